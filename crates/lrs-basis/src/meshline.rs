use lrs_core::{LrsError, ParamBox, Result, Tolerance, Validate};
use serde::{Deserialize, Serialize};

use crate::basis::BasisFunction;

/// An axis-aligned refinement line in the parametric domain.
///
/// The line is constant in one direction (`const_par`) and spans the
/// interval `[start, stop]` in the other; `span_u` is true for a line that
/// spans U (constant V). It carries the knot multiplicity the insertion
/// represents. A mesh line is an immutable value: it is referenced, never
/// owned, by the basis functions it partially touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshLine {
    pub(crate) span_u: bool,
    pub(crate) const_par: f64,
    pub(crate) start: f64,
    pub(crate) stop: f64,
    pub(crate) multiplicity: usize,
}

impl MeshLine {
    pub fn new(span_u: bool, const_par: f64, start: f64, stop: f64, multiplicity: usize) -> Self {
        Self {
            span_u,
            const_par,
            start,
            stop,
            multiplicity,
        }
    }

    pub fn is_spanning_u(&self) -> bool {
        self.span_u
    }

    pub fn const_par(&self) -> f64 {
        self.const_par
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    /// The line lies along one edge of the box without crossing its
    /// interior: the constant parameter falls strictly inside the
    /// transverse extent and the spanning interval meets the box at
    /// exactly one boundary.
    pub fn touches<B: ParamBox>(&self, b: &B) -> bool {
        if self.span_u {
            b.vmin() < self.const_par
                && self.const_par < b.vmax()
                && (self.start == b.umax() || b.umin() == self.stop)
        } else {
            b.umin() < self.const_par
                && self.const_par < b.umax()
                && (self.start == b.vmax() || b.vmin() == self.stop)
        }
    }

    /// The line fully crosses the box: the constant parameter falls
    /// strictly inside the transverse extent and the spanning interval
    /// contains the box's extent. Such an element or support must be
    /// subdivided.
    pub fn splits<B: ParamBox>(&self, b: &B) -> bool {
        if self.span_u {
            b.vmin() < self.const_par
                && self.const_par < b.vmax()
                && self.start <= b.umin()
                && b.umax() <= self.stop
        } else {
            b.umin() < self.const_par
                && self.const_par < b.umax()
                && self.start <= b.vmin()
                && b.vmax() <= self.stop
        }
    }

    /// Touch rule for basis-function supports. Deliberately looser than the
    /// element rule: the interval check is a one-sided *or* with strict
    /// inequalities (`start < support.max || support.min < stop`), because a
    /// support may extend past the line on one side only and still be
    /// tracked as touched during refinement.
    pub fn touches_support(&self, basis: &BasisFunction) -> bool {
        if self.span_u {
            basis.vmin() < self.const_par
                && self.const_par < basis.vmax()
                && (self.start < basis.umax() || basis.umin() < self.stop)
        } else {
            basis.umin() < self.const_par
                && self.const_par < basis.umax()
                && (self.start < basis.vmax() || basis.vmin() < self.stop)
        }
    }

    /// The function already carries this line: the constant parameter
    /// coincides (within knot tolerance) with one of the function's local
    /// knots in the transverse direction, so no further split is needed.
    pub fn contained_in(&self, basis: &BasisFunction, tol: Tolerance) -> bool {
        let knots = if self.span_u {
            basis.knot_v()
        } else {
            basis.knot_u()
        };
        knots.iter().any(|&k| tol.knot_eq(k, self.const_par))
    }
}

impl Validate for MeshLine {
    fn validate(&self) -> Result<()> {
        if self.start > self.stop {
            return Err(LrsError::Geometry(format!(
                "Mesh line interval is reversed: [{}, {}]",
                self.start, self.stop
            )));
        }
        if self.multiplicity == 0 {
            return Err(LrsError::Geometry(
                "Mesh line multiplicity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for MeshLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.span_u {
            write!(
                f,
                "[{}, {}] x {} ({})",
                self.start, self.stop, self.const_par, self.multiplicity
            )
        } else {
            write!(
                f,
                "{} x [{}, {}] ({})",
                self.const_par, self.start, self.stop, self.multiplicity
            )
        }
    }
}
