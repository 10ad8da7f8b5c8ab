use std::ops::AddAssign;

use lrs_core::{LrsError, ParamBox, Result, Validate};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::cox;
use crate::edge::ParameterEdge;
use crate::element::Element;
use crate::meshline::MeshLine;
use crate::types::{ElementId, FunctionId, MeshLineId};

/// A single LR-spline basis function with its own local knot vectors.
///
/// The function is supported on the rectangle
/// `[knot_u[0], knot_u[order_u]] x [knot_v[0], knot_v[order_v]]` and is
/// identically zero outside it. `order_u`/`order_v` are polynomial order
/// plus one, so each local knot vector holds `order + 1` values.
///
/// `support` and `partial_lines` are weak back-references into arenas owned
/// by the refinement driver: elements whose bounding box overlaps the
/// support rectangle, and mesh lines that cross the support only partially
/// (a function mid-refinement). Structural mutation is not synchronized;
/// the driver serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisFunction {
    dim: usize,
    order_u: usize,
    order_v: usize,
    knot_u: Vec<f64>,
    knot_v: Vec<f64>,
    controlpoint: Vec<f64>,
    weight: f64,
    id: i64,
    edge: ParameterEdge,
    support: Vec<ElementId>,
    partial_lines: Vec<MeshLineId>,
}

impl BasisFunction {
    /// Allocate an empty function of the given dimension and orders, with
    /// zeroed knots and control point to be filled in later (e.g. by
    /// [`BasisFunction::parse`]).
    pub fn new(dim: usize, order_u: usize, order_v: usize) -> Self {
        Self {
            dim,
            order_u,
            order_v,
            knot_u: vec![0.0; order_u + 1],
            knot_v: vec![0.0; order_v + 1],
            controlpoint: vec![0.0; dim],
            weight: 1.0,
            id: -1,
            edge: ParameterEdge::NONE,
            support: Vec::new(),
            partial_lines: Vec::new(),
        }
    }

    /// Construct fully from local knot vectors, control point, and weight.
    /// All inputs are copied.
    pub fn from_knots(
        knot_u: &[f64],
        knot_v: &[f64],
        controlpoint: &[f64],
        dim: usize,
        order_u: usize,
        order_v: usize,
        weight: f64,
    ) -> Self {
        debug_assert_eq!(knot_u.len(), order_u + 1);
        debug_assert_eq!(knot_v.len(), order_v + 1);
        debug_assert_eq!(controlpoint.len(), dim);
        Self {
            dim,
            order_u,
            order_v,
            knot_u: knot_u.to_vec(),
            knot_v: knot_v.to_vec(),
            controlpoint: controlpoint.to_vec(),
            weight,
            id: -1,
            edge: ParameterEdge::NONE,
            support: Vec::new(),
            partial_lines: Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn order_u(&self) -> usize {
        self.order_u
    }

    pub fn order_v(&self) -> usize {
        self.order_v
    }

    pub fn knot_u(&self) -> &[f64] {
        &self.knot_u
    }

    pub fn knot_v(&self) -> &[f64] {
        &self.knot_v
    }

    pub fn controlpoint(&self) -> &[f64] {
        &self.controlpoint
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    // --- Evaluation ---

    /// Evaluate the weighted basis function at `(u, v)`.
    ///
    /// Returns 0 outside the support rectangle. The `from_right` flags pick
    /// the half-open side used for evaluation exactly on a knot, so two
    /// elements sharing that knot each count the boundary once.
    pub fn evaluate(&self, u: f64, v: f64, u_from_right: bool, v_from_right: bool) -> f64 {
        if self.knot_u[0] > u || u > self.knot_u[self.order_u] {
            return 0.0;
        }
        if self.knot_v[0] > v || v > self.knot_v[self.order_v] {
            return 0.0;
        }
        let bu = cox::local_value(&self.knot_u, self.order_u, u, u_from_right);
        let bv = cox::local_value(&self.knot_v, self.order_v, v, v_from_right);
        bu * bv * self.weight
    }

    /// Evaluate the weighted basis function and its partial derivatives up
    /// to order `derivs` (at most 2).
    ///
    /// The result holds `(derivs+1)(derivs+2)/2` values ordered
    /// `[value, d/du, d/dv, d2/du2, d2/dudv, d2/dv2]`. Outside the support
    /// rectangle the vector is zero-filled but still correctly sized.
    pub fn evaluate_derivs(
        &self,
        u: f64,
        v: f64,
        derivs: usize,
        u_from_right: bool,
        v_from_right: bool,
    ) -> Result<Vec<f64>> {
        if derivs > 2 {
            return Err(LrsError::UnsupportedDerivativeOrder(derivs));
        }
        let mut results = vec![0.0; (derivs + 1) * (derivs + 2) / 2];
        if self.knot_u[0] > u || u > self.knot_u[self.order_u] {
            return Ok(results);
        }
        if self.knot_v[0] > v || v > self.knot_v[self.order_v] {
            return Ok(results);
        }

        let du = cox::local_derivs(&self.knot_u, self.order_u, u, u_from_right);
        let dv = cox::local_derivs(&self.knot_v, self.order_v, v, v_from_right);

        results[0] = du.value * dv.value * self.weight;
        if derivs > 0 {
            results[1] = du.d1 * dv.value * self.weight;
            results[2] = du.value * dv.d1 * self.weight;
        }
        if derivs > 1 {
            results[3] = du.d2 * dv.value * self.weight;
            results[4] = du.d1 * dv.d1 * self.weight;
            results[5] = du.value * dv.d2 * self.weight;
        }
        Ok(results)
    }

    // --- Support management ---

    /// Strict rectangle-overlap test against an element's bounding box.
    /// A support that only meets the element at a boundary does not count.
    pub fn overlaps(&self, el: &Element) -> bool {
        self.knot_u[0] < el.umax()
            && self.knot_u[self.order_u] > el.umin()
            && self.knot_v[0] < el.vmax()
            && self.knot_v[self.order_v] > el.vmin()
    }

    /// Register an element as supported, but only if it overlaps.
    /// Returns whether it was added.
    pub fn add_support(&mut self, id: ElementId, el: &Element) -> bool {
        if self.overlaps(el) {
            self.support.push(id);
            return true;
        }
        false
    }

    /// Unregister an element. Order is not preserved; an absent id is a
    /// no-op.
    pub fn remove_support(&mut self, id: ElementId) {
        if let Some(pos) = self.support.iter().position(|&e| e == id) {
            self.support.swap_remove(pos);
        }
    }

    pub fn supported_elements(&self) -> &[ElementId] {
        &self.support
    }

    /// Unregister this function from every element that lists it and clear
    /// the support set. Must be called before the function is dropped by
    /// the container so no element keeps a dangling back-reference.
    pub fn release(&mut self, own_id: FunctionId, elements: &mut SlotMap<ElementId, Element>) {
        for el_id in self.support.drain(..) {
            if let Some(el) = elements.get_mut(el_id) {
                el.remove_support_function(own_id);
            }
        }
        self.partial_lines.clear();
    }

    // --- Partial refinement lines ---

    pub fn add_partial_line(&mut self, id: MeshLineId) {
        self.partial_lines.push(id);
    }

    pub fn remove_partial_line(&mut self, id: MeshLineId) {
        if let Some(pos) = self.partial_lines.iter().position(|&l| l == id) {
            self.partial_lines.swap_remove(pos);
        }
    }

    pub fn partial_lines(&self) -> &[MeshLineId] {
        &self.partial_lines
    }

    // --- Refinement inheritance ---

    /// Copy from the parent every partial line that still touches this
    /// child's support. Geometric re-test, not a blind copy.
    pub fn inherit_partial_lines(
        &mut self,
        parent: &BasisFunction,
        lines: &SlotMap<MeshLineId, MeshLine>,
    ) {
        for &line_id in &parent.partial_lines {
            if let Some(line) = lines.get(line_id) {
                if line.touches_support(self) {
                    self.partial_lines.push(line_id);
                }
            }
        }
    }

    /// Carry the parent's boundary-edge tags onto a split child. A vertical
    /// split preserves EAST/WEST on both children and passes SOUTH to the
    /// minor child, NORTH to the major; a horizontal split preserves
    /// NORTH/SOUTH and passes WEST to the minor child, EAST to the major.
    pub fn inherit_edge_tag(&mut self, parent: &BasisFunction, vertical_split: bool, minor: bool) {
        let prev = parent.edge;
        if vertical_split {
            self.edge |= prev & ParameterEdge::EAST;
            self.edge |= prev & ParameterEdge::WEST;
            if minor {
                self.edge |= prev & ParameterEdge::SOUTH;
            } else {
                self.edge |= prev & ParameterEdge::NORTH;
            }
        } else {
            self.edge |= prev & ParameterEdge::NORTH;
            self.edge |= prev & ParameterEdge::SOUTH;
            if minor {
                self.edge |= prev & ParameterEdge::WEST;
            } else {
                self.edge |= prev & ParameterEdge::EAST;
            }
        }
    }

    // --- Edge tags ---

    pub fn edges(&self) -> ParameterEdge {
        self.edge
    }

    pub fn set_edge(&mut self, edge: ParameterEdge) {
        self.edge = edge;
    }

    pub fn add_edge(&mut self, edge: ParameterEdge) {
        self.edge |= edge;
    }
}

/// Structural equality: two functions are the same if their local knot
/// vectors match exactly, regardless of control point, weight, or id.
/// Independent refinement steps can regenerate an already-existing
/// function; duplicates found this way are merged with `+=`.
impl PartialEq for BasisFunction {
    fn eq(&self, other: &Self) -> bool {
        self.knot_u == other.knot_u && self.knot_v == other.knot_v
    }
}

/// Merge a structurally-equal duplicate into this function: the control
/// point becomes the weight-accumulating average and the weights add up,
/// preserving the rational partition of unity.
impl AddAssign<&BasisFunction> for BasisFunction {
    fn add_assign(&mut self, other: &BasisFunction) {
        let new_weight = self.weight + other.weight;
        for (c, oc) in self.controlpoint.iter_mut().zip(&other.controlpoint) {
            *c = (*c * self.weight + *oc * other.weight) / new_weight;
        }
        self.weight = new_weight;
    }
}

impl ParamBox for BasisFunction {
    fn umin(&self) -> f64 {
        self.knot_u[0]
    }

    fn umax(&self) -> f64 {
        self.knot_u[self.order_u]
    }

    fn vmin(&self) -> f64 {
        self.knot_v[0]
    }

    fn vmax(&self) -> f64 {
        self.knot_v[self.order_v]
    }
}

impl Validate for BasisFunction {
    fn validate(&self) -> Result<()> {
        if self.knot_u.len() != self.order_u + 1 || self.knot_v.len() != self.order_v + 1 {
            return Err(LrsError::Geometry(format!(
                "Local knot vector length mismatch: {} x {} for orders {} x {}",
                self.knot_u.len(),
                self.knot_v.len(),
                self.order_u,
                self.order_v
            )));
        }
        if self.controlpoint.len() != self.dim {
            return Err(LrsError::Geometry(format!(
                "Control point has {} components, expected {}",
                self.controlpoint.len(),
                self.dim
            )));
        }
        for knots in [&self.knot_u, &self.knot_v] {
            if knots.windows(2).any(|w| w[0] > w[1]) {
                return Err(LrsError::Geometry(format!(
                    "Local knot vector is not non-decreasing: {:?}",
                    knots
                )));
            }
        }
        if self.weight.is_nan() || self.weight <= 0.0 {
            return Err(LrsError::Geometry(format!(
                "Weight must be positive, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for BasisFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:[", self.id)?;
        for k in &self.knot_u {
            write!(f, "{} ", k)?;
        }
        write!(f, "] x [")?;
        for k in &self.knot_v {
            write!(f, "{} ", k)?;
        }
        write!(f, "] ")?;
        for c in &self.controlpoint {
            write!(f, "{} ", c)?;
        }
        write!(f, "({})", self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cubic(knot_u: &[f64], knot_v: &[f64]) -> BasisFunction {
        BasisFunction::from_knots(knot_u, knot_v, &[0.0, 0.0], 2, 4, 4, 1.0)
    }

    #[test]
    fn test_zero_outside_support() {
        let b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(b.evaluate(4.5, 2.0, true, true), 0.0);
        assert_eq!(b.evaluate(2.0, -0.1, true, true), 0.0);
        assert!(b.evaluate(2.0, 2.0, true, true) > 0.0);

        let r = b.evaluate_derivs(5.0, 2.0, 2, true, true).unwrap();
        assert_eq!(r, vec![0.0; 6]);
    }

    #[test]
    fn test_clamped_corner_value() {
        // Open cubic knot vectors: the corner function is 1 at the corner
        let b = cubic(&[0.0, 0.0, 0.0, 0.0, 1.0], &[0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_relative_eq!(b.evaluate(0.0, 0.0, true, true), 1.0);
    }

    #[test]
    fn test_rational_weight_scales_value() {
        let mut b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let plain = b.evaluate(2.0, 2.0, true, true);
        b.weight = 2.5;
        assert_relative_eq!(b.evaluate(2.0, 2.0, true, true), 2.5 * plain);
    }

    #[test]
    fn test_derivs_order_and_mixed_term() {
        let b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let r = b.evaluate_derivs(1.5, 2.5, 2, true, true).unwrap();
        assert_eq!(r.len(), 6);
        assert_relative_eq!(r[0], b.evaluate(1.5, 2.5, true, true));

        // Mixed derivative is the product of the univariate first derivatives
        let eps = 1e-6;
        let fd_mixed = (b.evaluate(1.5 + eps, 2.5 + eps, true, true)
            - b.evaluate(1.5 + eps, 2.5 - eps, true, true)
            - b.evaluate(1.5 - eps, 2.5 + eps, true, true)
            + b.evaluate(1.5 - eps, 2.5 - eps, true, true))
            / (4.0 * eps * eps);
        assert_relative_eq!(r[4], fd_mixed, epsilon = 1e-6);
    }

    #[test]
    fn test_derivs_finite_difference_u() {
        let b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let eps = 1e-6;
        let r = b.evaluate_derivs(1.5, 2.5, 1, true, true).unwrap();
        assert_eq!(r.len(), 3);
        let fd = (b.evaluate(1.5 + eps, 2.5, true, true) - b.evaluate(1.5 - eps, 2.5, true, true))
            / (2.0 * eps);
        assert_relative_eq!(r[1], fd, epsilon = 1e-8);
    }

    #[test]
    fn test_derivative_order_cap() {
        let b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let err = b.evaluate_derivs(2.0, 2.0, 3, true, true).unwrap_err();
        assert!(matches!(err, LrsError::UnsupportedDerivativeOrder(3)));
    }

    #[test]
    fn test_structural_equality_ignores_payload() {
        let a = BasisFunction::from_knots(
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 0.0],
            2,
            3,
            3,
            1.0,
        );
        let b = BasisFunction::from_knots(
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 1.0, 2.0, 3.0],
            &[5.0, 5.0],
            2,
            3,
            3,
            4.0,
        );
        assert_eq!(a, b);

        let c = BasisFunction::from_knots(
            &[0.0, 1.0, 2.0, 3.5],
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 0.0],
            2,
            3,
            3,
            1.0,
        );
        assert_ne!(a, c);
    }

    #[test]
    fn test_merge_weighted_average() {
        let mut a = BasisFunction::from_knots(
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 0.0],
            2,
            3,
            3,
            1.0,
        );
        let b = BasisFunction::from_knots(
            &[0.0, 1.0, 2.0, 3.0],
            &[0.0, 1.0, 2.0, 3.0],
            &[2.0, 2.0],
            2,
            3,
            3,
            1.0,
        );
        a += &b;
        assert_eq!(a.controlpoint(), &[1.0, 1.0]);
        assert_eq!(a.weight(), 2.0);
    }

    #[test]
    fn test_merge_respects_weights() {
        let mut a = BasisFunction::from_knots(
            &[0.0, 1.0],
            &[0.0, 1.0],
            &[0.0],
            1,
            1,
            1,
            3.0,
        );
        let b = BasisFunction::from_knots(&[0.0, 1.0], &[0.0, 1.0], &[4.0], 1, 1, 1, 1.0);
        a += &b;
        assert_relative_eq!(a.controlpoint()[0], 1.0);
        assert_eq!(a.weight(), 4.0);
    }

    #[test]
    fn test_overlap_is_strict() {
        let b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(b.overlaps(&Element::new(1.0, 1.0, 2.0, 2.0)));
        // Boundary contact only
        assert!(!b.overlaps(&Element::new(4.0, 0.0, 5.0, 4.0)));
        assert!(!b.overlaps(&Element::new(0.0, 4.0, 4.0, 5.0)));
    }

    #[test]
    fn test_add_remove_support() {
        let mut elements: SlotMap<ElementId, Element> = SlotMap::with_key();
        let inside = elements.insert(Element::new(1.0, 1.0, 2.0, 2.0));
        let outside = elements.insert(Element::new(4.0, 4.0, 5.0, 5.0));

        let mut b = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(b.add_support(inside, &elements[inside]));
        assert!(!b.add_support(outside, &elements[outside]));
        assert_eq!(b.supported_elements(), &[inside]);

        // Removing an unregistered element leaves the set unchanged
        b.remove_support(outside);
        assert_eq!(b.supported_elements(), &[inside]);
        b.remove_support(inside);
        assert!(b.supported_elements().is_empty());
    }

    #[test]
    fn test_edge_tag_inheritance_vertical() {
        let mut parent = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        parent.set_edge(
            ParameterEdge::NORTH | ParameterEdge::SOUTH | ParameterEdge::WEST,
        );

        let mut minor = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 2.5, 3.0]);
        minor.inherit_edge_tag(&parent, true, true);
        assert!(minor.edges().contains(ParameterEdge::WEST));
        assert!(minor.edges().contains(ParameterEdge::SOUTH));
        assert!(!minor.edges().contains(ParameterEdge::NORTH));

        let mut major = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 2.5, 3.0, 4.0]);
        major.inherit_edge_tag(&parent, true, false);
        assert!(major.edges().contains(ParameterEdge::WEST));
        assert!(major.edges().contains(ParameterEdge::NORTH));
        assert!(!major.edges().contains(ParameterEdge::SOUTH));
    }

    #[test]
    fn test_edge_tag_inheritance_horizontal() {
        let mut parent = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        parent.set_edge(ParameterEdge::EAST | ParameterEdge::NORTH);

        let mut minor = cubic(&[0.0, 1.0, 2.0, 2.5, 3.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        minor.inherit_edge_tag(&parent, false, true);
        assert!(minor.edges().contains(ParameterEdge::NORTH));
        assert!(!minor.edges().contains(ParameterEdge::EAST));

        let mut major = cubic(&[1.0, 2.0, 2.5, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        major.inherit_edge_tag(&parent, false, false);
        assert!(major.edges().contains(ParameterEdge::NORTH));
        assert!(major.edges().contains(ParameterEdge::EAST));
    }

    #[test]
    fn test_validate() {
        let good = cubic(&[0.0, 0.0, 1.0, 2.0, 2.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        good.validate().unwrap();

        let decreasing = cubic(&[0.0, 2.0, 1.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(decreasing.validate().is_err());

        let mut bad_weight = cubic(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        bad_weight.weight = 0.0;
        assert!(bad_weight.validate().is_err());
    }
}
