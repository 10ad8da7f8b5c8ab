/// Tolerance management for parametric comparisons.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Absolute tolerance for knot-value coincidence (in parameter units)
    pub knot: f64,
}

impl Tolerance {
    pub const DEFAULT_KNOT: f64 = 1e-14;

    pub fn new(knot: f64) -> Self {
        Self { knot }
    }

    pub fn default_precision() -> Self {
        Self {
            knot: Self::DEFAULT_KNOT,
        }
    }

    pub fn loose() -> Self {
        Self { knot: 1e-10 }
    }

    pub fn tight() -> Self {
        Self { knot: 1e-16 }
    }

    /// Check if two parameter values coincide within knot tolerance
    pub fn knot_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.knot
    }

    /// Check if a parameter value is zero within knot tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.knot
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}
