use crate::error::Result;

/// Validate structural integrity of a spline/mesh entity.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Axis-aligned extent of an entity in the parametric domain.
///
/// Implemented by mesh elements (their bounding box) and by basis functions
/// (their support rectangle), so line/box predicates can be written once.
pub trait ParamBox {
    fn umin(&self) -> f64;
    fn umax(&self) -> f64;
    fn vmin(&self) -> f64;
    fn vmax(&self) -> f64;
}
