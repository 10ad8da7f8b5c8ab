//! Locally refined (LR) B-spline basis core.
//!
//! Unlike a classical tensor-product spline, every basis function here owns
//! its *own* local knot vectors. Refinement is driven by axis-aligned
//! [`MeshLine`]s that decide, through strict geometric predicates, which
//! elements and basis functions must be subdivided.

pub mod basis;
pub mod cox;
pub mod edge;
pub mod element;
pub mod meshline;
mod read;
pub mod types;

pub use basis::BasisFunction;
pub use edge::ParameterEdge;
pub use element::Element;
pub use meshline::MeshLine;
pub use types::{ElementId, FunctionId, MeshLineId};
