use lrs_core::ParamBox;
use serde::{Deserialize, Serialize};

use crate::types::FunctionId;

/// A rectangular mesh element in the parametric domain.
///
/// Elements are owned by the refinement driver's arena; the basis core only
/// reads the bounding box and maintains the back-reference registry of
/// functions whose support overlaps this element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    umin: f64,
    vmin: f64,
    umax: f64,
    vmax: f64,
    supported: Vec<FunctionId>,
}

impl Element {
    pub fn new(umin: f64, vmin: f64, umax: f64, vmax: f64) -> Self {
        Self {
            umin,
            vmin,
            umax,
            vmax,
            supported: Vec::new(),
        }
    }

    pub fn add_support_function(&mut self, id: FunctionId) {
        self.supported.push(id);
    }

    /// Remove a function from the registry. Order is not preserved;
    /// an absent id is a no-op.
    pub fn remove_support_function(&mut self, id: FunctionId) {
        if let Some(pos) = self.supported.iter().position(|&f| f == id) {
            self.supported.swap_remove(pos);
        }
    }

    pub fn support_functions(&self) -> &[FunctionId] {
        &self.supported
    }
}

impl ParamBox for Element {
    fn umin(&self) -> f64 {
        self.umin
    }

    fn umax(&self) -> f64 {
        self.umax
    }

    fn vmin(&self) -> f64 {
        self.vmin
    }

    fn vmax(&self) -> f64 {
        self.vmax
    }
}
