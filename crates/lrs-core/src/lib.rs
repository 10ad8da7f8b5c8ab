pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{LrsError, Result};
pub use tolerance::Tolerance;
pub use traits::{ParamBox, Validate};
