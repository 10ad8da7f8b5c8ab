use thiserror::Error;

#[derive(Debug, Error)]
pub enum LrsError {
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Parse error at byte {offset}: {message}")]
    Parse { message: String, offset: usize },

    #[error("Unsupported derivative order {0}: at most second derivatives are available")]
    UnsupportedDerivativeOrder(usize),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LrsError>;
