//! Error types for vigil-eye

use thiserror::Error;
use vigil_core::Error as CoreError;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InvalidArgument(msg) => CoreError::InvalidArgument(msg),
            VisionError::Core(inner) => inner,
            other => CoreError::InvalidArgument(format!("Vision error: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::InvalidArgument("frame width must be positive".to_string());
        assert!(err.to_string().contains("Invalid argument"));
        assert!(err.to_string().contains("frame width"));
    }

    #[test]
    fn test_vision_error_to_core_error() {
        let core_err: CoreError = VisionError::InvalidArgument("bad".to_string()).into();
        match core_err {
            CoreError::InvalidArgument(msg) => assert_eq!(msg, "bad"),
            _ => panic!("Expected InvalidArgument error"),
        }
    }
}
