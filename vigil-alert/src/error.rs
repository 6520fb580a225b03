//! Error types for vigil-alert

use thiserror::Error;
use vigil_core::Error as CoreError;
use vigil_eye::VisionError;
use vigil_spk::SpeechError;

/// Alert pipeline errors
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Dispatcher error: {0}")]
    Dispatcher(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<AlertError> for CoreError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::Core(e) => e,
            AlertError::Config(msg) => CoreError::Configuration(msg),
            other => CoreError::InvalidArgument(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through() {
        let err = AlertError::from(CoreError::InvalidArgument("bad box".to_string()));
        assert!(matches!(CoreError::from(err), CoreError::InvalidArgument(msg) if msg == "bad box"));
    }

    #[test]
    fn test_display() {
        let err = AlertError::Dispatcher("already running".to_string());
        assert_eq!(err.to_string(), "Dispatcher error: already running");
    }
}
