//! Error types for the logging engine.

use thiserror::Error;

/// Errors that can occur inside the logging engine.
///
/// None of these cross the engine facade: [`crate::engine::LogEngine`]
/// operations are total and recover locally.
#[derive(Debug, Error)]
pub enum LogError {
    /// A level name did not match any known log level.
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    /// An I/O error occurred in the file sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = LogError::UnknownLevel("loud".to_string());
        assert_eq!(err.to_string(), "unknown log level: loud");
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LogError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogError>();
    }
}
