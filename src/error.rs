//! Crate-level error type.
//!
//! Evaluation failures reported by the batch endpoint are *not* errors; they
//! arrive as data and are rendered by [`crate::view`]. Everything here is a
//! reason an operation did not complete.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatmindError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The request exceeded its time bound.
    #[error("{0}")]
    Timeout(String),

    /// Connection or HTTP failure without a structured error body.
    #[error("{0}")]
    Transport(String),

    /// The backend answered `success: false` or sent a structured `error`.
    #[error("{0}")]
    Application(String),

    /// CSV import aborted; nothing from the failing file was added.
    #[error("{0}")]
    Csv(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ChatmindError {
    /// True for errors raised before touching the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatmindError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ChatmindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message_verbatim() {
        let err = ChatmindError::Application("Invalid model selection".to_string());
        assert_eq!(err.to_string(), "Invalid model selection");
    }

    #[test]
    fn test_config_display_has_prefix() {
        let err = ChatmindError::Config("bad url".to_string());
        assert_eq!(err.to_string(), "config error: bad url");
    }

    #[test]
    fn test_is_validation() {
        assert!(ChatmindError::Validation("x".into()).is_validation());
        assert!(!ChatmindError::Transport("x".into()).is_validation());
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(ChatmindError::Io(_))));
    }
}
