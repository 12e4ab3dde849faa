//! Viewer error types

use thiserror::Error;

/// Main viewer error type
#[derive(Error, Debug)]
pub enum ViewerError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("Page {index} did not finish loading in time")]
    LoadTimeout { index: usize },

    #[error("Image fetch failed for {src}: {message}")]
    ImageFetch { src: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Fatal for the viewer instance =====
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid manifest locator: {0}")]
    InvalidLocator(#[from] url::ParseError),

    #[error("No manifest locator configured")]
    MissingLocator,

    #[error("Manifest parse error: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("Manifest rejected by render engine")]
    ManifestRejected,
}

impl ViewerError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ViewerError::LoadTimeout { .. }
                | ViewerError::ImageFetch { .. }
                | ViewerError::Config(_)
                | ViewerError::Io(_)
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::Http(e) if e.is_timeout() => "The manifest server did not respond in time".to_string(),
            ViewerError::Http(_) | ViewerError::Transport(_) => {
                format!("Cannot fetch manifest: {}", self)
            }
            ViewerError::ManifestParse(_) | ViewerError::ManifestRejected => {
                "This document could not be opened".to_string()
            }
            ViewerError::LoadTimeout { index } => format!("Page {} is taking too long to load", index + 1),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ViewerError::LoadTimeout { index: 2 }.is_recoverable());
        assert!(ViewerError::ManifestRejected.is_fatal());
        assert!(ViewerError::MissingLocator.is_fatal());
        assert!(ViewerError::Transport("refused".into()).is_fatal());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            ViewerError::LoadTimeout { index: 0 }.user_message(),
            "Page 1 is taking too long to load"
        );
        assert_eq!(
            ViewerError::ManifestRejected.user_message(),
            "This document could not be opened"
        );
    }
}
