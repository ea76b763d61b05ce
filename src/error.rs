//! Error types for voxnote.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxnoteError {
    // Configuration errors — the only ones fatal to a whole invocation
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration is incomplete: {message}")]
    ConfigValidation { message: String },

    // Per-item pipeline errors, caught at the orchestrator boundary
    #[error("Invalid audio file {path}: {message}")]
    InvalidMedia { path: String, message: String },

    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    #[error("Text processing failed: {message}")]
    TextProcessing { message: String },

    #[error("File write failed: {message}")]
    Write { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Anything not covered above
    #[error("{0}")]
    Other(String),
}

impl VoxnoteError {
    /// Whether this is one of the expected per-item failure classes.
    ///
    /// Everything else is surfaced to the user tagged as unexpected.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            VoxnoteError::InvalidMedia { .. }
                | VoxnoteError::Transcription { .. }
                | VoxnoteError::TextProcessing { .. }
                | VoxnoteError::Write { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxnoteError>;

/// Failure classes of a remote OpenAI call, before retry policy is applied.
///
/// The transcription stage retries `RateLimited` and `Connection` failures;
/// everything else is fatal on the first occurrence.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl RemoteError {
    /// Classify a transport-level reqwest failure.
    ///
    /// Status-code classification (429 etc.) happens at the call site, where
    /// the response object is still available.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            RemoteError::Connection {
                message: err.to_string(),
            }
        } else {
            RemoteError::Unexpected {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_media_display() {
        let error = VoxnoteError::InvalidMedia {
            path: "/notes/missing.m4a".to_string(),
            message: "file not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid audio file /notes/missing.m4a: file not found"
        );
    }

    #[test]
    fn test_transcription_display() {
        let error = VoxnoteError::Transcription {
            message: "empty transcript".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription failed: empty transcript");
    }

    #[test]
    fn test_text_processing_display() {
        let error = VoxnoteError::TextProcessing {
            message: "rewrite returned empty response".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Text processing failed: rewrite returned empty response"
        );
    }

    #[test]
    fn test_write_display() {
        let error = VoxnoteError::Write {
            message: "permission denied".to_string(),
        };
        assert_eq!(error.to_string(), "File write failed: permission denied");
    }

    #[test]
    fn test_config_validation_display() {
        let error = VoxnoteError::ConfigValidation {
            message: "vault path not configured".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration is incomplete: vault path not configured"
        );
    }

    #[test]
    fn test_domain_error_classification() {
        let domain = VoxnoteError::Write {
            message: "x".to_string(),
        };
        assert!(domain.is_domain_error());

        let unexpected = VoxnoteError::Other("boom".to_string());
        assert!(!unexpected.is_domain_error());

        let io: VoxnoteError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(!io.is_domain_error());
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("a = b = c").unwrap_err();
        let error: VoxnoteError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VoxnoteError>();
        assert_sync::<VoxnoteError>();
        assert_send::<RemoteError>();
        assert_sync::<RemoteError>();
    }
}
