//! Error types for webb-core.

use thiserror::Error;

use crate::jobs::JobId;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // Submission errors (raised before a job exists)
    #[error("Invalid URL: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch M3U8: {0}")]
    ResolutionFailed(String),

    #[error("No media segments found in playlist")]
    NoSegments,

    #[error("Duplicate file already exists ({0})")]
    DuplicateSubmission(String),

    // Download errors
    #[error("Segment fetch failed: {0}")]
    SegmentFetch(String),

    #[error("Assembly failed: {0}")]
    Assembly(String),

    #[error("Job {id} failed: {reason}")]
    JobFailed { id: JobId, reason: String },

    // Registry errors
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {id} cannot move from {from} to {to}")]
    InvalidTransition { id: JobId, from: String, to: String },

    // File system errors
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error rejects a submission before any job is created.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::UrlParse(_)
                | Error::ResolutionFailed(_)
                | Error::NoSegments
                | Error::DuplicateSubmission(_)
        )
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const NETWORK_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(Error::InvalidInput("x".into()).is_rejection());
        assert!(Error::NoSegments.is_rejection());
        assert!(Error::DuplicateSubmission("abc".into()).is_rejection());
        assert!(!Error::Assembly("disk full".into()).is_rejection());
        assert!(!Error::JobNotFound(3).is_rejection());
    }
}
