//! Error types for the CodeUnify core library.
//!
//! Only the boundary layers (configuration, ingestion) produce errors.
//! Conditions inside the engine itself -- overlapping survivors, skipped
//! splices, failed validation -- are warnings carried in the
//! [`UnificationResult`](crate::applier::UnificationResult), because the
//! contract guarantees a result is always produced.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for callers that want a single error type.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Ingestion errors
// ---------------------------------------------------------------------------

/// Errors from reading and parsing proposal files.
///
/// These are file-level failures; a single malformed proposal inside an
/// otherwise valid file is excluded with a warning instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The proposal file could not be read.
    #[error("failed to read proposal source '{path}': {detail}")]
    ReadError {
        path: String,
        detail: String,
    },

    /// The proposal file is not valid JSON of the expected shape.
    #[error("failed to parse proposal source '{path}': {detail}")]
    ParseError {
        path: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ConfigError::InvalidValue {
            field: "strategy".into(),
            detail: "unknown strategy 'clever'".into(),
        };
        assert!(err.to_string().contains("strategy"));
        assert!(err.to_string().contains("clever"));

        let err = IngestError::ParseError {
            path: "suggestions.json".into(),
            detail: "expected value at line 1".into(),
        };
        assert!(err.to_string().contains("suggestions.json"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let config_err = ConfigError::FileNotFound("codeunify.toml".into());
        let core_err: CoreError = config_err.into();
        assert!(matches!(core_err, CoreError::Config(_)));

        let ingest_err = IngestError::ReadError {
            path: "a.json".into(),
            detail: "permission denied".into(),
        };
        let core_err: CoreError = ingest_err.into();
        assert!(matches!(core_err, CoreError::Ingest(_)));
    }
}
