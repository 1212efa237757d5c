//! Error types for the Strata write path
//!
//! This module defines all error types raised while registering recorder
//! kinds, constructing recorders and recording rows.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::path::PathParseError;
use std::io;
use thiserror::Error;

/// Result type alias for Strata operations
pub type StrataResult<T> = std::result::Result<T, StrataError>;

/// Error types for the Strata write path
#[derive(Debug, Error)]
pub enum StrataError {
    /// A recorder kind with the same `(package, kind)` key is already registered
    #[error("Recorder kind '{kind}' is already registered in package '{package}'")]
    ConfigConflict {
        /// Package the conflicting kind belongs to
        package: String,
        /// Conflicting kind name
        kind: String,
    },

    /// No recorder kind matches the configuration discriminator
    #[error("Recorder kind '{kind}' is not registered")]
    KindNotFound {
        /// Requested kind name
        kind: String,
    },

    /// Configuration parameters do not satisfy the kind's schema
    #[error("Invalid configuration for recorder kind '{kind}': {reason}")]
    ConfigValidation {
        /// Kind whose schema rejected the parameters
        kind: String,
        /// Why validation failed
        reason: String,
    },

    /// The progress callback asked for construction to stop
    #[error("Construction of recorder kind '{kind}' was cancelled")]
    ConstructionCancelled {
        /// Kind being constructed
        kind: String,
    },

    /// A backend failed to record rows
    #[error("Recording into '{kind}' failed: {message}")]
    Recording {
        /// Backend kind that raised the failure
        kind: String,
        /// Backend-specific description
        message: String,
    },

    /// A specialized tabular recorder was called with the wrong number of values
    #[error("Tabular record expected {expected} values, got {actual}")]
    ArityMismatch {
        /// Number of columns bound at specialization time
        expected: usize,
        /// Number of values passed
        actual: usize,
    },

    /// A root-path cell shares its row with other cells, which no tree can hold
    #[error("Row has a root-path cell alongside {others} other cells and has no tree form")]
    MixedRootColumn {
        /// Number of cells besides the root-path cell
        others: usize,
    },

    /// A path could not be parsed from its text form
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathParseError),

    /// I/O error (file backends, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StrataError {
    /// Create a backend recording failure
    pub fn recording(kind: impl Into<String>, message: impl Into<String>) -> Self {
        StrataError::Recording {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a configuration validation failure
    pub fn config_validation(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        StrataError::ConfigValidation {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        StrataError::Internal(message.into())
    }

    /// True for duplicate registrations
    pub fn is_config_conflict(&self) -> bool {
        matches!(self, StrataError::ConfigConflict { .. })
    }

    /// True when a configuration named an unknown kind
    pub fn is_kind_not_found(&self) -> bool {
        matches!(self, StrataError::KindNotFound { .. })
    }

    /// True when parameters were rejected by a schema
    pub fn is_config_validation(&self) -> bool {
        matches!(self, StrataError::ConfigValidation { .. })
    }

    /// True when construction was cancelled through the progress callback
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StrataError::ConstructionCancelled { .. })
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}
