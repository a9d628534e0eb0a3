//! Error and warning types for import and export.

use thiserror::Error;

/// A fatal import problem. Any error aborts the whole import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The payload is not parseable JSON or not an object.
    #[error("Malformed export file: {0}")]
    Malformed(String),

    /// The payload parses but a record is invalid.
    #[error("Invalid export data: {0}")]
    Validation(String),

    /// The export was written by an incompatible major version.
    #[error("Unsupported export version {found} (supported: {supported})")]
    VersionMismatch {
        /// Version found in the file.
        found: String,
        /// Version this build writes.
        supported: String,
    },
}

/// A non-fatal import observation, returned alongside success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    /// The file's minor version differs from ours.
    #[error("Export version {found} differs from {supported}; unknown fields are ignored")]
    MinorVersionDrift {
        /// Version found in the file.
        found: String,
        /// Version this build writes.
        supported: String,
    },

    /// A friend's tier was not recognized and was coerced to acquainted.
    #[error("Friend {friend_id} has unknown tier '{value}'; imported as acquainted")]
    UnknownTier {
        /// The friend's id.
        friend_id: String,
        /// The unrecognized value.
        value: String,
    },

    /// A friend's preferred contact was not recognized and was dropped.
    #[error("Friend {friend_id} has unknown preferred contact '{value}'; ignored")]
    UnknownPreferredContact {
        /// The friend's id.
        friend_id: String,
        /// The unrecognized value.
        value: String,
    },

    /// The same friend id appears more than once; the first is kept.
    #[error("Friend {friend_id} appears more than once; keeping the first")]
    DuplicateFriend {
        /// The repeated id.
        friend_id: String,
    },
}

/// Error type for export serialization.
#[derive(Error, Debug)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
