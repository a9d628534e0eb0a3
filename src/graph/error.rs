//! Error types for the social graph store.
//!
//! Ledger refusals pass through unchanged as [`StoreError::Tier`], so callers
//! can match on [`TierError::CapacityExceeded`] without unwrapping layers.

use thiserror::Error;

use crate::portability::ExportError;
use crate::tier::TierError;

/// Error type for store and persistence operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An operation was attempted before `init` or after `teardown`.
    #[error("Graph store is not initialized")]
    NotInitialized,

    /// The auth provider has no signed-in user.
    #[error("No authenticated user")]
    NotAuthenticated,

    /// The ledger refused the operation.
    #[error(transparent)]
    Tier(#[from] TierError),

    /// Post not found.
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// An import file was rejected; nothing was applied.
    #[error("Import failed: {}", .0.join("; "))]
    Import(Vec<String>),

    /// Export serialization failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    #[test]
    fn storage_error_display() {
        let err = StoreError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn not_initialized_display() {
        assert_eq!(
            StoreError::NotInitialized.to_string(),
            "Graph store is not initialized"
        );
    }

    #[test]
    fn tier_error_is_transparent() {
        let err: StoreError = TierError::CapacityExceeded {
            tier: Tier::Core,
            limit: 5,
        }
        .into();
        assert_eq!(err.to_string(), "Tier core is full (limit 5)");
        assert!(matches!(
            err,
            StoreError::Tier(TierError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn import_error_joins_messages() {
        let err = StoreError::Import(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(err.to_string(), "Import failed: first; second");
    }

    #[test]
    fn from_serde_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
