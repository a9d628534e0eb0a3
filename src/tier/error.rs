//! Error types for tier operations.

use thiserror::Error;

use super::types::Tier;

/// Error type for tier and capacity operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    /// The destination tier has no room left.
    #[error("Tier {tier} is full (limit {limit})")]
    CapacityExceeded {
        /// The tier that refused the request.
        tier: Tier,
        /// The tier's fixed capacity.
        limit: usize,
    },

    /// Friend not found.
    #[error("Friend not found: {0}")]
    FriendNotFound(String),

    /// Reserved group not found in the given tier.
    #[error("Reserved group not found: {0}")]
    ReservedGroupNotFound(String),

    /// Invalid data provided.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for tier operations.
pub type Result<T> = std::result::Result<T, TierError>;
