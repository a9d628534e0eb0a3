//! Tier membership and capacity enforcement.
//!
//! Every friend belongs to exactly one of seven concentric tiers. Each tier
//! has a fixed capacity that is shared between named friends and reserved
//! placeholder groups.
//!
//! # Capacity Model
//!
//! ```text
//! friend_count(T) + sum(reserved_groups(T).count) <= T.limit()
//! ```
//!
//! Adding or moving a friend into a full tier is refused outright.
//! Reserved placeholder requests are clamped to whatever room is left
//! instead, so a placeholder never blocks a named friend that fits.
//!
//! # Types
//!
//! - [`Tier`]: One of the seven relationship tiers
//! - [`Friend`]: A named member of a tier
//! - [`ReservedGroup`]: Unassigned capacity held in a tier
//! - [`TierCapacityLedger`]: Owns friends and reserved groups and enforces limits

mod error;
mod ledger;
pub mod types;

pub use error::{Result, TierError};
pub use ledger::TierCapacityLedger;
pub use types::{
    Friend, FriendDraft, FriendUpdate, PreferredContact, ReservedGroup, Tier,
    TierCapacitySnapshot,
};
