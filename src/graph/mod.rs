//! The social graph store and its persistence.
//!
//! [`SocialGraphStore`] owns one signed-in user's friends, posts, nudge
//! history and settings. Every mutation is gated by the
//! [`TierCapacityLedger`](crate::tier::TierCapacityLedger) and then written
//! through a [`PersistenceBackend`]:
//!
//! - [`MemoryBackend`]: in-process, for tests and ephemeral sessions
//! - [`SqliteBackend`]: one row per user in a local database
//! - [`RetryingBackend`]: retries failed saves of another backend
//!
//! Backends publish every save on a [`ChangeFeed`]. A store subscribed to
//! the same feed picks up other sessions' writes via
//! [`SocialGraphStore::poll_remote`].

mod backend;
mod error;
mod storage;
mod store;
pub mod types;

pub use backend::{ChangeFeed, MemoryBackend, PersistenceBackend, RetryingBackend, Subscription};
pub use error::{Result, StoreError};
pub use storage::SqliteBackend;
pub use store::SocialGraphStore;
pub use types::{
    AuthProvider, ContactImportReport, ContactNormalizer, GraphSnapshot, ImportSummary, PostDraft,
    UpdateOrigin,
};
