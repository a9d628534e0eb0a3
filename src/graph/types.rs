//! Types for the social graph store.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nudge::NudgeHistory;
use crate::portability::{ContactTuple, DuplicateContact, ImportWarning, MergeReport};
use crate::tier::{Friend, Tier, TierCapacityLedger, TierError};
use crate::visibility::{ContentType, FeedPost, NotificationSettings, PrivacySettings};

/// Everything persisted for one user, written and read as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    /// Friends and reserved groups.
    #[serde(default)]
    pub ledger: TierCapacityLedger,
    /// Feed posts, own and received.
    #[serde(default)]
    pub posts: Vec<FeedPost>,
    /// Acquainted review history.
    #[serde(default)]
    pub nudge_history: NudgeHistory,
    /// Ids of dismissed sunset nudges.
    #[serde(default)]
    pub dismissed_nudges: BTreeSet<String>,
    /// Field-visibility matrix.
    #[serde(default)]
    pub privacy: PrivacySettings,
    /// Notification routing table.
    #[serde(default)]
    pub notifications: NotificationSettings,
    /// Incremented on every local write.
    #[serde(default)]
    pub revision: u64,
    /// Session that produced this snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    /// When this snapshot was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GraphSnapshot {
    /// Finds a post by id.
    #[must_use]
    pub fn post(&self, id: &str) -> Option<&FeedPost> {
        self.posts.iter().find(|p| p.id == id)
    }
}

/// Where a state change came from.
///
/// Only local changes are written back; remote snapshots are already
/// persisted by whoever produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// A mutation made through this store.
    Local,
    /// A snapshot received from the persistence backend.
    Remote,
}

/// Supplies the signed-in user.
pub trait AuthProvider {
    /// The current user's id, or `None` when signed out.
    fn user_id(&self) -> Option<String>;
}

/// Supplies already-normalized contacts from an external source.
pub trait ContactNormalizer {
    /// Contacts to import.
    fn normalized_contacts(&self) -> Vec<ContactTuple>;
}

impl ContactNormalizer for [ContactTuple] {
    fn normalized_contacts(&self) -> Vec<ContactTuple> {
        self.to_vec()
    }
}

impl ContactNormalizer for Vec<ContactTuple> {
    fn normalized_contacts(&self) -> Vec<ContactTuple> {
        self.clone()
    }
}

/// Input for a new post by the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    /// Kind of content.
    pub content_type: ContentType,
    /// Post body.
    pub content: String,
    /// Tiers allowed to see the post.
    pub visibility: Vec<Tier>,
}

impl PostDraft {
    /// A text post visible to the given tiers.
    #[must_use]
    pub fn text(content: impl Into<String>, visibility: impl IntoIterator<Item = Tier>) -> Self {
        Self {
            content_type: ContentType::Text,
            content: content.into(),
            visibility: visibility.into_iter().collect(),
        }
    }
}

/// What an applied import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Per-friend merge outcomes.
    pub report: MergeReport,
    /// Non-fatal observations from validation.
    pub warnings: Vec<ImportWarning>,
    /// Posts not already present.
    pub posts_added: usize,
    /// Reserved groups restored.
    pub reserved_groups_added: usize,
    /// Review history entries restored.
    pub history_entries_added: usize,
    /// Whether privacy and notification settings were replaced.
    pub settings_replaced: bool,
}

/// What a contact import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactImportReport {
    /// Newly created friends.
    pub added: Vec<Friend>,
    /// Contacts matching an existing friend, with that friend's id.
    pub already_known: Vec<(ContactTuple, String)>,
    /// Contacts repeating an earlier contact in the same batch.
    pub duplicates: Vec<DuplicateContact>,
    /// Contacts the ledger refused.
    pub rejected: Vec<(ContactTuple, TierError)>,
}
