//! The orchestrator that owns one user's social graph.
//!
//! Every mutation is applied to a copy of the current snapshot. If the
//! ledger refuses, the copy is discarded and nothing changes. Otherwise the
//! copy becomes the current state and is written to the backend. A failed
//! write is logged and the in-memory state is kept; [`SocialGraphStore::flush`]
//! retries it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::backend::{PersistenceBackend, RetryingBackend, Subscription};
use super::error::{Result, StoreError};
use super::types::{
    AuthProvider, ContactImportReport, ContactNormalizer, GraphSnapshot, ImportSummary, PostDraft,
    UpdateOrigin,
};
use crate::config::EngineConfig;
use crate::id::new_id;
use crate::nudge::{
    cycle_year, generate_acquainted_nudge_batch, generate_sunset_nudges, record_nudge_action,
    sunset, AcquaintedAction, AcquaintedNudgeBatch, AcquaintedNudgeHistoryEntry, SunsetNudge,
};
use crate::portability::{
    export_social_graph, find_duplicate_contacts, import_social_graph, plan_merge, redact_friends,
    serialize_export, ExportExtras, ExportFile, ExportOptions, ExportableSocialGraph, FriendIndex,
    ImportResult, ImportWarning, MergeStrategy,
};
use crate::tier::{
    Friend, FriendDraft, FriendUpdate, ReservedGroup, Tier, TierCapacityLedger,
    TierCapacitySnapshot, TierError,
};
use crate::visibility::{
    get_notification_priority, get_visible_content, sort_interactions_by_fidelity, visible_feed,
    FeedPost, Interaction, InteractionType, NotificationPriority, NotificationSettings,
    PrivacySettings, VisiblePost,
};

/// State held between `init` and `teardown`.
struct Session {
    user_id: String,
    writer: String,
    snapshot: GraphSnapshot,
    subscription: Subscription,
    unsaved: bool,
}

/// Owns a user's friends, posts, nudge history and settings.
///
/// Every mutation is applied to the in-memory snapshot first, then saved
/// before the call returns. The save and its retries run on the caller's
/// thread, so callers wait on the backend but never on its success. A save
/// that still fails is logged and the new state stays in place;
/// [`has_unsaved_changes`](Self::has_unsaved_changes) reports it until
/// [`flush`](Self::flush) succeeds.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use dunbar_core::graph::{AuthProvider, MemoryBackend, SocialGraphStore};
/// use dunbar_core::tier::{FriendDraft, Tier};
/// use dunbar_core::EngineConfig;
///
/// struct SignedIn;
/// impl AuthProvider for SignedIn {
///     fn user_id(&self) -> Option<String> {
///         Some("alice".to_string())
///     }
/// }
///
/// let mut store = SocialGraphStore::new(Arc::new(MemoryBackend::new()), EngineConfig::default());
/// store.init(&SignedIn).unwrap();
/// store.add_friend(FriendDraft::new("Ada", Tier::Core)).unwrap();
/// assert_eq!(store.capacity(Tier::Core).unwrap().available, 4);
/// ```
pub struct SocialGraphStore {
    backend: Arc<dyn PersistenceBackend>,
    config: EngineConfig,
    local: GraphSnapshot,
    session: Option<Session>,
}

impl std::fmt::Debug for SocialGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialGraphStore")
            .field("initialized", &self.session.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SocialGraphStore {
    /// Creates an uninitialized store. Saves are retried per
    /// `config.persistence`.
    #[must_use]
    pub fn new(backend: Arc<dyn PersistenceBackend>, config: EngineConfig) -> Self {
        let backend: Arc<dyn PersistenceBackend> =
            Arc::new(RetryingBackend::from_config(backend, &config.persistence));
        Self {
            backend,
            config,
            local: GraphSnapshot::default(),
            session: None,
        }
    }

    /// Seeds device-local state to migrate on first sign-in.
    ///
    /// Used only when the backend has no record for the user; an existing
    /// record always wins.
    #[must_use]
    pub fn with_local_state(mut self, local: GraphSnapshot) -> Self {
        self.local = local;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Lifecycle ====================

    /// Loads the signed-in user's graph and subscribes to remote updates.
    ///
    /// When the backend has no record yet, the local state is written as the
    /// user's first snapshot. Re-initializing for the same user is a no-op;
    /// a different user tears the current session down first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotAuthenticated`] without a user, or a backend
    /// error if the snapshot cannot be loaded.
    pub fn init(&mut self, auth: &dyn AuthProvider) -> Result<()> {
        let user_id = auth.user_id().ok_or(StoreError::NotAuthenticated)?;
        if let Some(session) = &self.session {
            if session.user_id == user_id {
                return Ok(());
            }
            self.teardown();
        }

        let writer = new_id();
        let subscription = self.backend.subscribe(&user_id);

        let (snapshot, unsaved) = match self.backend.load(&user_id)? {
            Some(snapshot) => {
                if let Err(e) = snapshot.ledger.check_invariant() {
                    warn!(
                        revision = snapshot.revision,
                        error = %e,
                        "Stored social graph is over capacity; further adds stay refused"
                    );
                }
                info!(
                    revision = snapshot.revision,
                    friends = snapshot.ledger.friends().len(),
                    "Loaded social graph"
                );
                (snapshot, false)
            }
            None => {
                let mut snapshot = std::mem::take(&mut self.local);
                snapshot.revision = snapshot.revision.saturating_add(1);
                snapshot.writer = Some(writer.clone());
                snapshot.updated_at = Some(Utc::now());
                let unsaved = match self.backend.save(&user_id, &snapshot) {
                    Ok(()) => false,
                    Err(e) => {
                        warn!(error = %e, "Failed to persist migrated graph; will retry on next write");
                        true
                    }
                };
                info!(
                    friends = snapshot.ledger.friends().len(),
                    "No stored graph; migrated local state"
                );
                (snapshot, unsaved)
            }
        };

        self.session = Some(Session {
            user_id,
            writer,
            snapshot,
            subscription,
            unsaved,
        });
        Ok(())
    }

    /// Drops the session and its subscription.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            if session.unsaved {
                warn!(
                    revision = session.snapshot.revision,
                    "Tearing down with unsaved changes"
                );
            }
            info!("Social graph store torn down");
        }
    }

    /// Whether `init` has succeeded and `teardown` has not been called since.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The signed-in user, if initialized.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    /// Whether the latest local change failed to persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn has_unsaved_changes(&self) -> Result<bool> {
        Ok(self.session()?.unsaved)
    }

    /// Retries persisting the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`] or the backend's error.
    pub fn flush(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(StoreError::NotInitialized)?;
        if session.unsaved {
            self.backend.save(&session.user_id, &session.snapshot)?;
            session.unsaved = false;
            info!(revision = session.snapshot.revision, "Flushed unsaved graph");
        }
        Ok(())
    }

    /// Applies the most recent snapshot written by another session.
    ///
    /// Snapshots written by this session are ignored, as is one whose ledger
    /// is over capacity. The applied snapshot is not written back. Returns
    /// whether anything was applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn poll_remote(&mut self) -> Result<bool> {
        let session = self.session.as_mut().ok_or(StoreError::NotInitialized)?;
        let pending = session.subscription.drain();
        let latest = pending
            .into_iter()
            .filter(|s| s.writer.as_deref() != Some(session.writer.as_str()))
            .last();

        match latest {
            Some(snapshot) => {
                if let Err(e) = snapshot.ledger.check_invariant() {
                    warn!(
                        revision = snapshot.revision,
                        error = %e,
                        "Ignoring remote snapshot that breaks tier capacity"
                    );
                    return Ok(false);
                }
                self.commit(snapshot, UpdateOrigin::Remote)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ==================== Reads ====================

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(StoreError::NotInitialized)
    }

    /// The current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn snapshot(&self) -> Result<&GraphSnapshot> {
        Ok(&self.session()?.snapshot)
    }

    /// The current ledger.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn ledger(&self) -> Result<&TierCapacityLedger> {
        Ok(&self.session()?.snapshot.ledger)
    }

    /// All friends, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn friends(&self) -> Result<&[Friend]> {
        Ok(self.ledger()?.friends())
    }

    /// Friends of one tier in display order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn friends_in_tier(&self, tier: Tier) -> Result<Vec<Friend>> {
        Ok(self
            .ledger()?
            .friends_in_tier(tier)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Capacity of one tier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn capacity(&self, tier: Tier) -> Result<TierCapacitySnapshot> {
        Ok(self.ledger()?.capacity(tier))
    }

    /// Capacity of every tier, closest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn capacities(&self) -> Result<Vec<TierCapacitySnapshot>> {
        Ok(self.ledger()?.capacities())
    }

    // ==================== Mutation Plumbing ====================

    /// Runs `op` against a copy of the snapshot and commits it on success.
    fn mutate<T>(
        &mut self,
        action: &'static str,
        op: impl FnOnce(&mut GraphSnapshot) -> Result<T>,
    ) -> Result<T> {
        let current = &self.session()?.snapshot;
        let mut next = current.clone();

        match op(&mut next) {
            Ok(value) => {
                if next == *current {
                    debug!(action, "No change");
                } else {
                    self.commit(next, UpdateOrigin::Local)?;
                    debug!(action, "Social graph updated");
                }
                Ok(value)
            }
            Err(e @ StoreError::Tier(TierError::CapacityExceeded { .. })) => {
                warn!(action, error = %e, "Refused: tier is full");
                Err(e)
            }
            Err(e) => {
                debug!(action, error = %e, "Mutation refused");
                Err(e)
            }
        }
    }

    /// Makes `next` the current state. Local changes are persisted; remote
    /// ones already are.
    fn commit(&mut self, mut next: GraphSnapshot, origin: UpdateOrigin) -> Result<()> {
        let session = self.session.as_mut().ok_or(StoreError::NotInitialized)?;

        match origin {
            UpdateOrigin::Local => {
                next.revision = session.snapshot.revision.saturating_add(1);
                next.writer = Some(session.writer.clone());
                next.updated_at = Some(Utc::now());
                session.unsaved = match self.backend.save(&session.user_id, &next) {
                    Ok(()) => false,
                    Err(e) => {
                        warn!(
                            revision = next.revision,
                            error = %e,
                            "Failed to persist social graph; keeping in-memory state"
                        );
                        true
                    }
                };
            }
            UpdateOrigin::Remote => {
                info!(revision = next.revision, "Applied remote snapshot");
                session.unsaved = false;
            }
        }

        session.snapshot = next;
        Ok(())
    }

    // ==================== Friend Operations ====================

    /// Adds a friend.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] (wrapped) if the tier is full.
    pub fn add_friend(&mut self, draft: FriendDraft) -> Result<Friend> {
        let now = Utc::now();
        self.mutate("add_friend", |s| Ok(s.ledger.add_friend(draft, now)?))
    }

    /// Moves a friend to another tier.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] (wrapped) if the destination
    /// is full, or [`TierError::FriendNotFound`].
    pub fn move_friend(&mut self, id: &str, tier: Tier) -> Result<Friend> {
        self.mutate("move_friend", |s| Ok(s.ledger.move_friend(id, tier)?))
    }

    /// Patches a friend's fields.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`] or [`TierError::InvalidData`].
    pub fn update_friend(&mut self, id: &str, update: &FriendUpdate) -> Result<Friend> {
        self.mutate("update_friend", |s| Ok(s.ledger.update_friend(id, update)?))
    }

    /// Records a meaningful contact, resetting the friend's sunset clock.
    ///
    /// Dismissals of the friend's older nudges are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`].
    pub fn record_deep_contact(&mut self, id: &str, at: DateTime<Utc>) -> Result<Friend> {
        self.mutate("record_deep_contact", |s| {
            let friend = s.ledger.record_deep_contact(id, at)?;
            let current = sunset::nudge_id(&friend);
            s.dismissed_nudges
                .retain(|n| *n == current || !sunset::is_nudge_for(n, id));
            Ok(friend)
        })
    }

    /// Removes a friend along with their review history and dismissed nudges.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`].
    pub fn remove_friend(&mut self, id: &str) -> Result<Friend> {
        self.mutate("remove_friend", |s| {
            let friend = s.ledger.remove_friend(id)?;
            s.nudge_history.forget_friend(id);
            s.dismissed_nudges.retain(|n| !sunset::is_nudge_for(n, id));
            Ok(friend)
        })
    }

    /// Sets the manual order of friends within a tier.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`] or [`TierError::InvalidData`].
    pub fn reorder_tier(&mut self, tier: Tier, ids: &[String]) -> Result<()> {
        self.mutate("reorder_tier", |s| Ok(s.ledger.reorder_tier(tier, ids)?))
    }

    // ==================== Reserved Groups ====================

    /// Reserves placeholder capacity in a tier.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] (wrapped) if the tier is full.
    pub fn add_reserved_group(
        &mut self,
        tier: Tier,
        count: usize,
        note: Option<String>,
    ) -> Result<ReservedGroup> {
        self.mutate("add_reserved_group", |s| {
            Ok(s.ledger.add_reserved_group(tier, count, note)?)
        })
    }

    /// Changes a reserved group's count and note.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::ReservedGroupNotFound`].
    pub fn update_reserved_group(
        &mut self,
        tier: Tier,
        group_id: &str,
        count: usize,
        note: Option<String>,
    ) -> Result<ReservedGroup> {
        self.mutate("update_reserved_group", |s| {
            Ok(s.ledger.update_reserved_group(tier, group_id, count, note)?)
        })
    }

    /// Releases a reserved group.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::ReservedGroupNotFound`].
    pub fn remove_reserved_group(&mut self, tier: Tier, group_id: &str) -> Result<ReservedGroup> {
        self.mutate("remove_reserved_group", |s| {
            Ok(s.ledger.remove_reserved_group(tier, group_id)?)
        })
    }

    // ==================== Posts & Interactions ====================

    /// Publishes a post by the signed-in user.
    ///
    /// Own posts carry the closest tier as their author tier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn create_post(&mut self, draft: PostDraft) -> Result<FeedPost> {
        let author_id = self.session()?.user_id.clone();
        let post = FeedPost {
            id: new_id(),
            author_id,
            author_tier: Tier::Core,
            content_type: draft.content_type,
            content: draft.content,
            created_at: Utc::now(),
            interactions: Vec::new(),
            visibility: draft.visibility,
            is_suggested: false,
            is_sponsored: false,
        };
        self.mutate("create_post", |s| {
            s.posts.push(post.clone());
            Ok(post)
        })
    }

    /// Stores a post received from someone else, replacing any earlier copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn receive_post(&mut self, post: FeedPost) -> Result<()> {
        self.mutate("receive_post", |s| {
            match s.posts.iter_mut().find(|p| p.id == post.id) {
                Some(existing) => *existing = post,
                None => s.posts.push(post),
            }
            Ok(())
        })
    }

    /// Adds an interaction by the signed-in user to a post.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PostNotFound`].
    pub fn add_interaction(
        &mut self,
        post_id: &str,
        interaction_type: InteractionType,
        content: Option<String>,
    ) -> Result<Interaction> {
        let user_id = self.session()?.user_id.clone();
        let interaction = Interaction {
            id: new_id(),
            post_id: post_id.to_string(),
            user_id,
            interaction_type,
            content,
            created_at: Utc::now(),
        };
        self.mutate("add_interaction", |s| {
            let post = s
                .posts
                .iter_mut()
                .find(|p| p.id == post_id)
                .ok_or_else(|| StoreError::PostNotFound(post_id.to_string()))?;
            post.interactions.push(interaction.clone());
            Ok(interaction)
        })
    }

    /// A post as seen by a viewer tier. `None` if the tier may not see it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PostNotFound`].
    pub fn visible_post(&self, viewer_tier: Tier, post_id: &str) -> Result<Option<VisiblePost>> {
        let snapshot = self.snapshot()?;
        let post = snapshot
            .post(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.to_string()))?;
        Ok(get_visible_content(viewer_tier, post, &snapshot.privacy))
    }

    /// The whole feed as seen by a viewer tier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn visible_feed(&self, viewer_tier: Tier) -> Result<Vec<VisiblePost>> {
        let snapshot = self.snapshot()?;
        Ok(visible_feed(viewer_tier, &snapshot.posts, &snapshot.privacy))
    }

    /// A post's interactions, closest friends first.
    ///
    /// Interacting users are matched to friends by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PostNotFound`].
    pub fn sorted_interactions(&self, post_id: &str) -> Result<Vec<Interaction>> {
        let snapshot = self.snapshot()?;
        let post = snapshot
            .post(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.to_string()))?;
        Ok(sort_interactions_by_fidelity(&post.interactions, |user| {
            snapshot.ledger.friend(user).map(|f| f.tier)
        }))
    }

    /// Notification priority for an interaction by `user_id`.
    ///
    /// Users who are not friends are always quiet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn notification_priority(
        &self,
        user_id: &str,
        interaction: Option<InteractionType>,
    ) -> Result<NotificationPriority> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .ledger
            .friend(user_id)
            .map_or(NotificationPriority::Quiet, |f| {
                get_notification_priority(f.tier, interaction, &snapshot.notifications)
            }))
    }

    /// Replaces the field-visibility matrix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn set_privacy_settings(&mut self, privacy: PrivacySettings) -> Result<()> {
        self.mutate("set_privacy_settings", |s| {
            s.privacy = privacy;
            Ok(())
        })
    }

    /// Replaces the notification routing table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn set_notification_settings(&mut self, notifications: NotificationSettings) -> Result<()> {
        self.mutate("set_notification_settings", |s| {
            s.notifications = notifications;
            Ok(())
        })
    }

    // ==================== Nudges ====================

    /// Sunset nudges due at `now`, recomputed from current friends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn sunset_nudges(&self, now: DateTime<Utc>) -> Result<Vec<SunsetNudge>> {
        let snapshot = self.snapshot()?;
        let dismissed: HashSet<String> = snapshot.dismissed_nudges.iter().cloned().collect();
        Ok(generate_sunset_nudges(
            snapshot.ledger.friends(),
            &dismissed,
            now,
            &self.config.sunset,
        ))
    }

    /// Dismisses a sunset nudge.
    ///
    /// The nudge id changes when contact is recorded, so a dismissal lasts
    /// until the next deep contact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn dismiss_nudge(&mut self, nudge_id: &str) -> Result<()> {
        self.mutate("dismiss_nudge", |s| {
            s.dismissed_nudges.insert(nudge_id.to_string());
            Ok(())
        })
    }

    /// Acquainted friends due for review at `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn acquainted_batch(&self, date: DateTime<Utc>) -> Result<AcquaintedNudgeBatch> {
        let snapshot = self.snapshot()?;
        Ok(generate_acquainted_nudge_batch(
            snapshot.ledger.friends(),
            snapshot.nudge_history.as_slice(),
            date,
        ))
    }

    /// Records that friends were shown for review at `at`.
    ///
    /// Friends that already have an entry for the cycle keep it. Returns the
    /// number of new entries.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`] for an unknown friend; nothing
    /// is recorded in that case.
    pub fn mark_acquainted_nudged(&mut self, friend_ids: &[String], at: DateTime<Utc>) -> Result<usize> {
        let year = cycle_year(at);
        self.mutate("mark_acquainted_nudged", |s| {
            let mut added = 0;
            for id in friend_ids {
                if s.ledger.friend(id).is_none() {
                    return Err(TierError::FriendNotFound(id.clone()).into());
                }
                if s.nudge_history.get(id, year).is_none() {
                    s.nudge_history
                        .upsert(AcquaintedNudgeHistoryEntry::new(id.clone(), year, at));
                    added += 1;
                }
            }
            Ok(added)
        })
    }

    /// Records the decision taken on a reviewed friend.
    ///
    /// Creates the cycle's entry if the friend was never marked as nudged.
    /// Acting on the decision (moving or removing the friend) is a separate
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn record_acquainted_action(
        &mut self,
        friend_id: &str,
        action: AcquaintedAction,
        at: DateTime<Utc>,
    ) -> Result<AcquaintedNudgeHistoryEntry> {
        let year = cycle_year(at);
        self.mutate("record_acquainted_action", |s| {
            let entry = s.nudge_history.get(friend_id, year).cloned().unwrap_or_else(|| {
                AcquaintedNudgeHistoryEntry::new(friend_id, year, at)
            });
            let entry = record_nudge_action(&entry, action, at);
            s.nudge_history.upsert(entry.clone());
            Ok(entry)
        })
    }

    // ==================== Portability ====================

    /// Builds an export document for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn export_graph(
        &self,
        options: ExportOptions,
        now: DateTime<Utc>,
    ) -> Result<ExportableSocialGraph> {
        let session = self.session()?;
        let snapshot = &session.snapshot;

        let friends = redact_friends(snapshot.ledger.friends(), options);
        let (privacy, notifications) = if options.include_settings {
            (Some(&snapshot.privacy), Some(&snapshot.notifications))
        } else {
            (None, None)
        };
        let extras = options.include_extras.then(|| ExportExtras {
            reserved_groups: snapshot.ledger.all_reserved_groups().clone(),
            nudge_history: snapshot.nudge_history.as_slice().to_vec(),
        });

        Ok(export_social_graph(
            &session.user_id,
            &friends,
            &snapshot.posts,
            privacy,
            notifications,
            extras,
            now,
        ))
    }

    /// Builds and serializes an export for a download sink.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`] or [`StoreError::Export`].
    pub fn export(&self, options: ExportOptions, now: DateTime<Utc>) -> Result<ExportFile> {
        let graph = self.export_graph(options, now)?;
        let file = serialize_export(&self.session()?.user_id, &graph)?;
        info!(
            friends = graph.friends.len(),
            posts = graph.posts.len(),
            bytes = file.bytes.len(),
            "Exported social graph"
        );
        Ok(file)
    }

    /// Validates an export file and merges it in as one change.
    ///
    /// Settings are adopted only under [`MergeStrategy::Overwrite`].
    /// Reserved groups are restored only into tiers that have none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Import`] with every validation error when the
    /// file is rejected; nothing is applied in that case.
    pub fn import(&mut self, raw: &str, strategy: MergeStrategy) -> Result<ImportSummary> {
        let ImportResult {
            success,
            data,
            errors,
            warnings,
        } = import_social_graph(raw);
        let (true, Some(graph)) = (success, data) else {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            warn!(errors = messages.len(), "Import rejected");
            return Err(StoreError::Import(messages));
        };

        let summary = self.mutate("import", |s| Ok(apply_import(s, graph, strategy, warnings)))?;
        info!(
            %strategy,
            added = summary.report.added(),
            skipped = summary.report.skipped(),
            overwritten = summary.report.overwritten(),
            rejected = summary.report.rejected(),
            "Import applied"
        );
        Ok(summary)
    }

    /// Adds contacts from an external source as friends in `tier`.
    ///
    /// Contacts repeating one another or matching an existing friend (by
    /// phone, then email) are reported rather than added. Contacts the
    /// ledger refuses are reported and the rest still go in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`].
    pub fn import_contacts<C>(&mut self, source: &C, tier: Tier) -> Result<ContactImportReport>
    where
        C: ContactNormalizer + ?Sized,
    {
        let contacts = source.normalized_contacts();
        let now = Utc::now();

        let report = self.mutate("import_contacts", |s| {
            let dedup = find_duplicate_contacts(&contacts);
            let index = FriendIndex::new(s.ledger.friends());
            let mut report = ContactImportReport {
                duplicates: dedup.duplicates,
                ..ContactImportReport::default()
            };

            for contact in dedup.unique {
                if let Some((position, _)) = index.find_contact(&contact) {
                    let existing_id = s.ledger.friends()[position].id.clone();
                    report.already_known.push((contact, existing_id));
                    continue;
                }
                let draft = FriendDraft {
                    email: contact.email.clone(),
                    phone: contact.phone.clone(),
                    ..FriendDraft::new(contact.name.clone(), tier)
                };
                match s.ledger.add_friend(draft, now) {
                    Ok(friend) => report.added.push(friend),
                    Err(e) => report.rejected.push((contact, e)),
                }
            }
            Ok(report)
        })?;

        info!(
            %tier,
            added = report.added.len(),
            known = report.already_known.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejected.len(),
            "Contacts imported"
        );
        Ok(report)
    }
}

/// Folds a validated export into a snapshot.
fn apply_import(
    s: &mut GraphSnapshot,
    graph: ExportableSocialGraph,
    strategy: MergeStrategy,
    warnings: Vec<ImportWarning>,
) -> ImportSummary {
    let merged = plan_merge(&s.ledger, &graph.friends, strategy);
    s.ledger = merged.ledger;

    let mut summary = ImportSummary {
        report: merged.report,
        warnings,
        ..ImportSummary::default()
    };

    for post in graph.posts {
        if s.post(&post.id).is_none() {
            s.posts.push(post);
            summary.posts_added += 1;
        }
    }
    for interaction in graph.interactions {
        if let Some(post) = s.posts.iter_mut().find(|p| p.id == interaction.post_id) {
            if !post.interactions.iter().any(|i| i.id == interaction.id) {
                post.interactions.push(interaction);
            }
        }
    }

    if let Some(extras) = graph.extras {
        for (tier, groups) in extras.reserved_groups {
            if !s.ledger.reserved_groups(tier).is_empty() {
                continue;
            }
            for group in groups.into_iter().filter(|g| g.count > 0) {
                if s.ledger.add_reserved_group(tier, group.count, group.note).is_ok() {
                    summary.reserved_groups_added += 1;
                }
            }
        }
        for entry in extras.nudge_history {
            if s.ledger.friend(&entry.friend_id).is_some()
                && s.nudge_history.get(&entry.friend_id, entry.cycle_year).is_none()
            {
                s.nudge_history.upsert(entry);
                summary.history_entries_added += 1;
            }
        }
    }

    if strategy == MergeStrategy::Overwrite {
        if let Some(settings) = graph.settings {
            if let Some(privacy) = settings.privacy {
                s.privacy = privacy;
                summary.settings_replaced = true;
            }
            if let Some(notifications) = settings.notifications {
                s.notifications = notifications;
                summary.settings_replaced = true;
            }
        }
    }

    summary
}
