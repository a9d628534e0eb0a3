//! Persistence backends and the change feed that connects sessions.
//!
//! A backend stores one [`GraphSnapshot`] per user. Every successful save is
//! published on the backend's [`ChangeFeed`], so other sessions sharing the
//! feed observe it as a remote update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
#[cfg(any(test, feature = "test-utils"))]
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::broadcast::{self, error::TryRecvError};

use super::error::{Result, StoreError};
use super::types::GraphSnapshot;
use crate::config::PersistenceConfig;

/// Buffered changes per subscriber before the oldest are dropped.
const FEED_CAPACITY: usize = 64;

/// A save observed on the feed.
#[derive(Debug, Clone)]
struct ChangeEvent {
    user_id: String,
    snapshot: GraphSnapshot,
}

/// Broadcasts saved snapshots to every subscriber.
///
/// Cloning yields a handle to the same feed.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Arc<ChangeEvent>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Publishes a saved snapshot.
    pub fn publish(&self, user_id: &str, snapshot: &GraphSnapshot) {
        let event = Arc::new(ChangeEvent {
            user_id: user_id.to_string(),
            snapshot: snapshot.clone(),
        });
        // An error only means nobody is listening
        let _ = self.sender.send(event);
    }

    /// Subscribes to saves for one user.
    #[must_use]
    pub fn subscribe(&self, user_id: &str) -> Subscription {
        Subscription {
            user_id: user_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live subscription to one user's saves. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    user_id: String,
    receiver: broadcast::Receiver<Arc<ChangeEvent>>,
}

impl Subscription {
    /// Returns the next pending snapshot for this user, if any.
    pub fn try_next(&mut self) -> Option<GraphSnapshot> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.user_id == self.user_id => {
                    return Some(event.snapshot.clone());
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change feed lagged; older snapshots dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains pending snapshots, returning them in arrival order.
    pub fn drain(&mut self) -> Vec<GraphSnapshot> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

/// Storage for per-user graph snapshots.
pub trait PersistenceBackend: Send + Sync {
    /// Loads a user's snapshot. `None` means no record exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self, user_id: &str) -> Result<Option<GraphSnapshot>>;

    /// Upserts a user's snapshot and publishes it to subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, user_id: &str, snapshot: &GraphSnapshot) -> Result<()>;

    /// Subscribes to saves of a user's snapshot.
    fn subscribe(&self, user_id: &str) -> Subscription;

    /// Deletes a user's snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn clear(&self, user_id: &str) -> Result<()>;
}

impl<B: PersistenceBackend + ?Sized> PersistenceBackend for Arc<B> {
    fn load(&self, user_id: &str) -> Result<Option<GraphSnapshot>> {
        (**self).load(user_id)
    }

    fn save(&self, user_id: &str, snapshot: &GraphSnapshot) -> Result<()> {
        (**self).save(user_id, snapshot)
    }

    fn subscribe(&self, user_id: &str) -> Subscription {
        (**self).subscribe(user_id)
    }

    fn clear(&self, user_id: &str) -> Result<()> {
        (**self).clear(user_id)
    }
}

/// In-process backend. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, GraphSnapshot>>,
    feed: ChangeFeed,
    #[cfg(any(test, feature = "test-utils"))]
    failing_saves: AtomicU32,
}

impl MemoryBackend {
    /// Creates an empty backend with its own feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend publishing on a shared feed.
    #[must_use]
    pub fn with_feed(feed: ChangeFeed) -> Self {
        Self {
            feed,
            ..Self::default()
        }
    }

    /// The feed saves are published on.
    #[must_use]
    pub const fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Makes the next `count` saves fail.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn fail_next_saves(&self, count: u32) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn injected_failure(&self) -> Result<()> {
        let remaining = self.failing_saves.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_saves.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Storage("injected save failure".to_string()));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-utils")))]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    fn injected_failure(&self) -> Result<()> {
        Ok(())
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, GraphSnapshot>>> {
        self.records
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire records lock: {e}")))
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load(&self, user_id: &str) -> Result<Option<GraphSnapshot>> {
        Ok(self.records()?.get(user_id).cloned())
    }

    fn save(&self, user_id: &str, snapshot: &GraphSnapshot) -> Result<()> {
        self.injected_failure()?;
        self.records()?
            .insert(user_id.to_string(), snapshot.clone());
        self.feed.publish(user_id, snapshot);
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> Subscription {
        self.feed.subscribe(user_id)
    }

    fn clear(&self, user_id: &str) -> Result<()> {
        self.records()?.remove(user_id);
        Ok(())
    }
}

/// Retries failed saves before giving up.
///
/// Loads, subscriptions and clears pass straight through.
#[derive(Debug)]
pub struct RetryingBackend<B> {
    inner: B,
    attempts: u32,
}

impl<B: PersistenceBackend> RetryingBackend<B> {
    /// Wraps `inner`, trying each save up to `attempts` times (at least once).
    #[must_use]
    pub fn new(inner: B, attempts: u32) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
        }
    }

    /// Wraps `inner` using the configured attempt count.
    #[must_use]
    pub fn from_config(inner: B, config: &PersistenceConfig) -> Self {
        Self::new(inner, config.save_attempts)
    }

    /// The wrapped backend.
    pub const fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: PersistenceBackend> PersistenceBackend for RetryingBackend<B> {
    fn load(&self, user_id: &str) -> Result<Option<GraphSnapshot>> {
        self.inner.load(user_id)
    }

    fn save(&self, user_id: &str, snapshot: &GraphSnapshot) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.inner.save(user_id, snapshot) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.attempts => {
                    tracing::debug!(attempt, error = %e, "Save failed; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn subscribe(&self, user_id: &str) -> Subscription {
        self.inner.subscribe(user_id)
    }

    fn clear(&self, user_id: &str) -> Result<()> {
        self.inner.clear(user_id)
    }
}
