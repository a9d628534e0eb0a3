//! `SQLite` persistence for graph snapshots.
//!
//! Each user has one row holding the JSON-encoded [`GraphSnapshot`]. The
//! revision and writer are duplicated into columns so they can be inspected
//! without decoding the payload.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::backend::{ChangeFeed, PersistenceBackend, Subscription};
use super::error::{Result, StoreError};
use super::types::GraphSnapshot;

/// `SQLite`-based snapshot storage.
///
/// Thread-safe wrapper around a `SQLite` connection. Saves are published on
/// the backend's [`ChangeFeed`].
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        Self::with_feed(path, ChangeFeed::new())
    }

    /// Opens the database at `path`, publishing saves on a shared feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn with_feed(path: &Path, feed: ChangeFeed) -> Result<Self> {
        Self::from_connection(Connection::open(path)?, feed)
    }

    /// Creates an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, ChangeFeed::new())
    }

    fn from_connection(conn: Connection, feed: ChangeFeed) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
            feed,
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// The feed saves are published on.
    #[must_use]
    pub const fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS snapshots (
                user_id TEXT PRIMARY KEY,
                revision INTEGER NOT NULL,
                writer TEXT,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    /// Revision stored for a user, without decoding the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn revision(&self, user_id: &str) -> Result<Option<u64>> {
        let conn = self.lock()?;
        let revision: Option<i64> = conn
            .query_row(
                "SELECT revision FROM snapshots WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        revision
            .map(|r| {
                u64::try_from(r)
                    .map_err(|_| StoreError::Storage(format!("Negative revision stored: {r}")))
            })
            .transpose()
    }
}

impl PersistenceBackend for SqliteBackend {
    fn load(&self, user_id: &str) -> Result<Option<GraphSnapshot>> {
        let conn = self.lock()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM snapshots WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, user_id: &str, snapshot: &GraphSnapshot) -> Result<()> {
        let payload = serde_json::to_string(snapshot)?;
        let revision = i64::try_from(snapshot.revision)
            .map_err(|_| StoreError::Storage(format!("Revision out of range: {}", snapshot.revision)))?;
        let updated_at = snapshot
            .updated_at
            .map_or_else(|| chrono::Utc::now().timestamp(), |t| t.timestamp());

        {
            let conn = self.lock()?;
            conn.execute(
                r"
                INSERT INTO snapshots (user_id, revision, writer, payload, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(user_id) DO UPDATE SET
                    revision = excluded.revision,
                    writer = excluded.writer,
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                ",
                params![user_id, revision, snapshot.writer, payload, updated_at],
            )?;
        }

        self.feed.publish(user_id, snapshot);
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> Subscription {
        self.feed.subscribe(user_id)
    }

    fn clear(&self, user_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM snapshots WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }
}
