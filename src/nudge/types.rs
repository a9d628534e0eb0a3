//! Nudge and review-history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tier::{Friend, Tier};

/// What a sunset nudge suggests doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// A lightweight check-in.
    SendMessage,
    /// A stronger reconnect once contact has lapsed well past the threshold.
    ScheduleCall,
}

/// A derived reminder to reconnect with a friend.
///
/// The id encodes the friend and the contact timestamp it was computed
/// from, so a dismissal stops matching once contact timing changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunsetNudge {
    /// Derived identifier.
    pub id: String,
    /// Friend to reconnect with.
    pub friend_id: String,
    /// The friend's tier.
    pub friend_tier: Tier,
    /// Last recorded deep contact, if any.
    pub last_deep_contact: Option<DateTime<Utc>>,
    /// Whole days since the last deep contact (or since the friend was added).
    pub days_since_contact: i64,
    /// Suggested next step.
    pub suggested_action: SuggestedAction,
    /// Whether the caller has dismissed this nudge.
    pub dismissed: bool,
}

/// Outcome of an acquainted-tier review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquaintedAction {
    /// Stays acquainted.
    Keep,
    /// Moved to another tier.
    Moved,
    /// Removed from the graph.
    Removed,
    /// Reached out.
    Contacted,
}

/// One review of an acquainted friend within a cycle year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquaintedNudgeHistoryEntry {
    /// Friend reviewed.
    pub friend_id: String,
    /// Calendar year the review counts against.
    pub cycle_year: i32,
    /// When the nudge was shown.
    pub nudged_at: DateTime<Utc>,
    /// Decision taken, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<AcquaintedAction>,
    /// When the decision was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken_at: Option<DateTime<Utc>>,
}

impl AcquaintedNudgeHistoryEntry {
    /// Creates an entry for a nudge shown at `nudged_at`.
    #[must_use]
    pub fn new(friend_id: impl Into<String>, cycle_year: i32, nudged_at: DateTime<Utc>) -> Self {
        Self {
            friend_id: friend_id.into(),
            cycle_year,
            nudged_at,
            action_taken: None,
            action_taken_at: None,
        }
    }

    fn same_key(&self, other: &Self) -> bool {
        self.friend_id == other.friend_id && self.cycle_year == other.cycle_year
    }
}

/// Acquainted review log, unique per `(friend_id, cycle_year)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NudgeHistory(Vec<AcquaintedNudgeHistoryEntry>);

impl NudgeHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a history from raw entries, collapsing repeats of the same key.
    ///
    /// When a key repeats, the entry carrying an action wins over one
    /// without, and otherwise the later entry wins.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = AcquaintedNudgeHistoryEntry>) -> Self {
        let mut history = Self::new();
        for entry in entries {
            let keep_existing = history
                .get(&entry.friend_id, entry.cycle_year)
                .is_some_and(|e| e.action_taken.is_some() && entry.action_taken.is_none());
            if !keep_existing {
                history.upsert(entry);
            }
        }
        history
    }

    /// Entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[AcquaintedNudgeHistoryEntry] {
        &self.0
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up the entry for a friend and cycle year.
    #[must_use]
    pub fn get(&self, friend_id: &str, cycle_year: i32) -> Option<&AcquaintedNudgeHistoryEntry> {
        self.0
            .iter()
            .find(|e| e.friend_id == friend_id && e.cycle_year == cycle_year)
    }

    /// Inserts an entry or replaces the one with the same key.
    pub fn upsert(&mut self, entry: AcquaintedNudgeHistoryEntry) {
        match self.0.iter_mut().find(|e| e.same_key(&entry)) {
            Some(existing) => *existing = entry,
            None => self.0.push(entry),
        }
    }

    /// Drops every entry of a friend.
    pub fn forget_friend(&mut self, friend_id: &str) {
        self.0.retain(|e| e.friend_id != friend_id);
    }
}

/// This month's acquainted review batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquaintedNudgeBatch {
    /// Friends due for review.
    pub friends: Vec<Friend>,
    /// Whether there is anything to show.
    pub should_show: bool,
    /// Cycle year the batch belongs to.
    pub cycle_year: i32,
    /// Zero-based month of the batch.
    pub month: u32,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn upsert_replaces_same_key() {
        let mut history = NudgeHistory::new();
        history.upsert(AcquaintedNudgeHistoryEntry::new("f1", 2024, at(1)));
        let mut acted = AcquaintedNudgeHistoryEntry::new("f1", 2024, at(1));
        acted.action_taken = Some(AcquaintedAction::Keep);
        history.upsert(acted);

        assert_eq!(history.len(), 1);
        assert_eq!(
            history.get("f1", 2024).unwrap().action_taken,
            Some(AcquaintedAction::Keep)
        );
    }

    #[test]
    fn upsert_keeps_other_years_apart() {
        let mut history = NudgeHistory::new();
        history.upsert(AcquaintedNudgeHistoryEntry::new("f1", 2023, at(1)));
        history.upsert(AcquaintedNudgeHistoryEntry::new("f1", 2024, at(1)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn from_entries_collapses_appended_log() {
        let mut acted = AcquaintedNudgeHistoryEntry::new("f1", 2024, at(2));
        acted.action_taken = Some(AcquaintedAction::Contacted);
        acted.action_taken_at = Some(at(2));
        let history = NudgeHistory::from_entries([
            AcquaintedNudgeHistoryEntry::new("f1", 2024, at(1)),
            acted.clone(),
            AcquaintedNudgeHistoryEntry::new("f1", 2024, at(3)),
            AcquaintedNudgeHistoryEntry::new("f2", 2024, at(3)),
        ]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.get("f1", 2024), Some(&acted));
    }

    #[test]
    fn forget_friend_drops_all_years() {
        let mut history = NudgeHistory::new();
        history.upsert(AcquaintedNudgeHistoryEntry::new("f1", 2023, at(1)));
        history.upsert(AcquaintedNudgeHistoryEntry::new("f1", 2024, at(1)));
        history.upsert(AcquaintedNudgeHistoryEntry::new("f2", 2024, at(1)));
        history.forget_friend("f1");
        assert_eq!(history.len(), 1);
        assert!(history.get("f2", 2024).is_some());
    }

    #[test]
    fn history_serializes_as_plain_array() {
        let mut history = NudgeHistory::new();
        history.upsert(AcquaintedNudgeHistoryEntry::new("f1", 2024, at(1)));
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with("[{\"friendId\":\"f1\",\"cycleYear\":2024"));
        assert!(!json.contains("actionTaken"));
    }
}
