//! Monthly batching of the acquainted tier.
//!
//! Each acquainted friend is hashed into one month of the year. During that
//! month the friend is offered for review, unless the review history already
//! holds an entry for the friend in the current cycle year.

use chrono::{DateTime, Datelike, Utc};

use super::types::{AcquaintedAction, AcquaintedNudgeBatch, AcquaintedNudgeHistoryEntry};
use crate::id::stable_hash;
use crate::tier::{Friend, Tier};

/// Months in a review cycle.
const MONTHS_PER_CYCLE: u64 = 12;

/// Zero-based month a friend is reviewed in. Stable for the friend's lifetime.
#[must_use]
pub fn assigned_month(friend_id: &str) -> u32 {
    // The remainder is below 12 and always fits
    u32::try_from(stable_hash(friend_id) % MONTHS_PER_CYCLE).unwrap_or(0)
}

/// Cycle year a date belongs to.
#[must_use]
pub fn cycle_year(date: DateTime<Utc>) -> i32 {
    date.year()
}

/// Whether `date` falls in the friend's review month.
#[must_use]
pub fn is_acquainted_nudge_day(friend: &Friend, date: DateTime<Utc>) -> bool {
    date.month0() == assigned_month(&friend.id)
}

/// Whether the history holds an entry for the friend in `cycle_year`.
#[must_use]
pub fn has_been_nudged_this_cycle(
    friend_id: &str,
    cycle_year: i32,
    history: &[AcquaintedNudgeHistoryEntry],
) -> bool {
    history
        .iter()
        .any(|e| e.friend_id == friend_id && e.cycle_year == cycle_year)
}

/// Selects the acquainted friends due for review at `date`.
#[must_use]
pub fn generate_acquainted_nudge_batch(
    friends: &[Friend],
    history: &[AcquaintedNudgeHistoryEntry],
    date: DateTime<Utc>,
) -> AcquaintedNudgeBatch {
    let year = cycle_year(date);
    let due: Vec<Friend> = friends
        .iter()
        .filter(|f| f.tier == Tier::Acquainted)
        .filter(|f| is_acquainted_nudge_day(f, date))
        .filter(|f| !has_been_nudged_this_cycle(&f.id, year, history))
        .cloned()
        .collect();

    AcquaintedNudgeBatch {
        should_show: !due.is_empty(),
        friends: due,
        cycle_year: year,
        month: date.month0(),
    }
}

/// Returns `entry` with the decision recorded. The caller persists it.
#[must_use]
pub fn record_nudge_action(
    entry: &AcquaintedNudgeHistoryEntry,
    action: AcquaintedAction,
    at: DateTime<Utc>,
) -> AcquaintedNudgeHistoryEntry {
    AcquaintedNudgeHistoryEntry {
        action_taken: Some(action),
        action_taken_at: Some(at),
        ..entry.clone()
    }
}
