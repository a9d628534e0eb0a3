//! Reconnect reminders.
//!
//! Two schedulers cover the tiers:
//!
//! - [`sunset`]: per-friend decay reminders for the named tiers, fired once
//!   time since the last deep contact passes the tier's threshold
//! - [`acquainted`]: the acquainted tier can hold a thousand people, so each
//!   friend is bucketed into one month of the year and reviewed at most once
//!   per cycle year
//!
//! Both are pure. Nudges are recomputed on every query and never stored;
//! only the acquainted review history is persisted, by the caller.

pub mod acquainted;
pub mod sunset;
pub mod types;

pub use acquainted::{
    assigned_month, cycle_year, generate_acquainted_nudge_batch, has_been_nudged_this_cycle,
    is_acquainted_nudge_day, record_nudge_action,
};
pub use sunset::generate_sunset_nudges;
pub use types::{
    AcquaintedAction, AcquaintedNudgeBatch, AcquaintedNudgeHistoryEntry, NudgeHistory,
    SuggestedAction, SunsetNudge,
};
