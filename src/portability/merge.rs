//! Reconciling imported friends with an existing ledger.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dedup::{FriendIndex, MatchReason};
use crate::id::new_id;
use crate::tier::{Friend, TierCapacityLedger, TierError};

/// How an incoming friend that matches an existing one is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep the existing friend and drop the incoming one.
    #[default]
    KeepExisting,
    /// Replace the existing friend's fields with the incoming ones.
    Overwrite,
    /// Add the incoming friend as a separate record.
    KeepBoth,
}

impl MergeStrategy {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeepExisting => "keep_existing",
            Self::Overwrite => "overwrite",
            Self::KeepBoth => "keep_both",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one incoming friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Inserted as a new friend.
    Added {
        /// Id in the file.
        incoming_id: String,
        /// Id in the ledger; differs when a fresh id was minted.
        friend_id: String,
    },
    /// Matched an existing friend, which was left as is.
    Skipped {
        /// Id in the file.
        incoming_id: String,
        /// The matching existing friend.
        existing_id: String,
        /// Which key matched.
        reason: MatchReason,
    },
    /// Matched an existing friend, whose fields were replaced.
    Overwritten {
        /// Id in the file.
        incoming_id: String,
        /// The updated existing friend.
        existing_id: String,
        /// Which key matched.
        reason: MatchReason,
    },
    /// Refused by the ledger, usually because the tier is full.
    Rejected {
        /// Id in the file.
        incoming_id: String,
        /// Why the ledger refused.
        error: TierError,
    },
}

/// Per-friend outcomes of a merge, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// One outcome per incoming friend.
    pub outcomes: Vec<MergeOutcome>,
}

impl MergeReport {
    fn count(&self, pred: impl Fn(&MergeOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    /// Friends inserted.
    #[must_use]
    pub fn added(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Added { .. }))
    }

    /// Friends skipped as duplicates.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Skipped { .. }))
    }

    /// Existing friends overwritten.
    #[must_use]
    pub fn overwritten(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Overwritten { .. }))
    }

    /// Friends refused by the ledger.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Rejected { .. }))
    }

    /// Whether the merge left the ledger unchanged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, MergeOutcome::Skipped { .. } | MergeOutcome::Rejected { .. }))
    }
}

/// A merged ledger and what happened on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// The ledger after the merge.
    pub ledger: TierCapacityLedger,
    /// Per-friend outcomes.
    pub report: MergeReport,
}

/// Plans the merge of `incoming` into a copy of `existing`.
///
/// The input ledger is never touched; callers swap in
/// [`MergeResult::ledger`] to apply the whole merge at once. Every step goes
/// through the ledger, so a tier filling up mid-merge rejects the remaining
/// friends for that tier instead of exceeding capacity.
///
/// Matching uses phone, then email, then id, and also sees friends added
/// earlier in the same merge. Inserted friends keep their `sort_order`
/// unless they get a fresh id or the order is already used in their tier. Under [`MergeStrategy::KeepExisting`] merging
/// the same file twice is a no-op the second time.
#[must_use]
pub fn plan_merge(
    existing: &TierCapacityLedger,
    incoming: &[Friend],
    strategy: MergeStrategy,
) -> MergeResult {
    let mut ledger = existing.clone();
    let mut index = FriendIndex::new(ledger.friends());
    let mut report = MergeReport::default();

    for friend in incoming {
        let incoming_id = friend.id.clone();
        let matched = index.find(
            Some(&friend.id),
            friend.phone.as_deref(),
            friend.email.as_deref(),
        );

        let outcome = match (matched, strategy) {
            (Some((position, reason)), MergeStrategy::KeepExisting) => MergeOutcome::Skipped {
                incoming_id,
                existing_id: ledger.friends()[position].id.clone(),
                reason,
            },
            (Some((position, reason)), MergeStrategy::Overwrite) => {
                let existing_id = ledger.friends()[position].id.clone();
                match ledger.overwrite_friend(&existing_id, friend) {
                    Ok(_) => MergeOutcome::Overwritten {
                        incoming_id,
                        existing_id,
                        reason,
                    },
                    Err(error) => MergeOutcome::Rejected { incoming_id, error },
                }
            }
            (Some(_), MergeStrategy::KeepBoth) => {
                insert(&mut ledger, &mut index, friend, Some(new_id()))
            }
            (None, _) => insert(&mut ledger, &mut index, friend, None),
        };
        report.outcomes.push(outcome);
    }

    MergeResult { ledger, report }
}

fn insert(
    ledger: &mut TierCapacityLedger,
    index: &mut FriendIndex,
    friend: &Friend,
    fresh_id: Option<String>,
) -> MergeOutcome {
    let mut record = friend.clone();
    if let Some(id) = fresh_id {
        record.id = id;
        record.sort_order = None;
    } else if record
        .sort_order
        .is_some_and(|order| order_taken(ledger, &record, order))
    {
        record.sort_order = None;
    }

    let friend_id = record.id.clone();
    match ledger.insert_friend(record) {
        Ok(()) => {
            let position = ledger.friends().len() - 1;
            index.add(&ledger.friends()[position], position);
            MergeOutcome::Added {
                incoming_id: friend.id.clone(),
                friend_id,
            }
        }
        Err(error) => MergeOutcome::Rejected {
            incoming_id: friend.id.clone(),
            error,
        },
    }
}

fn order_taken(ledger: &TierCapacityLedger, record: &Friend, order: i32) -> bool {
    ledger
        .friends()
        .iter()
        .any(|f| f.tier == record.tier && f.sort_order == Some(order))
}
