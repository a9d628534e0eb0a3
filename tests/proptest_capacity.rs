//! Property-based tests for tier capacity and nudge scheduling.
//!
//! These tests verify:
//! - The capacity invariant holds after any sequence of ledger operations
//! - Refused operations leave the ledger unchanged
//! - Acquainted review months are stable and in range

use chrono::{TimeZone, Utc};
use dunbar_core::nudge::assigned_month;
use dunbar_core::portability::{plan_merge, MergeStrategy};
use dunbar_core::tier::{FriendDraft, Tier, TierCapacityLedger};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(Tier),
    Move(usize, Tier),
    Remove(usize),
    Reserve(Tier, usize),
    Resize(Tier, usize, usize),
    Release(Tier, usize),
}

fn tier_strategy() -> impl Strategy<Value = Tier> {
    prop::sample::select(Tier::ALL.to_vec())
}

/// Tiers small enough for random sequences to fill.
fn small_tier_strategy() -> impl Strategy<Value = Tier> {
    prop::sample::select(vec![Tier::Core, Tier::Inner, Tier::Naybor])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => small_tier_strategy().prop_map(Op::Add),
        2 => (any::<usize>(), tier_strategy()).prop_map(|(i, t)| Op::Move(i, t)),
        1 => any::<usize>().prop_map(Op::Remove),
        2 => (small_tier_strategy(), 0usize..12).prop_map(|(t, n)| Op::Reserve(t, n)),
        1 => (small_tier_strategy(), any::<usize>(), 0usize..30)
            .prop_map(|(t, i, n)| Op::Resize(t, i, n)),
        1 => (small_tier_strategy(), any::<usize>()).prop_map(|(t, i)| Op::Release(t, i)),
    ]
}

fn apply(ledger: &mut TierCapacityLedger, op: &Op) -> bool {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let pick = |i: usize, len: usize| (len > 0).then(|| i % len);

    match op {
        Op::Add(tier) => ledger
            .add_friend(FriendDraft::new("Friend", *tier), now)
            .is_ok(),
        Op::Move(i, tier) => {
            let Some(index) = pick(*i, ledger.friends().len()) else {
                return false;
            };
            let id = ledger.friends()[index].id.clone();
            ledger.move_friend(&id, *tier).is_ok()
        }
        Op::Remove(i) => {
            let Some(index) = pick(*i, ledger.friends().len()) else {
                return false;
            };
            let id = ledger.friends()[index].id.clone();
            ledger.remove_friend(&id).is_ok()
        }
        Op::Reserve(tier, count) => ledger.add_reserved_group(*tier, *count, None).is_ok(),
        Op::Resize(tier, i, count) => {
            let groups = ledger.reserved_groups(*tier);
            let Some(index) = pick(*i, groups.len()) else {
                return false;
            };
            let id = groups[index].id.clone();
            ledger.update_reserved_group(*tier, &id, *count, None).is_ok()
        }
        Op::Release(tier, i) => {
            let groups = ledger.reserved_groups(*tier);
            let Some(index) = pick(*i, groups.len()) else {
                return false;
            };
            let id = groups[index].id.clone();
            ledger.remove_reserved_group(*tier, &id).is_ok()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: no sequence of operations overfills a tier
    #[test]
    fn capacity_invariant_holds(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut ledger = TierCapacityLedger::new();
        for op in &ops {
            apply(&mut ledger, op);
            prop_assert!(ledger.check_invariant().is_ok(), "violated after {:?}", op);
            for tier in Tier::ALL {
                let cap = ledger.capacity(tier);
                prop_assert_eq!(cap.friend_count + cap.reserved + cap.available, cap.limit);
            }
        }
    }

    /// Property: a refused operation changes nothing
    #[test]
    fn refused_operations_leave_ledger_unchanged(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut ledger = TierCapacityLedger::new();
        for op in &ops {
            let before = ledger.clone();
            if !apply(&mut ledger, op) {
                prop_assert_eq!(&ledger, &before);
            }
        }
    }

    /// Property: merging never overfills a tier, whatever the strategy
    #[test]
    fn merge_respects_capacity(
        ops in prop::collection::vec(op_strategy(), 1..40),
        incoming_tiers in prop::collection::vec(small_tier_strategy(), 0..30),
        strategy in prop::sample::select(vec![
            MergeStrategy::KeepExisting,
            MergeStrategy::Overwrite,
            MergeStrategy::KeepBoth,
        ]),
    ) {
        let mut ledger = TierCapacityLedger::new();
        for op in &ops {
            apply(&mut ledger, op);
        }
        let mut source = TierCapacityLedger::new();
        for tier in incoming_tiers {
            let _ = source.add_friend(FriendDraft::new("Incoming", tier), Utc::now());
        }

        let merged = plan_merge(&ledger, source.friends(), strategy);

        prop_assert!(merged.ledger.check_invariant().is_ok());
        prop_assert_eq!(merged.report.outcomes.len(), source.friends().len());
    }

    /// Property: review month is stable and within the year
    #[test]
    fn assigned_month_is_stable(id in "[a-f0-9]{8,32}") {
        let month = assigned_month(&id);
        prop_assert!(month < 12);
        prop_assert_eq!(month, assigned_month(&id));
    }
}
