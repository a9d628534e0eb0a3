//! Decay-based reconnect reminders for the named tiers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::types::{SuggestedAction, SunsetNudge};
use crate::config::SunsetConfig;
use crate::tier::Friend;

const NUDGE_ID_PREFIX: &str = "sunset-";

/// Derives the nudge id for a friend's current contact timing.
pub(crate) fn nudge_id(friend: &Friend) -> String {
    format!(
        "{NUDGE_ID_PREFIX}{}-{}",
        friend.id,
        friend.last_contact_or_added().timestamp()
    )
}

/// Whether `nudge_id` was derived for `friend_id`, at any contact time.
pub(crate) fn is_nudge_for(nudge_id: &str, friend_id: &str) -> bool {
    nudge_id
        .strip_prefix(NUDGE_ID_PREFIX)
        .and_then(|rest| rest.strip_prefix(friend_id))
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|timestamp| timestamp.parse::<i64>().is_ok())
}

/// Computes the sunset nudges due at `now`.
///
/// A friend is nudged once whole days since the last deep contact (or since
/// being added) exceed the tier threshold. Tiers without a threshold, and
/// the acquainted tier, never produce nudges. Nudges whose id is in
/// `dismissed` are returned with `dismissed` set.
///
/// Results are ordered closest tier first, then most overdue first.
#[must_use]
pub fn generate_sunset_nudges(
    friends: &[Friend],
    dismissed: &HashSet<String>,
    now: DateTime<Utc>,
    config: &SunsetConfig,
) -> Vec<SunsetNudge> {
    let mut nudges: Vec<SunsetNudge> = friends
        .iter()
        .filter_map(|friend| {
            let threshold = config.threshold_for(friend.tier)?;
            let days_since_contact = (now - friend.last_contact_or_added()).num_days();
            if days_since_contact <= threshold {
                return None;
            }

            let suggested_action =
                if days_since_contact > threshold.saturating_mul(config.escalation_factor) {
                    SuggestedAction::ScheduleCall
                } else {
                    SuggestedAction::SendMessage
                };
            let id = nudge_id(friend);

            Some(SunsetNudge {
                dismissed: dismissed.contains(&id),
                id,
                friend_id: friend.id.clone(),
                friend_tier: friend.tier,
                last_deep_contact: friend.last_deep_contact,
                days_since_contact,
                suggested_action,
            })
        })
        .collect();

    nudges.sort_by(|a, b| {
        a.friend_tier
            .cmp(&b.friend_tier)
            .then_with(|| b.days_since_contact.cmp(&a.days_since_contact))
    });
    nudges
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::tier::Tier;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 30, 18, 0, 0).unwrap()
    }

    fn friend(id: &str, tier: Tier, contact_days_ago: Option<i64>) -> Friend {
        Friend {
            id: id.to_string(),
            name: id.to_string(),
            tier,
            added_at: now() - Duration::days(365),
            email: None,
            phone: None,
            notes: None,
            preferred_contact: None,
            sort_order: None,
            last_deep_contact: contact_days_ago.map(|d| now() - Duration::days(d)),
        }
    }

    fn generate(friends: &[Friend]) -> Vec<SunsetNudge> {
        generate_sunset_nudges(friends, &HashSet::new(), now(), &SunsetConfig::default())
    }

    #[test]
    fn core_friend_ten_days_out_gets_one_nudge() {
        let nudges = generate(&[friend("f1", Tier::Core, Some(10))]);
        assert_eq!(nudges.len(), 1);
        assert_eq!(nudges[0].days_since_contact, 10);
        assert_eq!(nudges[0].friend_id, "f1");
        assert_eq!(nudges[0].suggested_action, SuggestedAction::SendMessage);
        assert!(!nudges[0].dismissed);
    }

    #[test]
    fn nudge_ids_are_matched_per_friend() {
        let ada = friend("ada", Tier::Core, Some(10));
        let id = nudge_id(&ada);
        assert!(is_nudge_for(&id, "ada"));
        assert!(is_nudge_for("sunset-ada-1700000000", "ada"));
        assert!(!is_nudge_for("sunset-ada-b-1700000000", "ada"));
        assert!(!is_nudge_for(&id, "ad"));
        assert!(!is_nudge_for("sunset-ada-", "ada"));
    }

    #[test]
    fn exactly_at_threshold_is_not_nudged() {
        assert!(generate(&[friend("f1", Tier::Core, Some(7))]).is_empty());
        assert_eq!(generate(&[friend("f1", Tier::Core, Some(8))]).len(), 1);
    }

    #[test]
    fn escalates_past_twice_the_threshold() {
        let nudges = generate(&[
            friend("at-double", Tier::Inner, Some(28)),
            friend("past-double", Tier::Inner, Some(29)),
        ]);
        let action = |id: &str| {
            nudges
                .iter()
                .find(|n| n.friend_id == id)
                .unwrap()
                .suggested_action
        };
        assert_eq!(action("at-double"), SuggestedAction::SendMessage);
        assert_eq!(action("past-double"), SuggestedAction::ScheduleCall);
    }

    #[test]
    fn falls_back_to_added_at() {
        let nudges = generate(&[friend("f1", Tier::Outer, None)]);
        assert_eq!(nudges.len(), 1);
        assert_eq!(nudges[0].days_since_contact, 365);
        assert_eq!(nudges[0].last_deep_contact, None);
    }

    #[test]
    fn acquainted_and_unthresholded_tiers_never_nudge() {
        let nudges = generate(&[
            friend("a", Tier::Acquainted, None),
            friend("n", Tier::Naybor, None),
            friend("p", Tier::Parasocial, None),
            friend("r", Tier::Rolemodel, None),
        ]);
        assert!(nudges.is_empty());
    }

    #[test]
    fn dismissed_flag_follows_id_set() {
        let f = friend("f1", Tier::Core, Some(10));
        let first = generate(std::slice::from_ref(&f));
        let dismissed: HashSet<String> = [first[0].id.clone()].into_iter().collect();

        let again = generate_sunset_nudges(
            std::slice::from_ref(&f),
            &dismissed,
            now(),
            &SunsetConfig::default(),
        );
        assert!(again[0].dismissed);
    }

    #[test]
    fn dismissal_resurfaces_after_contact_changes() {
        let f = friend("f1", Tier::Core, Some(20));
        let first = generate(std::slice::from_ref(&f));
        let dismissed: HashSet<String> = [first[0].id.clone()].into_iter().collect();

        // Contact happened, then lapsed again
        let later = friend("f1", Tier::Core, Some(9));
        let again = generate_sunset_nudges(&[later], &dismissed, now(), &SunsetConfig::default());
        assert_eq!(again.len(), 1);
        assert!(!again[0].dismissed);
        assert_ne!(again[0].id, first[0].id);
    }

    #[test]
    fn ordered_by_tier_then_overdue() {
        let nudges = generate(&[
            friend("outer", Tier::Outer, Some(100)),
            friend("core-a", Tier::Core, Some(9)),
            friend("core-b", Tier::Core, Some(30)),
        ]);
        let ids: Vec<&str> = nudges.iter().map(|n| n.friend_id.as_str()).collect();
        assert_eq!(ids, ["core-b", "core-a", "outer"]);
    }

    #[test]
    fn custom_thresholds_apply() {
        let config = crate::EngineConfig::default()
            .with_sunset_threshold(Tier::Naybor, 30)
            .sunset;
        let nudges = generate_sunset_nudges(
            &[friend("n", Tier::Naybor, Some(31))],
            &HashSet::new(),
            now(),
            &config,
        );
        assert_eq!(nudges.len(), 1);
    }
}
