//! Capacity-enforcing owner of friends and reserved groups.
//!
//! All checks run before any mutation, so a refused operation leaves the
//! ledger exactly as it was.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Result, TierError};
use super::types::{
    Friend, FriendDraft, FriendUpdate, ReservedGroup, Tier, TierCapacitySnapshot,
};
use crate::id::new_id;

/// Friends and reserved groups, with per-tier capacity enforcement.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use dunbar_core::tier::{FriendDraft, Tier, TierCapacityLedger};
///
/// let mut ledger = TierCapacityLedger::new();
/// let friend = ledger
///     .add_friend(FriendDraft::new("Ada", Tier::Core), Utc::now())
///     .unwrap();
/// assert_eq!(ledger.capacity(Tier::Core).available, 4);
/// assert_eq!(friend.tier, Tier::Core);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCapacityLedger {
    #[serde(default)]
    friends: Vec<Friend>,
    #[serde(default)]
    reserved_groups: BTreeMap<Tier, Vec<ReservedGroup>>,
}

impl TierCapacityLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All friends, in insertion order.
    #[must_use]
    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    /// Looks up a friend by id.
    #[must_use]
    pub fn friend(&self, id: &str) -> Option<&Friend> {
        self.friends.iter().find(|f| f.id == id)
    }

    /// Reserved groups held in a tier.
    #[must_use]
    pub fn reserved_groups(&self, tier: Tier) -> &[ReservedGroup] {
        self.reserved_groups.get(&tier).map_or(&[], Vec::as_slice)
    }

    /// Reserved groups of every tier.
    #[must_use]
    pub const fn all_reserved_groups(&self) -> &BTreeMap<Tier, Vec<ReservedGroup>> {
        &self.reserved_groups
    }

    /// Friends of one tier in display order.
    #[must_use]
    pub fn friends_in_tier(&self, tier: Tier) -> Vec<&Friend> {
        let mut friends: Vec<&Friend> = self.friends.iter().filter(|f| f.tier == tier).collect();
        friends.sort_by(|a, b| Friend::display_order(a, b));
        friends
    }

    fn friend_count(&self, tier: Tier) -> usize {
        self.friends.iter().filter(|f| f.tier == tier).count()
    }

    fn reserved_total(&self, tier: Tier) -> usize {
        self.reserved_groups(tier).iter().map(|g| g.count).sum()
    }

    fn available(&self, tier: Tier) -> usize {
        tier.limit()
            .saturating_sub(self.friend_count(tier))
            .saturating_sub(self.reserved_total(tier))
    }

    /// Computes the capacity view of a tier.
    #[must_use]
    pub fn capacity(&self, tier: Tier) -> TierCapacitySnapshot {
        TierCapacitySnapshot {
            tier,
            friend_count: self.friend_count(tier),
            reserved: self.reserved_total(tier),
            reserved_groups: self.reserved_groups(tier).to_vec(),
            limit: tier.limit(),
            available: self.available(tier),
        }
    }

    /// Capacity views of every tier, closest first.
    #[must_use]
    pub fn capacities(&self) -> Vec<TierCapacitySnapshot> {
        Tier::ALL.iter().map(|&tier| self.capacity(tier)).collect()
    }

    fn ensure_room(&self, tier: Tier) -> Result<()> {
        if self.available(tier) == 0 {
            return Err(TierError::CapacityExceeded {
                tier,
                limit: tier.limit(),
            });
        }
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.friends
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| TierError::FriendNotFound(id.to_string()))
    }

    // ==================== Friend Operations ====================

    /// Creates a friend from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] if the tier is full, or
    /// [`TierError::InvalidData`] if the name is blank.
    pub fn add_friend(&mut self, draft: FriendDraft, now: DateTime<Utc>) -> Result<Friend> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(TierError::InvalidData("Friend name is empty".to_string()));
        }
        self.ensure_room(draft.tier)?;

        let friend = Friend {
            id: new_id(),
            name: name.to_string(),
            tier: draft.tier,
            added_at: now,
            email: draft.email,
            phone: draft.phone,
            notes: draft.notes,
            preferred_contact: draft.preferred_contact,
            sort_order: None,
            last_deep_contact: None,
        };
        self.friends.push(friend.clone());
        Ok(friend)
    }

    /// Inserts a fully-formed friend, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] if the friend's tier is full,
    /// or [`TierError::InvalidData`] if the id is already taken.
    pub fn insert_friend(&mut self, friend: Friend) -> Result<()> {
        if self.friend(&friend.id).is_some() {
            return Err(TierError::InvalidData(format!(
                "Friend id already exists: {}",
                friend.id
            )));
        }
        self.ensure_room(friend.tier)?;
        self.friends.push(friend);
        Ok(())
    }

    /// Moves a friend to another tier.
    ///
    /// Moving to the friend's current tier succeeds without a capacity check.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] if the destination is full;
    /// the friend keeps its original tier.
    pub fn move_friend(&mut self, id: &str, new_tier: Tier) -> Result<Friend> {
        let index = self.position(id)?;
        if self.friends[index].tier == new_tier {
            return Ok(self.friends[index].clone());
        }
        self.ensure_room(new_tier)?;

        let friend = &mut self.friends[index];
        friend.tier = new_tier;
        friend.sort_order = None;
        Ok(friend.clone())
    }

    /// Applies a field patch to a friend.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`] or, for a blank name,
    /// [`TierError::InvalidData`].
    pub fn update_friend(&mut self, id: &str, update: &FriendUpdate) -> Result<Friend> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(TierError::InvalidData("Friend name is empty".to_string()));
        }
        let index = self.position(id)?;
        let friend = &mut self.friends[index];
        update.apply_to(friend);
        Ok(friend.clone())
    }

    /// Replaces the mutable fields of an existing friend with those of
    /// `source`, keeping the existing id and `added_at`.
    ///
    /// A tier change is capacity-checked like [`move_friend`](Self::move_friend).
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`] or [`TierError::CapacityExceeded`];
    /// on error nothing is changed.
    pub fn overwrite_friend(&mut self, id: &str, source: &Friend) -> Result<Friend> {
        let index = self.position(id)?;
        let tier_changes = self.friends[index].tier != source.tier;
        if tier_changes {
            self.ensure_room(source.tier)?;
        }

        let friend = &mut self.friends[index];
        friend.name.clone_from(&source.name);
        friend.email.clone_from(&source.email);
        friend.phone.clone_from(&source.phone);
        friend.notes.clone_from(&source.notes);
        friend.preferred_contact = source.preferred_contact;
        friend.last_deep_contact = source.last_deep_contact.or(friend.last_deep_contact);
        if tier_changes {
            friend.tier = source.tier;
            friend.sort_order = None;
        }
        Ok(friend.clone())
    }

    /// Records a meaningful contact with a friend.
    ///
    /// Older timestamps than the one already recorded are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`].
    pub fn record_deep_contact(&mut self, id: &str, at: DateTime<Utc>) -> Result<Friend> {
        let index = self.position(id)?;
        let friend = &mut self.friends[index];
        if friend.last_deep_contact.map_or(true, |prev| at > prev) {
            friend.last_deep_contact = Some(at);
        }
        Ok(friend.clone())
    }

    /// Removes a friend, freeing its slot.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`].
    pub fn remove_friend(&mut self, id: &str) -> Result<Friend> {
        let index = self.position(id)?;
        Ok(self.friends.remove(index))
    }

    /// Assigns `sort_order` to the given friends by their position in `ids`.
    ///
    /// Friends of the tier not listed keep their current order.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::FriendNotFound`] for an unknown id and
    /// [`TierError::InvalidData`] for a friend of another tier. Nothing is
    /// changed on error.
    pub fn reorder_tier(&mut self, tier: Tier, ids: &[String]) -> Result<()> {
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids {
            let index = self.position(id)?;
            if self.friends[index].tier != tier {
                return Err(TierError::InvalidData(format!(
                    "Friend {id} is not in tier {tier}"
                )));
            }
            indices.push(index);
        }
        for (order, index) in indices.into_iter().enumerate() {
            self.friends[index].sort_order = Some(i32::try_from(order).unwrap_or(i32::MAX));
        }
        Ok(())
    }

    // ==================== Reserved Group Operations ====================

    /// Reserves placeholder capacity in a tier.
    ///
    /// The requested count is clamped to `[1, available]` rather than
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] only when the tier has no room
    /// at all.
    pub fn add_reserved_group(
        &mut self,
        tier: Tier,
        count: usize,
        note: Option<String>,
    ) -> Result<ReservedGroup> {
        self.ensure_room(tier)?;
        let group = ReservedGroup {
            id: new_id(),
            count: count.clamp(1, self.available(tier)),
            note,
        };
        self.reserved_groups
            .entry(tier)
            .or_default()
            .push(group.clone());
        Ok(group)
    }

    /// Changes a reserved group's count and note.
    ///
    /// The count is clamped to `[0, available + current count]`. A `None`
    /// note keeps the existing note.
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
        let available = self.available(tier);
        let group = self
            .reserved_groups
            .get_mut(&tier)
            .and_then(|groups| groups.iter_mut().find(|g| g.id == group_id))
            .ok_or_else(|| TierError::ReservedGroupNotFound(group_id.to_string()))?;

        group.count = count.min(available + group.count);
        if note.is_some() {
            group.note = note;
        }
        Ok(group.clone())
    }

    /// Releases a reserved group.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::ReservedGroupNotFound`].
    pub fn remove_reserved_group(&mut self, tier: Tier, group_id: &str) -> Result<ReservedGroup> {
        let groups = self
            .reserved_groups
            .get_mut(&tier)
            .ok_or_else(|| TierError::ReservedGroupNotFound(group_id.to_string()))?;
        let index = groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or_else(|| TierError::ReservedGroupNotFound(group_id.to_string()))?;
        let group = groups.remove(index);
        if groups.is_empty() {
            self.reserved_groups.remove(&tier);
        }
        Ok(group)
    }

    /// Verifies the capacity invariant for every tier.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::CapacityExceeded`] for the first over-full tier.
    pub fn check_invariant(&self) -> Result<()> {
        for tier in Tier::ALL {
            if self.friend_count(tier) + self.reserved_total(tier) > tier.limit() {
                return Err(TierError::CapacityExceeded {
                    tier,
                    limit: tier.limit(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn fill(ledger: &mut TierCapacityLedger, tier: Tier, n: usize) -> Vec<Friend> {
        (0..n)
            .map(|i| {
                ledger
                    .add_friend(FriendDraft::new(format!("Friend {i}"), tier), now())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = TierCapacityLedger::new();
        assert!(ledger.friends().is_empty());
        let cap = ledger.capacity(Tier::Core);
        assert_eq!(cap.friend_count, 0);
        assert_eq!(cap.reserved, 0);
        assert_eq!(cap.limit, 5);
        assert_eq!(cap.available, 5);
    }

    #[test]
    fn add_friend_assigns_id_and_timestamp() {
        let mut ledger = TierCapacityLedger::new();
        let friend = ledger
            .add_friend(FriendDraft::new("  Ada  ", Tier::Inner), now())
            .unwrap();
        assert_eq!(friend.name, "Ada");
        assert_eq!(friend.added_at, now());
        assert_eq!(friend.id.len(), 32);
        assert_eq!(ledger.friend(&friend.id), Some(&friend));
    }

    #[test]
    fn add_friend_rejects_blank_name() {
        let mut ledger = TierCapacityLedger::new();
        let err = ledger
            .add_friend(FriendDraft::new("   ", Tier::Inner), now())
            .unwrap_err();
        assert!(matches!(err, TierError::InvalidData(_)));
        assert!(ledger.friends().is_empty());
    }

    #[test]
    fn sixth_core_friend_is_refused() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Core, 5);
        let before = ledger.clone();

        let err = ledger
            .add_friend(FriendDraft::new("Sixth", Tier::Core), now())
            .unwrap_err();

        assert_eq!(
            err,
            TierError::CapacityExceeded {
                tier: Tier::Core,
                limit: 5
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn reserved_slots_count_against_friend_capacity() {
        let mut ledger = TierCapacityLedger::new();
        ledger.add_reserved_group(Tier::Core, 3, None).unwrap();
        fill(&mut ledger, Tier::Core, 2);
        assert!(ledger
            .add_friend(FriendDraft::new("Third", Tier::Core), now())
            .is_err());
    }

    #[test]
    fn move_friend_to_full_tier_keeps_original_tier() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Core, 5);
        let outer = ledger
            .add_friend(FriendDraft::new("Otto", Tier::Outer), now())
            .unwrap();

        let err = ledger.move_friend(&outer.id, Tier::Core).unwrap_err();

        assert!(matches!(err, TierError::CapacityExceeded { .. }));
        assert_eq!(ledger.friend(&outer.id).unwrap().tier, Tier::Outer);
    }

    #[test]
    fn move_friend_updates_tier_and_clears_sort_order() {
        let mut ledger = TierCapacityLedger::new();
        let f = ledger
            .add_friend(FriendDraft::new("Otto", Tier::Outer), now())
            .unwrap();
        ledger.reorder_tier(Tier::Outer, &[f.id.clone()]).unwrap();

        let moved = ledger.move_friend(&f.id, Tier::Inner).unwrap();

        assert_eq!(moved.tier, Tier::Inner);
        assert_eq!(moved.sort_order, None);
        assert_eq!(ledger.capacity(Tier::Outer).friend_count, 0);
        assert_eq!(ledger.capacity(Tier::Inner).friend_count, 1);
    }

    #[test]
    fn move_friend_to_same_full_tier_is_noop() {
        let mut ledger = TierCapacityLedger::new();
        let friends = fill(&mut ledger, Tier::Core, 5);
        let moved = ledger.move_friend(&friends[0].id, Tier::Core).unwrap();
        assert_eq!(moved.tier, Tier::Core);
    }

    #[test]
    fn move_unknown_friend_fails() {
        let mut ledger = TierCapacityLedger::new();
        let err = ledger.move_friend("missing", Tier::Core).unwrap_err();
        assert_eq!(err, TierError::FriendNotFound("missing".to_string()));
    }

    #[test]
    fn add_reserved_group_clamps_to_available() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Core, 2);

        let group = ledger
            .add_reserved_group(Tier::Core, 10, Some("cousins".to_string()))
            .unwrap();

        assert_eq!(group.count, 3);
        assert_eq!(ledger.capacity(Tier::Core).available, 0);
    }

    #[test]
    fn add_reserved_group_clamps_zero_up_to_one() {
        let mut ledger = TierCapacityLedger::new();
        let group = ledger.add_reserved_group(Tier::Inner, 0, None).unwrap();
        assert_eq!(group.count, 1);
    }

    #[test]
    fn add_reserved_group_to_full_tier_is_refused() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Core, 5);
        let err = ledger.add_reserved_group(Tier::Core, 1, None).unwrap_err();
        assert!(matches!(err, TierError::CapacityExceeded { .. }));
        assert!(ledger.reserved_groups(Tier::Core).is_empty());
    }

    #[test]
    fn update_reserved_group_clamps_to_own_plus_available() {
        let mut ledger = TierCapacityLedger::new();
        let group = ledger.add_reserved_group(Tier::Core, 2, None).unwrap();
        fill(&mut ledger, Tier::Core, 1);

        // available = 5 - 1 - 2 = 2, own = 2, so max is 4
        let updated = ledger
            .update_reserved_group(Tier::Core, &group.id, 50, None)
            .unwrap();
        assert_eq!(updated.count, 4);

        let shrunk = ledger
            .update_reserved_group(Tier::Core, &group.id, 0, Some("later".to_string()))
            .unwrap();
        assert_eq!(shrunk.count, 0);
        assert_eq!(shrunk.note.as_deref(), Some("later"));
    }

    #[test]
    fn update_reserved_group_keeps_note_when_none() {
        let mut ledger = TierCapacityLedger::new();
        let group = ledger
            .add_reserved_group(Tier::Outer, 4, Some("team".to_string()))
            .unwrap();
        let updated = ledger
            .update_reserved_group(Tier::Outer, &group.id, 2, None)
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("team"));
    }

    #[test]
    fn update_reserved_group_wrong_tier_fails() {
        let mut ledger = TierCapacityLedger::new();
        let group = ledger.add_reserved_group(Tier::Outer, 4, None).unwrap();
        let err = ledger
            .update_reserved_group(Tier::Inner, &group.id, 2, None)
            .unwrap_err();
        assert!(matches!(err, TierError::ReservedGroupNotFound(_)));
    }

    #[test]
    fn remove_reserved_group_frees_capacity() {
        let mut ledger = TierCapacityLedger::new();
        let group = ledger.add_reserved_group(Tier::Core, 5, None).unwrap();
        assert_eq!(ledger.capacity(Tier::Core).available, 0);

        ledger.remove_reserved_group(Tier::Core, &group.id).unwrap();

        assert_eq!(ledger.capacity(Tier::Core).available, 5);
        assert!(ledger
            .remove_reserved_group(Tier::Core, &group.id)
            .is_err());
    }

    #[test]
    fn friends_in_tier_sorted() {
        let mut ledger = TierCapacityLedger::new();
        let carol = ledger
            .add_friend(FriendDraft::new("Carol", Tier::Inner), now())
            .unwrap();
        ledger
            .add_friend(FriendDraft::new("Bob", Tier::Inner), now())
            .unwrap();
        ledger
            .add_friend(FriendDraft::new("Alice", Tier::Inner), now())
            .unwrap();
        ledger
            .add_friend(FriendDraft::new("Zed", Tier::Outer), now())
            .unwrap();
        ledger.reorder_tier(Tier::Inner, &[carol.id]).unwrap();

        let names: Vec<&str> = ledger
            .friends_in_tier(Tier::Inner)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["Carol", "Alice", "Bob"]);
    }

    #[test]
    fn reorder_rejects_friend_from_other_tier() {
        let mut ledger = TierCapacityLedger::new();
        let a = ledger
            .add_friend(FriendDraft::new("A", Tier::Inner), now())
            .unwrap();
        let b = ledger
            .add_friend(FriendDraft::new("B", Tier::Outer), now())
            .unwrap();
        let before = ledger.clone();

        let err = ledger.reorder_tier(Tier::Inner, &[a.id, b.id]).unwrap_err();

        assert!(matches!(err, TierError::InvalidData(_)));
        assert_eq!(ledger, before);
    }

    #[test]
    fn record_deep_contact_only_moves_forward() {
        let mut ledger = TierCapacityLedger::new();
        let f = ledger
            .add_friend(FriendDraft::new("A", Tier::Core), now())
            .unwrap();
        let later = now() + chrono::Duration::days(3);
        ledger.record_deep_contact(&f.id, later).unwrap();
        let updated = ledger.record_deep_contact(&f.id, now()).unwrap();
        assert_eq!(updated.last_deep_contact, Some(later));
    }

    #[test]
    fn overwrite_friend_keeps_identity() {
        let mut ledger = TierCapacityLedger::new();
        let existing = ledger
            .add_friend(
                FriendDraft::new("Old Name", Tier::Outer).with_email("a@example.com"),
                now(),
            )
            .unwrap();
        let mut source = existing.clone();
        source.id = "other-id".to_string();
        source.name = "New Name".to_string();
        source.email = None;
        source.tier = Tier::Inner;
        source.added_at = now() + chrono::Duration::days(10);

        let merged = ledger.overwrite_friend(&existing.id, &source).unwrap();

        assert_eq!(merged.id, existing.id);
        assert_eq!(merged.added_at, existing.added_at);
        assert_eq!(merged.name, "New Name");
        assert_eq!(merged.email, None);
        assert_eq!(merged.tier, Tier::Inner);
    }

    #[test]
    fn overwrite_friend_into_full_tier_changes_nothing() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Core, 5);
        let existing = ledger
            .add_friend(FriendDraft::new("Old", Tier::Outer), now())
            .unwrap();
        let mut source = existing.clone();
        source.name = "New".to_string();
        source.tier = Tier::Core;
        let before = ledger.clone();

        assert!(ledger.overwrite_friend(&existing.id, &source).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn insert_friend_rejects_duplicate_id() {
        let mut ledger = TierCapacityLedger::new();
        let f = ledger
            .add_friend(FriendDraft::new("A", Tier::Core), now())
            .unwrap();
        let err = ledger.insert_friend(f).unwrap_err();
        assert!(matches!(err, TierError::InvalidData(_)));
    }

    #[test]
    fn remove_friend_frees_slot() {
        let mut ledger = TierCapacityLedger::new();
        let friends = fill(&mut ledger, Tier::Core, 5);
        ledger.remove_friend(&friends[0].id).unwrap();
        assert!(ledger
            .add_friend(FriendDraft::new("New", Tier::Core), now())
            .is_ok());
    }

    #[test]
    fn invariant_holds_after_mixed_operations() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Inner, 10);
        ledger.add_reserved_group(Tier::Inner, 20, None).unwrap();
        let _ = ledger.add_friend(FriendDraft::new("Late", Tier::Inner), now());
        ledger.check_invariant().unwrap();
        assert_eq!(ledger.capacity(Tier::Inner).available, 0);
    }

    #[test]
    fn capacities_cover_all_tiers() {
        let ledger = TierCapacityLedger::new();
        let caps = ledger.capacities();
        assert_eq!(caps.len(), 7);
        assert_eq!(caps[0].tier, Tier::Core);
        assert_eq!(caps[6].limit, 1000);
    }

    #[test]
    fn ledger_serde_roundtrip() {
        let mut ledger = TierCapacityLedger::new();
        fill(&mut ledger, Tier::Core, 2);
        ledger.add_reserved_group(Tier::Outer, 3, None).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("\"reservedGroups\":{\"outer\""));
        let back: TierCapacityLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
