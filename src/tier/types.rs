//! Core types for tier membership.
//!
//! Tiers are declared closest-first, so the derived `Ord` doubles as the
//! fidelity order used by visibility and notification rules.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the seven concentric relationship tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Closest people, limit 5.
    Core,
    /// Close friends, limit 15.
    Inner,
    /// Good friends, limit 50.
    Outer,
    /// Neighbors and local community, limit 25.
    Naybor,
    /// One-directional relationships (creators, public figures), limit 25.
    Parasocial,
    /// People followed for inspiration, limit 25.
    Rolemodel,
    /// Everyone else worth remembering, limit 1000.
    Acquainted,
}

impl Tier {
    /// All tiers in fidelity order (closest first).
    pub const ALL: [Self; 7] = [
        Self::Core,
        Self::Inner,
        Self::Outer,
        Self::Naybor,
        Self::Parasocial,
        Self::Rolemodel,
        Self::Acquainted,
    ];

    /// Converts to string representation for storage and export.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Inner => "inner",
            Self::Outer => "outer",
            Self::Naybor => "naybor",
            Self::Parasocial => "parasocial",
            Self::Rolemodel => "rolemodel",
            Self::Acquainted => "acquainted",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "core" => Some(Self::Core),
            "inner" => Some(Self::Inner),
            "outer" => Some(Self::Outer),
            "naybor" => Some(Self::Naybor),
            "parasocial" => Some(Self::Parasocial),
            "rolemodel" => Some(Self::Rolemodel),
            "acquainted" => Some(Self::Acquainted),
            _ => None,
        }
    }

    /// Fixed capacity of the tier.
    #[must_use]
    pub const fn limit(self) -> usize {
        match self {
            Self::Core => 5,
            Self::Inner => 15,
            Self::Outer => 50,
            Self::Naybor | Self::Parasocial | Self::Rolemodel => 25,
            Self::Acquainted => 1000,
        }
    }

    /// Fidelity rank, 0 being the closest tier.
    #[must_use]
    pub const fn fidelity(self) -> u8 {
        self as u8
    }

    /// Whether the tier is one of the intimate circles (core or inner).
    #[must_use]
    pub const fn is_close(self) -> bool {
        matches!(self, Self::Core | Self::Inner)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid tier: {s}"))
    }
}

/// How a friend prefers to be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredContact {
    /// Text or chat message.
    Message,
    /// Phone or video call.
    Call,
    /// Email.
    Email,
    /// Meeting in person.
    InPerson,
}

impl PreferredContact {
    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "message" => Some(Self::Message),
            "call" => Some(Self::Call),
            "email" => Some(Self::Email),
            "in_person" => Some(Self::InPerson),
            _ => None,
        }
    }
}

/// A named member of a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    /// Opaque identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The single tier this friend belongs to.
    pub tier: Tier,
    /// When the friend was added.
    pub added_at: DateTime<Utc>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number, as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Preferred way to reach out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_contact: Option<PreferredContact>,
    /// Manual position within the tier (lower first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    /// Last meaningful contact; drives sunset nudges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deep_contact: Option<DateTime<Utc>>,
}

impl Friend {
    /// Orders friends within a tier.
    ///
    /// Explicit `sort_order` wins; a friend with one sorts before a friend
    /// without; otherwise names are compared case-sensitively.
    #[must_use]
    pub fn display_order(a: &Self, b: &Self) -> Ordering {
        match (a.sort_order, b.sort_order) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    }

    /// The moment contact-decay is measured from.
    #[must_use]
    pub fn last_contact_or_added(&self) -> DateTime<Utc> {
        self.last_deep_contact.unwrap_or(self.added_at)
    }
}

/// Input for creating a friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendDraft {
    /// Display name.
    pub name: String,
    /// Target tier.
    pub tier: Tier,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Preferred way to reach out.
    pub preferred_contact: Option<PreferredContact>,
}

impl FriendDraft {
    /// Creates a draft with just a name and tier.
    #[must_use]
    pub fn new(name: impl Into<String>, tier: Tier) -> Self {
        Self {
            name: name.into(),
            tier,
            email: None,
            phone: None,
            notes: None,
            preferred_contact: None,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the preferred contact channel.
    #[must_use]
    pub const fn with_preferred_contact(mut self, preferred: PreferredContact) -> Self {
        self.preferred_contact = Some(preferred);
        self
    }
}

/// Patch applied to an existing friend. `None` leaves a field untouched.
///
/// Tier changes go through [`TierCapacityLedger::move_friend`] instead.
///
/// [`TierCapacityLedger::move_friend`]: super::TierCapacityLedger::move_friend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// New preferred contact channel.
    pub preferred_contact: Option<PreferredContact>,
    /// New manual position.
    pub sort_order: Option<i32>,
}

impl FriendUpdate {
    /// Applies the patch to a friend in place.
    pub fn apply_to(&self, friend: &mut Friend) {
        if let Some(name) = &self.name {
            friend.name.clone_from(name);
        }
        if self.email.is_some() {
            friend.email.clone_from(&self.email);
        }
        if self.phone.is_some() {
            friend.phone.clone_from(&self.phone);
        }
        if self.notes.is_some() {
            friend.notes.clone_from(&self.notes);
        }
        if self.preferred_contact.is_some() {
            friend.preferred_contact = self.preferred_contact;
        }
        if self.sort_order.is_some() {
            friend.sort_order = self.sort_order;
        }
    }
}

/// Placeholder capacity held in a tier but not yet assigned to a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedGroup {
    /// Opaque identifier.
    pub id: String,
    /// Number of reserved slots.
    pub count: usize,
    /// What the slots are held for (e.g. "college roommates").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Derived capacity view of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCapacitySnapshot {
    /// The tier described.
    pub tier: Tier,
    /// Named friends in the tier.
    pub friend_count: usize,
    /// Sum of reserved group counts.
    pub reserved: usize,
    /// The reserved groups themselves.
    pub reserved_groups: Vec<ReservedGroup>,
    /// The tier's fixed capacity.
    pub limit: usize,
    /// `limit - friend_count - reserved`, floored at zero.
    pub available: usize,
}

impl TierCapacitySnapshot {
    /// Whether no further friend or reservation fits.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.available == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn friend(name: &str, sort_order: Option<i32>) -> Friend {
        Friend {
            id: name.to_lowercase(),
            name: name.to_string(),
            tier: Tier::Inner,
            added_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            email: None,
            phone: None,
            notes: None,
            preferred_contact: None,
            sort_order,
            last_deep_contact: None,
        }
    }

    #[test]
    fn tier_as_str_and_parse() {
        for tier in Tier::ALL {
            assert_eq!(Tier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::parse("bogus"), None);
        assert_eq!(Tier::parse("Core"), None);
    }

    #[test]
    fn tier_limits() {
        assert_eq!(Tier::Core.limit(), 5);
        assert_eq!(Tier::Inner.limit(), 15);
        assert_eq!(Tier::Outer.limit(), 50);
        assert_eq!(Tier::Acquainted.limit(), 1000);
    }

    #[test]
    fn tier_fidelity_follows_declaration_order() {
        assert!(Tier::Core < Tier::Inner);
        assert!(Tier::Outer < Tier::Acquainted);
        assert_eq!(Tier::Core.fidelity(), 0);
        assert_eq!(Tier::Acquainted.fidelity(), 6);
    }

    #[test]
    fn tier_is_close() {
        assert!(Tier::Core.is_close());
        assert!(Tier::Inner.is_close());
        assert!(!Tier::Outer.is_close());
        assert!(!Tier::Acquainted.is_close());
    }

    #[test]
    fn tier_serde_lowercase() {
        let json = serde_json::to_string(&Tier::Rolemodel).unwrap();
        assert_eq!(json, "\"rolemodel\"");
        let tier: Tier = serde_json::from_str("\"naybor\"").unwrap();
        assert_eq!(tier, Tier::Naybor);
    }

    #[test]
    fn tier_from_str_error() {
        let err = "bogus".parse::<Tier>().unwrap_err();
        assert_eq!(err, "Invalid tier: bogus");
    }

    #[test]
    fn display_order_prefers_sort_order() {
        let a = friend("Zed", Some(1));
        let b = friend("Amy", Some(2));
        assert_eq!(Friend::display_order(&a, &b), Ordering::Less);
    }

    #[test]
    fn display_order_sorted_before_unsorted() {
        let a = friend("Zed", Some(9));
        let b = friend("Amy", None);
        assert_eq!(Friend::display_order(&a, &b), Ordering::Less);
        assert_eq!(Friend::display_order(&b, &a), Ordering::Greater);
    }

    #[test]
    fn display_order_falls_back_to_case_sensitive_name() {
        let a = friend("bob", None);
        let b = friend("Bob", None);
        // Uppercase sorts first in a case-sensitive comparison
        assert_eq!(Friend::display_order(&b, &a), Ordering::Less);
    }

    #[test]
    fn friend_serializes_camel_case_and_skips_none() {
        let mut f = friend("Amy", None);
        f.preferred_contact = Some(PreferredContact::InPerson);
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"addedAt\""));
        assert!(json.contains("\"preferredContact\":\"in_person\""));
        assert!(!json.contains("email"));
        assert!(!json.contains("sortOrder"));
    }

    #[test]
    fn friend_update_applies_only_set_fields() {
        let mut f = friend("Amy", None);
        f.email = Some("amy@example.com".to_string());
        let update = FriendUpdate {
            name: Some("Amelia".to_string()),
            sort_order: Some(3),
            ..FriendUpdate::default()
        };
        update.apply_to(&mut f);
        assert_eq!(f.name, "Amelia");
        assert_eq!(f.sort_order, Some(3));
        assert_eq!(f.email.as_deref(), Some("amy@example.com"));
    }

    #[test]
    fn friend_draft_builder() {
        let draft = FriendDraft::new("Amy", Tier::Core)
            .with_email("amy@example.com")
            .with_phone("555-0100")
            .with_notes("met at school")
            .with_preferred_contact(PreferredContact::Call);
        assert_eq!(draft.name, "Amy");
        assert_eq!(draft.tier, Tier::Core);
        assert_eq!(draft.phone.as_deref(), Some("555-0100"));
        assert_eq!(draft.preferred_contact, Some(PreferredContact::Call));
    }

    #[test]
    fn last_contact_falls_back_to_added_at() {
        let mut f = friend("Amy", None);
        assert_eq!(f.last_contact_or_added(), f.added_at);
        let contact = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        f.last_deep_contact = Some(contact);
        assert_eq!(f.last_contact_or_added(), contact);
    }

    #[test]
    fn preferred_contact_parse() {
        assert_eq!(PreferredContact::parse("call"), Some(PreferredContact::Call));
        assert_eq!(
            PreferredContact::parse("in_person"),
            Some(PreferredContact::InPerson)
        );
        assert_eq!(PreferredContact::parse("pigeon"), None);
    }
}
