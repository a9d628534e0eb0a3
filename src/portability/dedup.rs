//! Contact matching shared by file imports and contact imports.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tier::Friend;

/// Minimum digit count for a phone number to be used as a match key.
const MIN_PHONE_DIGITS: usize = 7;

/// A pre-normalized contact from an external contact source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTuple {
    /// Display name.
    pub name: String,
    /// Phone number, as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ContactTuple {
    /// Creates a contact with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
            email: None,
        }
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Why two records were considered the same person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// Same normalized phone number.
    Phone,
    /// Same email, ignoring case.
    Email,
    /// Same record id, with no phone or email match.
    Id,
}

/// Reduces a phone number to its digits.
///
/// Returns `None` when fewer than 7 digits remain, so short or junk
/// values never match anything.
///
/// ```
/// use dunbar_core::portability::normalize_phone;
///
/// assert_eq!(normalize_phone("+1 555-123-4567").as_deref(), Some("15551234567"));
/// assert_eq!(normalize_phone("911"), None);
/// ```
#[must_use]
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= MIN_PHONE_DIGITS).then_some(digits)
}

/// Trims and lowercases an email. Blank input yields `None`.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Lookup of existing friends by id, phone and email.
///
/// When several friends share a key, the first one indexed wins.
#[derive(Debug, Default)]
pub struct FriendIndex {
    by_id: HashMap<String, usize>,
    by_phone: HashMap<String, usize>,
    by_email: HashMap<String, usize>,
}

impl FriendIndex {
    /// Indexes friends by their position in `friends`.
    #[must_use]
    pub fn new(friends: &[Friend]) -> Self {
        let mut index = Self::default();
        for (position, friend) in friends.iter().enumerate() {
            index.add(friend, position);
        }
        index
    }

    /// Adds one friend at `position`.
    pub fn add(&mut self, friend: &Friend, position: usize) {
        self.add_keys(Some(&friend.id), friend.phone.as_deref(), friend.email.as_deref(), position);
    }

    fn add_keys(&mut self, id: Option<&str>, phone: Option<&str>, email: Option<&str>, position: usize) {
        if let Some(id) = id {
            self.by_id.entry(id.to_string()).or_insert(position);
        }
        if let Some(phone) = phone.and_then(normalize_phone) {
            self.by_phone.entry(phone).or_insert(position);
        }
        if let Some(email) = email.and_then(normalize_email) {
            self.by_email.entry(email).or_insert(position);
        }
    }

    /// Finds the first matching position: phone, then email, then id.
    ///
    /// The id is only a fallback for records without contact keys, such as
    /// friends from a private export.
    #[must_use]
    pub fn find(
        &self,
        id: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Option<(usize, MatchReason)> {
        if let Some(position) = phone
            .and_then(normalize_phone)
            .and_then(|p| self.by_phone.get(&p))
        {
            return Some((*position, MatchReason::Phone));
        }
        if let Some(position) = email
            .and_then(normalize_email)
            .and_then(|e| self.by_email.get(&e))
        {
            return Some((*position, MatchReason::Email));
        }
        id.and_then(|id| self.by_id.get(id))
            .map(|position| (*position, MatchReason::Id))
    }

    /// Finds a friend matching a contact tuple (phone, then email).
    #[must_use]
    pub fn find_contact(&self, contact: &ContactTuple) -> Option<(usize, MatchReason)> {
        self.find(None, contact.phone.as_deref(), contact.email.as_deref())
    }
}

/// A contact that duplicates an earlier one in the same batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateContact {
    /// The repeated contact.
    pub contact: ContactTuple,
    /// Index into [`ContactDedupReport::unique`] of the contact it repeats.
    pub duplicate_of: usize,
    /// Which key matched.
    pub reason: MatchReason,
}

/// Outcome of deduplicating a batch of contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDedupReport {
    /// First occurrence of each person, in input order.
    pub unique: Vec<ContactTuple>,
    /// Later occurrences.
    pub duplicates: Vec<DuplicateContact>,
}

/// Splits a contact batch into unique contacts and duplicates.
#[must_use]
pub fn find_duplicate_contacts(contacts: &[ContactTuple]) -> ContactDedupReport {
    let mut index = FriendIndex::default();
    let mut report = ContactDedupReport::default();

    for contact in contacts {
        if let Some((duplicate_of, reason)) = index.find_contact(contact) {
            report.duplicates.push(DuplicateContact {
                contact: contact.clone(),
                duplicate_of,
                reason,
            });
            continue;
        }
        index.add_keys(
            None,
            contact.phone.as_deref(),
            contact.email.as_deref(),
            report.unique.len(),
        );
        report.unique.push(contact.clone());
    }
    report
}
