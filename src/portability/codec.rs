//! Export building, serialization and validated import.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{ExportError, ImportError, ImportWarning};
use super::types::{
    ExportExtras, ExportFile, ExportOptions, ExportSettings, ExportableSocialGraph, ImportResult,
};
use crate::id::opaque_digest;
use crate::tier::{Friend, PreferredContact, Tier};
use crate::visibility::{FeedPost, Interaction, NotificationSettings, PrivacySettings};

/// Version written by this build.
pub const EXPORT_VERSION: &str = "1.0";

/// Major version this build can read.
const SUPPORTED_MAJOR: u64 = 1;

/// Hex characters of the hashed user id used in export filenames.
const OPAQUE_ID_LEN: usize = 16;

/// Applies export include-flags to friends.
#[must_use]
pub fn redact_friends(friends: &[Friend], options: ExportOptions) -> Vec<Friend> {
    friends
        .iter()
        .cloned()
        .map(|mut friend| {
            if !options.include_contact_info {
                friend.email = None;
                friend.phone = None;
                friend.preferred_contact = None;
            }
            if !options.include_notes {
                friend.notes = None;
            }
            friend
        })
        .collect()
}

/// Builds an export document for `user_id`.
///
/// Only posts authored by the user are included, plus the user's own
/// interactions on other people's posts. Friends are taken as given; apply
/// [`redact_friends`] first.
#[must_use]
pub fn export_social_graph(
    user_id: &str,
    friends: &[Friend],
    posts: &[FeedPost],
    privacy: Option<&PrivacySettings>,
    notifications: Option<&NotificationSettings>,
    extras: Option<ExportExtras>,
    now: DateTime<Utc>,
) -> ExportableSocialGraph {
    let own_posts: Vec<FeedPost> = posts
        .iter()
        .filter(|p| p.author_id == user_id)
        .cloned()
        .collect();

    let own_interactions: Vec<Interaction> = posts
        .iter()
        .filter(|p| p.author_id != user_id)
        .flat_map(|p| p.interactions.iter())
        .filter(|i| i.user_id == user_id)
        .cloned()
        .collect();

    let settings = (privacy.is_some() || notifications.is_some()).then(|| ExportSettings {
        privacy: privacy.cloned(),
        notifications: notifications.cloned(),
    });

    ExportableSocialGraph {
        version: EXPORT_VERSION.to_string(),
        exported_at: now,
        friends: friends.to_vec(),
        posts: own_posts,
        interactions: own_interactions,
        settings,
        extras,
    }
}

/// Export filename for a user and date. Carries no cleartext identity.
#[must_use]
pub fn export_filename(user_id: &str, exported_at: DateTime<Utc>) -> String {
    format!(
        "{}-export-{}.json",
        opaque_digest(user_id, OPAQUE_ID_LEN),
        exported_at.format("%Y-%m-%d")
    )
}

/// Serializes an export for a download sink.
///
/// # Errors
///
/// Returns [`ExportError::Serialization`] if JSON encoding fails.
pub fn serialize_export(
    user_id: &str,
    graph: &ExportableSocialGraph,
) -> Result<ExportFile, ExportError> {
    Ok(ExportFile {
        filename: export_filename(user_id, graph.exported_at),
        bytes: serde_json::to_vec_pretty(graph)?,
    })
}

/// Parses `major.minor[.patch]`.
fn parse_version(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

/// Accumulates problems while walking an import payload.
#[derive(Default)]
struct Validator {
    errors: Vec<ImportError>,
    warnings: Vec<ImportWarning>,
}

impl Validator {
    fn invalid(&mut self, message: impl Into<String>) {
        self.errors.push(ImportError::Validation(message.into()));
    }

    fn check_version(&mut self, root: &Map<String, Value>) -> Result<String, ImportError> {
        let Some(version) = root.get("version").and_then(Value::as_str) else {
            return Err(ImportError::Validation(
                "missing or non-string 'version'".to_string(),
            ));
        };
        let Some((major, minor)) = parse_version(version) else {
            return Err(ImportError::Validation(format!(
                "unreadable version '{version}'"
            )));
        };
        let (_, supported_minor) = parse_version(EXPORT_VERSION).unwrap_or((SUPPORTED_MAJOR, 0));
        if major != SUPPORTED_MAJOR {
            return Err(ImportError::VersionMismatch {
                found: version.to_string(),
                supported: EXPORT_VERSION.to_string(),
            });
        }
        if minor != supported_minor {
            self.warnings.push(ImportWarning::MinorVersionDrift {
                found: version.to_string(),
                supported: EXPORT_VERSION.to_string(),
            });
        }
        Ok(version.to_string())
    }

    fn timestamp(&mut self, value: Option<&Value>, what: &str) -> Option<DateTime<Utc>> {
        match value.and_then(Value::as_str) {
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(e) => {
                    self.invalid(format!("{what}: invalid timestamp '{raw}': {e}"));
                    None
                }
            },
            None => {
                self.invalid(format!("{what}: missing timestamp"));
                None
            }
        }
    }

    fn optional_string(&mut self, obj: &Map<String, Value>, key: &str, what: &str) -> Option<String> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.invalid(format!("{what}: '{key}' must be a string"));
                None
            }
        }
    }

    fn friend(&mut self, index: usize, value: &Value) -> Option<Friend> {
        let what = format!("friends[{index}]");
        let Some(obj) = value.as_object() else {
            self.invalid(format!("{what}: expected an object"));
            return None;
        };

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let (Some(id), Some(name)) = (id, name) else {
            self.invalid(format!("{what}: 'id' and 'name' must be non-empty strings"));
            return None;
        };

        let tier = match obj.get("tier").and_then(Value::as_str).and_then(Tier::parse) {
            Some(tier) => tier,
            None => {
                let value = obj
                    .get("tier")
                    .map_or_else(|| "<missing>".to_string(), |v| v.as_str().map_or_else(|| v.to_string(), str::to_string));
                self.warnings.push(ImportWarning::UnknownTier {
                    friend_id: id.clone(),
                    value,
                });
                Tier::Acquainted
            }
        };

        let added_at = self.timestamp(obj.get("addedAt"), &what)?;
        let last_deep_contact = match obj.get("lastDeepContact") {
            None | Some(Value::Null) => None,
            some => Some(self.timestamp(some, &what)?),
        };

        let preferred_contact = self
            .optional_string(obj, "preferredContact", &what)
            .and_then(|raw| {
                let parsed = PreferredContact::parse(&raw);
                if parsed.is_none() {
                    self.warnings.push(ImportWarning::UnknownPreferredContact {
                        friend_id: id.clone(),
                        value: raw,
                    });
                }
                parsed
            });

        let sort_order = match obj.get("sortOrder") {
            None | Some(Value::Null) => None,
            Some(v) => {
                let order = v.as_i64().and_then(|n| i32::try_from(n).ok());
                if order.is_none() {
                    self.invalid(format!("{what}: 'sortOrder' must be an integer"));
                }
                order
            }
        };

        Some(Friend {
            email: self.optional_string(obj, "email", &what),
            phone: self.optional_string(obj, "phone", &what),
            notes: self.optional_string(obj, "notes", &what),
            id,
            name,
            tier,
            added_at,
            preferred_contact,
            sort_order,
            last_deep_contact,
        })
    }

    fn friends(&mut self, root: &Map<String, Value>) -> Vec<Friend> {
        let Some(items) = root.get("friends").and_then(Value::as_array) else {
            self.invalid("'friends' must be an array");
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut friends = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Some(friend) = self.friend(index, item) else {
                continue;
            };
            if !seen.insert(friend.id.clone()) {
                self.warnings.push(ImportWarning::DuplicateFriend {
                    friend_id: friend.id,
                });
                continue;
            }
            friends.push(friend);
        }
        friends
    }

    /// Decodes an optional array of typed records.
    fn records<T: DeserializeOwned>(&mut self, root: &Map<String, Value>, key: &str) -> Vec<T> {
        match root.get(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    serde_json::from_value(item.clone())
                        .map_err(|e| self.invalid(format!("{key}[{index}]: {e}")))
                        .ok()
                })
                .collect(),
            Some(_) => {
                self.invalid(format!("'{key}' must be an array"));
                Vec::new()
            }
        }
    }

    fn optional_record<T: DeserializeOwned>(&mut self, root: &Map<String, Value>, key: &str) -> Option<T> {
        match root.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| self.invalid(format!("{key}: {e}")))
                .ok(),
        }
    }
}

/// Parses and validates an export file.
///
/// Never panics: malformed JSON yields a single [`ImportError::Malformed`],
/// an incompatible major version a single [`ImportError::VersionMismatch`].
/// Any other invalid record is reported and the import as a whole fails;
/// an unknown tier is coerced to acquainted with a warning.
#[must_use]
pub fn import_social_graph(raw: &str) -> ImportResult {
    let root: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return ImportResult::failed(ImportError::Malformed(e.to_string())),
    };
    let Some(root) = root.as_object() else {
        return ImportResult::failed(ImportError::Malformed(
            "expected a JSON object".to_string(),
        ));
    };

    let mut validator = Validator::default();
    let version = match validator.check_version(root) {
        Ok(version) => version,
        Err(error) => return ImportResult::failed(error),
    };

    let exported_at = validator.timestamp(root.get("exportedAt"), "exportedAt");
    let friends = validator.friends(root);
    let posts: Vec<FeedPost> = validator.records(root, "posts");
    let interactions: Vec<Interaction> = validator.records(root, "interactions");
    let settings: Option<ExportSettings> = validator.optional_record(root, "settings");
    let extras: Option<ExportExtras> = validator.optional_record(root, "extras");

    let Validator { errors, warnings } = validator;
    let data = match exported_at {
        Some(exported_at) if errors.is_empty() => Some(ExportableSocialGraph {
            version,
            exported_at,
            friends,
            posts,
            interactions,
            settings,
            extras,
        }),
        _ => None,
    };

    ImportResult {
        success: data.is_some(),
        data,
        errors,
        warnings,
    }
}
