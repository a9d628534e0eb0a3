//! Export file types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ImportError, ImportWarning};
use crate::nudge::AcquaintedNudgeHistoryEntry;
use crate::tier::{Friend, ReservedGroup, Tier};
use crate::visibility::{FeedPost, Interaction, NotificationSettings, PrivacySettings};

/// Settings carried in an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Field-visibility matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<PrivacySettings>,
    /// Notification routing table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationSettings>,
}

/// Optional graph state beyond friends and posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportExtras {
    /// Reserved groups, by tier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reserved_groups: BTreeMap<Tier, Vec<ReservedGroup>>,
    /// Acquainted review history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nudge_history: Vec<AcquaintedNudgeHistoryEntry>,
}

/// The v1 export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportableSocialGraph {
    /// Format version, `major.minor`.
    pub version: String,
    /// When the export was produced.
    pub exported_at: DateTime<Utc>,
    /// Friends, already redacted by the caller.
    pub friends: Vec<Friend>,
    /// Posts authored by the exporting user.
    pub posts: Vec<FeedPost>,
    /// The exporting user's interactions on other people's posts.
    pub interactions: Vec<Interaction>,
    /// Settings, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ExportSettings>,
    /// Extra graph state, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<ExportExtras>,
}

/// Include-flags applied to friends before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExportOptions {
    /// Keep email, phone and preferred contact.
    pub include_contact_info: bool,
    /// Keep notes.
    pub include_notes: bool,
    /// Include privacy and notification settings.
    pub include_settings: bool,
    /// Include reserved groups and review history.
    pub include_extras: bool,
}

impl Default for ExportOptions {
    /// Full-fidelity export.
    fn default() -> Self {
        Self {
            include_contact_info: true,
            include_notes: true,
            include_settings: true,
            include_extras: true,
        }
    }
}

impl ExportOptions {
    /// Export stripped of contact details, notes and extras.
    #[must_use]
    pub const fn private() -> Self {
        Self {
            include_contact_info: false,
            include_notes: false,
            include_settings: true,
            include_extras: false,
        }
    }
}

/// Bytes ready for a download sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// `<opaque-id>-export-<YYYY-MM-DD>.json`
    pub filename: String,
    /// Pretty-printed JSON.
    pub bytes: Vec<u8>,
}

/// Outcome of parsing and validating an export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    /// Whether `data` is present and usable.
    pub success: bool,
    /// The validated graph.
    pub data: Option<ExportableSocialGraph>,
    /// Fatal problems; non-empty means nothing was accepted.
    pub errors: Vec<ImportError>,
    /// Non-fatal observations.
    pub warnings: Vec<ImportWarning>,
}

impl ImportResult {
    pub(crate) fn failed(error: ImportError) -> Self {
        Self {
            success: false,
            data: None,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Error messages, for display.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Warning messages, for display.
    #[must_use]
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
