//! Export, import and reconciliation of social graphs.
//!
//! # Flow
//!
//! ```text
//! export:  redact_friends -> export_social_graph -> serialize_export -> ExportFile
//! import:  raw text -> import_social_graph -> ImportResult -> plan_merge
//! ```
//!
//! Import never panics on bad input: malformed JSON, incompatible versions
//! and invalid records are collected as [`ImportError`]s and nothing is
//! applied. Recoverable oddities (unknown tier, minor version drift) become
//! [`ImportWarning`]s.
//!
//! # Deduplication
//!
//! The same matcher serves file imports and contact imports: record id,
//! then normalized phone (digits only, at least 7), then case-insensitive
//! email. The first hit wins.

mod codec;
mod dedup;
mod error;
mod merge;
pub mod types;

pub use codec::{
    export_filename, export_social_graph, import_social_graph, redact_friends, serialize_export, EXPORT_VERSION,
};
pub use dedup::{
    find_duplicate_contacts, normalize_email, normalize_phone, ContactDedupReport, ContactTuple,
    DuplicateContact, FriendIndex, MatchReason,
};
pub use error::{ExportError, ImportError, ImportWarning};
pub use merge::{plan_merge, MergeOutcome, MergeReport, MergeResult, MergeStrategy};
pub use types::{
    ExportExtras, ExportFile, ExportOptions, ExportSettings, ExportableSocialGraph, ImportResult,
};
