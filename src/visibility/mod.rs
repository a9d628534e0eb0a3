//! Tier-scoped content visibility and notification routing.
//!
//! What a viewer may see of a post, and how loudly an interaction is
//! announced, depends only on the viewer's tier. Both rules are data
//! ([`PrivacySettings`] and [`NotificationSettings`]) so they can change
//! without touching code.
//!
//! # Privacy Model
//!
//! - A post is invisible to tiers missing from its `visibility` list
//! - A tier missing from the field matrix sees no optional field at all
//! - Engagement counts are hidden inside the intimate circles (core, inner)

mod engine;
pub mod types;

pub use engine::{
    can_viewer_see, get_notification_priority, get_visible_content, should_show_like_count,
    sort_interactions_by_fidelity, visible_feed, VisiblePost,
};
pub use types::{
    ContentType, FeedPost, Interaction, InteractionType, NotificationPriority, NotificationRule,
    NotificationSettings, PostField, PrivacySettings,
};
