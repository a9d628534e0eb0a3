//! Redaction, engagement-count policy and notification routing.
//!
//! Every function here is pure and cheap enough to recompute on each query.

use chrono::{DateTime, Utc};

use super::types::{
    ContentType, FeedPost, Interaction, InteractionType, NotificationPriority,
    NotificationSettings, PostField, PrivacySettings,
};
use crate::tier::Tier;

/// Sort key for users whose tier is unknown; sorts after every real tier.
const UNKNOWN_FIDELITY: u8 = u8::MAX;

/// A post as seen by one viewer tier.
///
/// Fields the viewer may not see are `None`. The id, content type and
/// placement flags are never redacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisiblePost {
    /// Post id.
    pub id: String,
    /// Kind of content.
    pub content_type: ContentType,
    /// Author id, if visible.
    pub author_id: Option<String>,
    /// Author tier, if visible.
    pub author_tier: Option<Tier>,
    /// Post body, if visible.
    pub content: Option<String>,
    /// Timestamp, if visible.
    pub created_at: Option<DateTime<Utc>>,
    /// Interactions, if visible.
    pub interactions: Option<Vec<Interaction>>,
    /// Like count, if visible and not suppressed for the tier.
    pub like_count: Option<usize>,
    /// Surfaced by a suggestion.
    pub is_suggested: bool,
    /// Paid placement.
    pub is_sponsored: bool,
}

/// Whether a viewer in `viewer_tier` may see `field`.
#[must_use]
pub fn can_viewer_see(viewer_tier: Tier, field: PostField, settings: &PrivacySettings) -> bool {
    settings
        .field_visibility
        .get(&viewer_tier)
        .is_some_and(|fields| fields.contains(&field))
}

/// Whether like counts are shown to a tier.
///
/// The intimate circles (core, inner) never see engagement counts, so
/// popularity does not leak into close relationships.
#[must_use]
pub const fn should_show_like_count(tier: Tier) -> bool {
    !tier.is_close()
}

/// Redacts a post for a viewer tier.
///
/// Returns `None` when the post's visibility list excludes the viewer.
#[must_use]
pub fn get_visible_content(
    viewer_tier: Tier,
    post: &FeedPost,
    settings: &PrivacySettings,
) -> Option<VisiblePost> {
    if !post.visibility.contains(&viewer_tier) {
        return None;
    }

    let sees = |field| can_viewer_see(viewer_tier, field, settings);

    Some(VisiblePost {
        id: post.id.clone(),
        content_type: post.content_type,
        author_id: sees(PostField::AuthorId).then(|| post.author_id.clone()),
        author_tier: sees(PostField::AuthorTier).then_some(post.author_tier),
        content: sees(PostField::Content).then(|| post.content.clone()),
        created_at: sees(PostField::CreatedAt).then_some(post.created_at),
        interactions: sees(PostField::Interactions).then(|| post.interactions.clone()),
        like_count: (sees(PostField::LikeCount) && should_show_like_count(viewer_tier))
            .then(|| post.like_count()),
        is_suggested: post.is_suggested,
        is_sponsored: post.is_sponsored,
    })
}

/// Redacts a whole feed for a viewer tier, dropping posts it may not see.
#[must_use]
pub fn visible_feed(
    viewer_tier: Tier,
    posts: &[FeedPost],
    settings: &PrivacySettings,
) -> Vec<VisiblePost> {
    posts
        .iter()
        .filter_map(|post| get_visible_content(viewer_tier, post, settings))
        .collect()
}

/// Orders interactions by the interacting user's tier, closest first.
///
/// Recency does not override fidelity; within one tier interactions are
/// ordered by ascending `created_at`. Users for whom `tier_of` returns
/// `None` come last.
#[must_use]
pub fn sort_interactions_by_fidelity<F>(interactions: &[Interaction], tier_of: F) -> Vec<Interaction>
where
    F: Fn(&str) -> Option<Tier>,
{
    let mut sorted = interactions.to_vec();
    sorted.sort_by_cached_key(|interaction| {
        let fidelity = tier_of(&interaction.user_id).map_or(UNKNOWN_FIDELITY, Tier::fidelity);
        (fidelity, interaction.created_at)
    });
    sorted
}

/// Routes an interaction from a user in `tier` to a notification priority.
///
/// Rules are evaluated in order and the first match wins. With no match
/// the notification is quiet.
#[must_use]
pub fn get_notification_priority(
    tier: Tier,
    interaction: Option<InteractionType>,
    settings: &NotificationSettings,
) -> NotificationPriority {
    settings
        .rules
        .iter()
        .find(|rule| rule.matches(tier, interaction))
        .map_or(NotificationPriority::Quiet, |rule| rule.priority)
}
