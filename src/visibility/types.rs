//! Feed and settings types.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Kind of post content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Plain text.
    Text,
    /// Photo with optional caption.
    Photo,
    /// Shared link.
    Link,
    /// Life update (new job, move, birthday).
    Milestone,
}

/// Kind of interaction on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    /// Like or heart.
    Like,
    /// Top-level comment.
    Comment,
    /// Direct reply to the author.
    Reply,
    /// Re-share.
    Share,
}

/// An interaction on a post. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Opaque identifier.
    pub id: String,
    /// Post the interaction belongs to.
    pub post_id: String,
    /// User who interacted.
    pub user_id: String,
    /// Interaction kind.
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    /// Comment or reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// When the interaction happened.
    pub created_at: DateTime<Utc>,
}

/// A feed post. The body is immutable; interactions accumulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    /// Opaque identifier.
    pub id: String,
    /// Author user id.
    pub author_id: String,
    /// Tier the author holds relative to the feed owner.
    pub author_tier: Tier,
    /// Kind of content.
    pub content_type: ContentType,
    /// Post body.
    pub content: String,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// Interactions, in arrival order.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    /// Tiers allowed to see the post at all.
    pub visibility: Vec<Tier>,
    /// Surfaced by a suggestion rather than a relationship.
    #[serde(default)]
    pub is_suggested: bool,
    /// Paid placement.
    #[serde(default)]
    pub is_sponsored: bool,
}

impl FeedPost {
    /// Number of likes on the post.
    #[must_use]
    pub fn like_count(&self) -> usize {
        self.interactions
            .iter()
            .filter(|i| i.interaction_type == InteractionType::Like)
            .count()
    }
}

/// A redactable field of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PostField {
    /// Who wrote the post.
    AuthorId,
    /// The author's tier.
    AuthorTier,
    /// The post body.
    Content,
    /// The post timestamp.
    CreatedAt,
    /// The individual interactions.
    Interactions,
    /// The aggregated like count.
    LikeCount,
}

impl PostField {
    /// Every field.
    pub const ALL: [Self; 6] = [
        Self::AuthorId,
        Self::AuthorTier,
        Self::Content,
        Self::CreatedAt,
        Self::Interactions,
        Self::LikeCount,
    ];
}

/// Field-visibility matrix keyed by viewer tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    /// Fields each tier may see. A tier without an entry sees none.
    pub field_visibility: BTreeMap<Tier, BTreeSet<PostField>>,
}

impl Default for PrivacySettings {
    /// Closer tiers see full identity and content; outer and extended tiers
    /// see progressively less.
    fn default() -> Self {
        use PostField::{AuthorId, Content, CreatedAt, LikeCount};

        let all: BTreeSet<PostField> = PostField::ALL.into_iter().collect();
        let mut field_visibility = BTreeMap::new();
        field_visibility.insert(Tier::Core, all.clone());
        field_visibility.insert(Tier::Inner, all);
        field_visibility.insert(
            Tier::Outer,
            [AuthorId, Content, CreatedAt, LikeCount].into_iter().collect(),
        );
        field_visibility.insert(
            Tier::Naybor,
            [AuthorId, Content, LikeCount].into_iter().collect(),
        );
        for tier in [Tier::Parasocial, Tier::Rolemodel, Tier::Acquainted] {
            field_visibility.insert(tier, [Content, LikeCount].into_iter().collect());
        }
        Self { field_visibility }
    }
}

impl PrivacySettings {
    /// Replaces the visible field set of one tier.
    #[must_use]
    pub fn with_fields(mut self, tier: Tier, fields: impl IntoIterator<Item = PostField>) -> Self {
        self.field_visibility
            .insert(tier, fields.into_iter().collect());
        self
    }
}

/// How urgently an interaction is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Push right away.
    Immediate,
    /// Roll into a periodic digest.
    Batched,
    /// Record silently.
    Quiet,
}

/// One row of the notification routing table.
///
/// `None` in a predicate matches anything. A rule listing interaction types
/// does not match when no interaction type is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    /// Tiers the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<Tier>>,
    /// Interaction types the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Vec<InteractionType>>,
    /// Priority assigned on match.
    pub priority: NotificationPriority,
}

impl NotificationRule {
    /// Creates a rule matching everything.
    #[must_use]
    pub const fn new(priority: NotificationPriority) -> Self {
        Self {
            tiers: None,
            interactions: None,
            priority,
        }
    }

    /// Restricts the rule to the given tiers.
    #[must_use]
    pub fn for_tiers(mut self, tiers: impl IntoIterator<Item = Tier>) -> Self {
        self.tiers = Some(tiers.into_iter().collect());
        self
    }

    /// Restricts the rule to the given interaction types.
    #[must_use]
    pub fn for_interactions(mut self, types: impl IntoIterator<Item = InteractionType>) -> Self {
        self.interactions = Some(types.into_iter().collect());
        self
    }

    /// Whether the rule applies.
    #[must_use]
    pub fn matches(&self, tier: Tier, interaction: Option<InteractionType>) -> bool {
        let tier_ok = self.tiers.as_ref().map_or(true, |tiers| tiers.contains(&tier));
        let interaction_ok = match (&self.interactions, interaction) {
            (None, _) => true,
            (Some(types), Some(kind)) => types.contains(&kind),
            (Some(_), None) => false,
        };
        tier_ok && interaction_ok
    }
}

/// Ordered notification routing table; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Rules in evaluation order.
    pub rules: Vec<NotificationRule>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        use InteractionType::{Comment, Reply};
        use NotificationPriority::{Batched, Immediate, Quiet};

        Self {
            rules: vec![
                NotificationRule::new(Immediate).for_tiers([Tier::Core]),
                // Direct conversation with close-ish friends escalates
                NotificationRule::new(Immediate)
                    .for_tiers([Tier::Inner, Tier::Outer])
                    .for_interactions([Reply, Comment]),
                NotificationRule::new(Batched).for_tiers([Tier::Inner, Tier::Outer, Tier::Naybor]),
                NotificationRule::new(Batched).for_interactions([Reply]),
                NotificationRule::new(Quiet),
            ],
        }
    }
}
