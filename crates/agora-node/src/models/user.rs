//! User model.

use agora_feed::models::AuthorSummary;
use agora_reputation::{Tier, TierCommit, UserReputation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A platform participant.
///
/// The tier fields are written only by tier recalculation; `is_historical`
/// only by operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: String,

    /// Name shown next to content
    pub display_name: String,

    /// Unique handle
    pub handle: String,

    #[serde(default)]
    pub tier: Tier,

    #[serde(default)]
    pub reputation_score: u32,

    /// When the tier was last recomputed
    #[serde(default)]
    pub last_tier_eval_at: Option<DateTime<Utc>>,

    /// First time the user reached a verified tier
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,

    /// Curated legacy profile, pinned to `Tier1`
    #[serde(default)]
    pub is_historical: bool,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create an unevaluated `Tier4` user.
    pub fn new(id: String, display_name: String, handle: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name,
            handle,
            tier: Tier::Tier4,
            reputation_score: 0,
            last_tier_eval_at: None,
            verified_at: None,
            is_historical: false,
            created_at,
        }
    }

    /// Author info denormalized into feed items.
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            handle: self.handle.clone(),
            tier: self.tier,
        }
    }

    /// The slice of this record the tier controller works on.
    pub fn reputation(&self) -> UserReputation {
        UserReputation {
            user_id: self.id.clone(),
            tier: self.tier,
            reputation_score: self.reputation_score,
            last_tier_eval_at: self.last_tier_eval_at,
            verified_at: self.verified_at,
            is_historical: self.is_historical,
        }
    }

    /// Apply the result of a recalculation.
    pub fn apply(&mut self, commit: &TierCommit) {
        self.tier = commit.tier;
        self.reputation_score = commit.score;
        self.last_tier_eval_at = Some(commit.evaluated_at);
        self.verified_at = commit.verified_at;
    }
}
