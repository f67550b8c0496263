//! Per-request aggregate context for scoring.

use agora_reputation::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Incoming and outgoing edge counts of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounts {
    pub incoming: u32,
    pub outgoing: u32,
}

/// Everything the scoring function reads besides the activity itself.
///
/// Built fresh for each request from the candidate set and discarded with
/// the response. A missing map entry means zero.
#[derive(Debug, Clone, Default)]
pub struct ScoreContext {
    /// Instant freshness is measured against.
    pub now: DateTime<Utc>,
    /// Tier of the viewer. Carried for callers; not used by the score.
    pub viewer_tier: Option<Tier>,
    pub followed_users: HashSet<String>,
    pub followed_disciplines: HashSet<String>,
    /// Occurrences of each actor in the candidate set.
    pub actor_frequency: HashMap<String, u32>,
    /// Replies per discussion.
    pub reply_counts: HashMap<String, u32>,
    /// Summed weight of agree votes per discussion.
    pub agree_votes: HashMap<String, f64>,
    /// Discussions per node.
    pub node_discussions: HashMap<String, u32>,
    pub node_edges: HashMap<String, EdgeCounts>,
    /// Summed endorsement weight received per actor.
    pub endorsements: HashMap<String, f64>,
}

impl ScoreContext {
    /// Empty context anchored at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            ..Default::default()
        }
    }

    pub fn reply_count(&self, discussion_id: &str) -> u32 {
        self.reply_counts.get(discussion_id).copied().unwrap_or(0)
    }

    pub fn agree_votes(&self, discussion_id: &str) -> f64 {
        self.agree_votes.get(discussion_id).copied().unwrap_or(0.0)
    }

    pub fn discussion_count(&self, node_id: &str) -> u32 {
        self.node_discussions.get(node_id).copied().unwrap_or(0)
    }

    pub fn edges(&self, node_id: &str) -> EdgeCounts {
        self.node_edges.get(node_id).copied().unwrap_or_default()
    }

    pub fn endorsement_weight(&self, actor_id: &str) -> f64 {
        self.endorsements.get(actor_id).copied().unwrap_or(0.0)
    }

    /// Occurrences of `actor_id` in the candidate set, at least 1.
    pub fn actor_occurrences(&self, actor_id: &str) -> u32 {
        self.actor_frequency.get(actor_id).copied().unwrap_or(1).max(1)
    }
}
