//! Argument graph records.
//!
//! The node only stores these for the feed and reputation read paths; the
//! graph editing surface lives elsewhere.

use agora_feed::models::{DiscussionSummary, EvidenceSummary, NodeSummary, ReplySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentNode {
    pub id: String,
    pub title: String,
    pub author_id: String,
    #[serde(default)]
    pub discipline_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ArgumentNode {
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            author_id: self.author_id.clone(),
            discipline_id: self.discipline_id.clone(),
        }
    }
}

/// A discussion thread, usually attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub node_id: Option<String>,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

impl Discussion {
    /// Summary carrying the discipline of `node`, the discussion's parent.
    pub fn summary(&self, node: Option<&ArgumentNode>) -> DiscussionSummary {
        DiscussionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            node_id: self.node_id.clone(),
            node_discipline_id: node.and_then(|n| n.discipline_id.clone()),
        }
    }
}

/// A reply in a discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub discussion_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn snapshot(&self) -> ReplySnapshot {
        ReplySnapshot {
            id: self.id.clone(),
            discussion_id: self.discussion_id.clone(),
            author_id: self.author_id.clone(),
            body: self.body.clone(),
            created_at: self.created_at,
        }
    }
}

/// Position a vote takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Agree,
    Disagree,
}

/// A weighted vote on a discussion, one per (discussion, voter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub discussion_id: String,
    pub voter_id: String,
    pub stance: Stance,
    /// Weight assigned by the voting path
    #[serde(default = "default_vote_weight")]
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

fn default_vote_weight() -> f64 {
    1.0
}

/// Relation between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Supports,
    Challenges,
    Contradicts,
    Cites,
}

/// Directed edge from `source_id` to `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub created_at: DateTime<Utc>,
}

/// Supporting material attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub node_id: Option<String>,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
}

impl Evidence {
    /// Summary carrying the title of `node`, the evidence's parent.
    pub fn summary(&self, node: Option<&ArgumentNode>) -> EvidenceSummary {
        EvidenceSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            node_id: self.node_id.clone(),
            node_title: node.map(|n| n.title.clone()),
        }
    }
}
