//! Activities joined with the summaries the ranking needs.

use super::activity::{Activity, ItemShape};
use agora_reputation::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized author info carried by every feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub display_name: String,
    pub handle: String,
    pub tier: Tier,
}

/// A knowledge-graph node as seen by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: String,
    pub title: String,
    pub author_id: String,
    pub discipline_id: Option<String>,
}

/// A discussion, with the discipline of the node it hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionSummary {
    pub id: String,
    pub title: String,
    pub node_id: Option<String>,
    pub node_discipline_id: Option<String>,
}

/// A piece of evidence and the node it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSummary {
    pub id: String,
    pub title: String,
    pub node_id: Option<String>,
    pub node_title: Option<String>,
}

/// Snapshot of the most recent reply in a discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySnapshot {
    pub id: String,
    pub discussion_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An activity with its actor and any resolvable targets joined in.
///
/// A `None` summary for the activity's own target means the target was
/// removed after the activity was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub activity: Activity,
    pub actor: AuthorSummary,
    #[serde(default)]
    pub node: Option<NodeSummary>,
    #[serde(default)]
    pub discussion: Option<DiscussionSummary>,
    #[serde(default)]
    pub evidence: Option<EvidenceSummary>,
}

impl ActivityRecord {
    /// Whether the payload for this activity's feed shape can be built.
    pub fn is_resolvable(&self) -> bool {
        match self.activity.action.shape() {
            Some(ItemShape::Node) => self.node.is_some(),
            Some(ItemShape::Discussion) => self.discussion.is_some(),
            Some(ItemShape::Evidence) => self.evidence.is_some(),
            None => false,
        }
    }

    /// Discipline used for the discipline boost.
    ///
    /// Precedence: the node's discipline, then the discussion's node
    /// discipline, then the activity's direct discipline target.
    pub fn discipline(&self) -> Option<&str> {
        self.node
            .as_ref()
            .and_then(|n| n.discipline_id.as_deref())
            .or_else(|| {
                self.discussion
                    .as_ref()
                    .and_then(|d| d.node_discipline_id.as_deref())
            })
            .or(self.activity.targets.discipline_id.as_deref())
    }
}
