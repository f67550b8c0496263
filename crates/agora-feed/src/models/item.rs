//! Ranked feed items as returned to clients.

use super::activity::ActionKind;
use super::record::{AuthorSummary, ReplySnapshot};
use crate::context::EdgeCounts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node created or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeItem {
    pub node_id: String,
    pub title: String,
    pub discipline_id: Option<String>,
    pub edges: EdgeCounts,
    pub discussion_count: u32,
}

/// Activity inside a discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionItem {
    pub discussion_id: String,
    pub title: String,
    pub node_id: Option<String>,
    pub latest_reply: Option<ReplySnapshot>,
    pub reply_count: u32,
}

/// Evidence added or endorsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub evidence_id: String,
    pub title: String,
    pub node_id: Option<String>,
    pub node_title: Option<String>,
}

/// Kind-specific part of a feed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedPayload {
    Node(NodeItem),
    Discussion(DiscussionItem),
    Evidence(EvidenceItem),
}

/// A scored, hydrated activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    pub score: f64,
    pub activity_id: String,
    pub action: ActionKind,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    #[serde(flatten)]
    pub payload: FeedPayload,
}
