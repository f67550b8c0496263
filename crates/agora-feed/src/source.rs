//! Read contract between the ranking pipeline and the store.
//!
//! The pipeline never runs queries itself; it consumes typed results from a
//! [`FeedSource`]. Every aggregate method receives only ids that are present
//! in the current candidate set.

use crate::context::EdgeCounts;
use crate::error::Result;
use crate::models::{ActivityRecord, FollowSets, ReplySnapshot};
use agora_reputation::Tier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Typed query results consumed by the feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Followed users and disciplines of `viewer_id`, in one query.
    async fn follow_sets(&self, viewer_id: &str) -> Result<FollowSets>;

    /// Current tier of the viewer, if known.
    async fn viewer_tier(&self, viewer_id: &str) -> Result<Option<Tier>>;

    /// Activities created at or after `since` whose actor is followed, whose
    /// direct discipline target is followed, or whose target node was
    /// authored by a followed user. Most recent first, at most `limit`.
    async fn personalized_candidates(
        &self,
        follows: &FollowSets,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>>;

    /// All activities created at or after `since`. Most recent first, at
    /// most `limit`.
    async fn global_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>>;

    /// Reply count per discussion.
    async fn reply_counts(&self, discussion_ids: &[String]) -> Result<HashMap<String, u32>>;

    /// Summed weight of agree votes per discussion.
    async fn agree_vote_sums(&self, discussion_ids: &[String]) -> Result<HashMap<String, f64>>;

    /// Discussion count per node.
    async fn discussion_counts(&self, node_ids: &[String]) -> Result<HashMap<String, u32>>;

    /// Incoming/outgoing edge counts per node.
    async fn edge_counts(&self, node_ids: &[String]) -> Result<HashMap<String, EdgeCounts>>;

    /// Summed endorsement weight received per user.
    async fn endorsement_sums(&self, actor_ids: &[String]) -> Result<HashMap<String, f64>>;

    /// Replies for the given discussions. May return several per discussion;
    /// callers keep the most recent.
    async fn latest_replies(&self, discussion_ids: &[String]) -> Result<Vec<ReplySnapshot>>;
}
