//! In-memory [`FeedSource`] used by the unit tests.

use crate::context::EdgeCounts;
use crate::error::{Error, Result};
use crate::models::{
    ActionKind, Activity, ActivityRecord, AuthorSummary, DiscussionSummary, EvidenceSummary,
    FollowSets, NodeSummary, ReplySnapshot,
};
use crate::source::FeedSource;
use agora_reputation::Tier;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn author(id: &str, tier: Tier) -> AuthorSummary {
    AuthorSummary {
        id: id.to_string(),
        display_name: id.to_uppercase(),
        handle: id.to_string(),
        tier,
    }
}

/// A node-creation record by `actor` on node `node_id`.
pub fn node_record(id: &str, actor: &str, node_id: &str, age: Duration) -> ActivityRecord {
    ActivityRecord {
        activity: Activity::new(id.into(), actor.into(), ActionKind::CreateNode, t0() - age)
            .with_node(node_id),
        actor: author(actor, Tier::Tier3),
        node: Some(NodeSummary {
            id: node_id.into(),
            title: format!("Node {}", node_id),
            author_id: actor.into(),
            discipline_id: None,
        }),
        discussion: None,
        evidence: None,
    }
}

/// A reply record by `actor` in discussion `discussion_id`.
pub fn reply_record(id: &str, actor: &str, discussion_id: &str, age: Duration) -> ActivityRecord {
    ActivityRecord {
        activity: Activity::new(id.into(), actor.into(), ActionKind::Reply, t0() - age)
            .with_discussion(discussion_id),
        actor: author(actor, Tier::Tier3),
        node: None,
        discussion: Some(DiscussionSummary {
            id: discussion_id.into(),
            title: format!("Discussion {}", discussion_id),
            node_id: None,
            node_discipline_id: None,
        }),
        evidence: None,
    }
}

/// An evidence record by `actor`.
pub fn evidence_record(id: &str, actor: &str, evidence_id: &str, age: Duration) -> ActivityRecord {
    ActivityRecord {
        activity: Activity::new(id.into(), actor.into(), ActionKind::AddEvidence, t0() - age)
            .with_evidence(evidence_id),
        actor: author(actor, Tier::Tier3),
        node: None,
        discussion: None,
        evidence: Some(EvidenceSummary {
            id: evidence_id.into(),
            title: format!("Evidence {}", evidence_id),
            node_id: None,
            node_title: None,
        }),
    }
}

#[derive(Default)]
pub struct MemorySource {
    pub records: Vec<ActivityRecord>,
    pub follows: HashMap<String, FollowSets>,
    pub viewer_tiers: HashMap<String, Tier>,
    pub reply_counts: HashMap<String, u32>,
    pub agree_votes: HashMap<String, f64>,
    pub node_discussions: HashMap<String, u32>,
    pub node_edges: HashMap<String, EdgeCounts>,
    pub endorsements: HashMap<String, f64>,
    pub replies: Vec<ReplySnapshot>,
    /// Names of queries that should fail.
    pub failing: HashSet<&'static str>,
    /// Ids each aggregate query was asked for.
    pub requested: Mutex<HashMap<&'static str, Vec<String>>>,
}

impl MemorySource {
    pub fn follow(&mut self, viewer: &str, users: &[&str], disciplines: &[&str]) {
        let sets = self.follows.entry(viewer.to_string()).or_default();
        sets.users.extend(users.iter().map(|u| u.to_string()));
        sets.disciplines.extend(disciplines.iter().map(|d| d.to_string()));
    }

    fn check(&self, query: &'static str) -> Result<()> {
        if self.failing.contains(query) {
            Err(Error::Source(format!("{} unavailable", query)))
        } else {
            Ok(())
        }
    }

    fn record_request(&self, query: &'static str, ids: &[String]) {
        self.requested
            .lock()
            .unwrap()
            .insert(query, ids.to_vec());
    }

    fn recent(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        keep: impl Fn(&ActivityRecord) -> bool,
    ) -> Vec<ActivityRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.activity.created_at >= since && keep(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.activity.created_at.cmp(&a.activity.created_at));
        records.truncate(limit);
        records
    }

    fn pick<V: Clone>(&self, map: &HashMap<String, V>, ids: &[String]) -> HashMap<String, V> {
        ids.iter()
            .filter_map(|id| map.get(id).map(|v| (id.clone(), v.clone())))
            .collect()
    }
}

#[async_trait]
impl FeedSource for MemorySource {
    async fn follow_sets(&self, viewer_id: &str) -> Result<FollowSets> {
        self.check("follow_sets")?;
        Ok(self.follows.get(viewer_id).cloned().unwrap_or_default())
    }

    async fn viewer_tier(&self, viewer_id: &str) -> Result<Option<Tier>> {
        self.check("viewer_tier")?;
        Ok(self.viewer_tiers.get(viewer_id).copied())
    }

    async fn personalized_candidates(
        &self,
        follows: &FollowSets,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>> {
        self.check("personalized_candidates")?;
        Ok(self.recent(since, limit, |r| {
            follows.users.contains(&r.activity.actor_id)
                || r.activity
                    .targets
                    .discipline_id
                    .as_ref()
                    .is_some_and(|d| follows.disciplines.contains(d))
                || r.node
                    .as_ref()
                    .is_some_and(|n| follows.users.contains(&n.author_id))
        }))
    }

    async fn global_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>> {
        self.check("global_candidates")?;
        Ok(self.recent(since, limit, |_| true))
    }

    async fn reply_counts(&self, discussion_ids: &[String]) -> Result<HashMap<String, u32>> {
        self.record_request("reply_counts", discussion_ids);
        self.check("reply_counts")?;
        Ok(self.pick(&self.reply_counts, discussion_ids))
    }

    async fn agree_vote_sums(&self, discussion_ids: &[String]) -> Result<HashMap<String, f64>> {
        self.record_request("agree_vote_sums", discussion_ids);
        self.check("agree_vote_sums")?;
        Ok(self.pick(&self.agree_votes, discussion_ids))
    }

    async fn discussion_counts(&self, node_ids: &[String]) -> Result<HashMap<String, u32>> {
        self.record_request("discussion_counts", node_ids);
        self.check("discussion_counts")?;
        Ok(self.pick(&self.node_discussions, node_ids))
    }

    async fn edge_counts(&self, node_ids: &[String]) -> Result<HashMap<String, EdgeCounts>> {
        self.record_request("edge_counts", node_ids);
        self.check("edge_counts")?;
        Ok(self.pick(&self.node_edges, node_ids))
    }

    async fn endorsement_sums(&self, actor_ids: &[String]) -> Result<HashMap<String, f64>> {
        self.record_request("endorsement_sums", actor_ids);
        self.check("endorsement_sums")?;
        Ok(self.pick(&self.endorsements, actor_ids))
    }

    async fn latest_replies(&self, discussion_ids: &[String]) -> Result<Vec<ReplySnapshot>> {
        self.record_request("latest_replies", discussion_ids);
        self.check("latest_replies")?;
        Ok(self
            .replies
            .iter()
            .filter(|r| discussion_ids.contains(&r.discussion_id))
            .cloned()
            .collect())
    }
}
