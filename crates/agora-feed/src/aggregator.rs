//! Candidate selection and aggregate fan-out.
//!
//! A request sees at most [`CANDIDATE_LIMIT`] activities:
//!
//! - **Personalized**: trailing [`PERSONAL_WINDOW_HOURS`], restricted to
//!   followed actors, followed disciplines and nodes authored by followed
//!   users.
//! - **Global**: trailing [`GLOBAL_WINDOW_HOURS`], no predicate.
//!
//! A personalized query that yields nothing falls back to the global set.
//! The five aggregate queries then run concurrently over the ids present in
//! the candidates; a failed query contributes zeros instead of failing the
//! request.

use crate::context::ScoreContext;
use crate::error::Result;
use crate::hydrator::latest_per_discussion;
use crate::models::{ActivityRecord, FollowSets, ItemShape, ReplySnapshot};
use crate::source::FeedSource;
use agora_reputation::Tier;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Trailing window of the personalized query.
pub const PERSONAL_WINDOW_HOURS: i64 = 24 * 7;

/// Trailing window of the global query.
pub const GLOBAL_WINDOW_HOURS: i64 = 48;

/// Maximum candidates considered per request.
pub const CANDIDATE_LIMIT: usize = 60;

/// Which query produced a candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Personalized,
    Global,
}

/// Candidates ready for scoring.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub scope: FeedScope,
    pub records: Vec<ActivityRecord>,
    pub context: ScoreContext,
}

/// Selects candidates and gathers their aggregates.
pub struct CandidateAggregator {
    source: Arc<dyn FeedSource>,
}

impl CandidateAggregator {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self { source }
    }

    /// Candidates for `viewer`, or the global set for anonymous viewers and
    /// viewers whose personalized query comes back empty.
    pub async fn collect(&self, viewer: Option<&str>, now: DateTime<Utc>) -> CandidateSet {
        if let Some(viewer) = viewer {
            if let Some(set) = self.personalized(viewer, now).await {
                return set;
            }
            debug!(viewer, "no personalized candidates, falling back to global feed");
        }
        self.global(now).await
    }

    /// The anonymous/global candidate set.
    pub async fn global(&self, now: DateTime<Utc>) -> CandidateSet {
        let since = now - Duration::hours(GLOBAL_WINDOW_HOURS);
        let records = match self.source.global_candidates(since, CANDIDATE_LIMIT).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "global candidate query failed, serving empty feed");
                Vec::new()
            }
        };
        self.build(FeedScope::Global, records, FollowSets::default(), None, now)
            .await
    }

    async fn personalized(&self, viewer: &str, now: DateTime<Utc>) -> Option<CandidateSet> {
        let follows = match self.source.follow_sets(viewer).await {
            Ok(follows) => follows,
            Err(e) => {
                warn!(viewer, error = %e, "follow graph query failed");
                return None;
            }
        };
        if follows.is_empty() {
            return None;
        }

        let since = now - Duration::hours(PERSONAL_WINDOW_HOURS);
        let records = match self
            .source
            .personalized_candidates(&follows, since, CANDIDATE_LIMIT)
            .await
        {
            Ok(records) if records.is_empty() => return None,
            Ok(records) => records,
            Err(e) => {
                warn!(viewer, error = %e, "personalized candidate query failed");
                return None;
            }
        };

        let viewer_tier = degrade(self.source.viewer_tier(viewer).await, "viewer_tier");
        Some(
            self.build(FeedScope::Personalized, records, follows, viewer_tier, now)
                .await,
        )
    }

    async fn build(
        &self,
        scope: FeedScope,
        mut records: Vec<ActivityRecord>,
        follows: FollowSets,
        viewer_tier: Option<Tier>,
        now: DateTime<Utc>,
    ) -> CandidateSet {
        records.truncate(CANDIDATE_LIMIT);
        records.retain(|record| {
            let keep = record.is_resolvable();
            if !keep {
                debug!(
                    activity_id = %record.activity.id,
                    action = ?record.activity.action,
                    "dropping activity with unresolvable payload"
                );
            }
            keep
        });

        let mut context = ScoreContext::new(now);
        context.viewer_tier = viewer_tier;
        context.followed_users = follows.users;
        context.followed_disciplines = follows.disciplines;
        for record in &records {
            *context
                .actor_frequency
                .entry(record.activity.actor_id.clone())
                .or_insert(0) += 1;
        }

        self.fan_out(&records, &mut context).await;

        CandidateSet {
            scope,
            records,
            context,
        }
    }

    /// Run the five aggregate queries concurrently and merge them.
    async fn fan_out(&self, records: &[ActivityRecord], context: &mut ScoreContext) {
        let discussion_ids = collect_ids(
            records
                .iter()
                .filter_map(|r| r.activity.targets.discussion_id.as_deref()),
        );
        let node_ids = collect_ids(
            records
                .iter()
                .filter_map(|r| r.activity.targets.node_id.as_deref()),
        );
        let actor_ids = collect_ids(records.iter().map(|r| r.activity.actor_id.as_str()));

        let (replies, votes, discussions, edges, endorsements) = tokio::join!(
            self.source.reply_counts(&discussion_ids),
            self.source.agree_vote_sums(&discussion_ids),
            self.source.discussion_counts(&node_ids),
            self.source.edge_counts(&node_ids),
            self.source.endorsement_sums(&actor_ids),
        );

        context.reply_counts = degrade(replies, "reply_counts");
        context.agree_votes = degrade(votes, "agree_vote_sums");
        context.node_discussions = degrade(discussions, "discussion_counts");
        context.node_edges = degrade(edges, "edge_counts");
        context.endorsements = degrade(endorsements, "endorsement_sums");
    }

    /// Most recent reply per discussion among `records`, in one batched query.
    pub async fn latest_replies(
        &self,
        records: &[ActivityRecord],
    ) -> HashMap<String, ReplySnapshot> {
        let discussion_ids = collect_ids(
            records
                .iter()
                .filter(|r| r.activity.action.shape() == Some(ItemShape::Discussion))
                .filter_map(|r| r.discussion.as_ref().map(|d| d.id.as_str())),
        );
        if discussion_ids.is_empty() {
            return HashMap::new();
        }
        latest_per_discussion(degrade(
            self.source.latest_replies(&discussion_ids).await,
            "latest_replies",
        ))
    }
}

/// Distinct ids in stable order.
fn collect_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    ids.collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Zero-valued default for a failed aggregate query.
fn degrade<T: Default>(result: Result<T>, query: &'static str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(query, error = %e, "aggregate query failed, scoring with defaults");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node_record, reply_record, t0, MemorySource};

    fn aggregator(source: MemorySource) -> (CandidateAggregator, Arc<MemorySource>) {
        let source = Arc::new(source);
        (CandidateAggregator::new(source.clone()), source)
    }

    fn ids(set: &CandidateSet) -> Vec<&str> {
        set.records.iter().map(|r| r.activity.id.as_str()).collect()
    }

    #[tokio::test]
    async fn anonymous_gets_global_window() {
        let mut source = MemorySource::default();
        source.records = vec![
            node_record("fresh", "alice", "n1", Duration::hours(1)),
            node_record("edge", "bob", "n2", Duration::hours(47)),
            node_record("stale", "carol", "n3", Duration::hours(49)),
        ];
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(None, t0()).await;
        assert_eq!(set.scope, FeedScope::Global);
        assert_eq!(ids(&set), vec!["fresh", "edge"]);
        assert!(set.context.followed_users.is_empty());
    }

    #[tokio::test]
    async fn personalized_uses_week_window_and_predicate() {
        let mut source = MemorySource::default();
        source.records = vec![
            node_record("followed-old", "alice", "n1", Duration::days(5)),
            node_record("stranger", "mallory", "n2", Duration::hours(1)),
            node_record("too-old", "alice", "n3", Duration::days(8)),
        ];
        source.follow("viewer", &["alice"], &[]);
        source.viewer_tiers.insert("viewer".into(), agora_reputation::Tier::Tier2);
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(Some("viewer"), t0()).await;
        assert_eq!(set.scope, FeedScope::Personalized);
        assert_eq!(ids(&set), vec!["followed-old"]);
        assert!(set.context.followed_users.contains("alice"));
        assert_eq!(set.context.viewer_tier, Some(agora_reputation::Tier::Tier2));
    }

    #[tokio::test]
    async fn falls_back_to_global_without_relevant_activity() {
        let mut source = MemorySource::default();
        source.records = vec![node_record("a1", "mallory", "n1", Duration::hours(2))];
        source.follow("viewer", &["alice"], &["physics"]);
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(Some("viewer"), t0()).await;
        assert_eq!(set.scope, FeedScope::Global);
        assert_eq!(ids(&set), vec!["a1"]);

        // No follows at all behaves the same
        let set = aggregator.collect(Some("newcomer"), t0()).await;
        assert_eq!(set.scope, FeedScope::Global);
    }

    #[tokio::test]
    async fn failed_follow_query_falls_back_to_global() {
        let mut source = MemorySource::default();
        source.records = vec![node_record("a1", "alice", "n1", Duration::hours(2))];
        source.follow("viewer", &["alice"], &[]);
        source.failing.insert("follow_sets");
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(Some("viewer"), t0()).await;
        assert_eq!(set.scope, FeedScope::Global);
        assert_eq!(set.records.len(), 1);
    }

    #[tokio::test]
    async fn candidates_are_capped() {
        let mut source = MemorySource::default();
        source.records = (0..100)
            .map(|i| node_record(&format!("a{}", i), "alice", &format!("n{}", i), Duration::minutes(i)))
            .collect();
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(None, t0()).await;
        assert_eq!(set.records.len(), CANDIDATE_LIMIT);
        assert_eq!(set.context.actor_frequency["alice"], CANDIDATE_LIMIT as u32);
    }

    #[tokio::test]
    async fn orphans_are_dropped_before_counting() {
        let mut orphan = node_record("orphan", "alice", "gone", Duration::hours(1));
        orphan.node = None;
        let mut source = MemorySource::default();
        source.records = vec![
            orphan,
            node_record("kept", "alice", "n1", Duration::hours(2)),
        ];
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(None, t0()).await;
        assert_eq!(ids(&set), vec!["kept"]);
        assert_eq!(set.context.actor_frequency["alice"], 1);
    }

    #[tokio::test]
    async fn fan_out_is_limited_to_candidate_ids() {
        let mut source = MemorySource::default();
        source.records = vec![
            node_record("a1", "alice", "n1", Duration::hours(1)),
            reply_record("a2", "bob", "d1", Duration::hours(1)),
        ];
        source.reply_counts.insert("d1".into(), 3);
        source.reply_counts.insert("other".into(), 99);
        source.node_discussions.insert("n1".into(), 2);
        source.endorsements.insert("bob".into(), 4.0);
        let (aggregator, source) = aggregator(source);

        let set = aggregator.collect(None, t0()).await;
        assert_eq!(set.context.reply_count("d1"), 3);
        assert!(!set.context.reply_counts.contains_key("other"));
        assert_eq!(set.context.discussion_count("n1"), 2);
        assert_eq!(set.context.endorsement_weight("bob"), 4.0);

        let requested = source.requested.lock().unwrap();
        assert_eq!(requested["reply_counts"], vec!["d1".to_string()]);
        assert_eq!(requested["edge_counts"], vec!["n1".to_string()]);
        assert_eq!(
            requested["endorsement_sums"],
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_aggregate_degrades_to_zero() {
        let mut source = MemorySource::default();
        source.records = vec![reply_record("a1", "bob", "d1", Duration::hours(1))];
        source.reply_counts.insert("d1".into(), 3);
        source.agree_votes.insert("d1".into(), 2.0);
        source.failing.insert("reply_counts");
        let (aggregator, _) = aggregator(source);

        let set = aggregator.collect(None, t0()).await;
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.context.reply_count("d1"), 0);
        assert_eq!(set.context.agree_votes("d1"), 2.0);
    }

    #[tokio::test]
    async fn latest_replies_batched_for_discussions_only() {
        let mut source = MemorySource::default();
        source.records = vec![
            node_record("a1", "alice", "n1", Duration::hours(1)),
            reply_record("a2", "bob", "d1", Duration::hours(1)),
            reply_record("a3", "carol", "d2", Duration::hours(1)),
        ];
        source.replies = vec![
            ReplySnapshot {
                id: "r1".into(),
                discussion_id: "d1".into(),
                author_id: "bob".into(),
                body: "first".into(),
                created_at: t0() - Duration::minutes(30),
            },
            ReplySnapshot {
                id: "r2".into(),
                discussion_id: "d1".into(),
                author_id: "dan".into(),
                body: "second".into(),
                created_at: t0() - Duration::minutes(10),
            },
        ];
        let (aggregator, source) = aggregator(source);

        let set = aggregator.collect(None, t0()).await;
        let latest = aggregator.latest_replies(&set.records).await;
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["d1"].id, "r2");
        assert_eq!(
            source.requested.lock().unwrap()["latest_replies"],
            vec!["d1".to_string(), "d2".to_string()]
        );
    }
}
