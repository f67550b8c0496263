//! Persistent storage using RocksDB.
//!
//! Key layout (values are JSON):
//!
//! ```text
//! user:{id}
//! activity:{created_ms:020}:{id}          recency-ordered event log
//! follow:{follower}:{u|d}:{followee}
//! node:{id}
//! discussion:{id}
//! node_discussion:{node}:{discussion}    index, empty value
//! reply:{discussion}:{created_ms:020}:{id}
//! vote:{discussion}:{voter}
//! edge:out:{source}:{id} / edge:in:{target}:{id}
//! evidence:{id}
//! endorsement:{endorsee}:{endorser}
//! verification:{user}
//! history:{user}:{created_ms:020}:{id}
//! feedcache:{viewer}
//! ```
//!
//! The store implements [`FeedSource`], [`FeedCache`] and [`TierStore`], so
//! one instance backs both the feed engine and the tier controller.

use crate::error::{Error, Result};
use crate::models::{ArgumentNode, CachedFeed, Discussion, Edge, Evidence, Reply, Stance, User, Vote};
use agora_feed::models::{Activity, ActivityRecord, FollowEdge, FollowSets, Followee, ReplySnapshot, ScoredItem};
use agora_feed::{EdgeCounts, FeedCache, FeedSource};
use agora_reputation::{
    Clock, Endorsement, ReputationHistoryEntry, SystemClock, Tier, TierCommit, TierStore,
    UserReputation, VerificationEvidence,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Zero-padded millisecond timestamp so keys sort chronologically.
fn time_key(at: DateTime<Utc>) -> String {
    format!("{:020}", at.timestamp_millis().max(0))
}

/// Storage backend for Agora data.
pub struct Storage {
    db: DB,
    clock: Arc<dyn Clock>,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open storage that reads the time from `clock` (cache expiry).
    pub fn open_with_clock<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db, clock })
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_vec(value)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// All values under `prefix`, in key order.
    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let prefix = prefix.as_bytes();
        let mut values = Vec::new();

        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(serde_json::from_slice(&value)?);
        }

        Ok(values)
    }

    fn count(&self, prefix: &str) -> Result<u32> {
        let prefix = prefix.as_bytes();
        let mut count = 0;

        for item in self.db.prefix_iterator(prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }

        Ok(count)
    }

    /// The last value under `prefix` in key order.
    fn last<T: DeserializeOwned>(&self, prefix: &str) -> Result<Option<T>> {
        // ';' sorts right after ':', so seeking back from it lands on the
        // greatest key under `prefix`.
        let upper = format!("{};", prefix.trim_end_matches(':'));
        let mut iter = self
            .db
            .iterator(IteratorMode::From(upper.as_bytes(), Direction::Reverse));
        match iter.next() {
            Some(item) => {
                let (key, value) = item?;
                if key.starts_with(prefix.as_bytes()) {
                    Ok(Some(serde_json::from_slice(&value)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    // --- Users ---

    /// Store a user.
    pub fn put_user(&self, user: &User) -> Result<()> {
        self.put_json(&format!("user:{}", user.id), user)
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.get_json(&format!("user:{}", id))
    }

    /// Flag or unflag a user as a historical account.
    pub fn set_historical(&self, id: &str, historical: bool) -> Result<User> {
        let mut user = self
            .get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
        user.is_historical = historical;
        self.put_user(&user)?;
        Ok(user)
    }

    // --- Activity log ---

    /// Append an activity.
    pub fn put_activity(&self, activity: &Activity) -> Result<()> {
        let key = format!("activity:{}:{}", time_key(activity.created_at), activity.id);
        self.put_json(&key, activity)
    }

    /// Walk the log newest first down to `since`, joining each activity and
    /// keeping up to `limit` records accepted by `keep`.
    fn recent_records(
        &self,
        since: DateTime<Utc>,
        limit: usize,
        keep: impl Fn(&ActivityRecord) -> bool,
    ) -> Result<Vec<ActivityRecord>> {
        let mut records = Vec::new();
        if limit == 0 {
            return Ok(records);
        }

        let iter = self
            .db
            .iterator(IteratorMode::From(b"activity;", Direction::Reverse));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(b"activity:") {
                break;
            }
            let activity: Activity = serde_json::from_slice(&value)?;
            if activity.created_at < since {
                break;
            }
            if let Some(record) = self.join(activity)? {
                if keep(&record) {
                    records.push(record);
                    if records.len() >= limit {
                        break;
                    }
                }
            }
        }

        Ok(records)
    }

    /// Attach actor and target summaries. Missing targets stay `None`; an
    /// activity whose actor is gone is skipped.
    fn join(&self, activity: Activity) -> Result<Option<ActivityRecord>> {
        let Some(actor) = self.get_user(&activity.actor_id)? else {
            debug!(activity_id = %activity.id, actor = %activity.actor_id, "activity actor missing, skipping");
            return Ok(None);
        };

        let node = match activity.targets.node_id.as_deref() {
            Some(id) => self.get_node(id)?.map(|n| n.summary()),
            None => None,
        };
        let discussion = match activity.targets.discussion_id.as_deref() {
            Some(id) => match self.get_discussion(id)? {
                Some(d) => {
                    let parent = self.parent_node(d.node_id.as_deref())?;
                    Some(d.summary(parent.as_ref()))
                }
                None => None,
            },
            None => None,
        };
        let evidence = match activity.targets.evidence_id.as_deref() {
            Some(id) => match self.get_evidence(id)? {
                Some(e) => {
                    let parent = self.parent_node(e.node_id.as_deref())?;
                    Some(e.summary(parent.as_ref()))
                }
                None => None,
            },
            None => None,
        };

        Ok(Some(ActivityRecord {
            activity,
            actor: actor.summary(),
            node,
            discussion,
            evidence,
        }))
    }

    fn parent_node(&self, id: Option<&str>) -> Result<Option<ArgumentNode>> {
        match id {
            Some(id) => self.get_node(id),
            None => Ok(None),
        }
    }

    // --- Follow graph ---

    /// Store a follow edge. Re-following replaces the existing edge.
    pub fn put_follow(&self, edge: &FollowEdge) -> Result<()> {
        let key = match &edge.followee {
            Followee::User(id) => format!("follow:{}:u:{}", edge.follower_id, id),
            Followee::Discipline(id) => format!("follow:{}:d:{}", edge.follower_id, id),
        };
        self.put_json(&key, edge)
    }

    /// All follow edges of `follower_id`.
    pub fn list_follows(&self, follower_id: &str) -> Result<Vec<FollowEdge>> {
        self.scan(&format!("follow:{}:", follower_id))
    }

    // --- Argument graph ---

    /// Store a node.
    pub fn put_node(&self, node: &ArgumentNode) -> Result<()> {
        self.put_json(&format!("node:{}", node.id), node)
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: &str) -> Result<Option<ArgumentNode>> {
        self.get_json(&format!("node:{}", id))
    }

    /// Hard-delete a node. Activities pointing at it become orphaned.
    pub fn delete_node(&self, id: &str) -> Result<()> {
        self.db.delete(format!("node:{}", id).as_bytes())?;
        Ok(())
    }

    /// Store a discussion and index it under its node.
    pub fn put_discussion(&self, discussion: &Discussion) -> Result<()> {
        let mut batch = WriteBatch::default();
        batch.put(
            format!("discussion:{}", discussion.id).as_bytes(),
            serde_json::to_vec(discussion)?,
        );
        if let Some(node_id) = &discussion.node_id {
            batch.put(
                format!("node_discussion:{}:{}", node_id, discussion.id).as_bytes(),
                b"",
            );
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Get a discussion by ID.
    pub fn get_discussion(&self, id: &str) -> Result<Option<Discussion>> {
        self.get_json(&format!("discussion:{}", id))
    }

    /// Store a reply.
    pub fn put_reply(&self, reply: &Reply) -> Result<()> {
        let key = format!(
            "reply:{}:{}:{}",
            reply.discussion_id,
            time_key(reply.created_at),
            reply.id
        );
        self.put_json(&key, reply)
    }

    /// Store a vote, replacing the voter's previous vote on the discussion.
    pub fn put_vote(&self, vote: &Vote) -> Result<()> {
        self.put_json(&format!("vote:{}:{}", vote.discussion_id, vote.voter_id), vote)
    }

    /// Store an edge under both of its endpoints.
    pub fn put_edge(&self, edge: &Edge) -> Result<()> {
        let value = serde_json::to_vec(edge)?;
        let mut batch = WriteBatch::default();
        batch.put(format!("edge:out:{}:{}", edge.source_id, edge.id).as_bytes(), &value);
        batch.put(format!("edge:in:{}:{}", edge.target_id, edge.id).as_bytes(), &value);
        self.db.write(batch)?;
        Ok(())
    }

    /// Store evidence.
    pub fn put_evidence(&self, evidence: &Evidence) -> Result<()> {
        self.put_json(&format!("evidence:{}", evidence.id), evidence)
    }

    /// Get evidence by ID.
    pub fn get_evidence(&self, id: &str) -> Result<Option<Evidence>> {
        self.get_json(&format!("evidence:{}", id))
    }

    // --- Verification ---

    /// Record an endorsement of `endorsee_id`, one per endorser.
    pub fn put_endorsement(&self, endorsee_id: &str, endorsement: &Endorsement) -> Result<()> {
        let key = format!("endorsement:{}:{}", endorsee_id, endorsement.endorser_id);
        self.put_json(&key, endorsement)
    }

    /// Endorsements received by `user_id`.
    pub fn endorsements_for(&self, user_id: &str) -> Result<Vec<Endorsement>> {
        self.scan(&format!("endorsement:{}:", user_id))
    }

    /// Store the verification workflow's view of a user. Endorsements are
    /// kept as separate rows and not stored here.
    pub fn put_verification(&self, user_id: &str, evidence: &VerificationEvidence) -> Result<()> {
        let profile = VerificationEvidence {
            endorsements: Vec::new(),
            ..evidence.clone()
        };
        self.put_json(&format!("verification:{}", user_id), &profile)
    }

    /// Verification profile joined with the user's endorsements.
    pub fn verification_evidence(&self, user_id: &str) -> Result<VerificationEvidence> {
        let mut evidence: VerificationEvidence = self
            .get_json(&format!("verification:{}", user_id))?
            .unwrap_or_default();
        evidence.endorsements = self.endorsements_for(user_id)?;
        Ok(evidence)
    }

    // --- Reputation ---

    /// Apply a tier recalculation and its history row in one batch.
    pub fn commit_tier(&self, commit: &TierCommit) -> Result<()> {
        let mut user = self
            .get_user(&commit.user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", commit.user_id)))?;
        user.apply(commit);

        let mut batch = WriteBatch::default();
        batch.put(format!("user:{}", user.id).as_bytes(), serde_json::to_vec(&user)?);
        if let Some(entry) = &commit.history {
            let key = format!(
                "history:{}:{}:{}",
                entry.user_id,
                time_key(entry.created_at),
                entry.id
            );
            batch.put(key.as_bytes(), serde_json::to_vec(entry)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Tier history of a user, oldest first.
    pub fn reputation_history(&self, user_id: &str) -> Result<Vec<ReputationHistoryEntry>> {
        self.scan(&format!("history:{}:", user_id))
    }

    // --- Feed cache ---

    /// Replace the cached page of `viewer_id`.
    pub fn write_feed_cache(&self, viewer_id: &str, items: &[ScoredItem], ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::InvalidInput(format!("feed cache ttl: {}", e)))?;
        let now = self.clock.now();
        let cached = CachedFeed {
            viewer_id: viewer_id.to_string(),
            items: items.to_vec(),
            written_at: now,
            expires_at: now + ttl,
        };
        self.put_json(&format!("feedcache:{}", viewer_id), &cached)
    }

    /// The cached page of `viewer_id`, if one exists and has not expired.
    pub fn read_feed_cache(&self, viewer_id: &str) -> Result<Option<CachedFeed>> {
        let key = format!("feedcache:{}", viewer_id);
        match self.get_json::<CachedFeed>(&key)? {
            Some(cached) if cached.is_expired(self.clock.now()) => {
                self.db.delete(key.as_bytes())?;
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

#[async_trait]
impl FeedSource for Storage {
    async fn follow_sets(&self, viewer_id: &str) -> agora_feed::Result<FollowSets> {
        let edges = self.list_follows(viewer_id)?;
        Ok(FollowSets::from_edges(&edges))
    }

    async fn viewer_tier(&self, viewer_id: &str) -> agora_feed::Result<Option<Tier>> {
        Ok(self.get_user(viewer_id)?.map(|u| u.tier))
    }

    async fn personalized_candidates(
        &self,
        follows: &FollowSets,
        since: DateTime<Utc>,
        limit: usize,
    ) -> agora_feed::Result<Vec<ActivityRecord>> {
        Ok(self.recent_records(since, limit, |record| {
            let activity = &record.activity;
            follows.users.contains(&activity.actor_id)
                || activity
                    .targets
                    .discipline_id
                    .as_ref()
                    .is_some_and(|d| follows.disciplines.contains(d))
                || record
                    .node
                    .as_ref()
                    .is_some_and(|n| follows.users.contains(&n.author_id))
        })?)
    }

    async fn global_candidates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> agora_feed::Result<Vec<ActivityRecord>> {
        Ok(self.recent_records(since, limit, |_| true)?)
    }

    async fn reply_counts(&self, discussion_ids: &[String]) -> agora_feed::Result<HashMap<String, u32>> {
        let mut counts = HashMap::new();
        for id in discussion_ids {
            counts.insert(id.clone(), self.count(&format!("reply:{}:", id))?);
        }
        Ok(counts)
    }

    async fn agree_vote_sums(&self, discussion_ids: &[String]) -> agora_feed::Result<HashMap<String, f64>> {
        let mut sums = HashMap::new();
        for id in discussion_ids {
            let votes: Vec<Vote> = self.scan(&format!("vote:{}:", id))?;
            let agree = votes
                .iter()
                .filter(|v| v.stance == Stance::Agree)
                .map(|v| v.weight)
                .sum();
            sums.insert(id.clone(), agree);
        }
        Ok(sums)
    }

    async fn discussion_counts(&self, node_ids: &[String]) -> agora_feed::Result<HashMap<String, u32>> {
        let mut counts = HashMap::new();
        for id in node_ids {
            counts.insert(id.clone(), self.count(&format!("node_discussion:{}:", id))?);
        }
        Ok(counts)
    }

    async fn edge_counts(&self, node_ids: &[String]) -> agora_feed::Result<HashMap<String, EdgeCounts>> {
        let mut counts = HashMap::new();
        for id in node_ids {
            let edges = EdgeCounts {
                incoming: self.count(&format!("edge:in:{}:", id))?,
                outgoing: self.count(&format!("edge:out:{}:", id))?,
            };
            counts.insert(id.clone(), edges);
        }
        Ok(counts)
    }

    async fn endorsement_sums(&self, actor_ids: &[String]) -> agora_feed::Result<HashMap<String, f64>> {
        let mut sums = HashMap::new();
        for id in actor_ids {
            let total: u32 = self
                .endorsements_for(id)?
                .iter()
                .map(Endorsement::clamped_weight)
                .sum();
            sums.insert(id.clone(), f64::from(total));
        }
        Ok(sums)
    }

    async fn latest_replies(&self, discussion_ids: &[String]) -> agora_feed::Result<Vec<ReplySnapshot>> {
        let mut replies = Vec::new();
        for id in discussion_ids {
            if let Some(reply) = self.last::<Reply>(&format!("reply:{}:", id))? {
                replies.push(reply.snapshot());
            }
        }
        Ok(replies)
    }
}

#[async_trait]
impl FeedCache for Storage {
    async fn write(&self, viewer_id: &str, items: &[ScoredItem], ttl: Duration) -> agora_feed::Result<()> {
        Ok(self.write_feed_cache(viewer_id, items, ttl)?)
    }
}

#[async_trait]
impl TierStore for Storage {
    async fn load_user(&self, user_id: &str) -> agora_reputation::Result<Option<UserReputation>> {
        Ok(self.get_user(user_id)?.map(|u| u.reputation()))
    }

    async fn load_evidence(&self, user_id: &str) -> agora_reputation::Result<VerificationEvidence> {
        Ok(self.verification_evidence(user_id)?)
    }

    async fn commit(&self, commit: TierCommit) -> agora_reputation::Result<()> {
        match self.commit_tier(&commit) {
            Ok(()) => Ok(()),
            Err(Error::NotFound(_)) => Err(agora_reputation::Error::UserNotFound(commit.user_id)),
            Err(e) => Err(e.into()),
        }
    }
}
