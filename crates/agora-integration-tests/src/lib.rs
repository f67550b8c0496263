//! Shared fixtures for the end-to-end tests.
//!
//! [`World`] owns a RocksDB store in a temporary directory, a manual clock
//! and the node state wired over them.

use agora_feed::models::{ActionKind, Activity, FollowEdge, Followee};
use agora_node::{ArgumentNode, Discussion, Evidence, NodeState, Reply, Storage, User};
use agora_reputation::{ManualClock, Tier};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

/// Fixed reference instant used by every fixture.
pub fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// A seeded store plus the services running over it.
pub struct World {
    _dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<Storage>,
    pub state: Arc<NodeState>,
}

impl World {
    pub fn new() -> agora_node::Result<Self> {
        let dir = tempfile::tempdir()?;
        let clock = Arc::new(ManualClock::new(t0()));
        let storage = Arc::new(Storage::open_with_clock(dir.path(), clock.clone())?);
        let state = Arc::new(NodeState::new(
            storage.clone(),
            clock.clone(),
            agora_feed::FEED_CACHE_TTL,
        ));
        Ok(Self {
            _dir: dir,
            clock,
            storage,
            state,
        })
    }

    /// Add a user already sitting at `tier`.
    pub fn user(&self, id: &str, tier: Tier) -> agora_node::Result<()> {
        let mut user = User::new(id.into(), id.to_uppercase(), id.into(), t0());
        user.tier = tier;
        self.storage.put_user(&user)
    }

    pub fn node(&self, id: &str, author: &str, discipline: Option<&str>) -> agora_node::Result<()> {
        self.storage.put_node(&ArgumentNode {
            id: id.into(),
            title: format!("Claim {}", id),
            author_id: author.into(),
            discipline_id: discipline.map(String::from),
            created_at: t0(),
        })
    }

    pub fn discussion(&self, id: &str, node: &str, author: &str) -> agora_node::Result<()> {
        self.storage.put_discussion(&Discussion {
            id: id.into(),
            title: format!("Thread {}", id),
            node_id: Some(node.into()),
            author_id: author.into(),
            created_at: t0(),
        })
    }

    pub fn evidence(&self, id: &str, node: &str, author: &str) -> agora_node::Result<()> {
        self.storage.put_evidence(&Evidence {
            id: id.into(),
            title: format!("Source {}", id),
            node_id: Some(node.into()),
            submitted_by: author.into(),
            created_at: t0(),
        })
    }

    pub fn reply(&self, id: &str, discussion: &str, author: &str, age: Duration) -> agora_node::Result<()> {
        self.storage.put_reply(&Reply {
            id: id.into(),
            discussion_id: discussion.into(),
            author_id: author.into(),
            body: format!("reply {}", id),
            created_at: t0() - age,
        })
    }

    pub fn follow(&self, follower: &str, followee: Followee) -> agora_node::Result<()> {
        self.storage.put_follow(&FollowEdge {
            follower_id: follower.into(),
            followee,
            created_at: t0(),
        })
    }

    /// Record an activity `age` before [`t0`].
    pub fn activity(
        &self,
        id: &str,
        actor: &str,
        action: ActionKind,
        age: Duration,
        target: impl FnOnce(Activity) -> Activity,
    ) -> agora_node::Result<()> {
        let activity = target(Activity::new(id.into(), actor.into(), action, t0() - age));
        self.storage.put_activity(&activity)
    }
}
