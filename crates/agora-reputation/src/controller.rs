//! Tier recalculation.
//!
//! Session refresh and verification decisions call into [`TierController`]
//! to keep the persisted tier in line with the user's current evidence.
//!
//! # Flow
//!
//! 1. Historical users are pinned to `Tier1`. Only score (and the tier, if
//!    it was somehow different) are written, and only when they changed.
//! 2. Everyone else gets a fresh score and a tier from [`infer_tier`].
//! 3. Score, tier and eval timestamp are committed. The first time a user
//!    lands in `Tier1`/`Tier2`, `verified_at` is stamped.
//! 4. A tier change appends a [`ReputationHistoryEntry`] in the same commit.
//!
//! Recalculations for one user are serialized by a keyed lock, and the user
//! is re-read under that lock, so two concurrent calls can never write two
//! history rows for the same transition.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::evidence::VerificationEvidence;
use crate::scorer::{compute_verification_score, ReputationResult};
use crate::tier::{infer_tier, Tier};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A tier older than this is recomputed on the session path.
pub const TIER_STALE_AFTER_HOURS: i64 = 24;

/// The reputation-relevant slice of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReputation {
    pub user_id: String,
    pub tier: Tier,
    pub reputation_score: u32,
    pub last_tier_eval_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub is_historical: bool,
}

impl UserReputation {
    /// Whether the tier must be recomputed at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.last_tier_eval_at {
            None => true,
            Some(at) => now - at > Duration::hours(TIER_STALE_AFTER_HOURS),
        }
    }
}

/// Immutable audit row written whenever a tier changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub previous_tier: Tier,
    pub next_tier: Tier,
    /// New score minus previous score.
    pub score_delta: i64,
    /// Transition label, e.g. `TIER3→TIER2`.
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl ReputationHistoryEntry {
    fn new(
        user_id: &str,
        previous: (Tier, u32),
        next: (Tier, u32),
        created_at: DateTime<Utc>,
    ) -> Self {
        let reason = format!("{}→{}", previous.0, next.0);
        let id = hex::encode(
            blake3::hash(
                format!("{}:{}:{}", user_id, created_at.timestamp_millis(), reason).as_bytes(),
            )
            .as_bytes(),
        );
        Self {
            id,
            user_id: user_id.to_string(),
            previous_tier: previous.0,
            next_tier: next.0,
            score_delta: i64::from(next.1) - i64::from(previous.1),
            reason,
            created_at,
        }
    }
}

/// One atomic write produced by a recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct TierCommit {
    pub user_id: String,
    pub score: u32,
    pub tier: Tier,
    pub evaluated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub history: Option<ReputationHistoryEntry>,
}

/// Result handed back to session/auth callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierOutcome {
    pub tier: Tier,
    pub score: u32,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Persistence used by the controller.
///
/// `commit` must apply every field of the [`TierCommit`], including the
/// optional history row, atomically.
#[async_trait]
pub trait TierStore: Send + Sync {
    async fn load_user(&self, user_id: &str) -> Result<Option<UserReputation>>;

    async fn load_evidence(&self, user_id: &str) -> Result<VerificationEvidence>;

    async fn commit(&self, commit: TierCommit) -> Result<()>;
}

/// Decides staleness, rescoring and persistence of user tiers.
pub struct TierController<S: TierStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: TierStore> TierController<S> {
    /// Create a controller over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: DashMap::new(),
        }
    }

    /// Score a user's evidence without persisting anything.
    pub async fn compute_verification_score(&self, user_id: &str) -> Result<ReputationResult> {
        self.load_existing(user_id).await?;
        let evidence = self.store.load_evidence(user_id).await?;
        Ok(compute_verification_score(&evidence))
    }

    /// Recompute and persist the user's tier unconditionally.
    pub async fn recalc_and_persist(&self, user_id: &str) -> Result<TierOutcome> {
        let lock = self.lock_for(user_id);
        let guard = lock.lock().await;
        let result = match self.load_existing(user_id).await {
            Ok(user) => self.recalc_locked(user).await,
            Err(e) => Err(e),
        };
        drop(guard);
        self.release(user_id, lock);
        result
    }

    /// Session-path entry point: recompute only when the tier is stale.
    ///
    /// Returns `None` when the stored tier is still fresh.
    pub async fn recalc_if_stale(&self, user_id: &str) -> Result<Option<TierOutcome>> {
        let lock = self.lock_for(user_id);
        let guard = lock.lock().await;
        let result = match self.load_existing(user_id).await {
            Ok(user) if user.is_stale(self.clock.now()) => self.recalc_locked(user).await.map(Some),
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        };
        drop(guard);
        self.release(user_id, lock);
        result
    }

    async fn load_existing(&self, user_id: &str) -> Result<UserReputation> {
        self.store
            .load_user(user_id)
            .await?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    async fn recalc_locked(&self, user: UserReputation) -> Result<TierOutcome> {
        let evidence = self.store.load_evidence(&user.user_id).await?;
        let result = compute_verification_score(&evidence);
        let now = self.clock.now();

        let (tier, verified_at) = if user.is_historical {
            let tier = Tier::Tier1;
            if user.reputation_score == result.score && user.tier == tier {
                debug!(user = %user.user_id, "historical user unchanged, skipping write");
                return Ok(TierOutcome {
                    tier,
                    score: user.reputation_score,
                    verified_at: user.verified_at,
                });
            }
            (tier, user.verified_at)
        } else {
            let tier = infer_tier(result.score, false, result.institution_reputation_avg);
            let verified_at = match user.verified_at {
                Some(at) => Some(at),
                None if tier.is_verified() => Some(now),
                None => None,
            };
            (tier, verified_at)
        };

        let history = (tier != user.tier).then(|| {
            ReputationHistoryEntry::new(
                &user.user_id,
                (user.tier, user.reputation_score),
                (tier, result.score),
                now,
            )
        });

        if history.is_some() {
            info!(
                user = %user.user_id,
                previous = %user.tier,
                next = %tier,
                score = result.score,
                "tier changed"
            );
        }

        self.store
            .commit(TierCommit {
                user_id: user.user_id.clone(),
                score: result.score,
                tier,
                evaluated_at: now,
                verified_at,
                history,
            })
            .await?;

        Ok(TierOutcome {
            tier,
            score: result.score,
            verified_at,
        })
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(user_id, |_, l| Arc::strong_count(l) == 1);
    }
}
