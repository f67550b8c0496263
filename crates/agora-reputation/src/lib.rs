//! Agora Reputation
//!
//! Turns a user's verification evidence into a bounded score and an ordinal
//! tier, and keeps the persisted tier current.
//!
//! # Components
//!
//! - **Scorer** ([`compute_verification_score`]): pure, diminishing-returns
//!   scoring over domains, documents, institutions, endorsements, scholarly
//!   identities and submission diversity.
//! - **Tiers** ([`infer_tier`]): fixed thresholds from score (and institution
//!   reputation for `Tier1`). Historical accounts are always `Tier1`.
//! - **Controller** ([`TierController`]): staleness check, rescoring and an
//!   atomic commit with an audit row on every tier change.
//!
//! The tier feeds the activity ranking as a multiplicative weight.

mod clock;
mod controller;
mod error;
mod evidence;
mod scorer;
mod tier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{
    ReputationHistoryEntry, TierCommit, TierController, TierOutcome, TierStore, UserReputation,
    TIER_STALE_AFTER_HOURS,
};
pub use error::{Error, Result};
pub use evidence::{Endorsement, InstitutionAffiliation, SubmissionKind, VerificationEvidence};
pub use scorer::{compute_verification_score, diminishing, ReputationResult, ScoreBreakdown};
pub use tier::{infer_tier, Tier};
