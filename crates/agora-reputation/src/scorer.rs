//! Verification score with diminishing returns.
//!
//! Each signal contributes `round(sqrt(count) × factor)`, capped, so no
//! single kind of evidence can carry a user to the top tiers alone:
//!
//! | component    | input                                  | factor | cap |
//! |--------------|----------------------------------------|--------|-----|
//! | domains      | unique verified domains                | 12     | 30  |
//! | documents    | verified documents                     | 10     | 30  |
//! | institutions | distinct verified institutions         | 15     | 35  |
//! | endorsements | endorsement weight (each clamped 1-5)  | 5      | 20  |
//! | scholarly    | ORCID + scholar-profile approvals      | 6      | 10  |
//! | email        | email-domain approvals                 | 9      | 9   |
//! | diversity    | distinct approved submission kinds     | 5      | 12  |
//!
//! The sum is clamped to [0, 100].

use crate::evidence::VerificationEvidence;
use serde::{Deserialize, Serialize};

/// Upper bound of a verification score.
pub const MAX_SCORE: u32 = 100;

pub const DOMAIN_FACTOR: f64 = 12.0;
pub const DOMAIN_CAP: u32 = 30;
pub const DOCUMENT_FACTOR: f64 = 10.0;
pub const DOCUMENT_CAP: u32 = 30;
pub const INSTITUTION_FACTOR: f64 = 15.0;
pub const INSTITUTION_CAP: u32 = 35;
pub const ENDORSEMENT_FACTOR: f64 = 5.0;
pub const ENDORSEMENT_CAP: u32 = 20;
pub const SCHOLARLY_FACTOR: f64 = 6.0;
pub const SCHOLARLY_CAP: u32 = 10;
pub const EMAIL_FACTOR: f64 = 9.0;
pub const EMAIL_CAP: u32 = 9;
pub const DIVERSITY_FACTOR: f64 = 5.0;
pub const DIVERSITY_CAP: u32 = 12;

/// Square-root scaled, capped contribution.
///
/// Non-decreasing in `count`, never above `cap`, and 0 when `count` is 0.
pub fn diminishing(count: u32, factor: f64, cap: u32) -> u32 {
    if count == 0 || !factor.is_finite() || factor <= 0.0 {
        return 0;
    }
    let raw = (f64::from(count).sqrt() * factor).round();
    if raw >= f64::from(cap) {
        cap
    } else {
        raw as u32
    }
}

/// Per-component contributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub domains: u32,
    pub documents: u32,
    pub institutions: u32,
    pub endorsements: u32,
    pub scholarly: u32,
    pub email: u32,
    pub diversity: u32,
}

impl ScoreBreakdown {
    /// Sum of all components before clamping.
    pub fn total(&self) -> u32 {
        self.domains
            + self.documents
            + self.institutions
            + self.endorsements
            + self.scholarly
            + self.email
            + self.diversity
    }
}

/// Output of [`compute_verification_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationResult {
    /// Score in [0, 100].
    pub score: u32,
    /// Mean reputation of verified institutions, 0 if none.
    pub institution_reputation_avg: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score a user's verification evidence. Pure and side-effect free.
pub fn compute_verification_score(evidence: &VerificationEvidence) -> ReputationResult {
    let breakdown = ScoreBreakdown {
        domains: diminishing(evidence.unique_domains(), DOMAIN_FACTOR, DOMAIN_CAP),
        documents: diminishing(evidence.verified_documents, DOCUMENT_FACTOR, DOCUMENT_CAP),
        institutions: diminishing(
            evidence.institution_count(),
            INSTITUTION_FACTOR,
            INSTITUTION_CAP,
        ),
        endorsements: diminishing(
            evidence.endorsement_weight(),
            ENDORSEMENT_FACTOR,
            ENDORSEMENT_CAP,
        ),
        scholarly: diminishing(evidence.scholarly_approvals(), SCHOLARLY_FACTOR, SCHOLARLY_CAP),
        email: diminishing(evidence.email_approvals(), EMAIL_FACTOR, EMAIL_CAP),
        diversity: diminishing(
            evidence.submission_diversity(),
            DIVERSITY_FACTOR,
            DIVERSITY_CAP,
        ),
    };

    ReputationResult {
        score: breakdown.total().min(MAX_SCORE),
        institution_reputation_avg: evidence.institution_reputation_avg(),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Endorsement, InstitutionAffiliation, SubmissionKind};
    use crate::tier::{infer_tier, Tier};
    use proptest::prelude::*;

    fn strong_evidence() -> VerificationEvidence {
        VerificationEvidence {
            domains: vec!["a.edu".into(), "b.edu".into(), "c.org".into()],
            verified_documents: 3,
            institutions: vec![
                InstitutionAffiliation { institution_id: "i1".into(), reputation: 80 },
                InstitutionAffiliation { institution_id: "i2".into(), reputation: 90 },
            ],
            approved_submissions: vec![SubmissionKind::Orcid, SubmissionKind::ScholarProfile],
            endorsements: vec![
                Endorsement { endorser_id: "e1".into(), weight: 5 },
                Endorsement { endorser_id: "e2".into(), weight: 3 },
            ],
        }
    }

    #[test]
    fn empty_evidence_scores_zero() {
        let result = compute_verification_score(&VerificationEvidence::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.institution_reputation_avg, 0.0);
        assert_eq!(result.breakdown, ScoreBreakdown::default());
    }

    #[test]
    fn strong_profile_reaches_tier1() {
        let result = compute_verification_score(&strong_evidence());
        assert!(result.score > 60, "score {} should exceed 60", result.score);
        assert!((result.institution_reputation_avg - 85.0).abs() < 1e-9);
        assert_eq!(
            infer_tier(result.score, false, result.institution_reputation_avg),
            Tier::Tier1
        );
    }

    #[test]
    fn breakdown_values() {
        let b = compute_verification_score(&strong_evidence()).breakdown;
        assert_eq!(b.domains, 21); // sqrt(3) * 12 = 20.78
        assert_eq!(b.documents, 17); // sqrt(3) * 10 = 17.32
        assert_eq!(b.institutions, 21); // sqrt(2) * 15 = 21.21
        assert_eq!(b.endorsements, 14); // sqrt(8) * 5 = 14.14
        assert_eq!(b.scholarly, 8); // sqrt(2) * 6 = 8.49
        assert_eq!(b.email, 0);
        assert_eq!(b.diversity, 7); // sqrt(2) * 5 = 7.07
    }

    #[test]
    fn score_is_clamped_to_100() {
        let evidence = VerificationEvidence {
            domains: (0..50).map(|i| format!("d{}.edu", i)).collect(),
            verified_documents: 100,
            institutions: (0..20)
                .map(|i| InstitutionAffiliation {
                    institution_id: format!("i{}", i),
                    reputation: 100,
                })
                .collect(),
            approved_submissions: vec![
                SubmissionKind::EmailDomain,
                SubmissionKind::Orcid,
                SubmissionKind::ScholarProfile,
                SubmissionKind::InstitutionId,
                SubmissionKind::DocumentOrg,
                SubmissionKind::PeerEndorse,
            ],
            endorsements: (0..40)
                .map(|i| Endorsement { endorser_id: format!("e{}", i), weight: 5 })
                .collect(),
        };
        let result = compute_verification_score(&evidence);
        assert_eq!(result.score, MAX_SCORE);
        assert!(result.breakdown.total() > MAX_SCORE);
    }

    #[test]
    fn email_bonus_is_flat() {
        assert_eq!(diminishing(1, EMAIL_FACTOR, EMAIL_CAP), 9);
        assert_eq!(diminishing(4, EMAIL_FACTOR, EMAIL_CAP), 9);
    }

    proptest! {
        #[test]
        fn diminishing_is_monotonic(a in 0u32..10_000, b in 0u32..10_000, factor in 0.1f64..50.0, cap in 0u32..200) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(diminishing(lo, factor, cap) <= diminishing(hi, factor, cap));
        }

        #[test]
        fn diminishing_is_capped(count in 0u32..1_000_000, factor in 0.1f64..50.0, cap in 0u32..200) {
            prop_assert!(diminishing(count, factor, cap) <= cap);
        }

        #[test]
        fn diminishing_zero_count(factor in 0.1f64..50.0, cap in 0u32..200) {
            prop_assert_eq!(diminishing(0, factor, cap), 0);
        }
    }
}
