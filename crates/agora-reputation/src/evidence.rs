//! Verification evidence read by the scorer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Kind of an approved verification submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    EmailDomain,
    Orcid,
    ScholarProfile,
    InstitutionId,
    DocumentOrg,
    PeerEndorse,
}

impl SubmissionKind {
    /// Scholarly identity signals (ORCID and scholar profiles).
    pub const fn is_scholarly(self) -> bool {
        matches!(self, SubmissionKind::Orcid | SubmissionKind::ScholarProfile)
    }
}

/// A verified institution affiliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionAffiliation {
    pub institution_id: String,
    /// Institution reputation, 0-100.
    pub reputation: u8,
}

/// An inbound endorsement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endorsement {
    pub endorser_id: String,
    /// Nominal weight 1-5; out-of-range values are clamped when scoring.
    pub weight: i32,
}

impl Endorsement {
    /// Weight clamped to [1, 5].
    pub fn clamped_weight(&self) -> u32 {
        self.weight.clamp(1, 5) as u32
    }
}

/// Everything the verification workflow knows about one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEvidence {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub verified_documents: u32,
    #[serde(default)]
    pub institutions: Vec<InstitutionAffiliation>,
    #[serde(default)]
    pub approved_submissions: Vec<SubmissionKind>,
    #[serde(default)]
    pub endorsements: Vec<Endorsement>,
}

impl VerificationEvidence {
    /// Count of distinct domains, case-insensitive.
    pub fn unique_domains(&self) -> u32 {
        self.domains
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect::<BTreeSet<_>>()
            .len() as u32
    }

    /// Distinct institutions with their reputation (last affiliation wins).
    fn distinct_institutions(&self) -> HashMap<&str, u8> {
        self.institutions
            .iter()
            .map(|i| (i.institution_id.as_str(), i.reputation.min(100)))
            .collect()
    }

    /// Count of distinct verified institutions.
    pub fn institution_count(&self) -> u32 {
        self.distinct_institutions().len() as u32
    }

    /// Mean institution reputation, 0 when there are none.
    pub fn institution_reputation_avg(&self) -> f64 {
        let institutions = self.distinct_institutions();
        if institutions.is_empty() {
            return 0.0;
        }
        let total: u32 = institutions.values().map(|r| u32::from(*r)).sum();
        f64::from(total) / institutions.len() as f64
    }

    /// Sum of endorsement weights, each clamped to [1, 5].
    pub fn endorsement_weight(&self) -> u32 {
        self.endorsements.iter().map(Endorsement::clamped_weight).sum()
    }

    /// Approvals that are ORCID or scholar-profile.
    pub fn scholarly_approvals(&self) -> u32 {
        self.approved_submissions
            .iter()
            .filter(|k| k.is_scholarly())
            .count() as u32
    }

    /// Approvals of the email-domain kind.
    pub fn email_approvals(&self) -> u32 {
        self.approved_submissions
            .iter()
            .filter(|k| **k == SubmissionKind::EmailDomain)
            .count() as u32
    }

    /// Number of distinct approved submission kinds.
    pub fn submission_diversity(&self) -> u32 {
        self.approved_submissions
            .iter()
            .collect::<BTreeSet<_>>()
            .len() as u32
    }
}
