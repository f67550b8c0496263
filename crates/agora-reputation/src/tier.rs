//! Reputation tiers and score thresholds.
//!
//! Tiers are ordinal: `Tier1` is the highest class, `Tier4` the lowest.
//! Inference from a verification score uses fixed thresholds:
//!
//! - `Tier1` needs score ≥ 80 **and** institution reputation average ≥ 70
//! - `Tier2` needs score ≥ 60
//! - `Tier3` needs score ≥ 35
//! - everything else is `Tier4`
//!
//! Historical accounts are always `Tier1`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum score for `Tier1`.
pub const TIER1_MIN_SCORE: u32 = 80;

/// Minimum institution reputation average for `Tier1`.
pub const TIER1_MIN_INSTITUTION_AVG: f64 = 70.0;

/// Minimum score for `Tier2`.
pub const TIER2_MIN_SCORE: u32 = 60;

/// Minimum score for `Tier3`.
pub const TIER3_MIN_SCORE: u32 = 35;

/// Ordinal reputation class persisted on the user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
    #[default]
    Tier4,
}

impl Tier {
    /// All tiers, best first.
    pub const ALL: [Tier; 4] = [Tier::Tier1, Tier::Tier2, Tier::Tier3, Tier::Tier4];

    /// Rank where 1 is best and 4 is worst.
    pub const fn rank(self) -> u8 {
        match self {
            Tier::Tier1 => 1,
            Tier::Tier2 => 2,
            Tier::Tier3 => 3,
            Tier::Tier4 => 4,
        }
    }

    /// Whether this tier counts as a verified account (`Tier1` or `Tier2`).
    pub const fn is_verified(self) -> bool {
        matches!(self, Tier::Tier1 | Tier::Tier2)
    }

    /// Wire name, e.g. `TIER1`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Tier1 => "TIER1",
            Tier::Tier2 => "TIER2",
            Tier::Tier3 => "TIER3",
            Tier::Tier4 => "TIER4",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infer a tier from a verification score.
///
/// `is_historical` short-circuits to `Tier1` regardless of score.
pub fn infer_tier(score: u32, is_historical: bool, institution_reputation_avg: f64) -> Tier {
    if is_historical {
        return Tier::Tier1;
    }
    if score >= TIER1_MIN_SCORE && institution_reputation_avg >= TIER1_MIN_INSTITUTION_AVG {
        Tier::Tier1
    } else if score >= TIER2_MIN_SCORE {
        Tier::Tier2
    } else if score >= TIER3_MIN_SCORE {
        Tier::Tier3
    } else {
        Tier::Tier4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn thresholds() {
        assert_eq!(infer_tier(100, false, 90.0), Tier::Tier1);
        assert_eq!(infer_tier(80, false, 70.0), Tier::Tier1);
        // High score but weak institutions caps at Tier2
        assert_eq!(infer_tier(95, false, 69.9), Tier::Tier2);
        assert_eq!(infer_tier(60, false, 0.0), Tier::Tier2);
        assert_eq!(infer_tier(59, false, 100.0), Tier::Tier3);
        assert_eq!(infer_tier(35, false, 0.0), Tier::Tier3);
        assert_eq!(infer_tier(34, false, 0.0), Tier::Tier4);
        assert_eq!(infer_tier(0, false, 0.0), Tier::Tier4);
    }

    #[test]
    fn historical_is_always_tier1() {
        assert_eq!(infer_tier(0, true, 0.0), Tier::Tier1);
        assert_eq!(infer_tier(50, true, 10.0), Tier::Tier1);
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&Tier::Tier1).unwrap(), "\"TIER1\"");
        let parsed: Tier = serde_json::from_str("\"TIER3\"").unwrap();
        assert_eq!(parsed, Tier::Tier3);
        assert_eq!(Tier::Tier4.to_string(), "TIER4");
    }

    #[test]
    fn verified_tiers() {
        assert!(Tier::Tier1.is_verified());
        assert!(Tier::Tier2.is_verified());
        assert!(!Tier::Tier3.is_verified());
        assert!(!Tier::Tier4.is_verified());
    }

    proptest! {
        #[test]
        fn monotonic_in_score(a in 0u32..=100, b in 0u32..=100, avg in 0.0f64..=100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            // Lower rank number is a better tier
            prop_assert!(infer_tier(hi, false, avg).rank() <= infer_tier(lo, false, avg).rank());
        }

        #[test]
        fn historical_ignores_score(score in 0u32..=100, avg in 0.0f64..=100.0) {
            prop_assert_eq!(infer_tier(score, true, avg), Tier::Tier1);
        }
    }
}
