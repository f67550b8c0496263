//! Relevance score of one candidate activity.
//!
//! ```text
//! engagement = ln(1 + base + replies×2 + agree×3 + endorsements×2)
//! freshness  = max(0.1, 1 - hours/72)
//! score      = (engagement + freshness)
//!              × tier_weight × relation_boost × discipline_boost
//!              × 1/sqrt(actor occurrences)
//! ```
//!
//! `replies` is the discussion's reply count plus half the node's discussion
//! count when the activity targets a node. Any non-finite result is 0.

use crate::context::ScoreContext;
use crate::models::ActivityRecord;
use agora_reputation::Tier;
use chrono::{DateTime, Utc};

/// Multiplier when the actor is followed by the viewer.
pub const RELATION_BOOST: f64 = 1.2;

/// Multiplier when the activity's discipline is followed by the viewer.
pub const DISCIPLINE_BOOST: f64 = 1.1;

/// Hours over which freshness decays linearly to its floor.
pub const FRESHNESS_HORIZON_HOURS: f64 = 72.0;

/// Lowest freshness an activity can decay to.
pub const FRESHNESS_FLOOR: f64 = 0.1;

/// Weight of the author's tier. Strictly decreasing from `Tier1` to `Tier4`.
pub const fn tier_weight(tier: Tier) -> f64 {
    match tier {
        Tier::Tier1 => 1.5,
        Tier::Tier2 => 1.3,
        Tier::Tier3 => 1.15,
        Tier::Tier4 => 1.0,
    }
}

/// Linear decay over [`FRESHNESS_HORIZON_HOURS`], floored at
/// [`FRESHNESS_FLOOR`]. Future timestamps count as brand new.
pub fn freshness(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = ((now - created_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    (1.0 - hours / FRESHNESS_HORIZON_HOURS).max(FRESHNESS_FLOOR)
}

/// Logarithmic engagement term.
pub fn engagement(record: &ActivityRecord, ctx: &ScoreContext) -> f64 {
    let targets = &record.activity.targets;

    let mut replies = targets
        .discussion_id
        .as_deref()
        .map(|id| f64::from(ctx.reply_count(id)))
        .unwrap_or(0.0);
    if let Some(node_id) = targets.node_id.as_deref() {
        replies += 0.5 * f64::from(ctx.discussion_count(node_id));
    }

    let agree = targets
        .discussion_id
        .as_deref()
        .map(|id| ctx.agree_votes(id))
        .unwrap_or(0.0);
    let endorsements = ctx.endorsement_weight(&record.activity.actor_id);

    (1.0 + record.activity.base_weight + replies * 2.0 + agree * 3.0 + endorsements * 2.0).ln()
}

/// Dampens prolific actors: `1/sqrt(occurrences)`.
pub fn balancing_factor(record: &ActivityRecord, ctx: &ScoreContext) -> f64 {
    1.0 / f64::from(ctx.actor_occurrences(&record.activity.actor_id)).sqrt()
}

/// Score one candidate. Pure and deterministic for a given context.
pub fn score(record: &ActivityRecord, ctx: &ScoreContext) -> f64 {
    let relation = if ctx.followed_users.contains(&record.activity.actor_id) {
        RELATION_BOOST
    } else {
        1.0
    };
    let discipline = match record.discipline() {
        Some(d) if ctx.followed_disciplines.contains(d) => DISCIPLINE_BOOST,
        _ => 1.0,
    };

    let total = (engagement(record, ctx) + freshness(record.activity.created_at, ctx.now))
        * tier_weight(record.actor.tier)
        * relation
        * discipline
        * balancing_factor(record, ctx);

    if total.is_finite() {
        total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionKind, Activity, AuthorSummary, DiscussionSummary, NodeSummary};
    use chrono::Duration;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn reply_record(age: Duration, tier: Tier) -> ActivityRecord {
        ActivityRecord {
            activity: Activity::new("a".into(), "alice".into(), ActionKind::Reply, now() - age)
                .with_discussion("d1")
                .with_weight(5.0),
            actor: AuthorSummary {
                id: "alice".into(),
                display_name: "Alice".into(),
                handle: "alice".into(),
                tier,
            },
            node: None,
            discussion: Some(DiscussionSummary {
                id: "d1".into(),
                title: "Is it?".into(),
                node_id: Some("n1".into()),
                node_discipline_id: Some("physics".into()),
            }),
            evidence: None,
        }
    }

    fn engaged_context(followed: bool) -> ScoreContext {
        let mut ctx = ScoreContext::new(now());
        ctx.reply_counts.insert("d1".into(), 2);
        ctx.agree_votes.insert("d1".into(), 4.0);
        if followed {
            ctx.followed_users.insert("alice".into());
            ctx.followed_disciplines.insert("physics".into());
        }
        ctx
    }

    #[test]
    fn tier_weights_strictly_decrease() {
        let weights: Vec<f64> = Tier::ALL.iter().map(|t| tier_weight(*t)).collect();
        assert_eq!(weights[0], 1.5);
        assert_eq!(weights[3], 1.0);
        assert!(weights.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn freshness_decays_to_floor() {
        assert_eq!(freshness(now(), now()), 1.0);
        assert!((freshness(now() - Duration::hours(36), now()) - 0.5).abs() < 1e-9);
        assert_eq!(freshness(now() - Duration::hours(72), now()), FRESHNESS_FLOOR);
        assert_eq!(freshness(now() - Duration::days(30), now()), FRESHNESS_FLOOR);
        assert_eq!(freshness(now() + Duration::hours(5), now()), 1.0);
    }

    #[test]
    fn engagement_formula() {
        let record = reply_record(Duration::hours(1), Tier::Tier1);
        let ctx = engaged_context(false);
        // 1 + 5 + 2×2 + 4×3 + 0 = 22
        assert!((engagement(&record, &ctx) - 22f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn node_discussions_count_half() {
        let mut record = reply_record(Duration::hours(1), Tier::Tier4);
        record.activity.action = ActionKind::CreateNode;
        record.activity.targets.discussion_id = None;
        record.activity.targets.node_id = Some("n1".into());
        record.activity.base_weight = 0.0;

        let mut ctx = ScoreContext::new(now());
        ctx.node_discussions.insert("n1".into(), 4);
        // 1 + 0 + (0.5×4)×2 = 5
        assert!((engagement(&record, &ctx) - 5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn followed_scores_higher() {
        let record = reply_record(Duration::hours(1), Tier::Tier1);
        let followed = score(&record, &engaged_context(true));
        let unfollowed = score(&record, &engaged_context(false));
        assert!(followed > unfollowed);
        assert!((followed / unfollowed - RELATION_BOOST * DISCIPLINE_BOOST).abs() < 1e-9);
    }

    #[test]
    fn fresh_scores_higher_than_old() {
        let ctx = engaged_context(true);
        let fresh = score(&reply_record(Duration::hours(1), Tier::Tier1), &ctx);
        let old = score(&reply_record(Duration::hours(70), Tier::Tier1), &ctx);
        assert!(fresh > old);
    }

    #[test]
    fn prolific_actor_is_dampened() {
        let record = reply_record(Duration::hours(1), Tier::Tier2);
        let mut ctx = engaged_context(false);
        let once = score(&record, &ctx);
        ctx.actor_frequency.insert("alice".into(), 4);
        let four_times = score(&record, &ctx);
        assert!((four_times / once - 0.5).abs() < 1e-12);
    }

    #[test]
    fn discipline_boost_uses_resolved_discipline() {
        let mut record = reply_record(Duration::hours(1), Tier::Tier3);
        record.node = Some(NodeSummary {
            id: "n1".into(),
            title: "N".into(),
            author_id: "bob".into(),
            discipline_id: Some("biology".into()),
        });
        let mut ctx = ScoreContext::new(now());
        ctx.followed_disciplines.insert("physics".into());
        let base = score(&record, &ctx);

        // The node's discipline wins over the discussion's
        ctx.followed_disciplines.insert("biology".into());
        assert!((score(&record, &ctx) / base - DISCIPLINE_BOOST).abs() < 1e-12);
    }

    #[test]
    fn non_finite_is_clamped() {
        let mut record = reply_record(Duration::hours(1), Tier::Tier1);
        record.activity.base_weight = f64::NAN;
        assert_eq!(score(&record, &ScoreContext::new(now())), 0.0);

        record.activity.base_weight = -10.0;
        assert_eq!(score(&record, &ScoreContext::new(now())), 0.0);

        record.activity.base_weight = f64::INFINITY;
        assert_eq!(score(&record, &ScoreContext::new(now())), 0.0);
    }

    proptest! {
        #[test]
        fn score_is_finite(weight in -1e6f64..1e6, hours in 0i64..10_000, replies in 0u32..10_000) {
            let mut record = reply_record(Duration::hours(hours), Tier::Tier2);
            record.activity.base_weight = weight;
            let mut ctx = ScoreContext::new(now());
            ctx.reply_counts.insert("d1".into(), replies);
            prop_assert!(score(&record, &ctx).is_finite());
        }
    }
}
