//! Turns scored activity records into feed items.

use crate::context::ScoreContext;
use crate::models::{
    ActivityRecord, DiscussionItem, EvidenceItem, FeedPayload, ItemShape, NodeItem, ReplySnapshot,
    ScoredItem,
};
use std::collections::HashMap;
use tracing::debug;

/// Keep only the most recent reply per discussion.
pub fn latest_per_discussion(
    replies: impl IntoIterator<Item = ReplySnapshot>,
) -> HashMap<String, ReplySnapshot> {
    let mut latest: HashMap<String, ReplySnapshot> = HashMap::new();
    for reply in replies {
        let newer = latest.get(&reply.discussion_id).map_or(true, |current| {
            (reply.created_at, reply.id.as_str()) > (current.created_at, current.id.as_str())
        });
        if newer {
            latest.insert(reply.discussion_id.clone(), reply);
        }
    }
    latest
}

/// Build the output item for one scored record.
///
/// Returns `None` (and logs) when the action has no feed shape or its
/// payload cannot be resolved.
pub fn hydrate(
    record: ActivityRecord,
    score: f64,
    ctx: &ScoreContext,
    latest_replies: &HashMap<String, ReplySnapshot>,
) -> Option<ScoredItem> {
    let payload = match record.activity.action.shape() {
        Some(ItemShape::Node) => {
            let node = record.node.as_ref()?;
            FeedPayload::Node(NodeItem {
                node_id: node.id.clone(),
                title: node.title.clone(),
                discipline_id: node.discipline_id.clone(),
                edges: ctx.edges(&node.id),
                discussion_count: ctx.discussion_count(&node.id),
            })
        }
        Some(ItemShape::Discussion) => {
            let discussion = record.discussion.as_ref()?;
            FeedPayload::Discussion(DiscussionItem {
                discussion_id: discussion.id.clone(),
                title: discussion.title.clone(),
                node_id: discussion.node_id.clone(),
                latest_reply: latest_replies.get(&discussion.id).cloned(),
                reply_count: ctx.reply_count(&discussion.id),
            })
        }
        Some(ItemShape::Evidence) => {
            let evidence = record.evidence.as_ref()?;
            FeedPayload::Evidence(EvidenceItem {
                evidence_id: evidence.id.clone(),
                title: evidence.title.clone(),
                node_id: evidence.node_id.clone(),
                node_title: evidence.node_title.clone(),
            })
        }
        None => {
            debug!(
                activity_id = %record.activity.id,
                action = ?record.activity.action,
                "activity has no feed shape, dropping"
            );
            return None;
        }
    };

    Some(ScoredItem {
        score,
        activity_id: record.activity.id,
        action: record.activity.action,
        created_at: record.activity.created_at,
        author: record.actor,
        payload,
    })
}
