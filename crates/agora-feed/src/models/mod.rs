//! Feed data models.
//!
//! # Inputs
//!
//! - [`Activity`] - append-only event log entry
//! - [`ActivityRecord`] - activity joined with actor and target summaries
//! - [`FollowEdge`] / [`FollowSets`] - the viewer's follow graph
//!
//! # Outputs
//!
//! - [`ScoredItem`] - a ranked item carrying one [`FeedPayload`] shape

mod activity;
mod follow;
mod item;
mod record;

pub use activity::{ActionKind, Activity, ActivityTargets, ItemShape};
pub use follow::{FollowEdge, FollowSets, Followee};
pub use item::{DiscussionItem, EvidenceItem, FeedPayload, NodeItem, ScoredItem};
pub use record::{
    ActivityRecord, AuthorSummary, DiscussionSummary, EvidenceSummary, NodeSummary, ReplySnapshot,
};
