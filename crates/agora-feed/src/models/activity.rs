//! Activity log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a participant did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateNode,
    UpdateNode,
    CreateDiscussion,
    Reply,
    Vote,
    Support,
    Challenge,
    Contradict,
    Cite,
    AddEvidence,
    Endorse,
    Follow,
}

/// Output shape an activity is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemShape {
    Node,
    Discussion,
    Evidence,
}

impl ActionKind {
    /// The feed shape for this action, or `None` if it has no feed rendering.
    pub const fn shape(self) -> Option<ItemShape> {
        match self {
            ActionKind::CreateNode | ActionKind::UpdateNode => Some(ItemShape::Node),
            ActionKind::CreateDiscussion
            | ActionKind::Reply
            | ActionKind::Vote
            | ActionKind::Support
            | ActionKind::Challenge
            | ActionKind::Contradict
            | ActionKind::Cite => Some(ItemShape::Discussion),
            ActionKind::AddEvidence | ActionKind::Endorse => Some(ItemShape::Evidence),
            ActionKind::Follow => None,
        }
    }
}

/// Optional target references. One is meaningful per action kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discipline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<String>,
}

/// An immutable, append-only activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Globally unique id
    pub id: String,
    pub actor_id: String,
    pub action: ActionKind,
    #[serde(default)]
    pub targets: ActivityTargets,
    /// Base engagement weight recorded by the write path
    #[serde(default)]
    pub base_weight: f64,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Create an activity with no targets and zero weight.
    pub fn new(id: String, actor_id: String, action: ActionKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            actor_id,
            action,
            targets: ActivityTargets::default(),
            base_weight: 0.0,
            created_at,
        }
    }

    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.targets.node_id = Some(node_id.into());
        self
    }

    pub fn with_discussion(mut self, discussion_id: impl Into<String>) -> Self {
        self.targets.discussion_id = Some(discussion_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.targets.user_id = Some(user_id.into());
        self
    }

    pub fn with_discipline(mut self, discipline_id: impl Into<String>) -> Self {
        self.targets.discipline_id = Some(discipline_id.into());
        self
    }

    pub fn with_evidence(mut self, evidence_id: impl Into<String>) -> Self {
        self.targets.evidence_id = Some(evidence_id.into());
        self
    }

    pub fn with_weight(mut self, base_weight: f64) -> Self {
        self.base_weight = base_weight;
        self
    }
}
