//! Follow graph edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Who or what is being followed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Followee {
    User(String),
    Discipline(String),
}

/// A follow relation, unique per (follower, followee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee: Followee,
    pub created_at: DateTime<Utc>,
}

/// The viewer's followed users and disciplines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    pub users: HashSet<String>,
    pub disciplines: HashSet<String>,
}

impl FollowSets {
    /// Build the sets from a viewer's follow edges.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a FollowEdge>) -> Self {
        let mut sets = Self::default();
        for edge in edges {
            match &edge.followee {
                Followee::User(id) => {
                    sets.users.insert(id.clone());
                }
                Followee::Discipline(id) => {
                    sets.disciplines.insert(id.clone());
                }
            }
        }
        sets
    }

    /// True when the viewer follows nothing.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.disciplines.is_empty()
    }
}
