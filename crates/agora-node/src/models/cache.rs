//! Cached feed snapshot.

use agora_feed::models::ScoredItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last page produced for a viewer, kept until `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFeed {
    pub viewer_id: String,
    pub items: Vec<ScoredItem>,
    pub written_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedFeed {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
