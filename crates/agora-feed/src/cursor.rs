//! Opaque pagination cursors and the feed's total order.
//!
//! Items are ordered by score descending, then creation time descending,
//! then activity id ascending. Activity ids are unique, so no two items ever
//! compare equal.
//!
//! A cursor is `base64(json {score, createdAt, activityId})` of the last item
//! on a page. Decoding is forgiving: anything that does not parse is simply
//! treated as "no cursor".

use crate::models::ScoredItem;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Position of an item in the feed's total order.
#[derive(Debug, Clone, Copy)]
pub struct RankKey<'a> {
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub activity_id: &'a str,
}

impl Ord for RankKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| self.activity_id.cmp(other.activity_id))
    }
}

impl PartialOrd for RankKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey<'_> {}

impl ScoredItem {
    /// This item's position in the feed order.
    pub fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            score: self.score,
            created_at: self.created_at,
            activity_id: &self.activity_id,
        }
    }
}

/// Boundary marker identifying the last item of a returned page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub activity_id: String,
}

impl Cursor {
    /// Cursor pointing at `item`.
    pub fn from_item(item: &ScoredItem) -> Self {
        Self {
            score: item.score,
            created_at: item.created_at,
            activity_id: item.activity_id.clone(),
        }
    }

    /// Position of the cursor in the feed order.
    pub fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            score: self.score,
            created_at: self.created_at,
            activity_id: &self.activity_id,
        }
    }

    /// Encode to the opaque wire form.
    pub fn encode(&self) -> String {
        let json = serde_json::json!({
            "score": self.score,
            "createdAt": self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            "activityId": self.activity_id,
        });
        general_purpose::STANDARD.encode(json.to_string())
    }

    /// Decode the wire form. Returns `None` for anything malformed.
    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let bytes = general_purpose::STANDARD
            .decode(raw)
            .or_else(|_| general_purpose::URL_SAFE.decode(raw))
            .ok()?;
        let cursor: Cursor = serde_json::from_slice(&bytes).ok()?;
        cursor.score.is_finite().then_some(cursor)
    }
}
