//! Sorting and slicing of the ranked set.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::models::ScoredItem;
use serde::{Deserialize, Serialize};

/// Page size when the request gives none.
pub const DEFAULT_LIMIT: u32 = 30;

/// Smallest accepted page size.
pub const MIN_LIMIT: u32 = 5;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// Page request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRequest {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl FeedRequest {
    pub fn new(limit: Option<u32>, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    /// Reject a limit outside [`MIN_LIMIT`, `MAX_LIMIT`].
    pub fn validate(&self) -> Result<()> {
        match self.limit {
            Some(limit) if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) => {
                Err(Error::InvalidLimit(limit))
            }
            _ => Ok(()),
        }
    }

    /// Page size clamped to [`MIN_LIMIT`, `MAX_LIMIT`].
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT) as usize
    }

    /// The decoded cursor; malformed cursors read as absent.
    pub fn decoded_cursor(&self) -> Option<Cursor> {
        self.cursor.as_deref().and_then(Cursor::decode)
    }
}

/// One page of the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<ScoredItem>,
    /// Present only when the page is full; `None` marks the end of the feed.
    pub next_cursor: Option<String>,
}

/// Sort `items` into feed order and return the `limit` items strictly after
/// `cursor`.
pub fn paginate(mut items: Vec<ScoredItem>, limit: usize, cursor: Option<&Cursor>) -> FeedPage {
    items.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));

    let start = match cursor {
        Some(cursor) => {
            let boundary = cursor.rank_key();
            items.partition_point(|item| item.rank_key() <= boundary)
        }
        None => 0,
    };

    let items: Vec<ScoredItem> = items.into_iter().skip(start).take(limit).collect();
    let next_cursor = if limit > 0 && items.len() == limit {
        items.last().map(|last| Cursor::from_item(last).encode())
    } else {
        None
    };

    FeedPage { items, next_cursor }
}
