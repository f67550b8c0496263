//! Best-effort feed snapshot cache.
//!
//! After a viewer's page is produced, its items are written to a cache keyed
//! by viewer id for downstream read paths. The write runs detached from the
//! request and its failure is only logged.

use crate::error::Result;
use crate::models::ScoredItem;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default lifetime of a cached feed snapshot.
pub const FEED_CACHE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Destination for feed snapshots.
#[async_trait]
pub trait FeedCache: Send + Sync {
    /// Store `items` for `viewer_id`, replacing any previous snapshot.
    async fn write(&self, viewer_id: &str, items: &[ScoredItem], ttl: Duration) -> Result<()>;
}

/// Write `items` in the background. Empty pages are not cached.
pub fn spawn_cache_write(
    cache: Arc<dyn FeedCache>,
    viewer_id: String,
    items: Vec<ScoredItem>,
    ttl: Duration,
) -> Option<JoinHandle<()>> {
    if items.is_empty() {
        debug!(viewer = %viewer_id, "empty page, skipping feed cache write");
        return None;
    }
    Some(tokio::spawn(async move {
        if let Err(e) = cache.write(&viewer_id, &items, ttl).await {
            warn!(viewer = %viewer_id, error = %e, "feed cache write failed");
        }
    }))
}
