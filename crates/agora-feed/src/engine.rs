//! Feed entry points.
//!
//! ```text
//! viewer → CandidateAggregator → score → hydrate → paginate → FeedPage
//!                                                        └─→ FeedCache (detached)
//! ```
//!
//! Both entry points always produce a page. Source failures degrade the
//! ranking signal (or empty the page) but never surface to the caller.

use crate::aggregator::{CandidateAggregator, CandidateSet};
use crate::cache::{spawn_cache_write, FeedCache, FEED_CACHE_TTL};
use crate::hydrator::hydrate;
use crate::paginator::{paginate, FeedPage, FeedRequest};
use crate::scoring::score;
use crate::source::FeedSource;
use agora_reputation::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Personalized and global feed ranking.
pub struct FeedEngine {
    aggregator: CandidateAggregator,
    clock: Arc<dyn Clock>,
    cache: Option<Arc<dyn FeedCache>>,
    cache_ttl: Duration,
}

impl FeedEngine {
    /// Create an engine reading from `source`.
    pub fn new(source: Arc<dyn FeedSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator: CandidateAggregator::new(source),
            clock,
            cache: None,
            cache_ttl: FEED_CACHE_TTL,
        }
    }

    /// Write each personalized page to `cache` with the given TTL.
    pub fn with_cache(mut self, cache: Arc<dyn FeedCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Personalized feed for `viewer_id`, falling back to the global feed
    /// when the viewer has no relevant activity.
    pub async fn get_feed(&self, viewer_id: &str, request: &FeedRequest) -> FeedPage {
        let set = self
            .aggregator
            .collect(Some(viewer_id), self.clock.now())
            .await;
        let page = self.rank(set, request).await;

        if let Some(cache) = &self.cache {
            spawn_cache_write(
                Arc::clone(cache),
                viewer_id.to_string(),
                page.items.clone(),
                self.cache_ttl,
            );
        }
        page
    }

    /// Anonymous/global feed.
    pub async fn get_global_feed(&self, request: &FeedRequest) -> FeedPage {
        let set = self.aggregator.global(self.clock.now()).await;
        self.rank(set, request).await
    }

    async fn rank(&self, set: CandidateSet, request: &FeedRequest) -> FeedPage {
        let latest_replies = self.aggregator.latest_replies(&set.records).await;
        let CandidateSet {
            scope,
            records,
            context,
        } = set;
        let candidates = records.len();

        let items: Vec<_> = records
            .into_iter()
            .filter_map(|record| {
                let relevance = score(&record, &context);
                hydrate(record, relevance, &context, &latest_replies)
            })
            .collect();

        let page = paginate(
            items,
            request.effective_limit(),
            request.decoded_cursor().as_ref(),
        );
        debug!(
            ?scope,
            candidates,
            returned = page.items.len(),
            has_more = page.next_cursor.is_some(),
            "ranked feed page"
        );
        page
    }
}
