//! Agora Feed
//!
//! Ranks recent activity for a viewer. A request runs one pipeline:
//!
//! 1. **Aggregate**: pick up to 60 candidate activities (personalized or
//!    global) and fetch their aggregates concurrently.
//! 2. **Score**: author tier, freshness, engagement, relation and
//!    discipline boosts, divided by the actor's frequency in the set.
//! 3. **Hydrate**: shape each record as a node, discussion or evidence item.
//! 4. **Paginate**: total order on `(score desc, created_at desc, id asc)`
//!    with an opaque cursor.
//!
//! Storage is reached only through [`FeedSource`] and [`FeedCache`].

mod aggregator;
mod cache;
mod context;
mod cursor;
mod engine;
mod error;
mod hydrator;
pub mod models;
mod paginator;
pub mod scoring;
mod source;

#[cfg(test)]
mod testing;

pub use aggregator::{
    CandidateAggregator, CandidateSet, FeedScope, CANDIDATE_LIMIT, GLOBAL_WINDOW_HOURS,
    PERSONAL_WINDOW_HOURS,
};
pub use cache::{spawn_cache_write, FeedCache, FEED_CACHE_TTL};
pub use context::{EdgeCounts, ScoreContext};
pub use cursor::{Cursor, RankKey};
pub use engine::FeedEngine;
pub use error::{Error, Result};
pub use hydrator::{hydrate, latest_per_discussion};
pub use paginator::{paginate, FeedPage, FeedRequest, DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
pub use source::FeedSource;
