//! HTTP API for the Agora node.

use crate::error::Error;
use crate::models::CachedFeed;
use crate::node::NodeState;
use agora_feed::{FeedPage, FeedRequest};
use agora_reputation::{ReputationHistoryEntry, ReputationResult, Tier, TierOutcome};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Feed
        .route("/api/v1/feed", get(get_feed))
        .route("/api/v1/feed/global", get(get_global_feed))
        .route("/api/v1/feed/cached", get(get_cached_feed))
        // Reputation
        .route("/api/v1/users/:id/reputation", get(preview_reputation))
        .route("/api/v1/users/:id/reputation/history", get(reputation_history))
        .route("/api/v1/users/:id/tier", post(recalc_tier))
        .route("/api/v1/users/:id/session", post(refresh_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!(error = %e, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn reputation_status(e: agora_reputation::Error) -> StatusCode {
    status_for(&Error::from(e))
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Feed endpoints ---

#[derive(Debug, Deserialize)]
struct FeedQuery {
    viewer: Option<String>,
    limit: Option<u32>,
    cursor: Option<String>,
}

impl FeedQuery {
    fn request(self) -> Result<(Option<String>, FeedRequest), StatusCode> {
        let request = FeedRequest::new(self.limit, self.cursor);
        request.validate().map_err(|_| StatusCode::BAD_REQUEST)?;
        Ok((self.viewer.filter(|v| !v.is_empty()), request))
    }
}

async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>, StatusCode> {
    let (viewer, request) = query.request()?;
    let page = match viewer {
        Some(viewer) => state.feed.get_feed(&viewer, &request).await,
        None => state.feed.get_global_feed(&request).await,
    };
    Ok(Json(page))
}

async fn get_global_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>, StatusCode> {
    let (_, request) = query.request()?;
    Ok(Json(state.feed.get_global_feed(&request).await))
}

#[derive(Debug, Deserialize)]
struct CachedQuery {
    viewer: String,
}

async fn get_cached_feed(
    State(state): State<AppState>,
    Query(query): Query<CachedQuery>,
) -> Result<Json<CachedFeed>, StatusCode> {
    match state.storage.read_feed_cache(&query.viewer) {
        Ok(Some(cached)) => Ok(Json(cached)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(status_for(&e)),
    }
}

// --- Reputation endpoints ---

async fn preview_reputation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReputationResult>, StatusCode> {
    state
        .tiers
        .compute_verification_score(&id)
        .await
        .map(Json)
        .map_err(reputation_status)
}

async fn recalc_tier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TierOutcome>, StatusCode> {
    if !state.limiter.check("recalc_tier", &id) {
        tracing::warn!(user = %id, "tier recalculation rate limited");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    state
        .tiers
        .recalc_and_persist(&id)
        .await
        .map(Json)
        .map_err(reputation_status)
}

/// Session refresh result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRefresh {
    recalculated: bool,
    tier: Tier,
    score: u32,
    verified_at: Option<DateTime<Utc>>,
}

async fn refresh_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionRefresh>, StatusCode> {
    let refreshed = state
        .tiers
        .recalc_if_stale(&id)
        .await
        .map_err(reputation_status)?;

    let response = match refreshed {
        Some(outcome) => SessionRefresh {
            recalculated: true,
            tier: outcome.tier,
            score: outcome.score,
            verified_at: outcome.verified_at,
        },
        None => {
            let user = state
                .storage
                .get_user(&id)
                .map_err(|e| status_for(&e))?
                .ok_or(StatusCode::NOT_FOUND)?;
            SessionRefresh {
                recalculated: false,
                tier: user.tier,
                score: user.reputation_score,
                verified_at: user.verified_at,
            }
        }
    };
    Ok(Json(response))
}

async fn reputation_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReputationHistoryEntry>>, StatusCode> {
    if state.storage.get_user(&id).map_err(|e| status_for(&e))?.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    state
        .storage
        .reputation_history(&id)
        .map(Json)
        .map_err(|e| status_for(&e))
}
