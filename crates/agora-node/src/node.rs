//! Agora node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API for feed and reputation reads/refreshes
//! - Unix admin socket for operator actions (agora-admin CLI)

use crate::admin_socket::AdminSocket;
use crate::api;
use crate::error::{Error, Result};
use crate::ratelimit::{
    RateLimiter, LIMITER_CLEANUP_INTERVAL, RECALC_MAX_PER_WINDOW, RECALC_WINDOW_SECS,
};
use crate::storage::Storage;
use agora_feed::{FeedEngine, FEED_CACHE_TTL};
use agora_reputation::{Clock, SystemClock, TierController};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for an Agora node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Admin socket path (for agora-admin CLI)
    pub admin_socket: PathBuf,

    /// Lifetime of cached feed pages
    pub feed_cache_ttl: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./agora-data");
        Self {
            admin_socket: data_dir.join("admin.sock"),
            data_dir,
            api_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            feed_cache_ttl: FEED_CACHE_TTL,
        }
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let data_dir = lookup("AGORA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let api_addr = match lookup("AGORA_API_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::InvalidInput(format!("AGORA_API_ADDR: {:?}", raw)))?,
            None => defaults.api_addr,
        };

        let admin_socket = lookup("AGORA_ADMIN_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("admin.sock"));

        let feed_cache_ttl = match lookup("AGORA_FEED_CACHE_TTL_SECS") {
            Some(raw) => raw.parse().map(Duration::from_secs).map_err(|_| {
                Error::InvalidInput(format!("AGORA_FEED_CACHE_TTL_SECS: {:?}", raw))
            })?,
            None => defaults.feed_cache_ttl,
        };

        Ok(Self {
            data_dir,
            api_addr,
            admin_socket,
            feed_cache_ttl,
        })
    }
}

/// Shared state for the node - one storage instance behind every component.
pub struct NodeState {
    pub storage: Arc<Storage>,
    pub feed: FeedEngine,
    pub tiers: TierController<Storage>,
    pub limiter: RateLimiter,
}

impl NodeState {
    /// Wire the feed engine, tier controller and rate limiter over `storage`.
    pub fn new(storage: Arc<Storage>, clock: Arc<dyn Clock>, feed_cache_ttl: Duration) -> Self {
        let feed = FeedEngine::new(storage.clone(), clock.clone())
            .with_cache(storage.clone(), feed_cache_ttl);
        let tiers = TierController::new(storage.clone(), clock.clone());
        let limiter = RateLimiter::new(
            clock,
            chrono::Duration::seconds(RECALC_WINDOW_SECS),
            RECALC_MAX_PER_WINDOW,
        );
        Self {
            storage,
            feed,
            tiers,
            limiter,
        }
    }
}

/// Periodically drop elapsed rate-limit windows.
pub fn spawn_limiter_cleanup(
    state: Arc<NodeState>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let before = state.limiter.len();
            state.limiter.cleanup();
            let dropped = before.saturating_sub(state.limiter.len());
            if dropped > 0 {
                tracing::debug!(dropped, "swept rate-limit windows");
            }
        }
    })
}

/// An Agora node instance.
pub struct AgoraNode {
    state: Arc<NodeState>,
    config: NodeConfig,
}

impl AgoraNode {
    /// Create a new node.
    pub async fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = Arc::new(Storage::open_with_clock(&config.data_dir, clock.clone())?);
        let state = Arc::new(NodeState::new(storage, clock, config.feed_cache_ttl));

        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts the admin socket and the HTTP server).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Agora node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Admin: {:?}", self.config.admin_socket);
        tracing::info!("  Data: {:?}", self.config.data_dir);

        let admin_socket = AdminSocket::new(self.state(), self.config.admin_socket.clone());
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        spawn_limiter_cleanup(self.state(), LIMITER_CLEANUP_INTERVAL);

        let app = api::build_router(self.state());

        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_reputation::ManualClock;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.admin_socket, PathBuf::from("./agora-data/admin.sock"));
        assert_eq!(config.feed_cache_ttl, Duration::from_secs(7200));
    }

    #[test]
    fn overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("AGORA_DATA_DIR", "/var/lib/agora"),
            ("AGORA_API_ADDR", "127.0.0.1:9090"),
            ("AGORA_FEED_CACHE_TTL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/agora"));
        assert_eq!(config.api_addr.port(), 9090);
        // Socket follows the data dir unless set
        assert_eq!(config.admin_socket, PathBuf::from("/var/lib/agora/admin.sock"));
        assert_eq!(config.feed_cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(
            NodeConfig::from_lookup(lookup(&[("AGORA_API_ADDR", "nope")])),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            NodeConfig::from_lookup(lookup(&[("AGORA_FEED_CACHE_TTL_SECS", "-1")])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn cleanup_task_drops_elapsed_windows() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let storage = Arc::new(Storage::open_with_clock(dir.path(), clock.clone()).unwrap());
        let state = Arc::new(NodeState::new(storage, clock.clone(), FEED_CACHE_TTL));

        // Unknown users still leave a window behind
        for i in 0..50 {
            state.limiter.check("recalc_tier", &format!("ghost-{}", i));
        }
        assert_eq!(state.limiter.len(), 50);

        let task = spawn_limiter_cleanup(state.clone(), Duration::from_millis(10));

        clock.advance(chrono::Duration::seconds(RECALC_WINDOW_SECS));
        let mut swept = false;
        for _ in 0..200 {
            if state.limiter.is_empty() {
                swept = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();
        assert!(swept, "{} windows left", state.limiter.len());
    }
}
