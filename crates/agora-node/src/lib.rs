//! Agora Node - feed and reputation service
//!
//! Serves the ranked activity feed and keeps user reputation tiers current
//! on top of a single RocksDB store.
//!
//! # Architecture
//!
//! - **Models**: users and argument-graph records
//! - **Storage**: RocksDB-backed store implementing the feed source, feed
//!   cache and tier store contracts
//! - **API**: HTTP endpoints for feeds, score previews and tier refreshes
//! - **Admin Socket**: Unix socket for operator commands (agora-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use agora_node::{AgoraNode, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env()?;
//!     let node = AgoraNode::new(config).await?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod admin_socket;
pub mod api;
pub mod error;
pub mod models;
pub mod node;
pub mod ratelimit;
pub mod storage;

pub use error::{Error, Result};
pub use models::{
    ArgumentNode, CachedFeed, Discussion, Edge, EdgeKind, Evidence, Reply, Stance, User, Vote,
};
pub use node::{AgoraNode, NodeConfig, NodeState};
pub use storage::Storage;
