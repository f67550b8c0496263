//! Records stored by the Agora node.
//!
//! # Users
//!
//! - [`User`] - profile, persisted tier and reputation fields
//!
//! # Argument graph
//!
//! - [`ArgumentNode`] - a published claim
//! - [`Discussion`] / [`Reply`] / [`Vote`] - threads hanging off nodes
//! - [`Edge`] - typed relation between two nodes
//! - [`Evidence`] - supporting material attached to a node
//!
//! # Feed
//!
//! - [`CachedFeed`] - short-lived snapshot of a viewer's last page

mod cache;
mod graph;
mod user;

pub use cache::CachedFeed;
pub use graph::{ArgumentNode, Discussion, Edge, EdgeKind, Evidence, Reply, Stance, Vote};
pub use user::User;
