//! Unix socket server for admin commands.
//!
//! Provides a local IPC interface for operator actions: forcing tier
//! recalculation after a verification decision, previewing scores and
//! flagging historical accounts.

use crate::error::Result;
use crate::node::NodeState;
use agora_reputation::{ReputationResult, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Admin command sent over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Recompute and persist a user's tier now
    RecalcTier { user_id: String },
    /// Score a user's evidence without persisting
    PreviewScore { user_id: String },
    /// Flag or unflag a historical account
    SetHistorical { user_id: String, historical: bool },
    /// List a user's tier transitions
    History { user_id: String },
    /// Ping (health check)
    Ping,
}

/// Response from admin command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok {
        message: String,
    },
    Error {
        error: String,
    },
    List {
        items: Vec<String>,
    },
    Tier {
        tier: Tier,
        score: u32,
        verified_at: Option<DateTime<Utc>>,
    },
    Score {
        result: ReputationResult,
    },
    Pong,
}

/// Admin socket server.
pub struct AdminSocket {
    state: Arc<NodeState>,
    socket_path: PathBuf,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(state: Arc<NodeState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind()?;
        tracing::info!("Admin socket listening on {:?}", self.socket_path);
        self.serve(listener).await
    }

    /// Bind the socket, replacing a stale socket file.
    pub fn bind(&self) -> Result<UnixListener> {
        let _ = std::fs::remove_file(&self.socket_path);
        Ok(UnixListener::bind(&self.socket_path)?)
    }

    /// Accept connections on an already bound listener.
    pub async fn serve(&self, listener: UnixListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

async fn handle_connection(stream: UnixStream, state: Arc<NodeState>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &state).await,
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

/// Run one command against the node state.
pub async fn execute_command(cmd: AdminCommand, state: &NodeState) -> AdminResponse {
    match cmd {
        AdminCommand::RecalcTier { user_id } => match state.tiers.recalc_and_persist(&user_id).await {
            Ok(outcome) => {
                tracing::info!(user = %user_id, tier = %outcome.tier, "Admin tier recalculation");
                AdminResponse::Tier {
                    tier: outcome.tier,
                    score: outcome.score,
                    verified_at: outcome.verified_at,
                }
            }
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::PreviewScore { user_id } => {
            match state.tiers.compute_verification_score(&user_id).await {
                Ok(result) => AdminResponse::Score { result },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::SetHistorical {
            user_id,
            historical,
        } => match state.storage.set_historical(&user_id, historical) {
            Ok(_) => {
                tracing::info!(user = %user_id, historical, "Updated historical flag");
                AdminResponse::Ok {
                    message: format!("{} historical={}", user_id, historical),
                }
            }
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::History { user_id } => match state.storage.reputation_history(&user_id) {
            Ok(entries) => AdminResponse::List {
                items: entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{} {} delta={}",
                            e.created_at.to_rfc3339(),
                            e.reason,
                            e.score_delta
                        )
                    })
                    .collect(),
            },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

/// Default socket path.
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var("AGORA_ADMIN_SOCKET") {
        return PathBuf::from(path);
    }
    let data_dir = std::env::var("AGORA_DATA_DIR").unwrap_or_else(|_| "./agora-data".to_string());
    PathBuf::from(data_dir).join("admin.sock")
}
