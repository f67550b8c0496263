//! agora-admin CLI tool
//!
//! Operator commands for a running Agora node.
//!
//! Usage:
//!   agora-admin recalc-tier <user_id>
//!   agora-admin preview-score <user_id>
//!   agora-admin set-historical <user_id> <true|false>
//!   agora-admin history <user_id>
//!   agora-admin ping

use agora_node::admin_socket::{default_socket_path, AdminCommand, AdminResponse};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

fn print_usage() {
    eprintln!("agora-admin - Operate an Agora node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  agora-admin recalc-tier <user_id>                Recompute and persist a tier");
    eprintln!("  agora-admin preview-score <user_id>              Score evidence without saving");
    eprintln!("  agora-admin set-historical <user_id> <true|false> Flag a historical account");
    eprintln!("  agora-admin history <user_id>                    List tier transitions");
    eprintln!("  agora-admin ping                                 Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  AGORA_ADMIN_SOCKET  Path to admin socket (default: $AGORA_DATA_DIR/admin.sock)");
}

fn send_command(cmd: &AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = default_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to agora-node at {:?}: {}\n\
             Is the agora-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn user_arg(args: &[String], command: &str) -> String {
    match args.get(2) {
        Some(user_id) => user_id.clone(),
        None => {
            eprintln!("Error: {} requires a user_id argument", command);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "recalc-tier" => AdminCommand::RecalcTier {
            user_id: user_arg(&args, "recalc-tier"),
        },
        "preview-score" => AdminCommand::PreviewScore {
            user_id: user_arg(&args, "preview-score"),
        },
        "set-historical" => {
            let user_id = user_arg(&args, "set-historical");
            let historical = match args.get(3).map(String::as_str) {
                Some("true") => true,
                Some("false") => false,
                _ => {
                    eprintln!("Error: set-historical requires true or false");
                    std::process::exit(1);
                }
            };
            AdminCommand::SetHistorical {
                user_id,
                historical,
            }
        }
        "history" => AdminCommand::History {
            user_id: user_arg(&args, "history"),
        },
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(&cmd) {
        Ok(response) => match response {
            AdminResponse::Ok { message } => {
                println!("{}", message);
            }
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::List { items } => {
                if items.is_empty() {
                    println!("(none)");
                } else {
                    for item in items {
                        println!("{}", item);
                    }
                }
            }
            AdminResponse::Tier {
                tier,
                score,
                verified_at,
            } => {
                println!("tier:     {}", tier);
                println!("score:    {}", score);
                match verified_at {
                    Some(at) => println!("verified: {}", at.to_rfc3339()),
                    None => println!("verified: no"),
                }
            }
            AdminResponse::Score { result } => {
                let b = result.breakdown;
                println!("score:        {}", result.score);
                println!("institutions: avg reputation {:.1}", result.institution_reputation_avg);
                println!(
                    "breakdown:    domains={} documents={} institutions={} endorsements={} scholarly={} email={} diversity={}",
                    b.domains, b.documents, b.institutions, b.endorsements, b.scholarly, b.email, b.diversity
                );
            }
            AdminResponse::Pong => {
                println!("pong - agora-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
