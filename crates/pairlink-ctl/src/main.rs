//! pairlink-ctl — command-line interface for the pairlink relay daemon.

mod cmd;

use anyhow::{Context, Result};

use cmd::status::{cmd_connections, cmd_peers, cmd_shutdown, cmd_status};

const DEFAULT_PORT: u16 = 3001;

fn print_usage() {
    println!("Usage: pairlink-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status        Show relay status");
    println!("  peers         List registered identities and their counterparts");
    println!("  connections   List open signaling connections");
    println!("  shutdown      Stop the daemon");
    println!();
    println!("Options:");
    println!("  --port <port>   Admin API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | [] => cmd_status(port).await,
        ["peers"] => cmd_peers(port).await,
        ["connections"] => cmd_connections(port).await,
        ["shutdown"] => cmd_shutdown(port).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
