//! Relay status, peers, connections, shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    port: u16,
    strategy: String,
    uptime_secs: u64,
    pairs: usize,
    peers_registered: usize,
    connections_open: usize,
}

#[derive(Deserialize)]
struct PeersResponse {
    peers: Vec<PeerInfo>,
}

#[derive(Deserialize)]
struct PeerInfo {
    identity: String,
    conn: u64,
    counterpart: Option<String>,
    counterpart_online: bool,
}

#[derive(Deserialize)]
struct ConnectionsResponse {
    connections: Vec<ConnectionItem>,
}

#[derive(Deserialize)]
struct ConnectionItem {
    conn: u64,
    remote: Option<String>,
    state: String,
    identity: Option<String>,
    age_secs: u64,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Pairlink Relay Status");
    println!("═══════════════════════════════════════");
    println!("  Signaling port   : {}", resp.port);
    println!("  Routing strategy : {}", resp.strategy);
    println!("  Configured pairs : {}", resp.pairs);
    println!("  Registered peers : {}", resp.peers_registered);
    println!("  Open connections : {}", resp.connections_open);
    println!("  Uptime           : {}s", resp.uptime_secs);

    Ok(())
}

pub async fn cmd_peers(port: u16) -> Result<()> {
    let resp: PeersResponse = get_json(&format!("{}/peers", base_url(port))).await?;

    if resp.peers.is_empty() {
        println!("No peers registered.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Registered Peers ({})", resp.peers.len());
    println!("═══════════════════════════════════════");

    for p in &resp.peers {
        let icon = if p.counterpart_online { "●" } else { "○" };
        println!("  ┌─ {} {}", icon, p.identity);
        println!("  │  conn        : #{}", p.conn);
        match &p.counterpart {
            Some(c) => {
                let state = if p.counterpart_online { "online" } else { "offline" };
                println!("  └─ counterpart : {} ({})", c, state);
            }
            None => println!("  └─ counterpart : (unpaired)"),
        }
    }

    Ok(())
}

pub async fn cmd_connections(port: u16) -> Result<()> {
    let resp: ConnectionsResponse =
        get_json(&format!("{}/connections", base_url(port))).await?;

    if resp.connections.is_empty() {
        println!("No open connections.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Open Connections ({})", resp.connections.len());
    println!("═══════════════════════════════════════");

    for c in &resp.connections {
        println!("  ┌─ #{}", c.conn);
        println!("  │  remote   : {}", c.remote.as_deref().unwrap_or("-"));
        println!("  │  state    : {}", c.state);
        if let Some(identity) = &c.identity {
            println!("  │  identity : {}", identity);
        }
        println!("  └─ age      : {}s", c.age_secs);
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    #[derive(Deserialize)]
    struct ShutdownResponse {
        message: String,
    }

    let resp: ShutdownResponse = post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}
