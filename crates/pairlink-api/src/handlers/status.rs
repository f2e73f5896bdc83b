//! /status, /peers, /connections, /daemon/shutdown handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub port: u16,
    pub strategy: String,
    pub uptime_secs: u64,
    pub pairs: usize,
    pub peers_registered: usize,
    pub connections_open: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let relay = &state.relay;
    Json(StatusResponse {
        port: state.port,
        strategy: relay.strategy().as_str().to_string(),
        uptime_secs: relay.uptime_secs(),
        pairs: relay.pair_count(),
        peers_registered: relay.registry().len().await,
        connections_open: relay.connection_count(),
    })
}

// ── /peers ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PeersResponse {
    pub peers: Vec<PeerInfo>,
}

#[derive(Serialize)]
pub struct PeerInfo {
    pub identity: String,
    pub conn: u64,
    pub counterpart: Option<String>,
    pub counterpart_online: bool,
}

pub async fn handle_peers(State(state): State<ApiState>) -> Json<PeersResponse> {
    let peers = state
        .relay
        .peers()
        .await
        .into_iter()
        .map(|p| PeerInfo {
            identity: p.identity,
            conn: p.conn,
            counterpart: p.counterpart,
            counterpart_online: p.counterpart_online,
        })
        .collect();

    Json(PeersResponse { peers })
}

// ── /connections ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<ConnectionItem>,
}

#[derive(Serialize)]
pub struct ConnectionItem {
    pub conn: u64,
    pub remote: Option<String>,
    pub state: String,
    pub identity: Option<String>,
    pub age_secs: u64,
}

pub async fn handle_connections(State(state): State<ApiState>) -> Json<ConnectionsResponse> {
    let connections = state
        .relay
        .connections()
        .into_iter()
        .map(|c| ConnectionItem {
            conn: c.conn,
            remote: c.remote.map(|a| a.to_string()),
            state: if c.identity.is_some() { "registered" } else { "unregistered" }.to_string(),
            identity: c.identity,
            age_secs: c.age_secs,
        })
        .collect();

    Json(ConnectionsResponse { connections })
}

// ── /daemon/shutdown ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());

    Json(ShutdownResponse {
        message: "Shutdown initiated".to_string(),
    })
}
