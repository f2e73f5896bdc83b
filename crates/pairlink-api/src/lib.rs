pub mod handlers;
pub mod signaling;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use pairlink_services::Relay;

pub use handlers::ApiState;

/// Admin routes, nested under `/api`.
pub fn api_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/peers", get(handlers::handle_peers))
        .route("/connections", get(handlers::handle_connections))
        .route("/daemon/shutdown", post(handlers::handle_shutdown))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

/// Serve the admin API until shutdown. Bind the listener to loopback.
pub async fn serve_api(
    listener: TcpListener,
    state: ApiState,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "admin API listening");
    axum::serve(listener, api_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    Ok(())
}

/// Serve the WebSocket signaling endpoint until shutdown.
pub async fn serve_signaling(
    listener: TcpListener,
    relay: Relay,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "signaling relay listening");
    axum::serve(
        listener,
        signaling::router(relay).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown.recv().await;
    })
    .await?;
    Ok(())
}
