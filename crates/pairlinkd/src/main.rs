//! pairlinkd — device/console WebRTC signaling relay daemon.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use pairlink_core::config::RelayConfig;
use pairlink_services::Relay;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load config
    if let Err(e) = RelayConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = RelayConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        let mut config = RelayConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    });

    let relay = Relay::new(&config).context("invalid pairing configuration")?;
    tracing::info!(
        strategy = relay.strategy().as_str(),
        pairs = relay.pair_count(),
        on_reregister = ?config.routing.on_reregister,
        "relay ready"
    );

    let signaling_addr = format!("{}:{}", config.network.bind_addr, config.network.port);
    let signaling_listener = TcpListener::bind(&signaling_addr)
        .await
        .with_context(|| format!("failed to bind signaling listener on {signaling_addr}"))?;

    let api_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.network.api_port));
    let api_listener = TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind admin API on {api_addr}"))?;

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let signaling_task = tokio::spawn(pairlink_api::serve_signaling(
        signaling_listener,
        relay.clone(),
        shutdown_tx.subscribe(),
    ));

    let api_task = tokio::spawn(pairlink_api::serve_api(
        api_listener,
        pairlink_api::ApiState {
            relay: relay.clone(),
            port: config.network.port,
            shutdown_tx: shutdown_tx.clone(),
        },
        shutdown_tx.subscribe(),
    ));

    let registry_printer = {
        let relay = relay.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let peers = relay.peers().await;
                tracing::debug!(
                    peers = peers.len(),
                    connections = relay.connection_count(),
                    "registry snapshot"
                );
                for p in &peers {
                    tracing::debug!(
                        identity = %p.identity,
                        conn = p.conn,
                        counterpart_online = p.counterpart_online,
                        "  peer"
                    );
                }
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = signaling_task     => tracing::error!("signaling server exited: {:?}", r),
        r = api_task           => tracing::error!("admin API exited: {:?}", r),
        r = registry_printer   => tracing::error!("registry printer exited: {:?}", r),
    }

    // Open websockets are not drained; give the servers a moment to stop accepting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
