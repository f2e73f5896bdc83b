//! Pairlink integration test harness.
//!
//! Each test starts its own relay in-process on ephemeral loopback ports and
//! talks to it over real WebSocket and HTTP connections:
//!
//!   cargo test --test integration
//!
//! Tests never share a relay, so they can run in parallel.

mod api;
mod presence;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use pairlink_core::config::{PairEntry, RelayConfig};
use pairlink_services::Relay;

// ── Harness ───────────────────────────────────────────────────────────────────

/// How long to wait for a frame that should arrive.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);
/// How long to listen before concluding nothing was sent.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A relay running in this process.
pub struct TestRelay {
    pub signaling_addr: SocketAddr,
    pub api_addr: SocketAddr,
    pub relay: Relay,
    pub shutdown_tx: broadcast::Sender<()>,
    pub signaling_task: JoinHandle<Result<()>>,
    pub api_task: JoinHandle<Result<()>>,
}

impl TestRelay {
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.signaling_addr, path)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.api_addr, path)
    }

    /// Open a client on `/` and register it as `identity`.
    pub async fn register(&self, identity: &str) -> Result<Client> {
        let mut client = connect(&self.ws_url("/")).await?;
        send_json(
            &mut client,
            &serde_json::json!({"type": "registration", "id": identity}),
        )
        .await?;
        Ok(client)
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.signaling_task.abort();
        self.api_task.abort();
    }
}

/// The pairing used by most tests.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.pairing.pairs = vec![
        PairEntry::new("device", "console"),
        PairEntry::new("poopush", "poopush_controller"),
    ];
    config
}

/// Start a relay with `config` on ephemeral loopback ports.
pub async fn start_relay(config: RelayConfig) -> Result<TestRelay> {
    let relay = Relay::new(&config).context("invalid test config")?;

    let signaling_listener = TcpListener::bind("127.0.0.1:0").await?;
    let api_listener = TcpListener::bind("127.0.0.1:0").await?;
    let signaling_addr = signaling_listener.local_addr()?;
    let api_addr = api_listener.local_addr()?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let signaling_task = tokio::spawn(pairlink_api::serve_signaling(
        signaling_listener,
        relay.clone(),
        shutdown_tx.subscribe(),
    ));
    let api_task = tokio::spawn(pairlink_api::serve_api(
        api_listener,
        pairlink_api::ApiState {
            relay: relay.clone(),
            port: signaling_addr.port(),
            shutdown_tx: shutdown_tx.clone(),
        },
        shutdown_tx.subscribe(),
    ));

    Ok(TestRelay {
        signaling_addr,
        api_addr,
        relay,
        shutdown_tx,
        signaling_task,
        api_task,
    })
}

pub async fn connect(url: &str) -> Result<Client> {
    let (client, _) = tokio_tungstenite::connect_async(url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    Ok(client)
}

pub async fn send_json(client: &mut Client, value: &Value) -> Result<()> {
    send_text(client, &value.to_string()).await
}

pub async fn send_text(client: &mut Client, text: &str) -> Result<()> {
    client
        .send(Message::text(text.to_string()))
        .await
        .context("failed to send frame")
}

/// Next text frame, parsed as JSON.
pub async fn recv_json(client: &mut Client) -> Result<Value> {
    let text = recv_text(client).await?;
    serde_json::from_str(&text).with_context(|| format!("frame is not JSON: {text}"))
}

/// Next text frame, verbatim. Control frames are skipped.
pub async fn recv_text(client: &mut Client) -> Result<String> {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .context("timed out waiting for a frame")?;
        match msg {
            Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_string()),
            Some(Ok(Message::Close(_))) | None => bail!("connection closed"),
            Some(Ok(_)) => continue,
            Some(Err(e)) => bail!("websocket error: {e}"),
        }
    }
}

/// Expect the next frame to carry `{"type": kind}`.
pub async fn expect_type(client: &mut Client, kind: &str) -> Result<Value> {
    let value = recv_json(client).await?;
    if value["type"] != kind {
        bail!("expected {kind}, got {value}");
    }
    Ok(value)
}

/// Fail if any text frame arrives within the quiet period.
pub async fn expect_silence(client: &mut Client) -> Result<()> {
    loop {
        match tokio::time::timeout(QUIET_PERIOD, client.next()).await {
            Err(_) => return Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected frame: {}", text.as_str()),
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => bail!("connection closed"),
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => bail!("websocket error: {e}"),
        }
    }
}

/// Expect the server to close the connection.
pub async fn expect_closed(client: &mut Client) -> Result<()> {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .context("timed out waiting for close")?;
        match msg {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return Ok(()),
            Some(Ok(Message::Text(text))) => bail!("expected close, got {}", text.as_str()),
            Some(Ok(_)) => continue,
        }
    }
}

/// Register a device/console pair and consume the presence frames.
pub async fn register_pair(relay: &TestRelay) -> Result<(Client, Client)> {
    let mut device = relay.register("device").await?;
    expect_type(&mut device, "remote-peer-offline").await?;
    let mut console = relay.register("console").await?;
    expect_type(&mut console, "remote-peer-online").await?;
    expect_type(&mut device, "remote-peer-online").await?;
    Ok((device, console))
}

/// Poll until `check` holds or the receive timeout passes.
pub async fn eventually<F, Fut>(mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    bail!("condition not reached in time")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// Both endpoints accept WebSocket upgrades.
#[tokio::test]
async fn test_relay_accepts_on_both_paths() -> Result<()> {
    let relay = start_relay(test_config()).await?;

    let _root = connect(&relay.ws_url("/")).await?;
    let _ws = connect(&relay.ws_url("/ws")).await?;

    let r = &relay.relay;
    eventually(move || async move { r.connection_count() == 2 }).await?;
    Ok(())
}

/// A plain HTTP request to the signaling port is not an upgrade.
#[tokio::test]
async fn test_plain_http_is_rejected() -> Result<()> {
    let relay = start_relay(test_config()).await?;
    let resp = reqwest::get(format!("http://{}/", relay.signaling_addr)).await?;
    assert!(resp.status().is_client_error(), "got {}", resp.status());
    Ok(())
}
