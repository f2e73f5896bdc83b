//! WebSocket signaling endpoint.
//!
//! One task per connection reads frames and drives the relay; a writer task
//! drains the connection's outbound queue into the socket. Whichever side
//! ends first ends the connection, and the relay cleans it up once.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use pairlink_services::{ConnectionId, Frame, Relay};

/// Signaling routes. Clients may connect on `/` or `/ws`.
pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/", get(handle_upgrade))
        .route("/ws", get(handle_upgrade))
        .with_state(relay)
}

async fn handle_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(relay): State<Relay>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, remote, relay))
}

async fn handle_socket(socket: WebSocket, remote: SocketAddr, relay: Relay) {
    let (handle, rx) = relay.open_connection(Some(remote));
    let conn = handle.id();
    tracing::info!(conn, %remote, "websocket connected");

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_frames(conn, sink, rx));

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    relay.on_message(conn, text.as_str()).await;
                }
                // Text frames only; a binary payload is never parsed, even if it holds JSON.
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!(conn, len = data.len(), "binary frame dropped");
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(conn, "websocket closed by client");
                    break;
                }
                // Ping/pong are answered by the transport.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    relay.on_transport_error(conn, &e).await;
                    break;
                }
            },

            result = &mut writer => {
                match result {
                    Ok(Ok(())) => tracing::debug!(conn, "writer finished"),
                    Ok(Err(e)) => relay.on_transport_error(conn, &e).await,
                    Err(e) => relay.on_transport_error(conn, &e).await,
                }
                break;
            }
        }
    }

    relay.on_close(conn).await;
    writer.abort();
    tracing::info!(conn, %remote, "websocket disconnected");
}

/// Drain queued frames into the socket until the queue closes, a close is
/// requested, or the socket fails.
async fn write_frames(
    conn: ConnectionId,
    mut sink: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Frame>,
) -> Result<(), axum::Error> {
    while let Some(frame) = rx.recv().await {
        match frame {
            Frame::Text(text) => sink.send(Message::Text(text.into())).await?,
            Frame::Close => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    tracing::debug!(conn, error = %e, "close frame not sent");
                }
                return Ok(());
            }
        }
    }
    Ok(())
}
