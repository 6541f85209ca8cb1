//! WebSocket listener and per-connection pump.
//!
//! Each accepted socket gets one task that owns both halves of the stream:
//! inbound frames are parsed and routed, outbound events drain from the
//! connection's channel, pings are answered in place. A dead socket is
//! reported to every room the connection touched and then forgotten.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TableConfig;
use crate::room::RoomRegistry;
use crate::tokio_tools::spawn_named;

use super::protocol::{ClientMessage, ServerMessage};
use super::router::{Connection, Router};

const LOG_TARGET: &str = "net::server";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub table: TableConfig,
}

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub async fn run_server(cfg: ServerConfig, cancel: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    info!(target = LOG_TARGET, bind = %cfg.bind, "listening");

    let registry = Arc::new(RoomRegistry::new(cfg.table, cancel.child_token()));
    let router = Arc::new(Router::new(registry));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let router = Arc::clone(&router);
                    let conn_cancel = cancel.child_token();
                    spawn_named(format!("conn-{peer}"), async move {
                        if let Err(err) = handle_connection(stream, peer, router, conn_cancel).await {
                            debug!(
                                target = LOG_TARGET,
                                peer = %peer,
                                error = %err,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(err) => {
                    warn!(target = LOG_TARGET, error = %err, "accept failed");
                }
            }
        }
    }

    info!(target = LOG_TARGET, "server stopped");
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    cancel: CancellationToken,
) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .context("websocket handshake failed")?;
    let (mut sink, mut source) = ws.split();
    let (events, mut outbox) = mpsc::unbounded_channel();
    let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    let mut conn = Connection::new(conn_id, events);
    debug!(target = LOG_TARGET, conn = conn_id, peer = %peer, "connected");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            outbound = outbox.recv() => {
                // The connection keeps one sender alive, so this is Some.
                let Some(event) = outbound else { break };
                let Ok(text) = serde_json::to_string(&event) else {
                    warn!(target = LOG_TARGET, conn = conn_id, "failed to serialize event");
                    continue;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => router.handle(&mut conn, msg).await,
                    Err(err) => {
                        debug!(
                            target = LOG_TARGET,
                            conn = conn_id,
                            error = %err,
                            "malformed intent"
                        );
                        let _ = conn.events.send(ServerMessage::Error {
                            message: format!("malformed message: {err}"),
                        });
                    }
                },
                Some(Ok(Message::Ping(payload))) => {
                    sink.send(Message::Pong(payload)).await.ok();
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(target = LOG_TARGET, conn = conn_id, ?frame, "socket closed by peer");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(target = LOG_TARGET, conn = conn_id, error = %err, "websocket error");
                    break;
                }
                None => break,
            }
        }
    }

    router.disconnect(&conn).await;
    debug!(target = LOG_TARGET, conn = conn_id, "disconnected");
    Ok(())
}
