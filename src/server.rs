use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tracing::{debug, error, info, warn};

use crate::coordinator::{Command, CoordinatorHandle, coordinator_actor};
use crate::messages::ClientMessage;
use crate::types::{OutboundMessage, ParticipantId};

pub const DEFAULT_PORT: u16 = 8080;
const PING_INTERVAL: Duration = Duration::from_secs(30);
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain HTTP GETs on the shared port get a liveness confirmation
const HEALTH_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/plain\r\n\
    Connection: close\r\n\
    Content-Length: 37\r\n\r\n\
    WebSocket signaling server is running";

pub struct SignalingServer {
    handle: CoordinatorHandle,
}

impl Default for SignalingServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingServer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Command>(1024);
        tokio::spawn(coordinator_actor(rx));

        Self {
            handle: CoordinatorHandle { tx },
        }
    }

    pub async fn run(&self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Signaling server listening on {}", addr);

        loop {
            let (stream, addr) = listener.accept().await?;
            let handle = self.handle.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, handle).await {
                    error!("Connection error from {}: {}", addr, e);
                }
            });
        }
    }
}

/// Peek at the request head without consuming it; a bare GET that never
/// asks for an upgrade is a liveness probe, not a participant.
async fn is_websocket_upgrade(stream: &TcpStream) -> std::io::Result<bool> {
    let mut buf = [0u8; 1024];
    let n = stream.peek(&mut buf).await?;
    let head = String::from_utf8_lossy(&buf[..n]).to_ascii_lowercase();
    Ok(head.contains("upgrade: websocket"))
}

async fn handle_connection(
    mut stream: TcpStream,
    handle: CoordinatorHandle,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !is_websocket_upgrade(&stream).await? {
        stream.write_all(HEALTH_RESPONSE.as_bytes()).await?;
        stream.shutdown().await?;
        return Ok(());
    }

    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let id = ParticipantId::generate();
    info!("WebSocket connection established: {}", id);

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ctrl_tx, mut ctrl_rx) = mpsc::unbounded_channel::<Message>();

    handle.connect(id, tx).await;

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    let mut waiting_for_pong = false;
    let mut pong_deadline: Option<tokio::time::Instant> = None;

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    let ws_msg = Message::Text(msg.into_inner());
                    if ws_tx.send(ws_msg).await.is_err() {
                        break;
                    }
                }
                Some(ctrl_msg) = ctrl_rx.recv() => {
                    if ws_tx.send(ctrl_msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    loop {
        let pong_timeout = async {
            match pong_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = ping_interval.tick() => {
                if waiting_for_pong {
                    warn!("No Pong received, disconnecting {}", id);
                    break;
                }
                if ctrl_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
                waiting_for_pong = true;
                pong_deadline = Some(tokio::time::Instant::now() + PONG_TIMEOUT);
                debug!("Ping sent to {}", id);
            }

            _ = pong_timeout => {
                warn!("Pong timeout, disconnecting {}", id);
                break;
            }

            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        handle_text_frame(&text, id, &handle).await;
                    }
                    Message::Pong(_) => {
                        waiting_for_pong = false;
                        pong_deadline = None;
                        debug!("Pong received from {}", id);
                    }
                    Message::Close(_) => {
                        info!("Close received from {}", id);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    handle.disconnect(id).await;

    send_task.abort();
    info!("WebSocket disconnected: {}", id);

    Ok(())
}

/// Malformed frames are logged and dropped; the connection stays usable.
async fn handle_text_frame(text: &str, id: ParticipantId, handle: &CoordinatorHandle) {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Malformed frame from {}: {}", id, e);
            return;
        }
    };

    match serde_json::from_value::<ClientMessage>(value) {
        Ok(msg) => handle.handle_message(id, msg).await,
        Err(e) => debug!("Unrecognized message from {} ignored: {}", id, e),
    }
}
