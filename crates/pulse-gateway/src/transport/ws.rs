//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Register the connection with the counter (guarded disconnect on any exit)
//! - Forward queued count updates to the socket
//! - Lifecycle: ping/pong heartbeat + idle timeout

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use pulse_core::error::Result;
use pulse_core::protocol::ServerFrame;
use pulse_core::ConnId;

use crate::app_state::AppState;
use crate::transport::codec::{decode, Inbound};

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    app.metrics().ws_upgrades.inc(&[]);
    ws.on_upgrade(move |socket| async move {
        let id = app.next_conn_id();
        let span = tracing::info_span!("session", conn = %id);
        if let Err(e) = run_session(app, id, socket).instrument(span.clone()).await {
            span.in_scope(|| tracing::debug!(error = %e, "session ended with error"));
        }
    })
}

/// Queue a frame without waiting; the session loop is the queue's only reader.
fn push(out_tx: &mpsc::Sender<Message>, frame: ServerFrame) {
    match frame.encode() {
        Ok(s) => {
            if out_tx.try_send(Message::Text(s)).is_err() {
                tracing::debug!("outbound queue full, frame dropped");
            }
        }
        Err(e) => tracing::error!(error = %e, "frame encode failed"),
    }
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, id: ConnId, socket: WebSocket) -> Result<()> {
    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(gw.outbound_queue);

    // Registered before the first read so the new client gets its own count.
    let _guard = app.counter().register(id, out_tx.clone())?;

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut ping_tick = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break; };
                if ws_tx.send(m).await.is_err() {
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match decode(msg) {
                    Ok(Inbound::Frame(f)) if f.is_ping() => push(&out_tx, ServerFrame::Pong),
                    Ok(Inbound::Frame(f)) => {
                        tracing::debug!(msg_type = %f.msg_type, "client frame ignored");
                    }
                    Ok(Inbound::Ping(payload)) => {
                        if out_tx.try_send(Message::Pong(payload)).is_err() {
                            tracing::debug!("outbound queue full, pong dropped");
                        }
                    }
                    Ok(Inbound::Pong) | Ok(Inbound::Ignored) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => tracing::debug!(error = %e, "undecodable client frame ignored"),
                }
            }

            // heartbeat
            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // idle timeout
            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                tracing::debug!("idle timeout");
                if let Ok(s) = ServerFrame::error("TIMEOUT", "idle timeout").encode() {
                    let _ = ws_tx.send(Message::Text(s)).await;
                }
                break;
            }
        }
    }

    let _ = ws_tx.send(Message::Close(None)).await;
    Ok(())
}
