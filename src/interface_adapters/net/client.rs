use crate::interface_adapters::net::hub::Outgoing;
use crate::interface_adapters::net::session_loop::LoopEvent;
use crate::interface_adapters::state::AppState;
use crate::use_cases::ConnectionId;

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, info, info_span, warn};

enum LoopControl {
    Continue,
    Disconnect,
}

// Counters reported when the connection ends.
#[derive(Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let events = state.loop_tx.clone();
    let queue_capacity = state.outgoing_queue_capacity;
    ws.on_upgrade(move |socket| handle_socket(socket, events, queue_capacity))
}

async fn handle_socket(
    mut socket: WebSocket,
    events: mpsc::Sender<LoopEvent>,
    queue_capacity: usize,
) {
    let (link, mut outgoing) = mpsc::channel(queue_capacity);
    let (reply, assigned) = oneshot::channel();

    let registered = events.send(LoopEvent::Connected { link, reply }).await.is_ok();
    let conn = match (registered, assigned.await) {
        (true, Ok(conn)) => conn,
        _ => {
            warn!("session loop unavailable; refusing connection");
            close_with(&mut socket, close_code::AWAY, "server shutting down").await;
            return;
        }
    };

    let span = info_span!("conn", conn);
    async move {
        info!("client connected");
        let mut stats = ConnStats::default();
        run_client_loop(&mut socket, conn, &events, &mut outgoing, &mut stats).await;

        // The loop may already be gone during shutdown.
        let _ = events.send(LoopEvent::Disconnected { conn }).await;
        info!(
            msgs_in = stats.msgs_in,
            msgs_out = stats.msgs_out,
            bytes_in = stats.bytes_in,
            bytes_out = stats.bytes_out,
            "client disconnected"
        );
    }
    .instrument(span)
    .await;
}

async fn run_client_loop(
    socket: &mut WebSocket,
    conn: ConnectionId,
    events: &mpsc::Sender<LoopEvent>,
    outgoing: &mut mpsc::Receiver<Outgoing>,
    stats: &mut ConnStats,
) {
    let mut close_frame: Option<CloseFrame> = None;

    loop {
        let control = tokio::select! {
            incoming = socket.recv() => handle_incoming_ws(incoming, conn, events, stats).await,

            next = outgoing.recv() => match next {
                Some(Outgoing::Text(bytes)) => {
                    let len = bytes.len() as u64;
                    match socket.send(Message::Text(bytes)).await {
                        Ok(()) => {
                            stats.msgs_out += 1;
                            stats.bytes_out += len;
                            LoopControl::Continue
                        }
                        Err(err) => {
                            warn!(error = %err, "failed to send message");
                            LoopControl::Disconnect
                        }
                    }
                }
                Some(Outgoing::Close) => {
                    close_frame = Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: "session ended".into(),
                    });
                    LoopControl::Disconnect
                }
                None => {
                    close_frame = Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "server shutting down".into(),
                    });
                    LoopControl::Disconnect
                }
            },
        };

        if let LoopControl::Disconnect = control {
            break;
        }
    }

    if let Some(frame) = close_frame {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    if let Err(err) = socket.close().await {
        debug!(error = %err, "socket close error");
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    conn: ConnectionId,
    events: &mpsc::Sender<LoopEvent>,
    stats: &mut ConnStats,
) -> LoopControl {
    let msg = match incoming {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            return LoopControl::Disconnect;
        }
        None => {
            debug!("websocket stream ended");
            return LoopControl::Disconnect;
        }
    };

    let event = match msg {
        Message::Text(text) => {
            stats.msgs_in += 1;
            stats.bytes_in += text.len() as u64;
            LoopEvent::Text { conn, text }
        }
        Message::Binary(_) => {
            stats.msgs_in += 1;
            LoopEvent::Binary { conn }
        }
        Message::Ping(_) | Message::Pong(_) => return LoopControl::Continue,
        Message::Close(_) => return LoopControl::Disconnect,
    };

    match events.send(event).await {
        Ok(()) => LoopControl::Continue,
        Err(_) => {
            info!("session loop closed; disconnecting");
            LoopControl::Disconnect
        }
    }
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
    let _ = socket.close().await;
}
