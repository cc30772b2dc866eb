// The single task that owns all session state.
//
// Socket tasks talk to it through `LoopEvent`s; it answers through the hub.
// Timers are the scheduler's deadlines, slept on right here.

use crate::domain::Clock;
use crate::interface_adapters::net::hub::{ConnectionHub, Link};
use crate::interface_adapters::protocol::{ProtocolError, decode_client_message};
use crate::use_cases::{ConnectionId, Delivery, Outbound, ServerEvent, SessionManager};
use axum::extract::ws::Utf8Bytes;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

#[derive(Debug)]
pub enum LoopEvent {
    // New socket: register its writer queue and hand back the connection id.
    Connected {
        link: Link,
        reply: oneshot::Sender<ConnectionId>,
    },
    Text {
        conn: ConnectionId,
        text: Utf8Bytes,
    },
    Binary {
        conn: ConnectionId,
    },
    Disconnected {
        conn: ConnectionId,
    },
    Shutdown,
}

enum LoopControl {
    Continue,
    Stop,
}

/// Runs until `Shutdown` arrives or every sender is gone.
///
/// `origin` must be the instant the manager's clock counts from.
pub async fn run_session_loop<C: Clock>(
    mut manager: SessionManager<C>,
    origin: Instant,
    mut events: mpsc::Receiver<LoopEvent>,
) {
    let mut hub = ConnectionHub::new();
    info!("session loop started");

    loop {
        let deadline = manager.next_deadline().map(|at| origin + at);
        let control = tokio::select! {
            event = events.recv() => match event {
                Some(event) => dispatch(&mut manager, &mut hub, event),
                None => LoopControl::Stop,
            },
            _ = sleep_until(deadline) => {
                hub.deliver(manager.run_due_timers());
                LoopControl::Continue
            }
        };
        if let LoopControl::Stop = control {
            break;
        }
    }

    info!(
        lobbies = manager.lobby_count(),
        connections = hub.len(),
        "session loop stopped"
    );
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn dispatch<C: Clock>(
    manager: &mut SessionManager<C>,
    hub: &mut ConnectionHub,
    event: LoopEvent,
) -> LoopControl {
    match event {
        LoopEvent::Connected { link, reply } => {
            let conn = manager.connect();
            hub.register(conn, link);
            if reply.send(conn).is_err() {
                // Socket task vanished before learning its id.
                hub.unregister(conn);
                hub.deliver(manager.disconnect(conn));
            }
        }
        LoopEvent::Text { conn, text } => match decode_client_message(text.as_str()) {
            Ok(command) => hub.deliver(manager.handle(conn, command)),
            Err(err) => reject(manager, hub, conn, err),
        },
        LoopEvent::Binary { conn } => reject(manager, hub, conn, ProtocolError::BinaryFrame),
        LoopEvent::Disconnected { conn } => {
            hub.unregister(conn);
            hub.deliver(manager.disconnect(conn));
        }
        LoopEvent::Shutdown => {
            hub.deliver(manager.shutdown());
            return LoopControl::Stop;
        }
    }
    LoopControl::Continue
}

fn reject<C: Clock>(
    manager: &mut SessionManager<C>,
    hub: &mut ConnectionHub,
    conn: ConnectionId,
    err: ProtocolError,
) {
    debug!(conn, error = %err, "protocol error");
    // A malformed message is still a sign of life.
    manager.touch(conn);
    hub.deliver(vec![Outbound::Deliver(Delivery {
        to: vec![conn],
        event: ServerEvent::Error {
            message: err.to_string(),
        },
    })]);
}
