// Per-connection writer queues owned by the session loop.
//
// Each delivery is serialized once; recipients share the same `Utf8Bytes`.
// Queues are bounded: a socket that stops draining loses frames instead of
// growing without limit.

use crate::interface_adapters::protocol::encode_event;
use crate::use_cases::{ConnectionId, Delivery, Outbound};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error};

/// What a socket task should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text(Utf8Bytes),
    Close,
}

pub type Link = mpsc::Sender<Outgoing>;

#[derive(Debug, Default)]
pub struct ConnectionHub {
    links: HashMap<ConnectionId, Link>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn: ConnectionId, link: Link) {
        self.links.insert(conn, link);
    }

    pub fn unregister(&mut self, conn: ConnectionId) {
        self.links.remove(&conn);
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Carries out transport instructions in order. Never blocks.
    pub fn deliver(&mut self, outbound: Vec<Outbound>) {
        for item in outbound {
            match item {
                Outbound::Deliver(delivery) => self.fan_out(delivery),
                Outbound::Close(conn) => {
                    // Removing the link guarantees nothing is queued after the close.
                    // On a full queue, dropping the sender still ends the socket task.
                    if let Some(link) = self.links.remove(&conn) {
                        let _ = link.try_send(Outgoing::Close);
                    }
                }
            }
        }
    }

    fn fan_out(&self, delivery: Delivery) {
        let Delivery { to, event } = delivery;
        let bytes = match encode_event(event) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "failed to serialize server event");
                return;
            }
        };

        for conn in to {
            let Some(link) = self.links.get(&conn) else {
                continue;
            };
            match link.try_send(Outgoing::Text(bytes.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!(conn, "writer queue full; dropping message");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(conn, "writer gone; dropping message");
                }
            }
        }
    }
}
