//! Fan-out of serialized events to connected clients.
//!
//! The broadcaster is the hub's only output channel. Each open connection is
//! represented by the sending half of an unbounded channel drained by that
//! connection's writer task, so a send never blocks the event loop. A closed
//! or failing recipient is skipped without affecting the others.

use log::{debug, error, warn};
use shared::ServerEvent;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// Server-assigned identifier of a transport connection
pub type ConnectionId = u64;

/// Outbound half of a connection: one serialized JSON frame per message
pub type Outbox = mpsc::UnboundedSender<String>;

#[derive(Debug, Default)]
pub struct Broadcaster {
    /// Open connections in connection order
    connections: BTreeMap<ConnectionId, Outbox>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, outbox: Outbox) {
        self.connections.insert(connection_id, outbox);
    }

    pub fn unregister(&mut self, connection_id: ConnectionId) -> bool {
        self.connections.remove(&connection_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sends `event` to every open connection. Returns how many connections
    /// accepted the frame.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, outbox) in &self.connections {
            if outbox.is_closed() {
                debug!("Skipping closed connection {}", connection_id);
                continue;
            }
            match outbox.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => warn!("Failed to send to connection {}", connection_id),
            }
        }
        delivered
    }

    /// Sends `event` to a single connection.
    pub fn send_to(&self, connection_id: ConnectionId, event: &ServerEvent) -> bool {
        let Some(outbox) = self.connections.get(&connection_id) else {
            debug!("Dropping reply to unknown connection {}", connection_id);
            return false;
        };
        let Some(frame) = encode(event) else {
            return false;
        };
        if outbox.send(frame).is_err() {
            warn!("Failed to send to connection {}", connection_id);
            return false;
        }
        true
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("Failed to encode event: {}", e);
            None
        }
    }
}
