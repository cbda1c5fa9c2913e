//! The hub: single owner of all shared state.
//!
//! Transport tasks, the control plane and deferred timers never touch state
//! directly. They post [`ServerMessage`]s to one channel, and [`Hub::run`]
//! applies them one at a time alongside the pursuit tick and the inactivity
//! sweep. Nothing here needs a lock.

use crate::broadcaster::{Broadcaster, ConnectionId, Outbox};
use crate::config::ServerConfig;
use crate::control::{ControlReply, ControlRequest};
use crate::error::HubError;
use crate::reaper::InactivityReaper;
use crate::reconciler::{normalize_coordinates, PositionReconciler, SlotUpdate};
use crate::registry::ConnectionRegistry;
use crate::session::{Deferred, DeferredQueue, SessionController};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use shared::{ClientMessage, MapCatalog, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// Messages sent from network and control tasks to the hub loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        connection_id: ConnectionId,
        outbox: Outbox,
    },
    Received {
        connection_id: ConnectionId,
        text: String,
    },
    Closed {
        connection_id: ConnectionId,
    },
    Control {
        request: ControlRequest,
        reply: oneshot::Sender<ControlReply>,
    },
    Shutdown,
}

pub struct Hub {
    registry: ConnectionRegistry,
    reconciler: PositionReconciler,
    broadcaster: Broadcaster,
    session: SessionController,
    reaper: InactivityReaper,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    deferred_rx: mpsc::UnboundedReceiver<Deferred>,
}

impl Hub {
    pub fn new(config: ServerConfig, catalog: MapCatalog) -> Self {
        Self::with_rng(config, catalog, StdRng::from_entropy())
    }

    /// Builds a hub whose hunter randomness comes from `rng`.
    pub fn with_rng(config: ServerConfig, catalog: MapCatalog, rng: StdRng) -> Self {
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (deferred_tx, deferred_rx) = mpsc::unbounded_channel();

        Self {
            registry: ConnectionRegistry::new(),
            reconciler: PositionReconciler::new(config.update_throttle),
            broadcaster: Broadcaster::new(),
            reaper: InactivityReaper::new(config.inactivity_timeout, config.reaper_period),
            session: SessionController::with_rng(
                config,
                catalog,
                DeferredQueue::new(deferred_tx),
                rng,
            ),
            server_tx,
            server_rx,
            deferred_rx,
        }
    }

    /// Handle used by transport and control tasks to reach the hub.
    pub fn sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Main loop; returns after a [`ServerMessage::Shutdown`].
    pub async fn run(&mut self) {
        let mut reap_interval = self.reaper.interval();

        info!("Hub started");

        loop {
            tokio::select! {
                // Handle network and control events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Hub shutting down");
                            break;
                        }
                        Some(message) => self.handle_message(message),
                    }
                },

                Some(deferred) = self.deferred_rx.recv() => {
                    self.session.handle_deferred(deferred, &self.broadcaster);
                },

                _ = self.session.next_tick() => {
                    self.session.on_tick(&self.registry, &self.broadcaster);
                },

                _ = reap_interval.tick() => {
                    self.reap(Instant::now());
                },
            }
        }
    }

    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected {
                connection_id,
                outbox,
            } => {
                info!("Connection {} opened", connection_id);
                self.broadcaster.register(connection_id, outbox);
                self.session.schedule_join_sync();
            }
            ServerMessage::Received {
                connection_id,
                text,
            } => {
                if let Err(e) = self.handle_text(connection_id, &text) {
                    warn!("Dropping message from connection {}: {}", connection_id, e);
                }
            }
            ServerMessage::Closed { connection_id } => {
                self.broadcaster.unregister(connection_id);
                for id in self.registry.release_connection(connection_id) {
                    self.broadcaster.broadcast(&ServerEvent::Disconnect { id });
                }
                info!("Connection {} closed", connection_id);
            }
            ServerMessage::Control { request, reply } => {
                let response = self.handle_control(request);
                if reply.send(response).is_err() {
                    debug!("Control caller went away before the reply");
                }
            }
            ServerMessage::Shutdown => {}
        }
    }

    fn handle_text(&mut self, connection_id: ConnectionId, text: &str) -> Result<(), HubError> {
        let message: ClientMessage = serde_json::from_str(text)?;

        match message {
            ClientMessage::Join { id } => {
                let id = player_id(id, "join")?;
                self.registry.claim(connection_id, &id);
                self.registry.join(&id);
                self.broadcaster.send_to(
                    connection_id,
                    &ServerEvent::Positions {
                        players: self.registry.snapshot(),
                    },
                );
            }
            ClientMessage::Update(mut payload) => {
                let id = player_id(payload.id.clone(), "update")?;
                if SlotUpdate::from_payload(&payload).is_none() {
                    return Err(HubError::NoPosition { id });
                }
                self.registry.claim(connection_id, &id);
                normalize_coordinates(&mut payload);

                if let Some(event) =
                    self.reconciler
                        .reconcile(&mut self.registry, &id, &payload, Instant::now())
                {
                    self.broadcaster.broadcast(&event);
                }
            }
            ClientMessage::Leave { id } => {
                let id = player_id(id, "leave")?;
                if self.registry.remove(&id) {
                    self.broadcaster.broadcast(&ServerEvent::Disconnect { id });
                }
            }
            ClientMessage::RequestPositions => {
                self.broadcaster.send_to(
                    connection_id,
                    &ServerEvent::Positions {
                        players: self.registry.snapshot(),
                    },
                );
            }
            ClientMessage::SessionUpdate(update) => {
                self.session.handle_update(update, &self.broadcaster)?;
            }
            ClientMessage::Pickup(pickup) => {
                self.session.on_pickup(pickup, &self.broadcaster);
            }
            ClientMessage::Unknown => {
                debug!("Ignoring unknown message type from connection {}", connection_id);
            }
        }

        Ok(())
    }

    fn handle_control(&mut self, request: ControlRequest) -> ControlReply {
        match request {
            ControlRequest::Start { difficulty, map } => {
                self.session.request_start(difficulty, map, &self.broadcaster);
                json!({
                    "message": "Pursuit session started",
                    "state": self.session.snapshot(),
                })
            }
            ControlRequest::StartTest => {
                self.session.request_start(Some(1), None, &self.broadcaster);
                json!({
                    "message": "Pursuit session started for testing",
                    "state": self.session.snapshot(),
                })
            }
            ControlRequest::Stop => {
                self.session.stop(&self.broadcaster);
                json!({
                    "message": "Pursuit session stopped",
                    "state": self.session.snapshot(),
                })
            }
            ControlRequest::State => json!(self.session.snapshot()),
            ControlRequest::List => json!(self.session.summary()),
            ControlRequest::Status => json!({
                "message": "WebSocket server is running.",
                "connectedPlayers": self.registry.len(),
                "players": self.registry.snapshot(),
            }),
        }
    }

    fn reap(&mut self, now: Instant) {
        for id in self.reaper.sweep(&mut self.registry, now) {
            self.broadcaster.broadcast(&ServerEvent::Disconnect { id });
        }
    }
}

/// Trims a client-declared id; a missing or blank id rejects the message.
fn player_id(id: Option<String>, kind: &'static str) -> Result<String, HubError> {
    match id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(HubError::MissingId { kind }),
    }
}
