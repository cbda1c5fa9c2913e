//! # Pursuit Hub Server Library
//!
//! This library provides the real-time hub behind the multiplayer pursuit
//! game. It keeps the authoritative list of connected players, relays their
//! position changes to everyone else, and runs the hunter minigame on top of
//! the same connections.
//!
//! ## Core Responsibilities
//!
//! ### Position Relay
//! Clients report where their body (and an optional remote twin) stands.
//! Updates are throttled per player and only real changes are re-broadcast.
//!
//! ### Pursuit Session
//! While a session is active, a pool of hunters sized by difficulty moves one
//! grid step per tick toward the nearest player on the session map. Catches,
//! slow-downs and speed restores are announced as game commands.
//!
//! ### Housekeeping
//! Players that go silent are evicted by a periodic sweep, and closing a
//! socket removes every player declared over it.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All state lives in [`hub::Hub`] and is only touched from its loop.
//! WebSocket tasks, the HTTP control plane and deferred timers talk to the
//! loop through channels, so handlers never race each other.
//!
//! ### Replaceable Tick Schedule
//! The pursuit tick is a single slot holding the current timer. Changing the
//! speed replaces the slot, which cancels the old timer; there is never more
//! than one tick source.
//!
//! ## Module Organization
//!
//! - `broadcaster`: fan-out of JSON frames to connection outboxes
//! - `config`: timing knobs and addresses
//! - `control`: HTTP admin routes for the session
//! - `error`: the hub error type
//! - `hub`: the event loop and message dispatch
//! - `network`: WebSocket accept loop and per-connection tasks
//! - `pursuit`: hunter population and chase step
//! - `reaper`: inactivity eviction
//! - `reconciler`: throttle and change detection for updates
//! - `registry`: player table and connection ownership
//! - `session`: the minigame state machine and its timers
//! - `utils`: timestamps and colors
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::hub::Hub;
//! use server::network::NetworkServer;
//! use shared::MapCatalog;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let mut hub = Hub::new(config.clone(), MapCatalog::default());
//!
//!     let network = NetworkServer::bind(&config.bind_address, hub.sender()).await?;
//!     tokio::spawn(network.run());
//!
//!     hub.run().await;
//!     Ok(())
//! }
//! ```

pub mod broadcaster;
pub mod config;
pub mod control;
pub mod error;
pub mod hub;
pub mod network;
pub mod pursuit;
pub mod reaper;
pub mod reconciler;
pub mod registry;
pub mod session;
pub mod utils;
