//! Runtime configuration for the hub.
//!
//! Every timing knob of the hub lives here with its production default, so
//! tests can shrink windows without touching the logic that uses them.

use crate::error::HubError;
use shared::{Position, DEFAULT_SESSION_MAP};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to
    pub bind_address: String,
    /// Address of the HTTP control plane, `None` to disable it
    pub control_address: Option<String>,
    /// Directory of extra `*.map` layouts loaded at startup
    pub maps_dir: Option<PathBuf>,

    /// Minimum gap between two accepted updates from the same player
    pub update_throttle: Duration,
    /// Silence after which a player is evicted
    pub inactivity_timeout: Duration,
    /// Period of the inactivity sweep
    pub reaper_period: Duration,

    /// How long a caught player is immune to further catches
    pub catch_cooldown: Duration,
    /// Half-width of the catch box around a hunter
    pub catch_distance: f64,
    /// Extra tick period applied while a pickup slow-down is in effect
    pub slowdown_penalty: Duration,
    /// How long a pickup slow-down lasts
    pub slowdown_duration: Duration,
    /// Delay before syncing hunters to a freshly connected client
    pub join_sync_delay: Duration,

    /// Draws allowed when searching for a traversable hunter spawn
    pub spawn_attempts: u32,
    /// Spawn used once every attempt has failed
    pub spawn_fallback: Position,
    /// Map used when a start request does not name one
    pub default_map: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            control_address: Some("0.0.0.0:3001".to_string()),
            maps_dir: None,
            update_throttle: Duration::from_millis(50),
            inactivity_timeout: Duration::from_millis(30_000),
            reaper_period: Duration::from_millis(10_000),
            catch_cooldown: Duration::from_millis(5_000),
            catch_distance: shared::CATCH_DISTANCE,
            slowdown_penalty: Duration::from_millis(300),
            slowdown_duration: Duration::from_millis(3_000),
            join_sync_delay: Duration::from_millis(1_000),
            spawn_attempts: 100,
            spawn_fallback: Position::new(20.0, 15.0),
            default_map: DEFAULT_SESSION_MAP.to_string(),
        }
    }
}

impl ServerConfig {
    /// Rejects settings the hub cannot run with.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.reaper_period.is_zero() {
            return Err(HubError::Config("reaper period must be at least 1 ms".to_string()));
        }
        if self.inactivity_timeout.is_zero() {
            return Err(HubError::Config("inactivity timeout must be at least 1 ms".to_string()));
        }
        Ok(())
    }
}
