//! Player registry keyed by client-declared ids.
//!
//! This module owns every piece of per-player state the hub keeps:
//! - The last known [`PlayerState`] of each local body and its remote twin
//! - The timestamp of the last accepted update, used for throttling and
//!   inactivity eviction
//! - Which transport connection declared which ids, so a closed socket can
//!   take its players with it
//!
//! Mutation of positions goes through the reconciler; the registry itself
//! performs no validation beyond id bookkeeping.

use crate::broadcaster::ConnectionId;
use crate::utils::generate_color;
use log::info;
use shared::{
    remote_id, PlayerState, Position, Role, LOBBY_MAP, REMOTE_COLOR, SPAWN_X, SPAWN_Y,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Tracks all players known to the hub
///
/// Players are kept in a sorted map so that snapshots and nearest-player
/// scans iterate in a stable order. The remote twin of `id` is stored under
/// `<id>_remote` next to its base entry.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Player states indexed by registry key
    players: BTreeMap<String, PlayerState>,
    /// Last accepted update per base id
    last_update: HashMap<String, Instant>,
    /// Base ids declared over each connection
    owners: HashMap<ConnectionId, BTreeSet<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a player at the lobby spawn point if `id` is unknown
    ///
    /// Returns true when a new player was created. Re-joining an existing
    /// id leaves its position and color untouched.
    pub fn join(&mut self, id: &str) -> bool {
        if self.players.contains_key(id) {
            return false;
        }

        let player = PlayerState::new(
            Position::new(SPAWN_X, SPAWN_Y),
            LOBBY_MAP,
            generate_color(),
            Role::Local,
        );
        info!("Player joined: {}", id);
        self.players.insert(id.to_string(), player);
        true
    }

    /// Records that `id` was declared over `connection_id`
    ///
    /// An id belongs to at most one connection: claiming it from a new
    /// connection releases it from the previous one.
    pub fn claim(&mut self, connection_id: ConnectionId, id: &str) {
        for (owner, ids) in self.owners.iter_mut() {
            if *owner != connection_id {
                ids.remove(id);
            }
        }
        self.owners
            .entry(connection_id)
            .or_default()
            .insert(id.to_string());
    }

    /// Removes a player, its remote twin and its throttle state
    ///
    /// Returns true if anything was known about `id`. Removing an unknown
    /// id is a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let had_player = self.players.remove(id).is_some();
        let had_remote = self.players.remove(&remote_id(id)).is_some();
        let had_throttle = self.last_update.remove(id).is_some();
        for ids in self.owners.values_mut() {
            ids.remove(id);
        }

        let removed = had_player || had_remote || had_throttle;
        if removed {
            info!("Player left: {}", id);
        }
        removed
    }

    /// Removes every player declared over a closed connection
    ///
    /// Returns the ids that were actually removed.
    pub fn release_connection(&mut self, connection_id: ConnectionId) -> Vec<String> {
        let ids = self.owners.remove(&connection_id).unwrap_or_default();
        ids.into_iter().filter(|id| self.remove(id)).collect()
    }

    /// Throttle gate for inbound updates
    ///
    /// Accepts when `id` has no accepted update yet or at least `window`
    /// has elapsed since the last one. Accepting restarts the window.
    pub fn try_accept_update(&mut self, id: &str, now: Instant, window: Duration) -> bool {
        if let Some(last) = self.last_update.get(id) {
            if now.saturating_duration_since(*last) < window {
                return false;
            }
        }
        self.last_update.insert(id.to_string(), now);
        true
    }

    /// Base ids whose last accepted update is older than `timeout`
    pub fn stale_ids(&self, now: Instant, timeout: Duration) -> Vec<String> {
        let mut stale: Vec<String> = self
            .last_update
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) > timeout)
            .map(|(id, _)| id.clone())
            .collect();
        stale.sort();
        stale
    }

    /// Stores a new local position, keeping the existing color
    pub fn set_local(&mut self, id: &str, position: Position, map: &str) {
        let color = self
            .players
            .get(id)
            .map(|player| player.color.clone())
            .unwrap_or_else(generate_color);
        self.players.insert(
            id.to_string(),
            PlayerState::new(position, map, color, Role::Local),
        );
    }

    /// Stores a new position for the remote twin of `id`
    pub fn set_remote(&mut self, id: &str, position: Position, map: &str) {
        self.players.insert(
            remote_id(id),
            PlayerState::new(position, map, REMOTE_COLOR.to_string(), Role::Remote),
        );
    }

    pub fn get(&self, key: &str) -> Option<&PlayerState> {
        self.players.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.players.contains_key(key)
    }

    /// Full copy of the player mapping, as sent in `positions` replies
    pub fn snapshot(&self) -> BTreeMap<String, PlayerState> {
        self.players.clone()
    }

    /// Every tracked body currently on `map`, in registry order
    pub fn players_on(&self, map: &str) -> Vec<(String, Position)> {
        self.players
            .iter()
            .filter(|(_, player)| player.current_map == map)
            .map(|(id, player)| (id.clone(), player.position()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
