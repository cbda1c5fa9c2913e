//! Admission of inbound position updates.
//!
//! An update passes two gates before it touches the registry: a per-player
//! throttle and a change-significance check per slot. Only admitted changes
//! mutate state, and only a mutation produces an `update` broadcast.

use crate::registry::ConnectionRegistry;
use log::{debug, trace};
use shared::{Position, ServerEvent, UpdatePayload, GLOBAL_COORD_SCALE, GLOBAL_MAP, LOBBY_MAP};
use std::time::Duration;
use tokio::time::Instant;

/// Position slots carried by a single update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotUpdate {
    pub local: Option<Position>,
    pub remote: Option<Position>,
}

impl SlotUpdate {
    /// Extracts the slots from a raw payload. A flat `{x, y}` wins over the
    /// `{local, remote}` form; a payload with neither yields `None`.
    pub fn from_payload(payload: &UpdatePayload) -> Option<Self> {
        if let (Some(x), Some(y)) = (payload.x, payload.y) {
            return Some(Self {
                local: Some(Position::new(x, y)),
                remote: None,
            });
        }
        if payload.local.is_some() || payload.remote.is_some() {
            return Some(Self {
                local: payload.local,
                remote: payload.remote,
            });
        }
        None
    }
}

/// Converts fixed-point coordinates of the `global` map namespace to map
/// units. Payloads for any other map pass through untouched.
pub fn normalize_coordinates(payload: &mut UpdatePayload) {
    if payload.map.as_deref() != Some(GLOBAL_MAP) {
        return;
    }
    for value in [payload.x.as_mut(), payload.y.as_mut()].into_iter().flatten() {
        *value /= GLOBAL_COORD_SCALE;
    }
    for slot in [payload.local.as_mut(), payload.remote.as_mut()].into_iter().flatten() {
        slot.x /= GLOBAL_COORD_SCALE;
        slot.y /= GLOBAL_COORD_SCALE;
    }
}

/// Any difference at all counts; a missing previous value always counts.
pub fn is_significant(previous: Option<Position>, next: Position) -> bool {
    match previous {
        None => true,
        Some(previous) => previous.x != next.x || previous.y != next.y,
    }
}

#[derive(Debug, Clone)]
pub struct PositionReconciler {
    throttle: Duration,
}

impl PositionReconciler {
    pub fn new(throttle: Duration) -> Self {
        Self { throttle }
    }

    /// Applies `payload` for player `id` and returns the broadcast to emit,
    /// if any slot changed.
    ///
    /// The broadcast always reports the local position, even when only the
    /// remote slot moved; clients rely on that shape.
    pub fn reconcile(
        &self,
        registry: &mut ConnectionRegistry,
        id: &str,
        payload: &UpdatePayload,
        now: Instant,
    ) -> Option<ServerEvent> {
        if !registry.try_accept_update(id, now, self.throttle) {
            trace!("Throttled update from {}", id);
            return None;
        }

        let Some(slots) = SlotUpdate::from_payload(payload) else {
            debug!("Update from {} carries no usable position", id);
            return None;
        };
        let map = payload.map.as_deref().unwrap_or(LOBBY_MAP);
        let mut changed = false;

        if let Some(local) = slots.local {
            let previous = registry.get(id).map(|player| player.position());
            if is_significant(previous, local) {
                registry.set_local(id, local, map);
                changed = true;
            }
        }

        if let Some(remote) = slots.remote {
            let twin = shared::remote_id(id);
            if !registry.contains(id) {
                debug!("Ignoring remote position for unknown player {}", id);
            } else if is_significant(registry.get(&twin).map(|twin| twin.position()), remote) {
                registry.set_remote(id, remote, map);
                changed = true;
            }
        }

        if !changed {
            trace!("Insignificant update from {}", id);
            return None;
        }

        let reported = slots
            .local
            .or_else(|| registry.get(id).map(|player| player.position()))?;
        Some(ServerEvent::Update {
            id: id.to_string(),
            x: reported.x,
            y: reported.y,
            map: map.to_string(),
        })
    }
}
