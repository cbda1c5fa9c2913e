//! Wire protocol and shared domain types for the pursuit hub.
//!
//! Every message crossing the WebSocket is a JSON object with a `type`
//! discriminator. Inbound messages deserialize into [`ClientMessage`],
//! outbound events serialize from [`ServerEvent`]. The map topology used by
//! both position validation and hunter movement lives in [`map`].

pub mod map;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub use map::{GridMap, MapCatalog, MapTopology};

pub const SPAWN_X: f64 = 1.0;
pub const SPAWN_Y: f64 = 1.0;
pub const LOBBY_MAP: &str = "main";
pub const DEFAULT_SESSION_MAP: &str = "escom_cafeteria";
pub const GLOBAL_MAP: &str = "global";
pub const GLOBAL_COORD_SCALE: f64 = 1_000_000.0;
pub const REMOTE_COLOR: &str = "#FF0000";
pub const REMOTE_SUFFIX: &str = "_remote";
pub const CATCH_DISTANCE: f64 = 2.0;

/// Registry key of the secondary body tracked for `id`.
pub fn remote_id(id: &str) -> String {
    format!("{id}{REMOTE_SUFFIX}")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Axis-aligned proximity test: both |dx| and |dy| are at most `reach`.
    pub fn within_box(&self, other: &Position, reach: f64) -> bool {
        (self.x - other.x).abs() <= reach && (self.y - other.y).abs() <= reach
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Local,
    Remote,
}

/// Last known state of a tracked body, serialized exactly as clients expect
/// it inside `positions` snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub x: f64,
    pub y: f64,
    pub current_map: String,
    pub color: String,
    #[serde(rename = "type")]
    pub role: Role,
}

impl PlayerState {
    pub fn new(position: Position, current_map: &str, color: String, role: Role) -> Self {
        Self {
            x: position.x,
            y: position.y,
            current_map: current_map.to_string(),
            color,
            role,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Hunter population tier. Serialized as its numeric level (1-3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn hunter_count(self) -> usize {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 6,
        }
    }

    /// Base period of the pursuit tick for this tier.
    pub fn tick_interval(self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(1200),
            Difficulty::Medium => Duration::from_millis(800),
            Difficulty::Hard => Duration::from_millis(500),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.level()
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Difficulty::from_level(level).ok_or_else(|| format!("unsupported difficulty {level}"))
    }
}

/// Hunter as rendered by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HunterView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub difficulty: Difficulty,
}

/// Messages sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        id: Option<String>,
    },
    Update(UpdatePayload),
    Leave {
        id: Option<String>,
    },
    RequestPositions,
    #[serde(rename = "zombie_game_update")]
    SessionUpdate(SessionUpdate),
    #[serde(rename = "zombie_game_food")]
    Pickup(Pickup),
    #[serde(other)]
    Unknown,
}

/// Body of an `update` message. Carries either a flat `{x, y}` or the
/// `{local, remote}` pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePayload {
    pub id: Option<String>,
    pub map: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub local: Option<Position>,
    pub remote: Option<Position>,
}

/// Body of a `zombie_game_update` message. Fields not used by the hub are
/// echoed back verbatim, so they stay untyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionUpdate {
    pub action: Option<String>,
    pub player: Option<Value>,
    pub difficulty: Option<u8>,
    pub map: Option<String>,
    pub survived: Option<Value>,
    pub time: Option<Value>,
    pub score: Option<Value>,
}

/// An in-game item pickup, echoed to every client as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Value>,
}

/// Events sent by the hub.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Positions {
        players: BTreeMap<String, PlayerState>,
    },
    Update {
        id: String,
        x: f64,
        y: f64,
        map: String,
    },
    Disconnect {
        id: String,
    },
    #[serde(rename = "zombie_position_batch")]
    HunterBatch {
        #[serde(rename = "zombies")]
        hunters: Vec<HunterView>,
        map: String,
        difficulty: Difficulty,
        timestamp: u64,
    },
    #[serde(rename = "zombie_game_command")]
    Command {
        #[serde(flatten)]
        command: GameCommand,
    },
    #[serde(rename = "zombie_game_update")]
    PlayerResult {
        action: ResultAction,
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        survived: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        time: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        score: Option<Value>,
    },
    #[serde(rename = "zombie_game_food")]
    Pickup(Pickup),
}

impl ServerEvent {
    pub fn command(command: GameCommand) -> Self {
        ServerEvent::Command { command }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultAction {
    PlayerResult,
}

/// Session lifecycle commands carried by `zombie_game_command` events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum GameCommand {
    Start {
        difficulty: Difficulty,
        map: String,
        #[serde(rename = "zombies")]
        hunters: Vec<HunterView>,
    },
    Stop,
    Caught {
        player: String,
    },
    #[serde(rename = "zombie_slowed")]
    Slowed {
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<Value>,
    },
    #[serde(rename = "zombie_speed_normal")]
    SpeedRestored,
}
