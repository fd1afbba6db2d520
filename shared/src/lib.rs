//! Wire protocol for the world viewer: JSON messages tagged by an `action`
//! field, one object per line on the stream.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Facing of an avatar in the world. West has no frames of its own; the
/// renderer draws the east sequence mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    #[default]
    South,
    East,
    West,
}

/// Movement intent directions as the protocol spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDirection {
    /// The facing a participant turns to when moving this way.
    pub fn facing(self) -> Direction {
        match self {
            MoveDirection::Up => Direction::North,
            MoveDirection::Down => Direction::South,
            MoveDirection::Left => Direction::West,
            MoveDirection::Right => Direction::East,
        }
    }
}

/// Messages sent to the world server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame { username: String },
    Move { direction: MoveDirection },
    Stop,
}

/// Per-participant fields as they appear on the wire. Every field is
/// optional: `players_moved` carries partial records and the merge must
/// leave absent fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub id: Option<String>,
    pub username: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub facing: Option<Direction>,
    pub animation_frame: Option<u32>,
    pub avatar: Option<String>,
}

/// Frame URL lists per direction. There is deliberately no west list: west
/// frames are the east frames drawn mirrored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameUrls {
    pub north: Vec<String>,
    pub south: Vec<String>,
    pub east: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AvatarDef {
    pub name: Option<String>,
    pub frames: FrameUrls,
}

/// Messages received from the world server, tagged by their `action` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    JoinGame {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        player_id: Option<String>,
        #[serde(default)]
        players: HashMap<String, PlayerUpdate>,
        #[serde(default)]
        avatars: HashMap<String, AvatarDef>,
        #[serde(default)]
        error: Option<String>,
    },
    PlayersMoved {
        #[serde(default)]
        players: HashMap<String, PlayerUpdate>,
    },
    PlayerJoined {
        player: PlayerUpdate,
        #[serde(default)]
        avatar: Option<AvatarDef>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },
}

/// One inbound payload: either a recognized action message or a bare
/// failure report, which carries no action tag at all.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Incoming {
    Message(ServerMessage),
    Report {
        success: bool,
        #[serde(default)]
        error: Option<String>,
    },
}

/// Parses one inbound payload. Callers log and discard on error; a
/// malformed message must never take the connection down.
pub fn parse_incoming(raw: &str) -> Result<Incoming, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Serializes one outbound message.
pub fn encode_outgoing(msg: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}
