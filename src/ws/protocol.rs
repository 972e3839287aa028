//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::WeaponKind;

/// Wire form of a position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Join the arena
    Start {
        /// Display name, server default when missing
        #[serde(default)]
        name: Option<String>,
    },

    /// Client-simulated position report
    #[serde(rename_all = "camelCase")]
    Move {
        position: Position,
        rotation_y: f32,
        is_walking: bool,
    },

    /// Attack with the equipped weapon
    Attack,

    /// Equip the weapon in a loadout slot
    Equip { slot: usize },

    /// Cycle the equipped weapon (+1 next, -1 previous)
    CycleWeapon { step: i32 },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Connection accepted, carries the session's player id
    Welcome { id: Uuid },

    /// Full world snapshot for a player that just joined
    CurrentPlayers { players: HashMap<Uuid, PlayerView> },

    /// Someone else joined
    #[serde(rename_all = "camelCase")]
    NewPlayer {
        id: Uuid,
        position: Position,
        rotation_y: f32,
        is_walking: bool,
        name: String,
    },

    /// Relay of another player's movement
    #[serde(rename_all = "camelCase")]
    PlayerMoved {
        id: Uuid,
        position: Position,
        rotation_y: f32,
        is_walking: bool,
    },

    /// Equipped weapon changed (sent to the owner)
    WeaponEquipped {
        id: Uuid,
        slot: usize,
        weapon: WeaponKind,
    },

    /// New health value for a player
    UpdateHealth { id: Uuid, health: u32 },

    /// Player respawned after reaching zero health
    PlayerRespawn {
        id: Uuid,
        position: Position,
        health: u32,
    },

    /// Kill/death tally
    Scoreboard { entries: Vec<ScoreEntry> },

    /// Player left
    PlayerDisconnected { id: Uuid },

    /// Error message
    Error { code: String, message: String },
}

/// Player state as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: Uuid,
    pub position: Position,
    pub rotation_y: f32,
    pub is_walking: bool,
    pub health: u32,
    pub name: String,
}

/// Scoreboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: Uuid,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
}
