//! Client-side frame driver for the local avatar and the store of remote
//! avatars built from server relays

use std::collections::HashMap;

use glam::Vec3;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::combat::{Loadout, MAX_HEALTH};
use super::geometry::GeometryIndex;
use super::physics::{Body, MoveInput, MovementSimulator};

/// Local player: simulated body, weapons, and health mirrored from the server
pub struct LocalPlayer {
    pub id: Option<Uuid>,
    pub body: Body,
    pub loadout: Loadout,
    pub health: u32,
    simulator: MovementSimulator,
}

impl LocalPlayer {
    pub fn new(simulator: MovementSimulator, spawn: Vec3) -> Self {
        Self {
            id: None,
            body: Body::new(spawn),
            loadout: Loadout::default(),
            health: MAX_HEALTH,
            simulator,
        }
    }

    /// Run one frame and return the movement report for the server.
    /// `yaw` is the current look direction; `dt` only drives weapon cooldowns.
    pub fn frame(
        &mut self,
        input: &MoveInput,
        yaw: f32,
        geometry: &GeometryIndex,
        dt: f32,
    ) -> ClientMsg {
        self.body.yaw = yaw;
        self.simulator.step(&mut self.body, input, geometry);
        self.loadout.tick(dt);

        ClientMsg::Move {
            position: self.body.position.into(),
            rotation_y: self.body.yaw,
            is_walking: self.body.is_walking,
        }
    }

    /// Attack intent, sent only when the local weapon is ready.
    /// The server enforces its own cooldown regardless.
    pub fn attack(&mut self) -> Option<ClientMsg> {
        let weapon = self.loadout.current_mut()?;
        if !weapon.ready() {
            return None;
        }
        weapon.cooldown_remaining = weapon.cooldown;
        Some(ClientMsg::Attack)
    }

    /// Apply server messages that concern the local avatar
    pub fn apply(&mut self, msg: &ServerMsg) {
        match msg {
            ServerMsg::Welcome { id } => self.id = Some(*id),
            ServerMsg::CurrentPlayers { players } => {
                if let Some(me) = self.id.and_then(|id| players.get(&id)) {
                    self.body = Body::new(me.position.into());
                    self.health = me.health;
                }
            }
            ServerMsg::UpdateHealth { id, health } if Some(*id) == self.id => {
                self.health = (*health).min(MAX_HEALTH);
            }
            ServerMsg::PlayerRespawn {
                id,
                position,
                health,
            } if Some(*id) == self.id => {
                self.body = Body::new((*position).into());
                self.health = (*health).min(MAX_HEALTH);
            }
            ServerMsg::WeaponEquipped { id, slot, .. } if Some(*id) == self.id => {
                self.loadout.switch_to(*slot);
            }
            _ => {}
        }
    }
}

/// Last relayed state of another player. Never simulated locally.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAvatar {
    pub position: Vec3,
    pub rotation_y: f32,
    pub is_walking: bool,
    pub health: u32,
    pub name: String,
}

/// Remote avatars keyed by player id, excluding the local player
#[derive(Debug, Default)]
pub struct RemotePlayers {
    local_id: Option<Uuid>,
    players: HashMap<Uuid, RemoteAvatar>,
}

impl RemotePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<&RemoteAvatar> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &RemoteAvatar)> {
        self.players.iter()
    }

    fn is_local(&self, id: &Uuid) -> bool {
        self.local_id.as_ref() == Some(id)
    }

    /// Apply a server relay. Messages about unknown remote players are
    /// ignored, apart from the snapshot and join announcements that create them.
    /// Avatars keep their last relayed state until told otherwise.
    pub fn apply(&mut self, msg: &ServerMsg) {
        match msg {
            ServerMsg::Welcome { id } => {
                self.local_id = Some(*id);
                self.players.remove(id);
            }
            ServerMsg::CurrentPlayers { players } => {
                for (id, view) in players {
                    if self.is_local(id) || self.players.contains_key(id) {
                        continue;
                    }
                    self.players.insert(
                        *id,
                        RemoteAvatar {
                            position: view.position.into(),
                            rotation_y: view.rotation_y,
                            is_walking: view.is_walking,
                            health: view.health,
                            name: view.name.clone(),
                        },
                    );
                }
            }
            ServerMsg::NewPlayer {
                id,
                position,
                rotation_y,
                is_walking,
                name,
            } => {
                if self.is_local(id) || self.players.contains_key(id) {
                    return;
                }
                self.players.insert(
                    *id,
                    RemoteAvatar {
                        position: (*position).into(),
                        rotation_y: *rotation_y,
                        is_walking: *is_walking,
                        health: MAX_HEALTH,
                        name: name.clone(),
                    },
                );
            }
            ServerMsg::PlayerMoved {
                id,
                position,
                rotation_y,
                is_walking,
            } => {
                if let Some(avatar) = self.players.get_mut(id) {
                    avatar.position = (*position).into();
                    avatar.rotation_y = *rotation_y;
                    avatar.is_walking = *is_walking;
                }
            }
            ServerMsg::UpdateHealth { id, health } => {
                if let Some(avatar) = self.players.get_mut(id) {
                    avatar.health = (*health).min(MAX_HEALTH);
                }
            }
            ServerMsg::PlayerRespawn {
                id,
                position,
                health,
            } => {
                if let Some(avatar) = self.players.get_mut(id) {
                    avatar.position = (*position).into();
                    avatar.health = (*health).min(MAX_HEALTH);
                }
            }
            ServerMsg::PlayerDisconnected { id } => {
                self.players.remove(id);
            }
            ServerMsg::WeaponEquipped { .. }
            | ServerMsg::Scoreboard { .. }
            | ServerMsg::Error { .. } => {}
        }
    }
}
