//! Authoritative player registry

use std::collections::HashMap;

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::{PlayerView, ScoreEntry};

use super::combat::{
    apply_damage, spawn_position, AttackOutcome, Combatant, Loadout, WeaponKind, MAX_HEALTH,
};

/// Longest display name kept, in characters
pub const MAX_NAME_LEN: usize = 16;
/// Name used when a player joins without one
pub const DEFAULT_NAME: &str = "Player";

/// Player state in the arena (authoritative)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: Uuid,
    pub name: String,
    pub position: Vec3,
    pub rotation_y: f32,
    pub health: u32,
    pub is_walking: bool,
    pub loadout: Loadout,
    pub kills: u32,
    pub deaths: u32,
}

impl PlayerState {
    pub fn new(id: Uuid, name: String, spawn: Vec3) -> Self {
        Self {
            id,
            name,
            position: spawn,
            rotation_y: 0.0,
            health: MAX_HEALTH,
            is_walking: false,
            loadout: Loadout::default(),
            kills: 0,
            deaths: 0,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            position: self.position.into(),
            rotation_y: self.rotation_y,
            is_walking: self.is_walking,
            health: self.health,
            name: self.name.clone(),
        }
    }

    pub fn combatant(&self) -> Combatant {
        Combatant {
            id: self.id,
            position: self.position,
            rotation_y: self.rotation_y,
        }
    }

    pub fn score(&self) -> ScoreEntry {
        ScoreEntry {
            id: self.id,
            name: self.name.clone(),
            kills: self.kills,
            deaths: self.deaths,
        }
    }
}

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Player {0} already joined")]
    AlreadyJoined(Uuid),
}

/// One damaged player from an attack
#[derive(Debug, Clone, PartialEq)]
pub struct HitReport {
    pub target: Uuid,
    /// Health right after the hit, zero on a kill
    pub health: u32,
    /// New spawn point when the hit was lethal
    pub respawn: Option<Vec3>,
}

/// What an attack did to the registry
#[derive(Debug, Clone, PartialEq)]
pub enum AttackReport {
    CoolingDown,
    NoTarget,
    Applied {
        weapon: WeaponKind,
        hits: Vec<HitReport>,
    },
}

impl AttackReport {
    pub fn kills(&self) -> usize {
        match self {
            AttackReport::Applied { hits, .. } => {
                hits.iter().filter(|h| h.respawn.is_some()).count()
            }
            _ => 0,
        }
    }
}

/// Map of connected player id to authoritative state
pub struct SessionRegistry {
    players: HashMap<Uuid, PlayerState>,
    rng: ChaCha8Rng,
}

impl SessionRegistry {
    pub fn new(seed: u64) -> Self {
        Self {
            players: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.players.contains_key(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Create a player at a random spawn point with full health
    pub fn join(&mut self, id: Uuid, name: Option<&str>) -> Result<&PlayerState, RegistryError> {
        if self.players.contains_key(&id) {
            return Err(RegistryError::AlreadyJoined(id));
        }

        let spawn = spawn_position(&mut self.rng);
        let player = PlayerState::new(id, sanitize_name(name), spawn);
        info!(player_id = %id, name = %player.name, "Player joined arena");

        Ok(self.players.entry(id).or_insert(player))
    }

    /// Store a client-reported movement verbatim
    pub fn apply_move(
        &mut self,
        id: &Uuid,
        position: Vec3,
        rotation_y: f32,
        is_walking: bool,
    ) -> Option<&PlayerState> {
        let player = self.players.get_mut(id)?;
        player.position = position;
        player.rotation_y = rotation_y;
        player.is_walking = is_walking;
        Some(player)
    }

    /// Remove a player. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &Uuid) -> Option<PlayerState> {
        let removed = self.players.remove(id);
        if removed.is_some() {
            info!(player_id = %id, "Player removed from arena");
        }
        removed
    }

    /// Full world state
    pub fn snapshot(&self) -> HashMap<Uuid, PlayerView> {
        self.players
            .iter()
            .map(|(id, player)| (*id, player.view()))
            .collect()
    }

    /// Kill/death tally, best first
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self.players.values().map(PlayerState::score).collect();
        entries.sort_by(|a, b| {
            b.kills
                .cmp(&a.kills)
                .then(a.deaths.cmp(&b.deaths))
                .then(a.name.cmp(&b.name))
        });
        entries
    }

    /// Equip a loadout slot. Returns the equipped weapon when the slot exists.
    pub fn equip(&mut self, id: &Uuid, slot: usize) -> Option<WeaponKind> {
        let player = self.players.get_mut(id)?;
        if !player.loadout.switch_to(slot) {
            return None;
        }
        player.loadout.current().map(|w| w.kind())
    }

    /// Cycle the equipped weapon. Returns the new slot and weapon.
    pub fn cycle_weapon(&mut self, id: &Uuid, step: i32) -> Option<(usize, WeaponKind)> {
        let player = self.players.get_mut(id)?;
        player.loadout.cycle(step.signum());
        let weapon = player.loadout.current()?.kind();
        Some((player.loadout.current_index(), weapon))
    }

    /// Advance every weapon cooldown by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        for player in self.players.values_mut() {
            player.loadout.tick(dt);
        }
    }

    /// Resolve an attack from `attacker_id` with their equipped weapon and
    /// apply its damage. Unknown attackers yield `None`.
    pub fn attack(&mut self, attacker_id: &Uuid) -> Option<AttackReport> {
        let attacker = self.players.get(attacker_id)?.combatant();
        let candidates: Vec<Combatant> = self
            .players
            .values()
            .filter(|p| p.id != attacker.id)
            .map(PlayerState::combatant)
            .collect();

        let player = self.players.get_mut(attacker_id)?;
        let weapon = player.loadout.current_mut()?;
        let kind = weapon.kind();
        let damage = weapon.damage;
        let outcome = weapon.attack(&attacker, &candidates);

        let targets = match outcome {
            AttackOutcome::CoolingDown => {
                debug!(player_id = %attacker_id, "Attack ignored, weapon cooling down");
                return Some(AttackReport::CoolingDown);
            }
            AttackOutcome::NoTarget => return Some(AttackReport::NoTarget),
            AttackOutcome::Applied(targets) => targets,
        };

        let mut hits = Vec::with_capacity(targets.len());
        let mut kills = 0;
        for target_id in targets {
            let Some(target) = self.players.get_mut(&target_id) else {
                continue;
            };

            let result = apply_damage(target.health, damage);
            let respawn = if result.died {
                let spawn = spawn_position(&mut self.rng);
                target.position = spawn;
                target.health = MAX_HEALTH;
                target.deaths += 1;
                kills += 1;
                info!(
                    attacker_id = %attacker_id,
                    victim_id = %target_id,
                    "Player killed, respawning"
                );
                Some(spawn)
            } else {
                target.health = result.health;
                None
            };

            hits.push(HitReport {
                target: target_id,
                health: result.health,
                respawn,
            });
        }

        if kills > 0 {
            if let Some(attacker) = self.players.get_mut(attacker_id) {
                attacker.kills += kills;
            }
        }

        Some(AttackReport::Applied { weapon: kind, hits })
    }
}

/// Trim, cap to `MAX_NAME_LEN` characters, default when empty
pub fn sanitize_name(name: Option<&str>) -> String {
    let trimmed: String = name
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed
    }
}
