//! Combat system - weapons, hit detection, damage

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::physics::{forward_from_yaw, STANDING_HEIGHT};

/// Health of a freshly spawned player
pub const MAX_HEALTH: u32 = 10;

/// Spawn area bounds on x and z (half-open)
pub const SPAWN_MIN: f32 = 0.0;
pub const SPAWN_MAX: f32 = 50.0;
/// Spawn center height, feet resting on the floor plane
pub const SPAWN_HEIGHT: f32 = STANDING_HEIGHT;

/// Remaining cooldown treated as elapsed, absorbs f32 accumulation error
pub const COOLDOWN_EPSILON: f32 = 1e-4;

/// Weapon family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponKind {
    Melee,
    Ranged,
}

/// Hit shape of a weapon
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeaponShape {
    /// Cone in front of the attacker, all targets inside are hit
    Melee { half_angle: f32 },
    /// Line in front of the attacker, nearest target within tolerance is hit
    Ranged { tolerance: f32 },
}

/// Weapon with its own cooldown timer
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub name: &'static str,
    pub damage: u32,
    pub range: f32,
    /// Seconds between attacks
    pub cooldown: f32,
    /// Seconds left before the next attack is allowed
    pub cooldown_remaining: f32,
    pub shape: WeaponShape,
}

impl Weapon {
    pub fn sword() -> Self {
        Self {
            name: "Sword",
            damage: 2,
            range: 1.5,
            cooldown: 0.4,
            cooldown_remaining: 0.0,
            shape: WeaponShape::Melee {
                half_angle: std::f32::consts::PI / 6.0,
            },
        }
    }

    pub fn gun() -> Self {
        Self {
            name: "Gun",
            damage: 1,
            range: 20.0,
            cooldown: 0.3,
            cooldown_remaining: 0.0,
            shape: WeaponShape::Ranged { tolerance: 0.7 },
        }
    }

    pub fn kind(&self) -> WeaponKind {
        match self.shape {
            WeaponShape::Melee { .. } => WeaponKind::Melee,
            WeaponShape::Ranged { .. } => WeaponKind::Ranged,
        }
    }

    pub fn ready(&self) -> bool {
        self.cooldown_remaining <= COOLDOWN_EPSILON
    }

    /// Count the cooldown down by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
        }
    }

    /// Evaluate an attack. Any evaluated attack restarts the cooldown, hit or miss.
    pub fn attack(&mut self, attacker: &Combatant, candidates: &[Combatant]) -> AttackOutcome {
        if !self.ready() {
            return AttackOutcome::CoolingDown;
        }

        let hits = match self.shape {
            WeaponShape::Melee { half_angle } => {
                melee_hits(attacker, candidates, self.range, half_angle)
            }
            WeaponShape::Ranged { tolerance } => {
                ranged_hit(attacker, candidates, self.range, tolerance)
                    .into_iter()
                    .collect()
            }
        };
        self.cooldown_remaining = self.cooldown;

        if hits.is_empty() {
            AttackOutcome::NoTarget
        } else {
            AttackOutcome::Applied(hits)
        }
    }
}

/// Position and facing of a player taking part in an attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combatant {
    pub id: Uuid,
    pub position: Vec3,
    pub rotation_y: f32,
}

/// Result of one attack intent
#[derive(Debug, Clone, PartialEq)]
pub enum AttackOutcome {
    /// Weapon not ready, nothing evaluated
    CoolingDown,
    /// Evaluated, nobody in reach
    NoTarget,
    /// Ids of the players hit
    Applied(Vec<Uuid>),
}

/// All candidates strictly inside the range and the half-angle cone
pub fn melee_hits(
    attacker: &Combatant,
    candidates: &[Combatant],
    range: f32,
    half_angle: f32,
) -> Vec<Uuid> {
    let forward = forward_from_yaw(attacker.rotation_y);
    candidates
        .iter()
        .filter(|target| target.id != attacker.id)
        .filter(|target| {
            let mut flat = target.position - attacker.position;
            flat.y = 0.0;
            let distance = flat.length();
            if distance >= range || distance == 0.0 {
                return false;
            }
            forward.angle_between(flat / distance) < half_angle
        })
        .map(|target| target.id)
        .collect()
}

/// Nearest candidate in front of the attacker within the lateral tolerance
pub fn ranged_hit(
    attacker: &Combatant,
    candidates: &[Combatant],
    range: f32,
    tolerance: f32,
) -> Option<Uuid> {
    let forward = forward_from_yaw(attacker.rotation_y);
    let mut best = range;
    let mut closest = None;

    for target in candidates {
        if target.id == attacker.id {
            continue;
        }
        let to_target = target.position - attacker.position;
        let projection = to_target.dot(forward);
        if projection > 0.0 && projection < best {
            let lateral = (to_target - forward * projection).length();
            if lateral < tolerance {
                best = projection;
                closest = Some(target.id);
            }
        }
    }

    closest
}

/// Health after a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub health: u32,
    /// Health reached exactly zero
    pub died: bool,
}

/// Apply damage, clamped into `[0, MAX_HEALTH]`
pub fn apply_damage(health: u32, damage: u32) -> DamageResult {
    let health = health.min(MAX_HEALTH).saturating_sub(damage);
    DamageResult {
        health,
        died: health == 0,
    }
}

/// Random spawn point inside the spawn square
pub fn spawn_position<R: Rng>(rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.gen_range(SPAWN_MIN..SPAWN_MAX),
        SPAWN_HEIGHT,
        rng.gen_range(SPAWN_MIN..SPAWN_MAX),
    )
}

/// Ordered set of weapons a player carries, one of them equipped
#[derive(Debug, Clone, PartialEq)]
pub struct Loadout {
    weapons: Vec<Weapon>,
    current: usize,
}

impl Loadout {
    pub fn new(weapons: Vec<Weapon>) -> Self {
        Self {
            weapons,
            current: 0,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Weapon> {
        self.weapons.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Weapon> {
        self.weapons.get_mut(self.current)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Equip the weapon in `slot`. Returns false when the slot is empty.
    pub fn switch_to(&mut self, slot: usize) -> bool {
        if slot < self.weapons.len() {
            self.current = slot;
            true
        } else {
            false
        }
    }

    /// Move the selection by `step` slots, wrapping at both ends
    pub fn cycle(&mut self, step: i32) {
        if self.weapons.is_empty() {
            return;
        }
        let len = self.weapons.len() as i64;
        self.current = (self.current as i64 + step as i64).rem_euclid(len) as usize;
    }

    pub fn next(&mut self) {
        self.cycle(1);
    }

    pub fn prev(&mut self) {
        self.cycle(-1);
    }

    /// Count down every weapon's cooldown, equipped or not
    pub fn tick(&mut self, dt: f32) {
        for weapon in &mut self.weapons {
            weapon.tick(dt);
        }
    }
}

impl Default for Loadout {
    fn default() -> Self {
        Self::new(vec![Weapon::sword(), Weapon::gun()])
    }
}
