//! Client message handling: (registry, message) -> outbound messages

use tracing::{debug, warn};
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::combat::MAX_HEALTH;
use super::registry::{AttackReport, SessionRegistry};

/// Who receives an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only this session
    Session(Uuid),
    /// Every session except this one
    Others(Uuid),
    /// Every session
    Everyone,
}

impl Audience {
    pub fn includes(&self, session: &Uuid) -> bool {
        match self {
            Audience::Session(id) => id == session,
            Audience::Others(id) => id != session,
            Audience::Everyone => true,
        }
    }
}

/// Message addressed to an audience
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Audience,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn new(to: Audience, msg: ServerMsg) -> Self {
        Self { to, msg }
    }
}

/// Apply one client message from `session` and return what must be sent
pub fn handle_message(
    registry: &mut SessionRegistry,
    session: Uuid,
    msg: ClientMsg,
) -> Vec<Outbound> {
    match msg {
        ClientMsg::Start { name } => handle_start(registry, session, name.as_deref()),
        ClientMsg::Move {
            position,
            rotation_y,
            is_walking,
        } => {
            let Some(player) = registry.apply_move(&session, position.into(), rotation_y, is_walking)
            else {
                debug!(player_id = %session, "Move from unknown player ignored");
                return Vec::new();
            };
            vec![Outbound::new(
                Audience::Others(session),
                ServerMsg::PlayerMoved {
                    id: session,
                    position: player.position.into(),
                    rotation_y: player.rotation_y,
                    is_walking: player.is_walking,
                },
            )]
        }
        ClientMsg::Attack => handle_attack(registry, session),
        ClientMsg::Equip { slot } => match registry.equip(&session, slot) {
            Some(weapon) => vec![Outbound::new(
                Audience::Session(session),
                ServerMsg::WeaponEquipped {
                    id: session,
                    slot,
                    weapon,
                },
            )],
            None => {
                debug!(player_id = %session, slot, "Equip ignored");
                Vec::new()
            }
        },
        ClientMsg::CycleWeapon { step } => match registry.cycle_weapon(&session, step) {
            Some((slot, weapon)) => vec![Outbound::new(
                Audience::Session(session),
                ServerMsg::WeaponEquipped {
                    id: session,
                    slot,
                    weapon,
                },
            )],
            None => Vec::new(),
        },
    }
}

/// Remove a disconnected session. Safe to call more than once.
pub fn handle_disconnect(registry: &mut SessionRegistry, session: Uuid) -> Vec<Outbound> {
    if registry.remove(&session).is_none() {
        return Vec::new();
    }
    vec![Outbound::new(
        Audience::Everyone,
        ServerMsg::PlayerDisconnected { id: session },
    )]
}

fn handle_start(registry: &mut SessionRegistry, session: Uuid, name: Option<&str>) -> Vec<Outbound> {
    let announce = match registry.join(session, name) {
        Ok(player) => ServerMsg::NewPlayer {
            id: player.id,
            position: player.position.into(),
            rotation_y: player.rotation_y,
            is_walking: player.is_walking,
            name: player.name.clone(),
        },
        Err(e) => {
            warn!(player_id = %session, error = %e, "Duplicate start ignored");
            return Vec::new();
        }
    };

    vec![
        Outbound::new(
            Audience::Session(session),
            ServerMsg::CurrentPlayers {
                players: registry.snapshot(),
            },
        ),
        Outbound::new(Audience::Others(session), announce),
    ]
}

fn handle_attack(registry: &mut SessionRegistry, session: Uuid) -> Vec<Outbound> {
    let Some(report) = registry.attack(&session) else {
        debug!(player_id = %session, "Attack from unknown player ignored");
        return Vec::new();
    };

    let AttackReport::Applied { weapon, hits } = &report else {
        return Vec::new();
    };
    debug!(player_id = %session, ?weapon, hits = hits.len(), "Attack landed");

    let mut out = Vec::with_capacity(hits.len() * 2 + 1);
    for hit in hits {
        out.push(Outbound::new(
            Audience::Everyone,
            ServerMsg::UpdateHealth {
                id: hit.target,
                health: hit.health,
            },
        ));
        if let Some(spawn) = hit.respawn {
            out.push(Outbound::new(
                Audience::Everyone,
                ServerMsg::PlayerRespawn {
                    id: hit.target,
                    position: spawn.into(),
                    health: MAX_HEALTH,
                },
            ));
        }
    }

    if report.kills() > 0 {
        out.push(Outbound::new(
            Audience::Everyone,
            ServerMsg::Scoreboard {
                entries: registry.scoreboard(),
            },
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::Position;

    fn start(registry: &mut SessionRegistry, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        handle_message(
            registry,
            id,
            ClientMsg::Start {
                name: Some(name.to_string()),
            },
        );
        id
    }

    fn place(registry: &mut SessionRegistry, id: Uuid, x: f32, z: f32) -> Vec<Outbound> {
        handle_message(
            registry,
            id,
            ClientMsg::Move {
                position: Position { x, y: 1.4, z },
                rotation_y: 0.0,
                is_walking: false,
            },
        )
    }

    #[test]
    fn start_sends_snapshot_to_joiner_and_announces_to_others() {
        let mut registry = SessionRegistry::new(3);
        let first = start(&mut registry, "First");

        let second = Uuid::new_v4();
        let out = handle_message(
            &mut registry,
            second,
            ClientMsg::Start {
                name: Some("Second".to_string()),
            },
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, Audience::Session(second));
        let ServerMsg::CurrentPlayers { players } = &out[0].msg else {
            panic!("expected snapshot");
        };
        assert!(players.contains_key(&first));
        assert!(players.contains_key(&second));

        assert_eq!(out[1].to, Audience::Others(second));
        assert!(matches!(
            &out[1].msg,
            ServerMsg::NewPlayer { id, name, .. } if *id == second && name == "Second"
        ));
    }

    #[test]
    fn duplicate_start_is_ignored() {
        let mut registry = SessionRegistry::new(3);
        let id = start(&mut registry, "Once");
        let out = handle_message(&mut registry, id, ClientMsg::Start { name: None });
        assert!(out.is_empty());
        assert_eq!(registry.get(&id).unwrap().name, "Once");
    }

    #[test]
    fn move_relays_to_others() {
        let mut registry = SessionRegistry::new(3);
        let id = start(&mut registry, "Mover");
        let out = place(&mut registry, id, 4.0, -2.0);

        assert_eq!(
            out,
            vec![Outbound::new(
                Audience::Others(id),
                ServerMsg::PlayerMoved {
                    id,
                    position: Position {
                        x: 4.0,
                        y: 1.4,
                        z: -2.0
                    },
                    rotation_y: 0.0,
                    is_walking: false,
                },
            )]
        );
    }

    #[test]
    fn unknown_sessions_are_ignored() {
        let mut registry = SessionRegistry::new(3);
        let ghost = Uuid::new_v4();
        assert!(place(&mut registry, ghost, 0.0, 0.0).is_empty());
        assert!(handle_message(&mut registry, ghost, ClientMsg::Attack).is_empty());
        assert!(handle_message(&mut registry, ghost, ClientMsg::Equip { slot: 1 }).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn disconnect_notifies_once() {
        let mut registry = SessionRegistry::new(3);
        let a = start(&mut registry, "A");
        let b = start(&mut registry, "B");

        let out = handle_disconnect(&mut registry, a);
        assert_eq!(
            out,
            vec![Outbound::new(
                Audience::Everyone,
                ServerMsg::PlayerDisconnected { id: a }
            )]
        );
        assert!(handle_disconnect(&mut registry, a).is_empty());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&b));
    }

    #[test]
    fn lethal_melee_hit_broadcasts_health_respawn_and_scores() {
        let mut registry = SessionRegistry::new(3);
        let attacker = start(&mut registry, "Attacker");
        let victim = start(&mut registry, "Victim");
        place(&mut registry, attacker, 20.0, 20.0);
        place(&mut registry, victim, 20.0, 19.0);

        // Four swings take the victim from 10 to 2
        for swing in 1..=4u32 {
            let out = handle_message(&mut registry, attacker, ClientMsg::Attack);
            assert_eq!(
                out,
                vec![Outbound::new(
                    Audience::Everyone,
                    ServerMsg::UpdateHealth {
                        id: victim,
                        health: MAX_HEALTH - 2 * swing
                    }
                )]
            );
            registry.tick(0.4);
        }

        let out = handle_message(&mut registry, attacker, ClientMsg::Attack);
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[0].msg,
            ServerMsg::UpdateHealth {
                id: victim,
                health: 0
            }
        );
        let ServerMsg::PlayerRespawn { id, health, .. } = &out[1].msg else {
            panic!("expected respawn");
        };
        assert_eq!(*id, victim);
        assert_eq!(*health, MAX_HEALTH);
        let ServerMsg::Scoreboard { entries } = &out[2].msg else {
            panic!("expected scoreboard");
        };
        assert_eq!(entries[0].id, attacker);
        assert_eq!(entries[0].kills, 1);
        assert!(out.iter().all(|o| o.to == Audience::Everyone));
    }

    #[test]
    fn cooling_down_attack_sends_nothing() {
        let mut registry = SessionRegistry::new(3);
        let attacker = start(&mut registry, "Attacker");
        let victim = start(&mut registry, "Victim");
        place(&mut registry, attacker, 20.0, 20.0);
        place(&mut registry, victim, 20.0, 19.0);

        assert_eq!(handle_message(&mut registry, attacker, ClientMsg::Attack).len(), 1);
        assert!(handle_message(&mut registry, attacker, ClientMsg::Attack).is_empty());
    }

    #[test]
    fn equip_answers_only_the_sender() {
        let mut registry = SessionRegistry::new(3);
        let id = start(&mut registry, "Gunner");
        let out = handle_message(&mut registry, id, ClientMsg::Equip { slot: 1 });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, Audience::Session(id));
        assert!(handle_message(&mut registry, id, ClientMsg::Equip { slot: 9 }).is_empty());
    }

    #[test]
    fn audience_membership() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(Audience::Session(a).includes(&a));
        assert!(!Audience::Session(a).includes(&b));
        assert!(!Audience::Others(a).includes(&a));
        assert!(Audience::Others(a).includes(&b));
        assert!(Audience::Everyone.includes(&a));
    }
}
