//! World actor: owns the registry and serializes every mutation

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{tick_interval, ElapsedClock};
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::dispatch::{handle_disconnect, handle_message, Outbound};
use super::registry::SessionRegistry;

/// Capacity of the shared event queue
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Events delivered to the world task by WebSocket sessions
#[derive(Debug)]
pub enum WorldEvent {
    /// New connection with its outbound queue
    Connected {
        session: Uuid,
        outbox: mpsc::Sender<ServerMsg>,
    },
    /// Parsed client message
    Message { session: Uuid, msg: ClientMsg },
    /// Connection closed
    Disconnected { session: Uuid },
}

/// Cloneable handle to the running world
#[derive(Clone)]
pub struct WorldHandle {
    event_tx: mpsc::Sender<WorldEvent>,
    player_count: Arc<AtomicUsize>,
}

impl WorldHandle {
    pub async fn connect(&self, session: Uuid, outbox: mpsc::Sender<ServerMsg>) -> bool {
        self.event_tx
            .send(WorldEvent::Connected { session, outbox })
            .await
            .is_ok()
    }

    pub async fn send(&self, session: Uuid, msg: ClientMsg) -> bool {
        self.event_tx
            .send(WorldEvent::Message { session, msg })
            .await
            .is_ok()
    }

    pub async fn disconnect(&self, session: Uuid) {
        let _ = self
            .event_tx
            .send(WorldEvent::Disconnected { session })
            .await;
    }

    /// Players that have joined (not merely connected)
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The authoritative arena world
pub struct GameWorld {
    registry: SessionRegistry,
    outboxes: HashMap<Uuid, mpsc::Sender<ServerMsg>>,
    event_rx: mpsc::Receiver<WorldEvent>,
    player_count: Arc<AtomicUsize>,
    cooldown_clock: ElapsedClock,
}

impl GameWorld {
    pub fn new(seed: u64) -> (Self, WorldHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = WorldHandle {
            event_tx,
            player_count: player_count.clone(),
        };

        let world = Self {
            registry: SessionRegistry::new(seed),
            outboxes: HashMap::new(),
            event_rx,
            player_count,
            cooldown_clock: ElapsedClock::start(),
        };

        (world, handle)
    }

    /// Process events until every handle is dropped
    pub async fn run(mut self) {
        info!("World started");

        let mut ticker = interval(tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = ticker.tick() => self.advance_cooldowns(),
            }
        }

        info!("World stopped");
    }

    fn handle_event(&mut self, event: WorldEvent) {
        let outbound = match event {
            WorldEvent::Connected { session, outbox } => {
                debug!(session = %session, "Session attached");
                let _ = outbox.try_send(ServerMsg::Welcome { id: session });
                self.outboxes.insert(session, outbox);
                Vec::new()
            }
            WorldEvent::Message { session, msg } => {
                // Cooldowns must be current when an attack is evaluated
                self.advance_cooldowns();
                handle_message(&mut self.registry, session, msg)
            }
            WorldEvent::Disconnected { session } => {
                self.outboxes.remove(&session);
                handle_disconnect(&mut self.registry, session)
            }
        };

        self.player_count.store(self.registry.len(), Ordering::Relaxed);
        self.route(outbound);
    }

    /// Count weapon cooldowns down by the real time since the last advance
    fn advance_cooldowns(&mut self) {
        let dt = self.cooldown_clock.lap();
        self.registry.tick(dt);
    }

    /// Deliver outbound messages without ever blocking the world
    fn route(&mut self, outbound: Vec<Outbound>) {
        for Outbound { to, msg } in outbound {
            for (session, outbox) in &self.outboxes {
                if !to.includes(session) {
                    continue;
                }
                match outbox.try_send(msg.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(session = %session, "Outbox full, dropping message");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!(session = %session, "Outbox closed");
                    }
                }
            }
        }
    }
}
