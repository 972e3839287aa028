//! Application state shared across routes

use std::sync::Arc;

use rand::Rng;
use tracing::info;

use crate::config::Config;
use crate::game::geometry::{ArenaConfig, ArenaLayout};
use crate::game::{GameWorld, WorldHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: Arc<ArenaLayout>,
    pub world: WorldHandle,
}

impl AppState {
    /// Build the arena and the world. The caller spawns the returned world task.
    pub fn new(config: Config) -> (Self, GameWorld) {
        let config = Arc::new(config);

        // Arena geometry is generated once and never changes
        let arena = Arc::new(ArenaLayout::generate(&ArenaConfig::default()));
        info!(
            floor_tiles = arena.floor.len(),
            wall_blocks = arena.blocks.len(),
            "Arena generated"
        );

        let seed = config
            .world_seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let (world, handle) = GameWorld::new(seed);

        let state = Self {
            config,
            arena,
            world: handle,
        };

        (state, world)
    }
}
