//! Time utilities for the world task

use std::time::Duration;

use tokio::time::Instant;

/// Server-side cooldown tick rate
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second

/// Period of one world tick
pub fn tick_interval() -> Duration {
    Duration::from_secs(1) / SIMULATION_TPS
}

/// Measures real time between calls, so missed or late ticks are not lost
#[derive(Debug)]
pub struct ElapsedClock {
    last: Instant,
}

impl ElapsedClock {
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous call (or since start)
    pub fn lap(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed.as_secs_f32()
    }
}
