//! Fixed-cadence simulation clock and spawn cadence.
//!
//! The clock is a pure timer: it counts ticks, knows how much simulated
//! lifetime one tick consumes, and tracks the wall-clock spawn cadence.
//! It holds no entity data. Tick pacing itself (sleeping between ticks)
//! belongs to the actor loop; spawn cadence uses wall-clock time so it
//! stays at its configured interval regardless of tick rate.

use std::time::{Duration, Instant};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid timing configuration.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Tick counter and cadence tracker for one pond.
#[derive(Debug, Clone, PartialEq)]
pub struct TickClock {
    /// Ticks executed so far (0 before the first tick).
    tick: u64,

    /// Real-time interval between ticks.
    tick_interval: Duration,

    /// Simulated seconds consumed per tick.
    dt: f64,

    /// Wall-clock interval between automatic local spawns.
    spawn_interval: Duration,

    /// When the last automatic spawn fired.
    last_spawn: Instant,
}

impl TickClock {
    /// Create a clock from tick and spawn cadence settings.
    ///
    /// `now` anchors the spawn cadence so the first automatic spawn
    /// happens one full interval after startup.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the tick interval or
    /// the per-tick decay is zero.
    pub fn new(
        tick_interval_ms: u64,
        dt_secs: f64,
        spawn_interval_secs: u64,
        now: Instant,
    ) -> Result<Self, ClockError> {
        if tick_interval_ms == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "tick_interval_ms must be at least 1".to_owned(),
            });
        }
        if dt_secs <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: "lifetime decay per tick must be positive".to_owned(),
            });
        }

        Ok(Self {
            tick: 0,
            tick_interval: Duration::from_millis(tick_interval_ms),
            dt: dt_secs,
            spawn_interval: Duration::from_secs(spawn_interval_secs),
            last_spawn: now,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would
    /// exceed `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Real-time interval between ticks.
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Simulated seconds consumed per tick.
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Wall-clock interval between automatic local spawns.
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }

    /// Whether an automatic spawn is due at `now`.
    ///
    /// Consumes the cadence when it fires: the next spawn becomes due
    /// one full interval after `now`.
    pub fn spawn_due(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_spawn) > self.spawn_interval {
            self.last_spawn = now;
            true
        } else {
            false
        }
    }
}
