//! The fish entity record and its supporting types.
//!
//! A fish is a pure simulation record: position, heading, lifetime, and
//! the cyclic animation frame index. Sprite images are a presentation
//! concern -- renderers look them up by owner pond at draw time, so no
//! presentation payload lives in the record itself.

use serde::{Deserialize, Serialize};

use crate::ids::{FishId, PondName};

/// Whether a fish was spawned here or adopted from another pond.
///
/// Derived from the owner pond, never stored: a fish is [`Origin::Local`]
/// exactly when its `owner_pond` equals the running pond's own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Spawned by this pond.
    Local,
    /// Received over the message bus from another pond.
    Visitor,
}

/// The rectangular region fish swim in.
///
/// Fish spawn at least `margin` units away from every edge; movement
/// reflects the heading when a fish crosses an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwimArea {
    /// Width of the area in simulation units.
    pub width: f64,
    /// Height of the area in simulation units.
    pub height: f64,
    /// Distance from the edges inside which new fish are placed.
    pub margin: f64,
}

impl SwimArea {
    /// Create an area with the given dimensions and spawn margin.
    pub const fn new(width: f64, height: f64, margin: f64) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }
}

impl Default for SwimArea {
    fn default() -> Self {
        Self::new(800.0, 600.0, 50.0)
    }
}

/// One simulated fish.
///
/// Mutated every simulation tick (position, frame, lifetime, occasional
/// heading perturbation) and destroyed either by lifetime expiry or by
/// an explicit release to the message bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fish {
    /// Globally unique identifier, assigned at spawn, never reused.
    pub id: FishId,

    /// The pond that originally spawned this fish. Immutable.
    pub owner_pond: PondName,

    /// Horizontal position within the swim area.
    pub x: f64,

    /// Vertical position within the swim area.
    pub y: f64,

    /// Heading angle in radians.
    pub direction: f64,

    /// Movement speed in units per tick. Constant after spawn.
    pub speed: f64,

    /// Seconds of life remaining; the fish is reaped at or below zero.
    pub remaining_lifetime: f64,

    /// Current index into the cyclic sprite-frame sequence.
    pub frame: usize,

    /// Seconds accumulated since the last frame advance.
    pub frame_elapsed: f64,
}

impl Fish {
    /// Classify this fish relative to the running pond.
    pub fn origin(&self, self_pond: &PondName) -> Origin {
        if self.owner_pond == *self_pond {
            Origin::Local
        } else {
            Origin::Visitor
        }
    }

    /// Build the persisted key-value shape for this fish.
    pub fn record(&self) -> FishRecord {
        FishRecord {
            name: self.id.clone(),
            owner_pond: self.owner_pond.clone(),
            x: self.x,
            y: self.y,
            remaining_lifetime: self.remaining_lifetime,
            speed: self.speed,
        }
    }
}

/// The shape stored in the external key-value mirror under `fish:{id}`.
///
/// A best-effort copy of the simulation state; the in-memory collection
/// remains the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishRecord {
    /// The fish identifier (the key suffix).
    pub name: FishId,
    /// The pond that spawned the fish.
    pub owner_pond: PondName,
    /// Horizontal position at store time.
    pub x: f64,
    /// Vertical position at store time.
    pub y: f64,
    /// Remaining lifetime at store time.
    pub remaining_lifetime: f64,
    /// Movement speed.
    pub speed: f64,
}

/// Aggregate counters kept by the lifecycle manager.
///
/// `total` is monotonic (every fish ever spawned here, local or
/// visitor); `local + visitor` always equals the current collection
/// size, partitioned by [`Origin`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PondStats {
    /// Fish ever spawned into this pond's collection. Never decremented.
    pub total: u64,
    /// Currently held fish owned by this pond.
    pub local: u64,
    /// Currently held fish owned by other ponds.
    pub visitor: u64,
}

impl PondStats {
    /// Current collection size implied by the partition.
    pub const fn active(&self) -> u64 {
        self.local.saturating_add(self.visitor)
    }
}
