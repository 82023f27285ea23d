//! The pond: owner of the fish collection and its state transitions.
//!
//! A [`Pond`] spawns, ages, reaps, and releases fish, and keeps the
//! aggregate stats partitioned by origin. Every transition mirrors
//! itself into the persistence and metrics adapters; adapter failures
//! are logged and never roll back the in-memory transition, because the
//! in-memory collection is the source of truth.
//!
//! Collection invariants (violations are programming defects, checked
//! with debug assertions):
//!
//! - no two fish share an identifier at any instant;
//! - every held fish has `remaining_lifetime > 0` between ticks;
//! - `stats.local + stats.visitor` equals the collection size, with
//!   the two sides partitioned by [`Origin`].

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shoal_protocol::ReleaseMessage;
use shoal_types::{Fish, FishId, Origin, PondName, PondStats, SwimArea};
use tracing::{debug, warn};

use crate::adapters::{FishStore, MetricsSink};
use crate::config::{SimulationConfig, WorldConfig};

/// Validation and lookup failures for lifecycle operations.
///
/// None of these are fatal: callers log the rejection and carry on.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The requested fish is not in the collection.
    #[error("no fish with id {id} in the collection")]
    NotFound {
        /// The identifier that was looked up.
        id: FishId,
    },

    /// The requested fish is a visitor; only local fish can be released.
    #[error("fish {id} is not locally owned and cannot be released")]
    NotLocal {
        /// The identifier that was looked up.
        id: FishId,
    },

    /// An inbound release claimed this pond as its owner. A peer must
    /// never be able to inject a "local" fish.
    #[error("inbound release from {owner} claims local ownership")]
    OwnPondRelease {
        /// The owner pond named in the rejected payload.
        owner: PondName,
    },

    /// An inbound release carried an identifier already present in the
    /// collection.
    #[error("fish {id} is already present in the collection")]
    DuplicateId {
        /// The colliding identifier.
        id: FishId,
    },
}

/// Movement, lifetime, and animation tuning for one pond.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PondSettings {
    /// The region fish swim in.
    pub area: SwimArea,
    /// Lifetime in seconds given to locally spawned fish.
    pub initial_lifetime_secs: f64,
    /// Movement speed in units per tick for newly placed fish.
    pub swim_speed: f64,
    /// Seconds each animation frame is held before advancing.
    pub frame_duration_secs: f64,
    /// Length of the cyclic animation frame sequence.
    pub frame_cycle: usize,
    /// Per-tick probability of a random heading perturbation.
    pub turn_chance: f64,
    /// Maximum magnitude of a heading perturbation, in radians.
    pub turn_max_radians: f64,
}

impl PondSettings {
    /// Build settings from the loaded configuration sections.
    pub const fn from_config(world: &WorldConfig, simulation: &SimulationConfig) -> Self {
        Self {
            area: world.area(),
            initial_lifetime_secs: simulation.initial_lifetime_secs,
            swim_speed: simulation.swim_speed,
            frame_duration_secs: simulation.frame_duration_secs,
            frame_cycle: simulation.frame_cycle,
            turn_chance: simulation.turn_chance,
            turn_max_radians: simulation.turn_max_radians,
        }
    }
}

impl Default for PondSettings {
    fn default() -> Self {
        Self {
            area: SwimArea::default(),
            initial_lifetime_secs: 15.0,
            swim_speed: 2.0,
            frame_duration_secs: 0.1,
            frame_cycle: 4,
            turn_chance: 0.02,
            turn_max_radians: 0.5,
        }
    }
}

/// Summary of a single tick's lifecycle effects.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// Fish whose lifetime expired during this tick (already removed).
    pub reaped: Vec<Fish>,
    /// Collection size at end of tick.
    pub alive: u64,
}

/// How a fish left the collection.
enum Removal {
    /// Lifetime expiry; counted in the removed-total series.
    Reaped,
    /// Explicit hand-off to the bus; not a removal in the metrics sense.
    Released,
}

/// One pond's fish collection, stats, and transition logic.
///
/// The collection is a `BTreeMap` keyed by fish identifier, giving the
/// snapshot a stable, deterministic order.
#[derive(Debug)]
pub struct Pond<S, M> {
    name: PondName,
    settings: PondSettings,
    fishes: BTreeMap<FishId, Fish>,
    stats: PondStats,
    rng: StdRng,
    store: S,
    metrics: M,
}

impl<S: FishStore, M: MetricsSink> Pond<S, M> {
    /// Create an empty pond.
    ///
    /// `seed` drives all placement and drift randomness, so runs with
    /// the same seed and the same inputs are reproducible.
    pub fn new(name: PondName, settings: PondSettings, seed: u64, store: S, metrics: M) -> Self {
        Self {
            name,
            settings,
            fishes: BTreeMap::new(),
            stats: PondStats::default(),
            rng: StdRng::seed_from_u64(seed),
            store,
            metrics,
        }
    }

    /// This pond's name.
    pub const fn name(&self) -> &PondName {
        &self.name
    }

    /// Current aggregate stats.
    pub const fn stats(&self) -> PondStats {
        self.stats
    }

    /// Number of fish currently held.
    pub fn len(&self) -> usize {
        self.fishes.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.fishes.is_empty()
    }

    /// Whether a fish with this identifier is currently held.
    pub fn contains(&self, id: &FishId) -> bool {
        self.fishes.contains_key(id)
    }

    /// Read-only view of the collection in identifier order.
    ///
    /// For rendering and inspection; the returned records must not be
    /// used to mutate simulation state.
    pub fn snapshot(&self) -> impl Iterator<Item = &Fish> {
        self.fishes.values()
    }

    /// The first locally-owned fish in snapshot order, if any.
    ///
    /// The control surface's bare "release one" gesture uses this to
    /// pick its subject.
    pub fn first_local_id(&self) -> Option<FishId> {
        self.fishes
            .values()
            .find(|fish| fish.origin(&self.name) == Origin::Local)
            .map(|fish| fish.id.clone())
    }

    /// Spawn a fish owned by this pond at a random in-bounds position.
    ///
    /// Increments `stats.total` and `stats.local`, stores the record,
    /// and moves the spawned/active/local series, in that order.
    pub async fn spawn_local(&mut self) -> Fish {
        let id = self.mint_id();
        let lifetime = self.settings.initial_lifetime_secs;
        let fish = self.place(id, self.name.clone(), lifetime);
        debug!(id = %fish.id, "spawning local fish");
        self.admit(fish, Origin::Local).await
    }

    /// Adopt a fish released by another pond.
    ///
    /// `id`, `owner_pond`, and `remaining_lifetime` are taken verbatim
    /// from the payload; position, heading, speed, and animation state
    /// are freshly randomized exactly as in [`Self::spawn_local`].
    /// Increments `stats.total` and `stats.visitor`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::OwnPondRelease`] if the payload claims
    /// this pond as owner, or [`LifecycleError::DuplicateId`] if the
    /// identifier is already held. Both are logged no-ops on the
    /// collection.
    pub async fn spawn_visitor(
        &mut self,
        release: ReleaseMessage,
    ) -> Result<Fish, LifecycleError> {
        if release.owner_pond == self.name {
            warn!(
                id = %release.id,
                "refusing inbound release that claims local ownership"
            );
            return Err(LifecycleError::OwnPondRelease {
                owner: release.owner_pond,
            });
        }
        if self.fishes.contains_key(&release.id) {
            warn!(id = %release.id, "refusing inbound release with duplicate id");
            return Err(LifecycleError::DuplicateId { id: release.id });
        }
        if !release.id.minted_by(&release.owner_pond) {
            // The protocol cannot verify ownership across peers; admit
            // the fish but leave a trace for operators.
            warn!(
                id = %release.id,
                owner = %release.owner_pond,
                "inbound release id was not minted by its claimed owner"
            );
        }

        let fish = self.place(release.id, release.owner_pond, release.remaining_lifetime);
        debug!(id = %fish.id, owner = %fish.owner_pond, "adopting visitor fish");
        Ok(self.admit(fish, Origin::Visitor).await)
    }

    /// Advance every fish by one tick, then reap expired fish.
    ///
    /// Per fish: move along the heading, reflect at the area edges,
    /// advance the animation frame on its cadence, consume `dt` seconds
    /// of lifetime, and occasionally perturb the heading. Afterwards,
    /// every fish at or below zero lifetime is removed in this same
    /// tick with full reap bookkeeping.
    pub async fn tick(&mut self, dt: f64) -> TickSummary {
        let area = self.settings.area;
        let frame_duration = self.settings.frame_duration_secs;
        let cycle = self.settings.frame_cycle.max(1);
        let turn_chance = self.settings.turn_chance.clamp(0.0, 1.0);
        let turn_max = self.settings.turn_max_radians;

        for fish in self.fishes.values_mut() {
            fish.x += fish.direction.cos() * fish.speed;
            fish.y += fish.direction.sin() * fish.speed;

            // Reflect the heading when an edge was crossed.
            if fish.x < 0.0 || fish.x > area.width {
                fish.direction = PI - fish.direction;
            }
            if fish.y < 0.0 || fish.y > area.height {
                fish.direction = -fish.direction;
            }

            fish.frame_elapsed += dt;
            if fish.frame_elapsed > frame_duration {
                fish.frame = fish.frame.wrapping_add(1) % cycle;
                fish.frame_elapsed = 0.0;
            }

            fish.remaining_lifetime -= dt;

            if self.rng.random_bool(turn_chance) {
                fish.direction += self.rng.random_range(-turn_max..=turn_max);
            }
        }

        let expired: Vec<FishId> = self
            .fishes
            .iter()
            .filter(|(_, fish)| fish.remaining_lifetime <= 0.0)
            .map(|(id, _)| id.clone())
            .collect();

        let mut reaped = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(fish) = self.fishes.remove(&id) {
                debug!(id = %fish.id, "reaping expired fish");
                self.retire(&fish, &Removal::Reaped).await;
                reaped.push(fish);
            }
        }

        self.assert_partition();
        TickSummary {
            alive: self.stats.active(),
            reaped,
        }
    }

    /// Remove one locally-owned fish for publication to the bus.
    ///
    /// The fish leaves the collection with normal removal bookkeeping
    /// (gauges, stats, persisted record) but is NOT counted as removed
    /// in the removed-total series: a release is a transfer, not a
    /// death. The caller publishes the returned fish.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] if the identifier is absent
    /// or [`LifecycleError::NotLocal`] if the fish is a visitor.
    pub async fn release_local(&mut self, id: &FishId) -> Result<Fish, LifecycleError> {
        match self.fishes.get(id) {
            None => Err(LifecycleError::NotFound { id: id.clone() }),
            Some(fish) if fish.origin(&self.name) == Origin::Visitor => {
                Err(LifecycleError::NotLocal { id: id.clone() })
            }
            Some(_) => match self.fishes.remove(id) {
                Some(fish) => {
                    debug!(id = %fish.id, "releasing local fish to the bus");
                    self.retire(&fish, &Removal::Released).await;
                    self.assert_partition();
                    Ok(fish)
                }
                None => Err(LifecycleError::NotFound { id: id.clone() }),
            },
        }
    }

    /// Mint a fresh identifier for a local spawn.
    ///
    /// Spawning twice in the same microsecond must still yield distinct
    /// identifiers, so the stamp is bumped past any collision.
    fn mint_id(&mut self) -> FishId {
        let mut stamp = Utc::now().timestamp_micros();
        let mut id = FishId::spawned(&self.name, stamp);
        while self.fishes.contains_key(&id) {
            stamp = stamp.saturating_add(1);
            id = FishId::spawned(&self.name, stamp);
        }
        id
    }

    /// Build a fish at a random in-bounds position with a random
    /// heading.
    fn place(&mut self, id: FishId, owner: PondName, lifetime: f64) -> Fish {
        let area = self.settings.area;
        let x_max = (area.width - area.margin).max(area.margin);
        let y_max = (area.height - area.margin).max(area.margin);
        Fish {
            id,
            owner_pond: owner,
            x: self.rng.random_range(area.margin..=x_max),
            y: self.rng.random_range(area.margin..=y_max),
            direction: self.rng.random_range(0.0..TAU),
            speed: self.settings.swim_speed,
            remaining_lifetime: lifetime,
            frame: 0,
            frame_elapsed: 0.0,
        }
    }

    /// Insert a placed fish and run the spawn transition's side
    /// effects: stats, stored record, then metrics, in that order.
    async fn admit(&mut self, fish: Fish, origin: Origin) -> Fish {
        let record = fish.record();
        self.fishes.insert(fish.id.clone(), fish.clone());

        self.stats.total = self.stats.total.saturating_add(1);
        match origin {
            Origin::Local => self.stats.local = self.stats.local.saturating_add(1),
            Origin::Visitor => self.stats.visitor = self.stats.visitor.saturating_add(1),
        }

        if let Err(error) = self.store.store(&record).await {
            warn!(id = %fish.id, %error, "fish record store failed; in-memory state unaffected");
        }

        self.metrics.spawned_inc();
        self.metrics.active_inc();
        match origin {
            Origin::Local => self.metrics.local_inc(),
            Origin::Visitor => self.metrics.visitor_inc(),
        }

        self.assert_partition();
        fish
    }

    /// Run the removal side effects for a fish already taken out of
    /// the collection.
    async fn retire(&mut self, fish: &Fish, removal: &Removal) {
        let origin = fish.origin(&self.name);
        match origin {
            Origin::Local => {
                debug_assert!(self.stats.local > 0, "local stat underflow");
                self.stats.local = self.stats.local.saturating_sub(1);
            }
            Origin::Visitor => {
                debug_assert!(self.stats.visitor > 0, "visitor stat underflow");
                self.stats.visitor = self.stats.visitor.saturating_sub(1);
            }
        }

        if let Err(error) = self.store.delete(&fish.id).await {
            warn!(id = %fish.id, %error, "fish record delete failed; in-memory state unaffected");
        }

        if matches!(removal, Removal::Reaped) {
            self.metrics.removed_inc();
        }
        self.metrics.active_dec();
        match origin {
            Origin::Local => self.metrics.local_dec(),
            Origin::Visitor => self.metrics.visitor_dec(),
        }
    }

    /// Debug-check the stats partition against the collection size.
    fn assert_partition(&self) {
        debug_assert_eq!(
            self.stats.active(),
            u64::try_from(self.fishes.len()).unwrap_or(u64::MAX),
            "stats partition must equal collection size"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

    use async_trait::async_trait;
    use shoal_types::FishRecord;

    use super::*;
    use crate::adapters::StoreError;

    /// A metrics sink that counts every series movement, shareable
    /// between the pond and the test body.
    #[derive(Debug, Default)]
    struct Counts {
        spawned: AtomicU64,
        removed: AtomicU64,
        active: AtomicI64,
        local: AtomicI64,
        visitor: AtomicI64,
    }

    #[derive(Debug, Clone, Default)]
    struct CountingSink(Arc<Counts>);

    impl MetricsSink for CountingSink {
        fn spawned_inc(&self) {
            self.0.spawned.fetch_add(1, Ordering::Relaxed);
        }
        fn removed_inc(&self) {
            self.0.removed.fetch_add(1, Ordering::Relaxed);
        }
        fn active_inc(&self) {
            self.0.active.fetch_add(1, Ordering::Relaxed);
        }
        fn active_dec(&self) {
            self.0.active.fetch_sub(1, Ordering::Relaxed);
        }
        fn local_inc(&self) {
            self.0.local.fetch_add(1, Ordering::Relaxed);
        }
        fn local_dec(&self) {
            self.0.local.fetch_sub(1, Ordering::Relaxed);
        }
        fn visitor_inc(&self) {
            self.0.visitor.fetch_add(1, Ordering::Relaxed);
        }
        fn visitor_dec(&self) {
            self.0.visitor.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// A store that records which identifiers were stored and deleted.
    #[derive(Debug, Clone, Default)]
    struct RecordingStore {
        stored: Arc<Mutex<Vec<FishId>>>,
        deleted: Arc<Mutex<Vec<FishId>>>,
    }

    #[async_trait]
    impl FishStore for RecordingStore {
        async fn store(&self, record: &FishRecord) -> Result<(), StoreError> {
            self.stored.lock().unwrap().push(record.name.clone());
            Ok(())
        }

        async fn delete(&self, id: &FishId) -> Result<(), StoreError> {
            self.deleted.lock().unwrap().push(id.clone());
            Ok(())
        }

        async fn fetch(&self, _id: &FishId) -> Result<Option<FishRecord>, StoreError> {
            Ok(None)
        }
    }

    /// A store whose every operation fails.
    #[derive(Debug, Clone, Copy, Default)]
    struct FailingStore;

    #[async_trait]
    impl FishStore for FailingStore {
        async fn store(&self, _record: &FishRecord) -> Result<(), StoreError> {
            Err(StoreError::new("store offline"))
        }

        async fn delete(&self, _id: &FishId) -> Result<(), StoreError> {
            Err(StoreError::new("store offline"))
        }

        async fn fetch(&self, _id: &FishId) -> Result<Option<FishRecord>, StoreError> {
            Err(StoreError::new("store offline"))
        }
    }

    fn make_pond() -> (Pond<RecordingStore, CountingSink>, RecordingStore, Arc<Counts>) {
        let store = RecordingStore::default();
        let sink = CountingSink::default();
        let counts = Arc::clone(&sink.0);
        let pond = Pond::new(
            PondName::from("NetLink"),
            PondSettings::default(),
            7,
            store.clone(),
            sink,
        );
        (pond, store, counts)
    }

    fn release(id: &str, owner: &str, lifetime: f64) -> ReleaseMessage {
        ReleaseMessage {
            id: FishId::from(id),
            owner_pond: PondName::from(owner),
            remaining_lifetime: lifetime,
        }
    }

    fn assert_partition<S: FishStore, M: MetricsSink>(pond: &Pond<S, M>) {
        let stats = pond.stats();
        assert_eq!(
            stats.local + stats.visitor,
            u64::try_from(pond.len()).unwrap()
        );
    }

    #[tokio::test]
    async fn stats_partition_holds_across_operations() {
        let (mut pond, _store, _counts) = make_pond();

        let local = pond.spawn_local().await;
        assert_partition(&pond);

        pond.spawn_local().await;
        assert_partition(&pond);

        pond.spawn_visitor(release("Acme_1", "Acme", 10.0))
            .await
            .unwrap();
        assert_partition(&pond);

        pond.tick(0.016).await;
        assert_partition(&pond);

        pond.release_local(&local.id).await.unwrap();
        assert_partition(&pond);

        let stats = pond.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.local, 1);
        assert_eq!(stats.visitor, 1);
    }

    #[tokio::test]
    async fn spawned_ids_are_unique() {
        let (mut pond, _store, _counts) = make_pond();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..5 {
            let fish = pond.spawn_local().await;
            assert!(seen.insert(fish.id.clone()), "duplicate id {}", fish.id);
        }
        assert_eq!(pond.len(), 5);
    }

    #[tokio::test]
    async fn visitor_adoption_takes_transfer_fields_verbatim() {
        let (mut pond, store, counts) = make_pond();

        let fish = pond
            .spawn_visitor(release("Acme_123", "Acme", 10.0))
            .await
            .unwrap();

        assert_eq!(fish.id, FishId::from("Acme_123"));
        assert_eq!(fish.owner_pond, PondName::from("Acme"));
        assert!((fish.remaining_lifetime - 10.0).abs() < f64::EPSILON);
        assert_eq!(fish.origin(&PondName::from("NetLink")), Origin::Visitor);

        // Locally assigned state is in bounds.
        let area = SwimArea::default();
        assert!(fish.x >= area.margin && fish.x <= area.width - area.margin);
        assert!(fish.y >= area.margin && fish.y <= area.height - area.margin);
        assert!((fish.speed - 2.0).abs() < f64::EPSILON);
        assert_eq!(fish.frame, 0);

        let stats = pond.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.visitor, 1);
        assert_eq!(stats.local, 0);
        assert_eq!(counts.visitor.load(Ordering::Relaxed), 1);
        assert_eq!(
            store.stored.lock().unwrap().as_slice(),
            &[FishId::from("Acme_123")]
        );
    }

    #[tokio::test]
    async fn own_pond_release_is_a_no_op() {
        let (mut pond, _store, _counts) = make_pond();

        let result = pond
            .spawn_visitor(release("NetLink_9", "NetLink", 5.0))
            .await;

        assert!(matches!(
            result,
            Err(LifecycleError::OwnPondRelease { .. })
        ));
        assert_eq!(pond.len(), 0);
        assert_eq!(pond.stats().total, 0);
    }

    #[tokio::test]
    async fn duplicate_visitor_id_is_a_no_op() {
        let (mut pond, _store, _counts) = make_pond();

        pond.spawn_visitor(release("Acme_1", "Acme", 10.0))
            .await
            .unwrap();
        let result = pond.spawn_visitor(release("Acme_1", "Acme", 8.0)).await;

        assert!(matches!(result, Err(LifecycleError::DuplicateId { .. })));
        assert_eq!(pond.len(), 1);
        assert_eq!(pond.stats().total, 1);
    }

    #[tokio::test]
    async fn forged_owner_prefix_is_admitted_but_flagged() {
        // The protocol cannot enforce ownership across peers; the
        // reference behavior is to accept. See the lifecycle docs.
        let (mut pond, _store, _counts) = make_pond();
        let fish = pond
            .spawn_visitor(release("SomeoneElse_4", "Acme", 6.0))
            .await
            .unwrap();
        assert_eq!(fish.owner_pond, PondName::from("Acme"));
        assert_eq!(pond.len(), 1);
    }

    #[tokio::test]
    async fn release_local_hands_off_without_removed_count() {
        let (mut pond, store, counts) = make_pond();
        let fish = pond.spawn_local().await;

        let released = pond.release_local(&fish.id).await.unwrap();

        assert_eq!(released.id, fish.id);
        assert_eq!(pond.len(), 0);
        assert_eq!(pond.stats().local, 0);
        // A release is a transfer, not a death.
        assert_eq!(counts.removed.load(Ordering::Relaxed), 0);
        assert_eq!(counts.active.load(Ordering::Relaxed), 0);
        assert_eq!(counts.local.load(Ordering::Relaxed), 0);
        // The persisted mirror no longer holds the fish.
        assert_eq!(store.deleted.lock().unwrap().as_slice(), &[fish.id]);
        // The monotonic spawn count is untouched by removal.
        assert_eq!(pond.stats().total, 1);
    }

    #[tokio::test]
    async fn release_local_rejects_visitors() {
        let (mut pond, _store, _counts) = make_pond();
        let visitor = pond
            .spawn_visitor(release("Acme_5", "Acme", 10.0))
            .await
            .unwrap();

        let result = pond.release_local(&visitor.id).await;

        assert!(matches!(result, Err(LifecycleError::NotLocal { .. })));
        assert_eq!(pond.len(), 1);
        assert_eq!(pond.stats().visitor, 1);
    }

    #[tokio::test]
    async fn release_local_rejects_unknown_ids() {
        let (mut pond, _store, _counts) = make_pond();
        let result = pond.release_local(&FishId::from("Nobody_1")).await;
        assert!(matches!(result, Err(LifecycleError::NotFound { .. })));
    }

    #[tokio::test]
    async fn expired_fish_leave_in_the_same_tick() {
        let (mut pond, _store, _counts) = make_pond();
        pond.spawn_local().await;

        // Never observe a fish with negative lifetime after a tick.
        for _ in 0..2000 {
            pond.tick(0.016).await;
            assert!(pond.snapshot().all(|fish| fish.remaining_lifetime > 0.0));
            if pond.is_empty() {
                return;
            }
        }
        panic!("fish never expired");
    }

    #[tokio::test]
    async fn full_lifetime_reap_scenario() {
        let (mut pond, store, counts) = make_pond();
        let fish = pond.spawn_local().await;

        // 937 ticks at 0.016 leave 15.0 - 14.992 = 0.008 s of life.
        for _ in 0..937 {
            pond.tick(0.016).await;
        }
        assert!(pond.contains(&fish.id));

        // Tick 938 crosses zero; the fish must be gone immediately.
        let summary = pond.tick(0.016).await;
        assert!(!pond.contains(&fish.id));
        assert_eq!(summary.reaped.len(), 1);
        assert_eq!(summary.alive, 0);
        assert_eq!(counts.removed.load(Ordering::Relaxed), 1);
        assert_eq!(counts.active.load(Ordering::Relaxed), 0);
        assert_eq!(pond.stats().local, 0);
        assert_eq!(store.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn adapter_failure_does_not_roll_back() {
        let sink = CountingSink::default();
        let counts = Arc::clone(&sink.0);
        let mut pond = Pond::new(
            PondName::from("NetLink"),
            PondSettings::default(),
            7,
            FailingStore,
            sink,
        );

        let fish = pond.spawn_local().await;

        // The in-memory transition stands despite the store failure.
        assert!(pond.contains(&fish.id));
        assert_eq!(pond.stats().local, 1);
        assert_eq!(counts.spawned.load(Ordering::Relaxed), 1);
        assert_eq!(counts.active.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn frame_advances_on_its_cadence() {
        let (mut pond, _store, _counts) = make_pond();
        let fish = pond.spawn_local().await;

        // Six ticks accumulate 0.096 s: not yet past the 0.1 s hold.
        for _ in 0..6 {
            pond.tick(0.016).await;
        }
        let frame_after_six = pond
            .snapshot()
            .find(|f| f.id == fish.id)
            .map(|f| f.frame)
            .unwrap();
        assert_eq!(frame_after_six, 0);

        // The seventh tick crosses it.
        pond.tick(0.016).await;
        let frame_after_seven = pond
            .snapshot()
            .find(|f| f.id == fish.id)
            .map(|f| f.frame)
            .unwrap();
        assert_eq!(frame_after_seven, 1);
    }

    #[tokio::test]
    async fn frame_wraps_at_cycle_length() {
        let (mut pond, _store, _counts) = make_pond();
        let fish = pond.spawn_local().await;

        // Four advances with the default cycle of 4 wrap back to 0.
        // Each advance takes 7 ticks of 0.016 s.
        for _ in 0..28 {
            pond.tick(0.016).await;
        }
        let frame = pond
            .snapshot()
            .find(|f| f.id == fish.id)
            .map(|f| f.frame)
            .unwrap();
        assert_eq!(frame, 0);
    }
}
