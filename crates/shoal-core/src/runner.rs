//! The pond actor: the single mutation context for the collection.
//!
//! Two activities must be coordinated: the periodic simulation tick and
//! inbound release delivery from the transport. Instead of a lock, the
//! collection lives inside one task that multiplexes over the tick
//! interval, a bounded inbound channel of already-decoded releases, and
//! a command channel from the control surface. Decoding happens in the
//! transport task, outside this actor; only the resulting lifecycle
//! call runs here, so no operation blocks on network I/O while the
//! collection is being mutated.
//!
//! Ticks are strictly sequential. Inbound releases apply in delivery
//! order and may interleave between ticks. A message either fully
//! produces a fish with all bookkeeping updated, or has no effect; on
//! stop, already-queued releases are drained before the actor returns.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use shoal_protocol::{ReleaseMessage, codec};
use shoal_types::{Fish, FishId, PondStats};
use tokio::sync::{RwLock, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::adapters::{FishStore, MetricsSink};
use crate::clock::{ClockError, TickClock};
use crate::lifecycle::Pond;

/// Errors that can occur during the actor run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// A control-surface request submitted to the actor.
#[derive(Debug, Clone, PartialEq)]
pub enum PondCommand {
    /// Spawn one locally-owned fish immediately.
    SpawnLocal,
    /// Release a locally-owned fish to the bus. With no identifier,
    /// the first local fish in snapshot order is chosen.
    Release {
        /// The fish to release, or `None` for the first local one.
        id: Option<FishId>,
    },
    /// Change the subject outbound releases are published on.
    SetTopic {
        /// The new outbound subject.
        topic: String,
    },
    /// Drain queued inbound releases and stop the actor.
    Stop,
}

/// One outbound payload for the transport to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// The bus subject to publish on.
    pub subject: String,
    /// The encoded message bytes.
    pub payload: Vec<u8>,
}

/// Read-only state published for the control surface after each tick.
#[derive(Debug, Clone, Serialize)]
pub struct PondView {
    /// Ticks executed so far.
    pub tick: u64,
    /// Current outbound subject.
    pub topic: String,
    /// Aggregate stats at the last refresh.
    pub stats: PondStats,
    /// The collection in snapshot order at the last refresh.
    pub fishes: Vec<Fish>,
}

impl PondView {
    /// An empty view for engine startup, before the first tick.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            tick: 0,
            topic: topic.into(),
            stats: PondStats::default(),
            fishes: Vec::new(),
        }
    }
}

/// Why the actor returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A [`PondCommand::Stop`] was received.
    StopRequested,
    /// Every command sender was dropped.
    ControlChannelClosed,
}

/// Final report of an actor run.
#[derive(Debug, Clone)]
pub struct RunnerReport {
    /// Why the actor returned.
    pub end_reason: EndReason,
    /// Total ticks executed.
    pub total_ticks: u64,
    /// Stats at shutdown.
    pub final_stats: PondStats,
}

/// Run the pond actor until stopped.
///
/// Multiplexes the tick interval, the inbound release channel, and the
/// command channel; refreshes `view` after every tick and once more at
/// shutdown.
///
/// # Errors
///
/// Returns [`RunnerError`] if the tick counter overflows.
pub async fn run_pond<S: FishStore, M: MetricsSink>(
    mut pond: Pond<S, M>,
    mut clock: TickClock,
    mut inbound: mpsc::Receiver<ReleaseMessage>,
    mut commands: mpsc::Receiver<PondCommand>,
    outbound: mpsc::Sender<OutboundFrame>,
    view: Arc<RwLock<PondView>>,
    topic: String,
) -> Result<RunnerReport, RunnerError> {
    let mut interval = tokio::time::interval(clock.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut inbound_open = true;
    let mut topic = topic;

    info!(pond = %pond.name(), "pond actor entering tick loop");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if clock.spawn_due(Instant::now()) {
                    let fish = pond.spawn_local().await;
                    info!(id = %fish.id, "automatic local spawn");
                }
                let tick = clock.advance()?;
                let summary = pond.tick(clock.dt()).await;
                if !summary.reaped.is_empty() {
                    debug!(tick, reaped = summary.reaped.len(), "reaped expired fish");
                }
                refresh_view(&view, tick, &topic, &pond).await;
            }

            message = inbound.recv(), if inbound_open => {
                match message {
                    Some(release) => apply_release(&mut pond, release).await,
                    None => inbound_open = false,
                }
            }

            command = commands.recv() => {
                match command {
                    Some(PondCommand::SpawnLocal) => {
                        let fish = pond.spawn_local().await;
                        info!(id = %fish.id, "local spawn requested");
                    }
                    Some(PondCommand::Release { id }) => {
                        release_to_bus(&mut pond, id, &topic, &outbound).await;
                    }
                    Some(PondCommand::SetTopic { topic: next }) => {
                        info!(topic = %next, "outbound topic changed");
                        topic = next;
                    }
                    Some(PondCommand::Stop) => {
                        drain_inbound(&mut pond, &mut inbound).await;
                        refresh_view(&view, clock.tick(), &topic, &pond).await;
                        info!("pond actor stopping on request");
                        return Ok(RunnerReport {
                            end_reason: EndReason::StopRequested,
                            total_ticks: clock.tick(),
                            final_stats: pond.stats(),
                        });
                    }
                    None => {
                        drain_inbound(&mut pond, &mut inbound).await;
                        refresh_view(&view, clock.tick(), &topic, &pond).await;
                        info!("control channel closed; pond actor stopping");
                        return Ok(RunnerReport {
                            end_reason: EndReason::ControlChannelClosed,
                            total_ticks: clock.tick(),
                            final_stats: pond.stats(),
                        });
                    }
                }
            }
        }
    }
}

/// Apply one admitted inbound release to the pond.
async fn apply_release<S: FishStore, M: MetricsSink>(
    pond: &mut Pond<S, M>,
    release: ReleaseMessage,
) {
    match pond.spawn_visitor(release).await {
        Ok(fish) => info!(id = %fish.id, owner = %fish.owner_pond, "visitor fish adopted"),
        Err(error) => debug!(%error, "inbound release rejected"),
    }
}

/// Remove one local fish and hand its encoded release to the transport.
async fn release_to_bus<S: FishStore, M: MetricsSink>(
    pond: &mut Pond<S, M>,
    id: Option<FishId>,
    topic: &str,
    outbound: &mpsc::Sender<OutboundFrame>,
) {
    let Some(target) = id.or_else(|| pond.first_local_id()) else {
        debug!("no locally owned fish to release");
        return;
    };

    match pond.release_local(&target).await {
        Ok(fish) => match codec::encode_release(&fish) {
            Ok(payload) => {
                let frame = OutboundFrame {
                    subject: topic.to_owned(),
                    payload,
                };
                if outbound.send(frame).await.is_err() {
                    warn!(id = %fish.id, "outbound channel closed; released fish was dropped");
                } else {
                    info!(id = %fish.id, topic, "fish released to the bus");
                }
            }
            Err(error) => {
                warn!(id = %fish.id, %error, "failed to encode release; fish was dropped");
            }
        },
        Err(error) => debug!(%error, "release request rejected"),
    }
}

/// Apply every release already sitting in the inbound channel.
///
/// Runs at shutdown so queued messages are either fully applied or
/// never observed -- no partial application.
async fn drain_inbound<S: FishStore, M: MetricsSink>(
    pond: &mut Pond<S, M>,
    inbound: &mut mpsc::Receiver<ReleaseMessage>,
) {
    while let Ok(release) = inbound.try_recv() {
        apply_release(pond, release).await;
    }
}

/// Publish the current pond state for the control surface.
async fn refresh_view<S: FishStore, M: MetricsSink>(
    view: &Arc<RwLock<PondView>>,
    tick: u64,
    topic: &str,
    pond: &Pond<S, M>,
) {
    let mut guard = view.write().await;
    *guard = PondView {
        tick,
        topic: topic.to_owned(),
        stats: pond.stats(),
        fishes: pond.snapshot().cloned().collect(),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreachable)]
mod tests {
    use std::time::Duration;

    use shoal_types::PondName;

    use super::*;
    use crate::adapters::{NullSink, NullStore};
    use crate::lifecycle::PondSettings;

    fn make_pond() -> Pond<NullStore, NullSink> {
        Pond::new(
            PondName::from("NetLink"),
            PondSettings::default(),
            7,
            NullStore,
            NullSink,
        )
    }

    fn make_clock() -> TickClock {
        TickClock::new(1, 0.016, 14, Instant::now()).unwrap()
    }

    fn release(id: &str, owner: &str) -> ReleaseMessage {
        ReleaseMessage {
            id: FishId::from(id),
            owner_pond: PondName::from(owner),
            remaining_lifetime: 10.0,
        }
    }

    #[tokio::test]
    async fn stop_drains_queued_releases() {
        let (inbound_tx, inbound_rx) = mpsc::channel(16);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (outbound_tx, _outbound_rx) = mpsc::channel(16);
        let view = Arc::new(RwLock::new(PondView::new("shoal.pond")));

        inbound_tx.send(release("Acme_1", "Acme")).await.unwrap();
        inbound_tx.send(release("Acme_2", "Acme")).await.unwrap();
        command_tx.send(PondCommand::Stop).await.unwrap();

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            run_pond(
                make_pond(),
                make_clock(),
                inbound_rx,
                command_rx,
                outbound_tx,
                Arc::clone(&view),
                String::from("shoal.pond"),
            ),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(report.end_reason, EndReason::StopRequested);
        // Both queued releases landed before shutdown, whether they
        // were applied in the loop or in the drain.
        assert_eq!(report.final_stats.visitor, 2);
        assert_eq!(view.read().await.stats.visitor, 2);
    }

    #[tokio::test]
    async fn release_command_publishes_one_frame() {
        let (_inbound_tx, inbound_rx) = mpsc::channel(16);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (outbound_tx, mut outbound_rx) = mpsc::channel(16);
        let view = Arc::new(RwLock::new(PondView::new("shoal.pond")));

        command_tx.send(PondCommand::SpawnLocal).await.unwrap();
        command_tx
            .send(PondCommand::Release { id: None })
            .await
            .unwrap();
        command_tx.send(PondCommand::Stop).await.unwrap();

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            run_pond(
                make_pond(),
                make_clock(),
                inbound_rx,
                command_rx,
                outbound_tx,
                view,
                String::from("shoal.pond"),
            ),
        )
        .await
        .unwrap()
        .unwrap();

        let frame = outbound_rx.recv().await.unwrap();
        assert_eq!(frame.subject, "shoal.pond");
        let decoded = codec::decode(&frame.payload).unwrap();
        let codec::Inbound::Release(msg) = decoded else {
            unreachable!("outbound frame must decode as a release");
        };
        assert_eq!(msg.owner_pond, PondName::from("NetLink"));

        // The fish left the collection without being counted removed.
        assert_eq!(report.final_stats.local, 0);
        assert_eq!(report.final_stats.total, 1);
    }

    #[tokio::test]
    async fn retargeted_topic_applies_to_later_releases() {
        let (_inbound_tx, inbound_rx) = mpsc::channel(16);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (outbound_tx, mut outbound_rx) = mpsc::channel(16);
        let view = Arc::new(RwLock::new(PondView::new("shoal.pond")));

        command_tx.send(PondCommand::SpawnLocal).await.unwrap();
        command_tx
            .send(PondCommand::SetTopic {
                topic: String::from("shoal.private"),
            })
            .await
            .unwrap();
        command_tx
            .send(PondCommand::Release { id: None })
            .await
            .unwrap();
        command_tx.send(PondCommand::Stop).await.unwrap();

        tokio::time::timeout(
            Duration::from_secs(5),
            run_pond(
                make_pond(),
                make_clock(),
                inbound_rx,
                command_rx,
                outbound_tx,
                view,
                String::from("shoal.pond"),
            ),
        )
        .await
        .unwrap()
        .unwrap();

        let frame = outbound_rx.recv().await.unwrap();
        assert_eq!(frame.subject, "shoal.private");
    }

    #[tokio::test]
    async fn closed_control_channel_stops_the_actor() {
        let (_inbound_tx, inbound_rx) = mpsc::channel(16);
        let (command_tx, command_rx) = mpsc::channel::<PondCommand>(16);
        let (outbound_tx, _outbound_rx) = mpsc::channel(16);
        let view = Arc::new(RwLock::new(PondView::new("shoal.pond")));

        drop(command_tx);

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            run_pond(
                make_pond(),
                make_clock(),
                inbound_rx,
                command_rx,
                outbound_tx,
                view,
                String::from("shoal.pond"),
            ),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(report.end_reason, EndReason::ControlChannelClosed);
    }
}
