//! NATS transport for the fish-exchange bus.
//!
//! Owns the bus connection and the three long-running transport tasks:
//!
//! - **subscriber** -- receives raw payloads, decodes and admission-
//!   filters them *outside* the pond actor, and forwards accepted
//!   releases over a bounded channel;
//! - **publisher** -- drains the actor's outbound frames onto the bus;
//! - **link watcher** -- drives the [`BusLink`] state machine from the
//!   client's connection events and re-announces hello after every
//!   reconnect.
//!
//! Reconnection itself (retry with backoff) is handled inside the
//! `async-nats` client; the pond only tolerates the delivery gap and
//! re-announces when the link comes back.

use futures::StreamExt as _;
use shoal_core::runner::OutboundFrame;
use shoal_protocol::codec::{self, Inbound};
use shoal_protocol::{BusLink, ReleaseMessage};
use shoal_types::PondName;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors raised by bus connection and messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A NATS operation failed.
    #[error("NATS error: {message}")]
    Nats {
        /// Description of the NATS failure.
        message: String,
    },
}

/// Connection lifecycle notifications from the NATS client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The client (re)established its connection.
    Up,
    /// The client lost its connection and is retrying with backoff.
    Down,
}

/// NATS client wrapper for the pond engine.
///
/// Manages a single NATS connection and provides subscribe and publish
/// operations for the fish-exchange subjects.
#[derive(Debug, Clone)]
pub struct BusClient {
    client: async_nats::Client,
}

impl BusClient {
    /// Connect to a NATS server.
    ///
    /// Returns the client plus a channel of [`LinkEvent`]s fed by the
    /// client's internal reconnect machinery.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Nats`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<LinkEvent>), TransportError> {
        info!(url = url, "connecting to NATS server");

        let (event_tx, event_rx) = mpsc::channel(8);
        let client = async_nats::ConnectOptions::new()
            .event_callback(move |event| {
                let event_tx = event_tx.clone();
                async move {
                    let mapped = match event {
                        async_nats::Event::Connected => Some(LinkEvent::Up),
                        async_nats::Event::Disconnected => Some(LinkEvent::Down),
                        _ => None,
                    };
                    if let Some(link_event) = mapped {
                        let _ = event_tx.send(link_event).await;
                    }
                }
            })
            .connect(url)
            .await
            .map_err(|e| TransportError::Nats {
                message: format!("failed to connect to {url}: {e}"),
            })?;

        info!("NATS connection established");
        Ok((Self { client }, event_rx))
    }

    /// Subscribe to the fish-exchange subject.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Nats`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, TransportError> {
        debug!(subject = subject, "subscribing to fish-exchange subject");
        let subscriber = self
            .client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| TransportError::Nats {
                message: format!("failed to subscribe to {subject}: {e}"),
            })?;
        info!(subject = subject, "subscribed");
        Ok(subscriber)
    }

    /// Publish one payload on a subject.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Nats`] if publishing fails.
    pub async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| TransportError::Nats {
                message: format!("failed to publish to {subject}: {e}"),
            })?;
        Ok(())
    }
}

/// Publish a hello announcement for this pond.
///
/// Failures are logged, not propagated: a missed hello only delays
/// peer discovery until the next reconnect.
pub async fn announce(client: &BusClient, pond: &PondName, subject: &str) {
    match codec::encode_hello(pond) {
        Ok(payload) => {
            if let Err(error) = client.publish(subject.to_owned(), payload).await {
                warn!(%error, "failed to publish hello");
            } else {
                info!(pond = %pond, subject, "hello announced");
            }
        }
        Err(error) => warn!(%error, "failed to encode hello"),
    }
}

/// Receive loop: decode and admission-filter inbound payloads, then
/// forward accepted releases to the pond actor.
///
/// Decoding happens here, on the transport task, so the actor never
/// waits on parsing. Malformed payloads are dropped with a logged
/// diagnostic; a pond's own echoed broadcasts are never forwarded.
/// Returns when the subscription or the actor channel closes.
pub async fn run_subscriber(
    mut subscriber: async_nats::Subscriber,
    self_pond: PondName,
    inbound: mpsc::Sender<ReleaseMessage>,
) {
    while let Some(message) = subscriber.next().await {
        match codec::decode(&message.payload) {
            Ok(Inbound::Release(release)) => {
                if codec::should_admit(&release, &self_pond) {
                    if inbound.send(release).await.is_err() {
                        // Actor shut down; nothing left to deliver to.
                        break;
                    }
                } else {
                    debug!(id = %release.id, "ignoring echoed own release");
                }
            }
            Ok(Inbound::Other) => {
                debug!("ignoring non-release payload");
            }
            Err(error) => {
                warn!(%error, "dropping malformed payload");
            }
        }
    }
    info!("subscriber loop ended");
}

/// Publish loop: drain the actor's outbound frames onto the bus.
///
/// Returns when the actor drops its outbound sender.
pub async fn run_publisher(client: BusClient, mut outbound: mpsc::Receiver<OutboundFrame>) {
    while let Some(frame) = outbound.recv().await {
        if let Err(error) = client.publish(frame.subject.clone(), frame.payload).await {
            warn!(%error, subject = %frame.subject, "failed to publish outbound frame");
        }
    }
    info!("publisher loop ended");
}

/// Link watcher: drive the [`BusLink`] state machine from connection
/// events and re-announce hello after every reconnect.
///
/// Returns when the event channel closes (client dropped).
pub async fn run_link(
    client: BusClient,
    pond: PondName,
    subject: String,
    mut events: mpsc::Receiver<LinkEvent>,
    mut link: BusLink,
) {
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Up => {
                link.connected();
                info!("bus link restored");
                if link.take_hello_due() {
                    announce(&client, &pond, &subject).await;
                }
            }
            LinkEvent::Down => {
                link.disconnected();
                warn!("bus link lost; client is reconnecting with backoff");
            }
        }
    }
}
