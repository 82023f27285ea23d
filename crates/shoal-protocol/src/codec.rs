//! Encoding and decoding between bus payloads and lifecycle operations.
//!
//! Decoding is deliberately tolerant: a malformed payload is a
//! [`DecodeError`] for the caller to log and drop, and a well-formed
//! payload that is not a release (a hello, or any future message kind)
//! comes back as [`Inbound::Other`]. Neither case may disturb the
//! collection or crash the transport.

use chrono::Utc;
use shoal_types::{Fish, PondName};

use crate::message::{HelloMessage, ReleaseMessage};

/// Malformed inbound payload (not valid JSON text).
#[derive(Debug, thiserror::Error)]
#[error("payload is not valid JSON: {source}")]
pub struct DecodeError {
    /// The underlying parse error.
    #[from]
    source: serde_json::Error,
}

/// Outbound message serialization failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to serialize outbound message: {source}")]
pub struct EncodeError {
    /// The underlying serialization error.
    #[from]
    source: serde_json::Error,
}

/// A successfully parsed inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A release carrying all three required keys.
    Release(ReleaseMessage),
    /// Any other well-formed payload; accepted but ignored.
    Other,
}

/// Parse an inbound bus payload.
///
/// A payload is recognized as a release by the presence of all three
/// required keys (`id`, `ownerPond`, `remainingLifetime`) with usable
/// values; no discriminator field is involved. Everything else that
/// parses as JSON -- hellos, unknown future shapes, scalars -- maps to
/// [`Inbound::Other`] for forward compatibility.
///
/// # Errors
///
/// Returns [`DecodeError`] if the payload is not valid JSON text.
pub fn decode(payload: &[u8]) -> Result<Inbound, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    match serde_json::from_value::<ReleaseMessage>(value) {
        Ok(release) => Ok(Inbound::Release(release)),
        Err(_) => Ok(Inbound::Other),
    }
}

/// Serialize a hello announcement for `sender`, stamped with the
/// current unix time.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialization fails.
pub fn encode_hello(sender: &PondName) -> Result<Vec<u8>, EncodeError> {
    let hello = HelloMessage::new(sender.clone(), Utc::now().timestamp());
    Ok(serde_json::to_vec(&hello)?)
}

/// Serialize the release payload for a fish leaving this pond.
///
/// Only `id`, `ownerPond`, and `remainingLifetime` are transmitted;
/// the adopting pond re-randomizes everything else.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialization fails.
pub fn encode_release(fish: &Fish) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(&ReleaseMessage::from(fish))?)
}

/// Whether a parsed release may enter the local collection.
///
/// A pond must never re-admit its own released fish, which would
/// otherwise happen when the bus echoes its broadcast back (or a peer
/// republishes on a topic this pond also subscribes to).
pub fn should_admit(release: &ReleaseMessage, self_pond: &PondName) -> bool {
    release.owner_pond != *self_pond
}
