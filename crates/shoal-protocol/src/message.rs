//! Typed wire message shapes.
//!
//! Releases carry no type discriminator: a payload is a release exactly
//! when it parses with the three required keys. Every other well-formed
//! JSON payload (hello included) is ignored by the lifecycle, which
//! keeps the topic open to future message kinds.

use serde::{Deserialize, Serialize};
use shoal_types::{Fish, FishId, PondName};

/// Pond announcement, published once each time the bus link comes up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloMessage {
    /// Message discriminator; always `"hello"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Name of the announcing pond.
    pub sender: PondName,
    /// Unix timestamp in seconds at send time.
    pub timestamp: i64,
    /// Reserved extension payload; empty object today.
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl HelloMessage {
    /// Build a hello announcement for `sender` at the given unix time.
    pub fn new(sender: PondName, timestamp: i64) -> Self {
        Self {
            kind: String::from("hello"),
            sender,
            timestamp,
            data: serde_json::Map::new(),
        }
    }
}

/// The transferable essence of one fish.
///
/// Position, speed, and animation state are intentionally absent: they
/// are re-randomized by the adopting pond, so shipping them would only
/// widen the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseMessage {
    /// The fish identifier, carried verbatim across ponds.
    pub id: FishId,
    /// The pond that originally spawned the fish.
    #[serde(rename = "ownerPond")]
    pub owner_pond: PondName,
    /// Seconds of life left at release time.
    #[serde(rename = "remainingLifetime")]
    pub remaining_lifetime: f64,
}

impl From<&Fish> for ReleaseMessage {
    fn from(fish: &Fish) -> Self {
        Self {
            id: fish.id.clone(),
            owner_pond: fish.owner_pond.clone(),
            remaining_lifetime: fish.remaining_lifetime,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hello_wire_shape() {
        let hello = HelloMessage::new(PondName::from("NetLink"), 1_700_000_000);
        let json = serde_json::to_value(&hello).unwrap();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("hello"));
        assert_eq!(json.get("sender").and_then(|v| v.as_str()), Some("NetLink"));
        assert_eq!(
            json.get("timestamp").and_then(serde_json::Value::as_i64),
            Some(1_700_000_000)
        );
        assert_eq!(json.get("data"), Some(&serde_json::json!({})));
    }

    #[test]
    fn release_wire_keys_are_camel_case() {
        let msg = ReleaseMessage {
            id: FishId::from("Acme_123"),
            owner_pond: PondName::from("Acme"),
            remaining_lifetime: 10.0,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("ownerPond").is_some());
        assert!(json.get("remainingLifetime").is_some());
        assert!(json.get("owner_pond").is_none());
    }
}
