//! Type-safe identifier wrappers for ponds and fish.
//!
//! A pond is one running instance of the simulation, identified by a
//! unique name. A fish identifier is minted once at spawn time as
//! `"{pond}_{timestamp_micros}"` and is never reused; the owner prefix
//! travels with the fish for its whole lifetime, including across the
//! message bus into other ponds.

use serde::{Deserialize, Serialize};

/// The name of one running pond instance.
///
/// Pond names are exchanged on the wire (`sender` in hello messages,
/// `ownerPond` in release messages) and prefix every fish identifier
/// minted by the pond.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PondName(String);

impl PondName {
    /// Wrap a pond name string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PondName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PondName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for PondName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Globally unique fish identifier.
///
/// Assigned at spawn as `"{owner_pond}_{spawn_timestamp_micros}"` and
/// carried verbatim when the fish is released to another pond. The
/// local collection never holds two fish with the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FishId(String);

impl FishId {
    /// Mint a new identifier for a fish spawned by `pond` at the given
    /// microsecond timestamp.
    pub fn spawned(pond: &PondName, timestamp_micros: i64) -> Self {
        Self(format!("{pond}_{timestamp_micros}"))
    }

    /// Wrap an identifier received from the wire.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier carries `pond` as its minting prefix.
    ///
    /// The protocol does not enforce this across peers; the check exists
    /// so admission can flag releases whose identifier was minted by a
    /// pond other than the claimed owner.
    pub fn minted_by(&self, pond: &PondName) -> bool {
        self.0
            .strip_prefix(pond.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

impl core::fmt::Display for FishId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FishId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for FishId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spawned_id_carries_pond_prefix() {
        let pond = PondName::from("NetLink");
        let id = FishId::spawned(&pond, 1_700_000_000_000_000);
        assert_eq!(id.as_str(), "NetLink_1700000000000000");
        assert!(id.minted_by(&pond));
    }

    #[test]
    fn minted_by_rejects_other_ponds() {
        let id = FishId::from("Acme_123");
        assert!(id.minted_by(&PondName::from("Acme")));
        assert!(!id.minted_by(&PondName::from("NetLink")));
        // A prefix match without the separator is not a mint match.
        assert!(!id.minted_by(&PondName::from("Ac")));
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = FishId::from("NetLink_42");
        let json = serde_json::to_string(&original).unwrap();
        // Transparent: serializes as a bare string.
        assert_eq!(json, "\"NetLink_42\"");
        let restored: FishId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn pond_name_display_matches_inner() {
        let pond = PondName::from("HoneyBee");
        assert_eq!(pond.to_string(), "HoneyBee");
        assert_eq!(pond.as_str(), "HoneyBee");
    }
}
