//! Wire protocol for sharing and releasing fish between ponds.
//!
//! Ponds exchange two message shapes as UTF-8 JSON on a shared bus
//! topic: a `hello` announcement sent on every (re)connect, and a
//! release payload that transfers one fish to whichever peers adopt it.
//! A release carries only `id`, `ownerPond`, and `remainingLifetime` --
//! the receiving pond re-randomizes position, heading, speed, and
//! animation state on adoption.
//!
//! # Modules
//!
//! - [`message`] -- Typed hello and release wire shapes
//! - [`codec`] -- Encode/decode between bytes and lifecycle operations
//! - [`link`] -- Connection lifecycle state machine for the bus link

pub mod codec;
pub mod link;
pub mod message;

pub use codec::{DecodeError, EncodeError, Inbound, decode, encode_hello, encode_release, should_admit};
pub use link::{BusLink, LinkState};
pub use message::{HelloMessage, ReleaseMessage};
