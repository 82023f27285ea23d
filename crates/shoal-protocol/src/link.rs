//! Connection lifecycle state machine for the bus link.
//!
//! The transport owns the socket and its reconnect-with-backoff policy;
//! this type only tracks where the link is in its lifecycle and whether
//! a hello announcement is owed. Entering [`LinkState::Connected`] arms
//! the hello exactly once; an unexpected disconnect reverts the state
//! and re-arms it for the next time the link comes up.

/// Where the bus link is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection; the transport may be backing off before a retry.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The link is up; messages flow in both directions.
    Connected,
}

/// Tracks the bus link lifecycle and the hello-announcement obligation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusLink {
    state: LinkState,
    hello_due: bool,
}

impl BusLink {
    /// Create a link in the [`LinkState::Disconnected`] state.
    pub const fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            hello_due: false,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Record that a connection attempt has started.
    pub const fn connecting(&mut self) {
        self.state = LinkState::Connecting;
    }

    /// Record that the link is up. Arms the hello announcement.
    pub const fn connected(&mut self) {
        self.state = LinkState::Connected;
        self.hello_due = true;
    }

    /// Record an unexpected disconnect.
    ///
    /// The hello obligation is cleared; it re-arms when the transport
    /// reconnects, so peers hear from this pond after every gap.
    pub const fn disconnected(&mut self) {
        self.state = LinkState::Disconnected;
        self.hello_due = false;
    }

    /// Consume the hello obligation.
    ///
    /// Returns `true` exactly once after each transition into
    /// [`LinkState::Connected`]; the caller must publish the hello when
    /// it does.
    pub const fn take_hello_due(&mut self) -> bool {
        if self.hello_due {
            self.hello_due = false;
            true
        } else {
            false
        }
    }
}

impl Default for BusLink {
    fn default() -> Self {
        Self::new()
    }
}
