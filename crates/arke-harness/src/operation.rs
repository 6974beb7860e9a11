//! Operations for model-based testing.
//!
//! Operations represent every action the network or a party can take in a
//! two-party conversation. They are generated by proptest or a fuzzer and
//! applied to a [`crate::Simulation`].

use arbitrary::Arbitrary;
use arke_core::Role;

/// One end of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Arbitrary)]
pub enum Side {
    /// The initiator
    Initiator,
    /// The responder
    Responder,
}

impl Side {
    /// Both sides, initiator first.
    pub const BOTH: [Side; 2] = [Side::Initiator, Side::Responder];

    /// The other side.
    #[must_use]
    pub fn peer(self) -> Self {
        match self {
            Self::Initiator => Self::Responder,
            Self::Responder => Self::Initiator,
        }
    }

    /// Array slot for per-side state.
    pub fn index(self) -> usize {
        match self {
            Self::Initiator => 0,
            Self::Responder => 1,
        }
    }
}

impl From<Side> for Role {
    fn from(side: Side) -> Self {
        match side {
            Side::Initiator => Role::Initiator,
            Side::Responder => Role::Responder,
        }
    }
}

/// Actions applied to a simulation.
///
/// Deliveries are FIFO per direction: the channel may delay messages and let
/// the two directions cross, but never reorders messages within a direction.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// `side` sends a message.
    Send {
        /// Sending side
        side: Side,
    },

    /// Deliver up to `count` of the oldest in-flight messages sent by `side`.
    Deliver {
        /// Side whose messages are delivered
        side: Side,
        /// Upper bound on deliveries (kept small for efficiency)
        count: u8,
    },

    /// Deliver the last delivered message from `side` a second time.
    Replay {
        /// Side whose message is replayed
        side: Side,
    },

    /// Flush both directions.
    DeliverAll,
}
