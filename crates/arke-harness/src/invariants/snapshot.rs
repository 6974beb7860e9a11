//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a conversation at a point in
//! time. Invariants operate on snapshots rather than live parties so a check
//! never races with the state it inspects.

use arke_core::{CipherSuite, Party, Role, SessionKey};

/// Counters and queue lengths of one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartySnapshot {
    /// Role of the party
    pub role: Role,
    /// Unacknowledged sends
    pub sent: u64,
    /// Receives since the last send
    pub received: u64,
    /// Public keys the next send encapsulates to
    pub pending_keys: usize,
    /// Queued own kuKEM secret keys
    pub secret_keys: usize,
    /// Pending public key update entries
    pub pending_updates: usize,
    /// Deferred receiving transcript entries
    pub deferred_entries: usize,
    /// Partner KEM public key present
    pub has_encapsulation_target: bool,
    /// Own KEM secret key present
    pub has_decapsulation_key: bool,
}

impl PartySnapshot {
    /// Capture the observable state of `party`.
    pub fn of<S: CipherSuite>(party: &Party<S>) -> Self {
        let queues = party.queued_kukem();
        Self {
            role: party.role(),
            sent: party.sent_count(),
            received: party.received_count(),
            pending_keys: party.pending_key_count(),
            secret_keys: queues.secret_key_count(),
            pending_updates: queues.pending_update_count(),
            deferred_entries: party.deferred_entry_count(),
            has_encapsulation_target: queues.has_encapsulation_target(),
            has_decapsulation_key: queues.has_decapsulation_key(),
        }
    }
}

/// Traffic in one direction.
#[derive(Debug, Clone, Default)]
pub struct DirectionSnapshot {
    /// Session keys derived by the sender, in send order
    pub sent_keys: Vec<SessionKey>,
    /// Session keys derived by the receiver, in delivery order
    pub received_keys: Vec<SessionKey>,
    /// Messages sent but not yet delivered
    pub in_flight: usize,
    /// Deliveries the receiver rejected
    pub rejected: usize,
}

/// Snapshot of both parties and both directions.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Initiator, then responder
    pub parties: [PartySnapshot; 2],
    /// Initiator to responder, then responder to initiator
    pub directions: [DirectionSnapshot; 2],
}
