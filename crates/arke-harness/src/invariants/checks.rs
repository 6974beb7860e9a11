//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must hold after every
//! operation of an honest conversation, whatever the delivery schedule.

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

const DIRECTION_NAMES: [&str; 2] = ["initiator→responder", "responder→initiator"];

/// Every delivered message yields the sender's session key.
///
/// The `i`-th key the receiver derives equals the `i`-th key the sender
/// derived. A mismatch means the parties ratcheted apart.
pub struct KeyAgreement;

impl Invariant for KeyAgreement {
    fn name(&self) -> &'static str {
        "KeyAgreement"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (direction, name) in state.directions.iter().zip(DIRECTION_NAMES) {
            if direction.received_keys.len() > direction.sent_keys.len() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{name}: {} keys received but only {} sent",
                        direction.received_keys.len(),
                        direction.sent_keys.len()
                    ),
                });
            }
            for (index, (sent, received)) in
                direction.sent_keys.iter().zip(&direction.received_keys).enumerate()
            {
                if sent != received {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("{name}: session key {index} differs"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Per-party counters and queue lengths move together.
///
/// Every send queues one kuKEM secret key, one pending update entry and one
/// deferred transcript entry, and the partner's acknowledgement retires one
/// of each, so all three equal the unacknowledged send count. Every receive
/// queues one partner public key and every send drains them, so the pending
/// key count is one more than the receive count.
pub struct CounterConsistency;

impl Invariant for CounterConsistency {
    fn name(&self) -> &'static str {
        "CounterConsistency"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for party in &state.parties {
            let sent = party.sent as usize;
            if party.secret_keys != sent
                || party.pending_updates != sent
                || party.deferred_entries != sent
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{:?}: sent {} but {} secret keys, {} pending updates, {} deferred entries",
                        party.role,
                        party.sent,
                        party.secret_keys,
                        party.pending_updates,
                        party.deferred_entries
                    ),
                });
            }
            if party.pending_keys as u64 != party.received + 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{:?}: {} pending public keys after {} receives",
                        party.role, party.pending_keys, party.received
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Queues stay within what the traffic can account for.
///
/// Both KEM keys are always present between operations, messages in flight
/// never outnumber the sender's unacknowledged sends, and every sent message
/// is either in flight or was accepted.
pub struct QueueBounds;

impl Invariant for QueueBounds {
    fn name(&self) -> &'static str {
        "QueueBounds"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for party in &state.parties {
            if !party.has_encapsulation_target || !party.has_decapsulation_key {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{:?}: encapsulation target {}, decapsulation key {}",
                        party.role, party.has_encapsulation_target, party.has_decapsulation_key
                    ),
                });
            }
        }

        for ((direction, sender), name) in
            state.directions.iter().zip(&state.parties).zip(DIRECTION_NAMES)
        {
            if direction.in_flight as u64 > sender.sent {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{name}: {} in flight but only {} unacknowledged",
                        direction.in_flight, sender.sent
                    ),
                });
            }
            if direction.received_keys.len() + direction.in_flight != direction.sent_keys.len() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{name}: {} sent, {} accepted, {} in flight",
                        direction.sent_keys.len(),
                        direction.received_keys.len(),
                        direction.in_flight
                    ),
                });
            }
        }
        Ok(())
    }
}
