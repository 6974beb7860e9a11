//! Hash-chained transcripts.
//!
//! Each party keeps two transcripts. The sending transcript folds every
//! message the party sends or receives, in local order. The receiving
//! transcript must match the partner's sending transcript at the moment the
//! partner sent, so the party's own sends are parked in a deferred queue and
//! folded in only once the partner acknowledges them.
//!
//! ```text
//! state' = H(state ‖ tag ‖ entry_digest)     tag: 1 initiator, 0 responder
//! ```
//!
//! The running state is never reset.

use std::collections::VecDeque;

use sha2::Digest;

use crate::{ciphertext::EntryDigest, error::ProtocolError, types::Role};

/// Running transcript hash plus a FIFO of deferred entries.
#[derive(Clone)]
pub struct Transcript<D: Digest + Clone> {
    state: D,
    deferred: VecDeque<(Role, EntryDigest)>,
}

impl<D: Digest + Clone> Transcript<D> {
    /// Empty transcript.
    pub fn new() -> Self {
        Self { state: D::new(), deferred: VecDeque::new() }
    }

    /// Hash an entry sent by `sender` into the running state.
    pub fn fold(&mut self, sender: Role, entry: &EntryDigest) {
        self.state.update([sender.transcript_tag()]);
        self.state.update(entry);
    }

    /// Park an entry until it is committed.
    pub fn enqueue(&mut self, sender: Role, entry: EntryDigest) {
        self.deferred.push_back((sender, entry));
    }

    /// Fold the oldest `used_keys - 1` deferred entries, in order.
    ///
    /// `used_keys - 1` is the number of our sends the partner had seen when
    /// it sent the message being received.
    ///
    /// # Errors
    ///
    /// `Desynchronized` if `used_keys` is zero or exceeds the queue. Nothing is
    /// folded in that case.
    pub fn commit_from_queue(&mut self, used_keys: u32) -> Result<(), ProtocolError> {
        let count = self.committable(used_keys)?;
        for (sender, entry) in self.deferred.drain(..count) {
            self.state.update([sender.transcript_tag()]);
            self.state.update(entry);
        }
        Ok(())
    }

    /// Number of deferred entries `commit_from_queue(used_keys)` would fold,
    /// without folding them.
    pub fn committable(&self, used_keys: u32) -> Result<usize, ProtocolError> {
        let count = used_keys
            .checked_sub(1)
            .ok_or(ProtocolError::desync("used key count is zero"))? as usize;
        if count > self.deferred.len() {
            return Err(ProtocolError::desync("deferred transcript underflow"));
        }
        Ok(count)
    }

    /// Digest of the current state. Does not advance the transcript.
    pub fn state(&self) -> Vec<u8> {
        self.state.clone().finalize().to_vec()
    }

    /// Entries waiting to be committed.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}

impl<D: Digest + Clone> Default for Transcript<D> {
    fn default() -> Self {
        Self::new()
    }
}
