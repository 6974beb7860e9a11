//! One party of the ratcheted key exchange.
//!
//! # Send
//!
//! ```text
//! encapsulate(queue) ─────┐
//! kuKEM pk, one-time vk ──┼─► Ciphertext ──sign──► transcripts ──► oracle
//!                         │                                          │
//!                         └──────────── (session key, next KEM seed) ◄┘
//! ```
//!
//! # Receive
//!
//! Every check runs before the first write. A ciphertext that fails any of
//! them leaves the party exactly as it was, so the peer can keep sending
//! after a forged or replayed message is dropped.
//!
//! 1. signature verifies under the pinned verification key
//! 2. `received_count` does not exceed our unacknowledged sends
//! 3. enough pending update data for the partner's public key
//! 4. enough deferred transcript entries for `used_keys`
//! 5. body shape and secret key queue match `used_keys`
//! 6. decapsulation succeeds (atomic: consumes nothing on failure)
//!
//! Only then are the transcripts, counters, key queues and oracle chain
//! advanced.

use std::fmt;

use rand::{CryptoRng, RngCore};

use crate::{
    ciphertext::Ciphertext,
    error::ProtocolError,
    primitives::{Algorithms, CipherSuite, KeyedRandomOracle, OracleOutput, SignatureManager},
    queued_kukem::QueuedKuKem,
    transcript::Transcript,
    types::{AssociatedData, Role, SessionKey},
};

/// A party in a two-party conversation.
///
/// Both parties must be created with identical RNG output: the bootstrap
/// splits one shared set of key pairs by [`Role`].
pub struct Party<S: CipherSuite> {
    role: Role,
    signature: S::Signature,
    oracle: S::Oracle,
    kukem: QueuedKuKem<S>,
    sending: Transcript<S::TranscriptHash>,
    receiving: Transcript<S::TranscriptHash>,
    /// Our sends the partner has not acknowledged
    sent: u64,
    /// Partner messages received since our last send
    received: u64,
}

impl<S: CipherSuite> Party<S> {
    /// Create and bootstrap a party.
    pub fn new<R: RngCore + CryptoRng>(suite: &S, rng: &mut R, role: Role) -> Self {
        let Algorithms { kem, kukem, mut signature, mut oracle, deriver } = suite.instantiate();

        signature.init(rng, role);
        oracle.init(rng, role);
        let mut kukem = QueuedKuKem::new(kem, kukem, deriver);
        kukem.init(rng, role);

        Self {
            role,
            signature,
            oracle,
            kukem,
            sending: Transcript::new(),
            receiving: Transcript::new(),
            sent: 0,
            received: 0,
        }
    }

    /// Derive a session key and the ciphertext that lets the partner derive
    /// the same key.
    ///
    /// # Errors
    ///
    /// `NoEncapsulationTarget` if no partner KEM key is set, or `Primitive`
    /// if a backend rejects a partner key. No own key is queued when
    /// encapsulation fails.
    pub fn send<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        ad: &AssociatedData,
    ) -> Result<(SessionKey, Ciphertext<S>), ProtocolError> {
        if !self.kukem.has_encapsulation_target() {
            return Err(ProtocolError::NoEncapsulationTarget);
        }
        // Must be read before encapsulate() drains the partner queue
        let used_keys = u32::try_from(self.kukem.pending_key_count())
            .map_err(|_| ProtocolError::desync("too many pending public keys"))?;

        // Encapsulation can fail on a bad partner key, so it runs before any
        // own key is queued
        let (aggregate, body) = self.kukem.encapsulate(rng)?;
        let public_key = self.kukem.generate_public_key(rng);
        let verification_key = self.signature.generate(rng);

        let ciphertext = Ciphertext::seal(
            &mut self.signature,
            ad,
            self.received,
            public_key,
            verification_key,
            used_keys,
            body,
        )?;

        let entry = ciphertext.entry_digest(ad);
        self.receiving.enqueue(self.role, entry);
        self.sending.fold(self.role, &entry);

        let OracleOutput { session_key, seed } =
            self.oracle.query_send(&aggregate, &self.sending.state());
        self.kukem.add_matching_public_key(&seed);
        self.kukem.add_to_public_key_update_information(ad, &ciphertext);

        self.sent += 1;
        self.received = 0;

        tracing::trace!(role = ?self.role, sent = self.sent, used_keys, "sent message");

        Ok((session_key, ciphertext))
    }

    /// Derive the session key for a partner ciphertext.
    ///
    /// Returns `None` if the ciphertext is rejected. The reason is logged at
    /// debug level and otherwise discarded; use [`Self::try_receive`] to see
    /// it.
    pub fn receive(
        &mut self,
        ad: &AssociatedData,
        ciphertext: &Ciphertext<S>,
    ) -> Option<SessionKey> {
        match self.try_receive(ad, ciphertext) {
            Ok(session_key) => Some(session_key),
            Err(error) => {
                tracing::debug!(role = ?self.role, %error, "rejected ciphertext");
                None
            },
        }
    }

    /// [`Self::receive`] with the rejection reason.
    ///
    /// # Errors
    ///
    /// `SignatureInvalid` or `Desynchronized` for a ciphertext that does not
    /// fit our state. Party state is unchanged on error.
    pub fn try_receive(
        &mut self,
        ad: &AssociatedData,
        ciphertext: &Ciphertext<S>,
    ) -> Result<SessionKey, ProtocolError> {
        if !self.signature.verify(&ciphertext.signed_message(ad), ciphertext.signature()) {
            return Err(ProtocolError::SignatureInvalid);
        }

        let acked = ciphertext.received_count();
        let unacked = self
            .sent
            .checked_sub(acked)
            .ok_or(ProtocolError::desync("partner acknowledged unsent messages"))?;
        let used_keys = ciphertext.used_keys();

        self.kukem.check_public_key_update(acked, unacked)?;
        self.receiving.committable(used_keys)?;
        self.kukem.check_decapsulation(used_keys, ciphertext.body())?;

        // First write. Atomic, and nothing after it can fail
        let aggregate = self.kukem.decapsulate(used_keys, ciphertext.body())?;

        let peer = self.role.peer();
        let entry = ciphertext.entry_digest(ad);
        self.sending.fold(peer, &entry);

        self.sent = unacked;
        self.kukem.add_updated_public_key(ciphertext.public_key().clone(), acked, unacked)?;
        self.signature.set_verification_key(ciphertext.verification_key().clone());

        self.receiving.commit_from_queue(used_keys)?;
        self.receiving.fold(peer, &entry);

        let OracleOutput { session_key, seed } =
            self.oracle.query_receive(&aggregate, &self.receiving.state());
        self.kukem.update_secret_keys(&seed, ad, ciphertext);
        self.received += 1;

        tracing::trace!(
            role = ?self.role,
            sent = self.sent,
            received = self.received,
            used_keys,
            "received message"
        );

        Ok(session_key)
    }

    /// Our role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Sends the partner has not acknowledged yet.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    /// Partner messages received since our last send.
    pub fn received_count(&self) -> u64 {
        self.received
    }

    /// Public keys the next send will encapsulate to.
    pub fn pending_key_count(&self) -> usize {
        self.kukem.pending_key_count()
    }

    /// Key queues, for inspection.
    pub fn queued_kukem(&self) -> &QueuedKuKem<S> {
        &self.kukem
    }

    /// Signature manager, for inspection.
    pub fn signature_manager(&self) -> &S::Signature {
        &self.signature
    }

    /// Deferred entries of the receiving transcript.
    pub fn deferred_entry_count(&self) -> usize {
        self.receiving.deferred_len()
    }
}

impl<S: CipherSuite> fmt::Debug for Party<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Party")
            .field("role", &self.role)
            .field("sent", &self.sent)
            .field("received", &self.received)
            .field("kukem", &self.kukem)
            .field("deferred", &self.receiving.deferred_len())
            .finish_non_exhaustive()
    }
}
