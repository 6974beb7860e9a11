//! Queued key-updateable KEM.
//!
//! Holds every key a party encapsulates to or decapsulates with:
//!
//! ```text
//!   own side                          partner side
//!   ────────                          ────────────
//!   KEM secret key (Option)           KEM public key (Option)
//!   kuKEM secret keys  [FIFO]         kuKEM public keys  [FIFO]
//!                                     pending update data [FIFO]
//! ```
//!
//! Each send generates a kuKEM pair whose secret half is queued here and whose
//! public half travels to the partner. The partner encapsulates to all queued
//! public keys at once, so a single receive may consume several secret keys.
//!
//! # Security
//!
//! - Secret keys are moved out of their queue when used and dropped
//! - On every receive all remaining secret keys are advanced one level, so a
//!   later compromise cannot decrypt earlier messages
//! - Public keys the partner has not yet seen updates for are advanced with
//!   the pending update data before they are queued

use std::{collections::VecDeque, fmt};

use rand::{CryptoRng, RngCore};

use crate::{
    ciphertext::Ciphertext,
    error::ProtocolError,
    primitives::{
        AssociatedDataDeriver, CipherSuite, Encode, KemCiphertext, KemPublicKey,
        KemSecretKey, KeyUpdateableKem, Kem, KuKemCiphertext, KuKemPublicKey, KuKemSecretKey,
        UpdateData, encode_field,
    },
    types::{AssociatedData, KeySeed, Role, SymmetricKey},
};

/// Encapsulation body of a ciphertext.
///
/// One KEM ciphertext plus one kuKEM ciphertext per queued partner public key,
/// in queue order.
pub struct QueuedCiphertext<S: CipherSuite> {
    kem: KemCiphertext<S>,
    kukem: Vec<KuKemCiphertext<S>>,
}

impl<S: CipherSuite> QueuedCiphertext<S> {
    /// Assemble a body from its parts.
    pub fn new(kem: KemCiphertext<S>, kukem: Vec<KuKemCiphertext<S>>) -> Self {
        Self { kem, kukem }
    }

    /// KEM ciphertext.
    pub fn kem(&self) -> &KemCiphertext<S> {
        &self.kem
    }

    /// kuKEM ciphertexts in encapsulation order.
    pub fn kukem(&self) -> &[KuKemCiphertext<S>] {
        &self.kukem
    }
}

impl<S: CipherSuite> Encode for QueuedCiphertext<S> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_field(out, &self.kem.to_encoded());
        let count = u32::try_from(self.kukem.len()).unwrap_or(u32::MAX);
        out.extend_from_slice(&count.to_be_bytes());
        for ciphertext in &self.kukem {
            encode_field(out, &ciphertext.to_encoded());
        }
    }
}

impl<S: CipherSuite> Clone for QueuedCiphertext<S> {
    fn clone(&self) -> Self {
        Self { kem: self.kem.clone(), kukem: self.kukem.clone() }
    }
}

impl<S: CipherSuite> fmt::Debug for QueuedCiphertext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedCiphertext")
            .field("kem", &self.kem)
            .field("kukem", &self.kukem)
            .finish()
    }
}

/// Key queues for one party.
pub struct QueuedKuKem<S: CipherSuite> {
    kem: S::Kem,
    kukem: S::KuKem,
    deriver: S::Deriver,
    secret_key: Option<KemSecretKey<S>>,
    partner_public_key: Option<KemPublicKey<S>>,
    secret_keys: VecDeque<KuKemSecretKey<S>>,
    partner_public_keys: VecDeque<KuKemPublicKey<S>>,
    pending_updates: VecDeque<UpdateData<S>>,
}

impl<S: CipherSuite> QueuedKuKem<S> {
    /// Empty queues over the given primitives. Call [`Self::init`] before use.
    pub fn new(kem: S::Kem, kukem: S::KuKem, deriver: S::Deriver) -> Self {
        Self {
            kem,
            kukem,
            deriver,
            secret_key: None,
            partner_public_key: None,
            secret_keys: VecDeque::new(),
            partner_public_keys: VecDeque::new(),
            pending_updates: VecDeque::new(),
        }
    }

    /// Bootstrap the KEM keys.
    ///
    /// Generates two pairs. The initiator keeps the first secret key and the
    /// second public key; the responder the other way round. Both parties must
    /// draw from identical randomness here.
    pub fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role) {
        let first = self.kem.generate(rng);
        let second = self.kem.generate(rng);
        let (own, partner) = if role.is_initiator() { (first, second) } else { (second, first) };
        self.secret_key = Some(own.secret_key);
        self.partner_public_key = Some(partner.public_key);
    }

    /// Generate a kuKEM pair, queue the secret key, return the public key.
    pub fn generate_public_key<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> KuKemPublicKey<S> {
        let pair = self.kukem.generate(rng);
        self.secret_keys.push_back(pair.secret_key);
        pair.public_key
    }

    /// Regenerate a KEM pair from `seed` and keep its public key as the next
    /// encapsulation target.
    pub fn add_matching_public_key(&mut self, seed: &KeySeed) {
        self.partner_public_key = Some(self.kem.generate_from_seed(seed).public_key);
    }

    /// Encapsulate to the partner KEM key and every queued partner kuKEM key.
    ///
    /// All used public keys are discarded. The keys are mixed into one
    /// aggregate in queue order. Nothing is discarded if any encapsulation
    /// fails.
    pub fn encapsulate<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(SymmetricKey, QueuedCiphertext<S>), ProtocolError> {
        let Some(public_key) = &self.partner_public_key else {
            return Err(ProtocolError::NoEncapsulationTarget);
        };

        let (mut aggregate, kem_ciphertext) = self.kem.encapsulate(rng, public_key)?;
        let mut kukem_ciphertexts = Vec::with_capacity(self.partner_public_keys.len());
        for public_key in &self.partner_public_keys {
            let (key, ciphertext) = self.kukem.encapsulate(rng, public_key)?;
            aggregate.mix(&key);
            kukem_ciphertexts.push(ciphertext);
        }

        self.partner_public_key = None;
        self.partner_public_keys.clear();

        Ok((aggregate, QueuedCiphertext::new(kem_ciphertext, kukem_ciphertexts)))
    }

    /// Recover the aggregate key of a body built with `used_keys` public keys.
    ///
    /// Consumes the KEM secret key and the oldest `used_keys - 1` kuKEM secret
    /// keys.
    ///
    /// # Errors
    ///
    /// `Desynchronized` if `used_keys` is zero, the body does not carry exactly
    /// `used_keys - 1` kuKEM ciphertexts, too few secret keys are queued, the
    /// KEM secret key was already consumed, or any decapsulation fails. The
    /// queues are untouched on error.
    pub fn decapsulate(
        &mut self,
        used_keys: u32,
        body: &QueuedCiphertext<S>,
    ) -> Result<SymmetricKey, ProtocolError> {
        let extra = self.check_decapsulation(used_keys, body)?;
        let Some(secret_key) = &self.secret_key else {
            return Err(ProtocolError::desync("KEM secret key already consumed"));
        };

        let mut aggregate = self
            .kem
            .decapsulate(secret_key, body.kem())
            .map_err(|_| ProtocolError::desync("KEM decapsulation failed"))?;
        for (secret_key, ciphertext) in self.secret_keys.iter().zip(body.kukem()) {
            let key = self
                .kukem
                .decapsulate(secret_key, ciphertext)
                .map_err(|_| ProtocolError::desync("kuKEM decapsulation failed"))?;
            aggregate.mix(&key);
        }

        self.secret_key = None;
        self.secret_keys.drain(..extra);

        Ok(aggregate)
    }

    /// Shape checks of [`Self::decapsulate`]; returns the number of kuKEM
    /// secret keys it would consume.
    pub fn check_decapsulation(
        &self,
        used_keys: u32,
        body: &QueuedCiphertext<S>,
    ) -> Result<usize, ProtocolError> {
        let extra = used_keys
            .checked_sub(1)
            .ok_or(ProtocolError::desync("used key count is zero"))? as usize;
        if body.kukem().len() != extra {
            return Err(ProtocolError::desync("kuKEM ciphertext count mismatch"));
        }
        if self.secret_keys.len() < extra {
            return Err(ProtocolError::desync("kuKEM secret key underflow"));
        }
        if self.secret_key.is_none() {
            return Err(ProtocolError::desync("KEM secret key already consumed"));
        }
        Ok(extra)
    }

    /// Regenerate the KEM secret key from `seed` and advance every queued
    /// kuKEM secret key with update data derived from `(ad, ciphertext)`.
    pub fn update_secret_keys(
        &mut self,
        seed: &KeySeed,
        ad: &AssociatedData,
        ciphertext: &Ciphertext<S>,
    ) {
        self.secret_key = Some(self.kem.generate_from_seed(seed).secret_key);

        let data = self.deriver.derive(&ciphertext.entry_encoding(ad));
        let secret_keys = std::mem::take(&mut self.secret_keys);
        self.secret_keys =
            secret_keys.into_iter().map(|key| self.kukem.update_secret_key(key, &data)).collect();
    }

    /// Queue a partner kuKEM public key.
    ///
    /// Drops the `acked` oldest pending update entries (messages the partner
    /// has seen), then advances `public_key` with the next `updates` entries
    /// in order (messages the partner had not seen when it generated the key).
    ///
    /// # Errors
    ///
    /// `Desynchronized` if fewer than `acked + updates` entries are pending.
    /// Nothing is dropped in that case.
    pub fn add_updated_public_key(
        &mut self,
        public_key: KuKemPublicKey<S>,
        acked: u64,
        updates: u64,
    ) -> Result<(), ProtocolError> {
        let (acked, updates) = self.check_public_key_update(acked, updates)?;

        self.pending_updates.drain(..acked);
        let public_key = self
            .pending_updates
            .iter()
            .take(updates)
            .fold(public_key, |key, data| self.kukem.update_public_key(&key, data));
        self.partner_public_keys.push_back(public_key);
        Ok(())
    }

    /// Bounds check of [`Self::add_updated_public_key`].
    pub fn check_public_key_update(
        &self,
        acked: u64,
        updates: u64,
    ) -> Result<(usize, usize), ProtocolError> {
        let required = acked
            .checked_add(updates)
            .ok_or(ProtocolError::desync("update count overflow"))?;
        if required > self.pending_updates.len() as u64 {
            return Err(ProtocolError::desync("pending update underflow"));
        }
        Ok((acked as usize, updates as usize))
    }

    /// Record update data for a message we sent.
    pub fn add_to_public_key_update_information(
        &mut self,
        ad: &AssociatedData,
        ciphertext: &Ciphertext<S>,
    ) {
        self.pending_updates.push_back(self.deriver.derive(&ciphertext.entry_encoding(ad)));
    }

    /// Public keys the next [`Self::encapsulate`] would use: the partner KEM
    /// key plus every queued partner kuKEM key.
    pub fn pending_key_count(&self) -> usize {
        1 + self.partner_public_keys.len()
    }

    /// Queued own kuKEM secret keys.
    pub fn secret_key_count(&self) -> usize {
        self.secret_keys.len()
    }

    /// Pending update entries for unacknowledged sends.
    pub fn pending_update_count(&self) -> usize {
        self.pending_updates.len()
    }

    /// Whether a partner KEM public key is available.
    pub fn has_encapsulation_target(&self) -> bool {
        self.partner_public_key.is_some()
    }

    /// Whether the KEM secret key is still available.
    pub fn has_decapsulation_key(&self) -> bool {
        self.secret_key.is_some()
    }
}

impl<S: CipherSuite> fmt::Debug for QueuedKuKem<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedKuKem")
            .field("has_decapsulation_key", &self.has_decapsulation_key())
            .field("has_encapsulation_target", &self.has_encapsulation_target())
            .field("secret_keys", &self.secret_keys.len())
            .field("partner_public_keys", &self.partner_public_keys.len())
            .field("pending_updates", &self.pending_updates.len())
            .finish()
    }
}
