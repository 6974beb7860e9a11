//! Capability contracts for the cryptographic building blocks.
//!
//! The protocol core never touches curve arithmetic or hash internals. It
//! drives six narrow traits, and a [`CipherSuite`] picks one implementation
//! of each. `arke-crypto` ships the production suite; `arke-harness` ships a
//! deterministic mock suite that detects key misuse.
//!
//! All randomness is passed in explicitly. Two parties fed the same RNG
//! stream during [`crate::Party::new`] end up with complementary bootstrap
//! keys.

use std::fmt;

use rand::{CryptoRng, RngCore};
use sha2::Digest;

use crate::{
    error::PrimitiveError,
    types::{KeySeed, Role, SymmetricKey},
};

/// Canonical byte encoding of values that are signed, hashed into the
/// transcript or turned into kuKEM update data.
///
/// Not a wire format. Implementations only need to be injective.
pub trait Encode {
    /// Append the canonical encoding of `self` to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Canonical encoding as a fresh buffer.
    fn to_encoded(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

/// Write `bytes` with a big-endian `u32` length prefix.
///
/// Every variable-length field of the canonical encoding goes through this.
pub fn encode_field(out: &mut Vec<u8>, bytes: &[u8]) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
}

/// A secret key together with its public key.
#[derive(Debug, Clone)]
pub struct KeyPair<S, P> {
    /// Secret half
    pub secret_key: S,
    /// Public half
    pub public_key: P,
}

/// Key encapsulation mechanism.
pub trait Kem {
    /// Encapsulation target
    type PublicKey: Encode + Clone + fmt::Debug;
    /// Decapsulation key
    type SecretKey;
    /// Encapsulated key
    type Ciphertext: Encode + Clone + fmt::Debug;

    /// Fresh key pair from `rng`.
    fn generate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> KeyPair<Self::SecretKey, Self::PublicKey>;

    /// Deterministic key pair. The same seed always yields the same pair.
    fn generate_from_seed(&self, seed: &KeySeed) -> KeyPair<Self::SecretKey, Self::PublicKey>;

    /// Encapsulate a fresh symmetric key to `public_key`.
    fn encapsulate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        public_key: &Self::PublicKey,
    ) -> Result<(SymmetricKey, Self::Ciphertext), PrimitiveError>;

    /// Recover the key encapsulated in `ciphertext`.
    fn decapsulate(
        &self,
        secret_key: &Self::SecretKey,
        ciphertext: &Self::Ciphertext,
    ) -> Result<SymmetricKey, PrimitiveError>;
}

/// KEM whose keys can be advanced with public update data.
///
/// A secret key and a public key stay compatible only if both were advanced
/// through the same sequence of update data. Advancing a secret key consumes
/// the old one.
pub trait KeyUpdateableKem: Kem {
    /// Data a key is advanced with
    type UpdateData: Clone + fmt::Debug;

    /// Advance a public key one level.
    fn update_public_key(
        &self,
        public_key: &Self::PublicKey,
        data: &Self::UpdateData,
    ) -> Self::PublicKey;

    /// Advance a secret key one level.
    fn update_secret_key(&self, secret_key: Self::SecretKey, data: &Self::UpdateData)
    -> Self::SecretKey;
}

/// One-time signature state for one party.
///
/// Holds a FIFO of own signing keys and the partner's currently pinned
/// verification key. Every signing key is used exactly once.
pub trait SignatureManager {
    /// Public verification key sent inside every ciphertext
    type VerificationKey: Encode + Clone + fmt::Debug;
    /// Signature over the canonical ciphertext encoding
    type Signature: Encode + Clone + fmt::Debug;

    /// Bootstrap: generate two key pairs from `rng`, keep the signing key for
    /// our role and pin the verification key of the peer's role.
    fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role);

    /// Queue a fresh signing key and return its verification key.
    fn generate<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Self::VerificationKey;

    /// Pin the partner's verification key for the next incoming message.
    fn set_verification_key(&mut self, verification_key: Self::VerificationKey);

    /// Sign with the oldest queued signing key, then discard it.
    fn sign(&mut self, message: &[u8]) -> Result<Self::Signature, PrimitiveError>;

    /// Verify against the pinned verification key.
    fn verify(&self, message: &[u8], signature: &Self::Signature) -> bool;
}

/// Output of one oracle query.
#[derive(Debug)]
pub struct OracleOutput {
    /// Session key handed to the caller
    pub session_key: SymmetricKey,
    /// Seed for the next KEM key pair
    pub seed: KeySeed,
}

/// Keyed random oracle with independent send and receive chains.
///
/// One party's send chain must evolve in lockstep with the other party's
/// receive chain.
pub trait KeyedRandomOracle {
    /// Bootstrap both chaining keys from `rng`, ordered by `role`.
    fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role);

    /// Query the send chain with an encapsulated key and transcript state.
    fn query_send(&mut self, key: &SymmetricKey, transcript_state: &[u8]) -> OracleOutput;

    /// Query the receive chain with a decapsulated key and transcript state.
    fn query_receive(&mut self, key: &SymmetricKey, transcript_state: &[u8]) -> OracleOutput;
}

/// Maps a canonical `ad ‖ ciphertext` encoding to kuKEM update data.
pub trait AssociatedDataDeriver<U> {
    /// Derive update data from an entry encoding.
    fn derive(&self, entry_encoding: &[u8]) -> U;
}

/// One implementation of every primitive the protocol needs.
pub trait CipherSuite: Sized {
    /// Plain KEM for the per-round key pair
    type Kem: Kem;
    /// Key-updateable KEM for the queued per-message keys
    type KuKem: KeyUpdateableKem;
    /// One-time signatures
    type Signature: SignatureManager;
    /// Session key derivation
    type Oracle: KeyedRandomOracle;
    /// kuKEM update data derivation
    type Deriver: AssociatedDataDeriver<UpdateData<Self>>;
    /// Transcript hash
    type TranscriptHash: Digest + Clone;

    /// Fresh primitive instances for one party.
    fn instantiate(&self) -> Algorithms<Self>;
}

/// Per-party primitive instances produced by [`CipherSuite::instantiate`].
pub struct Algorithms<S: CipherSuite> {
    /// KEM
    pub kem: S::Kem,
    /// kuKEM
    pub kukem: S::KuKem,
    /// Signature manager
    pub signature: S::Signature,
    /// Random oracle
    pub oracle: S::Oracle,
    /// Update data deriver
    pub deriver: S::Deriver,
}

/// KEM public key of a suite.
pub type KemPublicKey<S> = <<S as CipherSuite>::Kem as Kem>::PublicKey;
/// KEM secret key of a suite.
pub type KemSecretKey<S> = <<S as CipherSuite>::Kem as Kem>::SecretKey;
/// KEM ciphertext of a suite.
pub type KemCiphertext<S> = <<S as CipherSuite>::Kem as Kem>::Ciphertext;
/// kuKEM public key of a suite.
pub type KuKemPublicKey<S> = <<S as CipherSuite>::KuKem as Kem>::PublicKey;
/// kuKEM secret key of a suite.
pub type KuKemSecretKey<S> = <<S as CipherSuite>::KuKem as Kem>::SecretKey;
/// kuKEM ciphertext of a suite.
pub type KuKemCiphertext<S> = <<S as CipherSuite>::KuKem as Kem>::Ciphertext;
/// kuKEM update data of a suite.
pub type UpdateData<S> = <<S as CipherSuite>::KuKem as KeyUpdateableKem>::UpdateData;
/// Verification key of a suite.
pub type VerificationKey<S> = <<S as CipherSuite>::Signature as SignatureManager>::VerificationKey;
/// Signature of a suite.
pub type Signature<S> = <<S as CipherSuite>::Signature as SignatureManager>::Signature;
