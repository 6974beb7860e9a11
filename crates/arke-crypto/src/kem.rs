//! X25519 KEM for the per-round key pair.

use std::fmt;

use arke_core::{Encode, Kem, KeyPair, KeySeed, PrimitiveError, SymmetricKey};
use rand::{CryptoRng, RngCore};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::ecies::{self, EciesCiphertext};

/// Domain separation for plain KEM encapsulations
const KEM_CONTEXT: &[u8] = b"arke kem v1";

/// Label for seeded key generation
const KEM_SEED_LABEL: &[u8] = b"arke kem seed v1";

/// X25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X25519PublicKey(PublicKey);

impl X25519PublicKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<[u8; 32]> for X25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(PublicKey::from(bytes))
    }
}

impl Encode for X25519PublicKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.0.as_bytes());
    }
}

/// X25519 secret key. Zeroized on drop.
#[derive(Clone)]
pub struct X25519SecretKey(StaticSecret);

impl fmt::Debug for X25519SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("X25519SecretKey([REDACTED])")
    }
}

fn pair(secret: StaticSecret) -> KeyPair<X25519SecretKey, X25519PublicKey> {
    let public_key = X25519PublicKey(PublicKey::from(&secret));
    KeyPair { secret_key: X25519SecretKey(secret), public_key }
}

/// ECIES-style KEM over X25519 with HKDF-SHA256 and key confirmation.
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519Kem;

impl Kem for X25519Kem {
    type PublicKey = X25519PublicKey;
    type SecretKey = X25519SecretKey;
    type Ciphertext = EciesCiphertext;

    fn generate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> KeyPair<X25519SecretKey, X25519PublicKey> {
        pair(StaticSecret::random_from_rng(&mut *rng))
    }

    fn generate_from_seed(&self, seed: &KeySeed) -> KeyPair<X25519SecretKey, X25519PublicKey> {
        pair(ecies::secret_from_seed(seed.as_bytes(), KEM_SEED_LABEL))
    }

    fn encapsulate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        public_key: &X25519PublicKey,
    ) -> Result<(SymmetricKey, EciesCiphertext), PrimitiveError> {
        ecies::encapsulate(rng, &public_key.0, KEM_CONTEXT)
    }

    fn decapsulate(
        &self,
        secret_key: &X25519SecretKey,
        ciphertext: &EciesCiphertext,
    ) -> Result<SymmetricKey, PrimitiveError> {
        ecies::decapsulate(&secret_key.0, ciphertext, KEM_CONTEXT)
    }
}
