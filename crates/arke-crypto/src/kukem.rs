//! Identity-chained key-updateable KEM over X25519.
//!
//! Every key carries a level and a 32-byte identity chain. Updating a key
//! hashes the update data into the chain and bumps the level:
//!
//! ```text
//! identity' = SHA-256(label ‖ identity ‖ update_data)
//! level'    = level + 1
//! ```
//!
//! Encapsulation binds `level ‖ identity` into the ECIES context, so a
//! ciphertext only decapsulates under a secret key that went through the
//! same update sequence.
//!
//! # Security
//!
//! The X25519 point itself never changes. Updating therefore gives exact
//! key-updateability and level binding, but not update forward secrecy: a
//! leaked secret key at any level still decapsulates ciphertexts for other
//! levels if the identity chain is known. Update forward secrecy needs a
//! hierarchical IBE backend behind [`KeyUpdateableKem`], which this crate
//! does not ship.

use std::fmt;

use arke_core::{Encode, Kem, KeyPair, KeySeed, KeyUpdateableKem, PrimitiveError, SymmetricKey};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::ecies::{self, EciesCiphertext};

/// Domain separation for kuKEM encapsulations
const KUKEM_CONTEXT: &[u8] = b"arke kukem v1";

/// Label for seeded key generation
const KUKEM_SEED_LABEL: &[u8] = b"arke kukem seed v1";

/// Label for identity chain updates
const KUKEM_UPDATE_LABEL: &[u8] = b"arke kukem update v1";

/// Data a kuKEM key is advanced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KuKemUpdateData(pub [u8; 32]);

fn advance(identity: &[u8; 32], data: &KuKemUpdateData) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KUKEM_UPDATE_LABEL);
    hasher.update(identity);
    hasher.update(data.0);
    hasher.finalize().into()
}

fn context(level: u32, identity: &[u8; 32]) -> Vec<u8> {
    let mut context = Vec::with_capacity(KUKEM_CONTEXT.len() + 4 + 32);
    context.extend_from_slice(KUKEM_CONTEXT);
    context.extend_from_slice(&level.to_be_bytes());
    context.extend_from_slice(identity);
    context
}

/// kuKEM public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KuKemPublicKey {
    point: PublicKey,
    level: u32,
    identity: [u8; 32],
}

impl KuKemPublicKey {
    /// Number of updates applied.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Identity chain after all updates.
    pub fn identity(&self) -> &[u8; 32] {
        &self.identity
    }
}

impl Encode for KuKemPublicKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.point.as_bytes());
        out.extend_from_slice(&self.level.to_be_bytes());
        out.extend_from_slice(&self.identity);
    }
}

/// kuKEM secret key. The scalar is zeroized on drop.
#[derive(Clone)]
pub struct KuKemSecretKey {
    secret: StaticSecret,
    level: u32,
    identity: [u8; 32],
}

impl KuKemSecretKey {
    /// Number of updates applied.
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl fmt::Debug for KuKemSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KuKemSecretKey")
            .field("level", &self.level)
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

fn pair(secret: StaticSecret) -> KeyPair<KuKemSecretKey, KuKemPublicKey> {
    let identity = [0u8; 32];
    let public_key = KuKemPublicKey { point: PublicKey::from(&secret), level: 0, identity };
    KeyPair { secret_key: KuKemSecretKey { secret, level: 0, identity }, public_key }
}

/// Identity-chained kuKEM. See the module docs for its security limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519KuKem;

impl Kem for X25519KuKem {
    type PublicKey = KuKemPublicKey;
    type SecretKey = KuKemSecretKey;
    type Ciphertext = EciesCiphertext;

    fn generate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> KeyPair<KuKemSecretKey, KuKemPublicKey> {
        pair(StaticSecret::random_from_rng(&mut *rng))
    }

    fn generate_from_seed(&self, seed: &KeySeed) -> KeyPair<KuKemSecretKey, KuKemPublicKey> {
        pair(ecies::secret_from_seed(seed.as_bytes(), KUKEM_SEED_LABEL))
    }

    fn encapsulate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        public_key: &KuKemPublicKey,
    ) -> Result<(SymmetricKey, EciesCiphertext), PrimitiveError> {
        let context = context(public_key.level, &public_key.identity);
        ecies::encapsulate(rng, &public_key.point, &context)
    }

    fn decapsulate(
        &self,
        secret_key: &KuKemSecretKey,
        ciphertext: &EciesCiphertext,
    ) -> Result<SymmetricKey, PrimitiveError> {
        let context = context(secret_key.level, &secret_key.identity);
        ecies::decapsulate(&secret_key.secret, ciphertext, &context)
    }
}

impl KeyUpdateableKem for X25519KuKem {
    type UpdateData = KuKemUpdateData;

    fn update_public_key(
        &self,
        public_key: &KuKemPublicKey,
        data: &KuKemUpdateData,
    ) -> KuKemPublicKey {
        KuKemPublicKey {
            point: public_key.point,
            level: public_key.level.saturating_add(1),
            identity: advance(&public_key.identity, data),
        }
    }

    fn update_secret_key(
        &self,
        secret_key: KuKemSecretKey,
        data: &KuKemUpdateData,
    ) -> KuKemSecretKey {
        let identity = advance(&secret_key.identity, data);
        KuKemSecretKey { level: secret_key.level.saturating_add(1), identity, ..secret_key }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn fresh_keys_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let pair = X25519KuKem.generate(&mut rng);

        let (key, ciphertext) = X25519KuKem.encapsulate(&mut rng, &pair.public_key).unwrap();

        assert_eq!(X25519KuKem.decapsulate(&pair.secret_key, &ciphertext).unwrap(), key);
    }

    #[test]
    fn updated_keys_stay_compatible() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let KeyPair { mut secret_key, mut public_key } = X25519KuKem.generate(&mut rng);

        for byte in 0..3u8 {
            let data = KuKemUpdateData([byte; 32]);
            public_key = X25519KuKem.update_public_key(&public_key, &data);
            secret_key = X25519KuKem.update_secret_key(secret_key, &data);
        }
        assert_eq!(public_key.level(), 3);
        assert_eq!(secret_key.level(), 3);

        let (key, ciphertext) = X25519KuKem.encapsulate(&mut rng, &public_key).unwrap();
        assert_eq!(X25519KuKem.decapsulate(&secret_key, &ciphertext).unwrap(), key);
    }

    #[test]
    fn stale_secret_key_fails() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let pair = X25519KuKem.generate(&mut rng);
        let data = KuKemUpdateData([9; 32]);

        let public_key = X25519KuKem.update_public_key(&pair.public_key, &data);
        let (_, ciphertext) = X25519KuKem.encapsulate(&mut rng, &public_key).unwrap();

        assert_eq!(
            X25519KuKem.decapsulate(&pair.secret_key, &ciphertext),
            Err(PrimitiveError::DecapsulationFailed)
        );
    }

    #[test]
    fn divergent_update_history_fails() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let pair = X25519KuKem.generate(&mut rng);

        let public_key = X25519KuKem.update_public_key(&pair.public_key, &KuKemUpdateData([1; 32]));
        let secret_key = X25519KuKem.update_secret_key(pair.secret_key, &KuKemUpdateData([2; 32]));
        let (_, ciphertext) = X25519KuKem.encapsulate(&mut rng, &public_key).unwrap();

        assert!(X25519KuKem.decapsulate(&secret_key, &ciphertext).is_err());
    }

    #[test]
    fn update_order_matters() {
        let pair = X25519KuKem.generate_from_seed(&KeySeed::new([7; 32]));
        let a = KuKemUpdateData([1; 32]);
        let b = KuKemUpdateData([2; 32]);

        let step =
            |key: &KuKemPublicKey, data: &KuKemUpdateData| X25519KuKem.update_public_key(key, data);
        let ab = step(&step(&pair.public_key, &a), &b);
        let ba = step(&step(&pair.public_key, &b), &a);

        assert_eq!(ab.level(), ba.level());
        assert_ne!(ab.identity(), ba.identity());
    }
}
