//! Deterministic mock primitives.
//!
//! Insecure by construction: public keys equal secret keys and signatures are
//! plain hashes. What the mocks do guarantee is misuse detection. A KEM
//! ciphertext only decapsulates under the key it targeted, a kuKEM ciphertext
//! only under a secret key at the same level with the same update history,
//! and a signature only verifies under the key that produced it. Any
//! protocol bug that picks the wrong key therefore surfaces as a rejected
//! message or a key mismatch rather than silently passing.

use std::collections::VecDeque;

use arke_core::{
    AssociatedDataDeriver, Algorithms, CipherSuite, Encode, KeyPair, KeySeed, KeyUpdateableKem,
    KeyedRandomOracle, Kem, OracleOutput, PrimitiveError, Role, SignatureManager, SymmetricKey,
    primitives::encode_field,
};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

/// 32-byte mock key identifier.
pub type MockId = [u8; 32];

fn hash(label: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(label);
    for part in parts {
        hasher.update((part.len() as u32).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn random_id<R: RngCore + CryptoRng>(rng: &mut R) -> MockId {
    let mut id = [0u8; 32];
    rng.fill_bytes(&mut id);
    id
}

/// Mock KEM key. Serves as both the secret and the public half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockKemKey {
    /// Key identifier
    pub id: MockId,
}

impl Encode for MockKemKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id);
    }
}

/// Mock KEM ciphertext: names its target key in the clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockKemCiphertext {
    /// Identifier of the key this was encapsulated to
    pub target: MockId,
    /// Per-encapsulation randomness
    pub nonce: [u8; 32],
}

impl Encode for MockKemCiphertext {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.target);
        out.extend_from_slice(&self.nonce);
    }
}

/// Mock KEM.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockKem;

impl Kem for MockKem {
    type PublicKey = MockKemKey;
    type SecretKey = MockKemKey;
    type Ciphertext = MockKemCiphertext;

    fn generate<R: RngCore + CryptoRng>(&self, rng: &mut R) -> KeyPair<MockKemKey, MockKemKey> {
        let key = MockKemKey { id: random_id(rng) };
        KeyPair { secret_key: key.clone(), public_key: key }
    }

    fn generate_from_seed(&self, seed: &KeySeed) -> KeyPair<MockKemKey, MockKemKey> {
        let key = MockKemKey { id: hash(b"mock kem seed", &[&seed.as_bytes()[..]]) };
        KeyPair { secret_key: key.clone(), public_key: key }
    }

    fn encapsulate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        public_key: &MockKemKey,
    ) -> Result<(SymmetricKey, MockKemCiphertext), PrimitiveError> {
        let nonce = random_id(rng);
        let key = SymmetricKey::new(hash(b"mock kem", &[&public_key.id[..], &nonce[..]]));
        Ok((key, MockKemCiphertext { target: public_key.id, nonce }))
    }

    fn decapsulate(
        &self,
        secret_key: &MockKemKey,
        ciphertext: &MockKemCiphertext,
    ) -> Result<SymmetricKey, PrimitiveError> {
        if ciphertext.target != secret_key.id {
            return Err(PrimitiveError::DecapsulationFailed);
        }
        Ok(SymmetricKey::new(hash(b"mock kem", &[&secret_key.id[..], &ciphertext.nonce[..]])))
    }
}

/// Mock kuKEM key: identifier plus update history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockKuKemKey {
    /// Identifier fixed at generation
    pub id: MockId,
    /// Number of updates applied
    pub level: u32,
    /// Hash chain over all update data applied so far
    pub chain: [u8; 32],
}

impl MockKuKemKey {
    /// Identifier the mock refuses to encapsulate to, like a low-order
    /// X25519 point.
    pub const DEGENERATE_ID: MockId = [0u8; 32];

    fn updated(&self, data: &MockUpdateData) -> Self {
        let chain = hash(b"mock kukem update", &[&self.chain[..], &data.0[..]]);
        Self { id: self.id, level: self.level + 1, chain }
    }
}

impl Encode for MockKuKemKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.level.to_be_bytes());
        out.extend_from_slice(&self.chain);
    }
}

/// Mock kuKEM ciphertext: names the exact key state it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockKuKemCiphertext {
    /// Key state this was encapsulated to
    pub target: MockKuKemKey,
    /// Per-encapsulation randomness
    pub nonce: [u8; 32],
}

impl Encode for MockKuKemCiphertext {
    fn encode(&self, out: &mut Vec<u8>) {
        self.target.encode(out);
        out.extend_from_slice(&self.nonce);
    }
}

/// Mock kuKEM update data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUpdateData(pub [u8; 32]);

/// Mock key-updateable KEM.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockKuKem;

impl MockKuKem {
    fn derive_key(key: &MockKuKemKey, nonce: &[u8; 32]) -> SymmetricKey {
        SymmetricKey::new(hash(
            b"mock kukem",
            &[&key.id[..], &key.level.to_be_bytes()[..], &key.chain[..], &nonce[..]],
        ))
    }
}

impl Kem for MockKuKem {
    type PublicKey = MockKuKemKey;
    type SecretKey = MockKuKemKey;
    type Ciphertext = MockKuKemCiphertext;

    fn generate<R: RngCore + CryptoRng>(&self, rng: &mut R) -> KeyPair<MockKuKemKey, MockKuKemKey> {
        let key = MockKuKemKey { id: random_id(rng), level: 0, chain: [0u8; 32] };
        KeyPair { secret_key: key.clone(), public_key: key }
    }

    fn generate_from_seed(&self, seed: &KeySeed) -> KeyPair<MockKuKemKey, MockKuKemKey> {
        let key = MockKuKemKey {
            id: hash(b"mock kukem seed", &[&seed.as_bytes()[..]]),
            level: 0,
            chain: [0u8; 32],
        };
        KeyPair { secret_key: key.clone(), public_key: key }
    }

    fn encapsulate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        public_key: &MockKuKemKey,
    ) -> Result<(SymmetricKey, MockKuKemCiphertext), PrimitiveError> {
        if public_key.id == MockKuKemKey::DEGENERATE_ID {
            return Err(PrimitiveError::InvalidKey("degenerate mock kuKEM key"));
        }
        let nonce = random_id(rng);
        let key = Self::derive_key(public_key, &nonce);
        Ok((key, MockKuKemCiphertext { target: public_key.clone(), nonce }))
    }

    fn decapsulate(
        &self,
        secret_key: &MockKuKemKey,
        ciphertext: &MockKuKemCiphertext,
    ) -> Result<SymmetricKey, PrimitiveError> {
        // Wrong key, wrong level or divergent update history
        if ciphertext.target != *secret_key {
            return Err(PrimitiveError::DecapsulationFailed);
        }
        Ok(Self::derive_key(secret_key, &ciphertext.nonce))
    }
}

impl KeyUpdateableKem for MockKuKem {
    type UpdateData = MockUpdateData;

    fn update_public_key(&self, public_key: &MockKuKemKey, data: &MockUpdateData) -> MockKuKemKey {
        public_key.updated(data)
    }

    fn update_secret_key(&self, secret_key: MockKuKemKey, data: &MockUpdateData) -> MockKuKemKey {
        secret_key.updated(data)
    }
}

/// Mock verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockVerificationKey(pub MockId);

impl Encode for MockVerificationKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

/// Mock signature: signing key identifier plus message hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSignature {
    /// Identifier of the signing key
    pub key: MockId,
    /// SHA-256 of the signed message
    pub digest: [u8; 32],
}

impl Encode for MockSignature {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_field(out, &self.key);
        encode_field(out, &self.digest);
    }
}

/// Mock one-time signature manager.
#[derive(Debug, Clone, Default)]
pub struct MockSigner {
    signing_keys: VecDeque<MockId>,
    verification_key: Option<MockVerificationKey>,
}

impl MockSigner {
    /// A signature that verifies against `verification_key`.
    ///
    /// Verification keys are public, so anyone can produce this. Lets tests
    /// get a tampered ciphertext past the signature check to reach the
    /// checks behind it.
    pub fn forge(verification_key: &MockVerificationKey, message: &[u8]) -> MockSignature {
        MockSignature { key: verification_key.0, digest: Sha256::digest(message).into() }
    }

    /// The currently pinned partner key.
    pub fn pinned(&self) -> Option<&MockVerificationKey> {
        self.verification_key.as_ref()
    }

    /// Signing keys not yet used.
    pub fn signing_key_count(&self) -> usize {
        self.signing_keys.len()
    }
}

impl SignatureManager for MockSigner {
    type VerificationKey = MockVerificationKey;
    type Signature = MockSignature;

    fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role) {
        let first = random_id(rng);
        let second = random_id(rng);
        let (own, partner) = if role.is_initiator() { (first, second) } else { (second, first) };
        self.signing_keys.push_back(own);
        self.verification_key = Some(MockVerificationKey(partner));
    }

    fn generate<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> MockVerificationKey {
        let id = random_id(rng);
        self.signing_keys.push_back(id);
        MockVerificationKey(id)
    }

    fn set_verification_key(&mut self, verification_key: MockVerificationKey) {
        self.verification_key = Some(verification_key);
    }

    fn sign(&mut self, message: &[u8]) -> Result<MockSignature, PrimitiveError> {
        let key = self.signing_keys.pop_front().ok_or(PrimitiveError::NoSigningKey)?;
        Ok(MockSignature { key, digest: Sha256::digest(message).into() })
    }

    fn verify(&self, message: &[u8], signature: &MockSignature) -> bool {
        self.verification_key.as_ref().is_some_and(|pinned| {
            let digest: [u8; 32] = Sha256::digest(message).into();
            pinned.0 == signature.key && signature.digest == digest
        })
    }
}

/// Mock keyed random oracle: hash chains instead of HKDF.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    send_chain: [u8; 32],
    receive_chain: [u8; 32],
}

impl MockOracle {
    fn query(chain: &mut [u8; 32], key: &SymmetricKey, state: &[u8]) -> OracleOutput {
        let input: [&[u8]; 3] = [&chain[..], &key.as_bytes()[..], state];
        let session_key = SymmetricKey::new(hash(b"mock oracle session", &input));
        let seed = KeySeed::new(hash(b"mock oracle seed", &input));
        *chain = hash(b"mock oracle chain", &input);
        OracleOutput { session_key, seed }
    }
}

impl KeyedRandomOracle for MockOracle {
    fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role) {
        let seed = random_id(rng);
        let first = hash(b"mock oracle first", &[&seed[..]]);
        let second = hash(b"mock oracle second", &[&seed[..]]);
        if role.is_initiator() {
            self.receive_chain = first;
            self.send_chain = second;
        } else {
            self.send_chain = first;
            self.receive_chain = second;
        }
    }

    fn query_send(&mut self, key: &SymmetricKey, transcript_state: &[u8]) -> OracleOutput {
        Self::query(&mut self.send_chain, key, transcript_state)
    }

    fn query_receive(&mut self, key: &SymmetricKey, transcript_state: &[u8]) -> OracleOutput {
        Self::query(&mut self.receive_chain, key, transcript_state)
    }
}

/// Mock update data deriver: SHA-256 of the entry encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDeriver;

impl AssociatedDataDeriver<MockUpdateData> for MockDeriver {
    fn derive(&self, entry_encoding: &[u8]) -> MockUpdateData {
        MockUpdateData(Sha256::digest(entry_encoding).into())
    }
}

/// Suite of mock primitives with SHA-256 transcripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSuite;

impl CipherSuite for MockSuite {
    type Kem = MockKem;
    type KuKem = MockKuKem;
    type Signature = MockSigner;
    type Oracle = MockOracle;
    type Deriver = MockDeriver;
    type TranscriptHash = Sha256;

    fn instantiate(&self) -> Algorithms<Self> {
        Algorithms {
            kem: MockKem,
            kukem: MockKuKem,
            signature: MockSigner::default(),
            oracle: MockOracle::default(),
            deriver: MockDeriver,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn kem_rejects_wrong_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let right = MockKem.generate(&mut rng);
        let wrong = MockKem.generate(&mut rng);

        let (key, ciphertext) = MockKem.encapsulate(&mut rng, &right.public_key).unwrap();

        assert_eq!(MockKem.decapsulate(&right.secret_key, &ciphertext).unwrap(), key);
        assert_eq!(
            MockKem.decapsulate(&wrong.secret_key, &ciphertext),
            Err(PrimitiveError::DecapsulationFailed)
        );
    }

    #[test]
    fn kukem_requires_matching_update_history() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let pair = MockKuKem.generate(&mut rng);
        let data = MockUpdateData([7; 32]);

        let public_key = MockKuKem.update_public_key(&pair.public_key, &data);
        let (key, ciphertext) = MockKuKem.encapsulate(&mut rng, &public_key).unwrap();

        // Stale secret key
        assert!(MockKuKem.decapsulate(&pair.secret_key, &ciphertext).is_err());

        let secret_key = MockKuKem.update_secret_key(pair.secret_key, &data);
        assert_eq!(MockKuKem.decapsulate(&secret_key, &ciphertext).unwrap(), key);

        // Diverging update
        let diverged = MockKuKem.update_secret_key(secret_key, &MockUpdateData([8; 32]));
        assert!(MockKuKem.decapsulate(&diverged, &ciphertext).is_err());
    }

    #[test]
    fn signer_keys_are_one_time() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut alice = MockSigner::default();
        alice.init(&mut rng.clone(), Role::Initiator);
        let mut bob = MockSigner::default();
        bob.init(&mut rng, Role::Responder);

        let signature = alice.sign(b"hello").unwrap();
        assert!(bob.verify(b"hello", &signature));
        assert!(!bob.verify(b"goodbye", &signature));
        assert_eq!(alice.sign(b"again"), Err(PrimitiveError::NoSigningKey));
    }

    #[test]
    fn oracle_chains_pair_up_across_roles() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut alice = MockOracle::default();
        alice.init(&mut rng.clone(), Role::Initiator);
        let mut bob = MockOracle::default();
        bob.init(&mut rng, Role::Responder);

        let key = SymmetricKey::new([9; 32]);
        let sent = alice.query_send(&key, b"state");
        let received = bob.query_receive(&key, b"state");
        assert_eq!(sent.session_key, received.session_key);
        assert_eq!(sent.seed.as_bytes(), received.seed.as_bytes());

        // Chains advanced in lockstep
        let sent = alice.query_send(&key, b"state");
        let received = bob.query_receive(&key, b"state");
        assert_eq!(sent.session_key, received.session_key);

        // Opposite direction uses the other chain
        let other = bob.query_send(&key, b"state");
        assert_ne!(other.session_key, sent.session_key);
    }
}
