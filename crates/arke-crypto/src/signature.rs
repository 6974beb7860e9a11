//! One-time Ed25519 signatures.

use std::{collections::VecDeque, fmt};

use arke_core::{Encode, PrimitiveError, Role, SignatureManager};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};

/// Ed25519 verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519VerificationKey(VerifyingKey);

impl Ed25519VerificationKey {
    /// Compressed key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl Encode for Ed25519VerificationKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.0.as_bytes());
    }
}

/// Ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

impl Ed25519Signature {
    /// Signature bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Parse signature bytes. Any 64 bytes parse; validity is checked on
    /// verification.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(bytes))
    }
}

impl Encode for Ed25519Signature {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_bytes());
    }
}

/// FIFO of own one-time signing keys plus the pinned partner key.
///
/// Signing keys zeroize on drop. Verification uses `verify_strict`, which
/// rejects small-order keys and non-canonical signatures.
#[derive(Default)]
pub struct Ed25519OneTimeSigner {
    signing_keys: VecDeque<SigningKey>,
    verification_key: Option<VerifyingKey>,
}

impl Ed25519OneTimeSigner {
    /// Signing keys not yet used.
    pub fn signing_key_count(&self) -> usize {
        self.signing_keys.len()
    }

    /// The currently pinned partner key.
    pub fn pinned(&self) -> Option<Ed25519VerificationKey> {
        self.verification_key.map(Ed25519VerificationKey)
    }
}

impl fmt::Debug for Ed25519OneTimeSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519OneTimeSigner")
            .field("signing_keys", &self.signing_keys.len())
            .field("verification_key", &self.verification_key)
            .finish()
    }
}

impl SignatureManager for Ed25519OneTimeSigner {
    type VerificationKey = Ed25519VerificationKey;
    type Signature = Ed25519Signature;

    fn init<R: RngCore + CryptoRng>(&mut self, rng: &mut R, role: Role) {
        let first = SigningKey::generate(rng);
        let second = SigningKey::generate(rng);
        let (own, partner) = if role.is_initiator() { (first, second) } else { (second, first) };
        self.verification_key = Some(partner.verifying_key());
        self.signing_keys.push_back(own);
    }

    fn generate<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Ed25519VerificationKey {
        let signing_key = SigningKey::generate(rng);
        let verification_key = Ed25519VerificationKey(signing_key.verifying_key());
        self.signing_keys.push_back(signing_key);
        verification_key
    }

    fn set_verification_key(&mut self, verification_key: Ed25519VerificationKey) {
        self.verification_key = Some(verification_key.0);
    }

    fn sign(&mut self, message: &[u8]) -> Result<Ed25519Signature, PrimitiveError> {
        let signing_key = self.signing_keys.pop_front().ok_or(PrimitiveError::NoSigningKey)?;
        Ok(Ed25519Signature(signing_key.sign(message)))
    }

    fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> bool {
        self.verification_key
            .as_ref()
            .is_some_and(|pinned| pinned.verify_strict(message, &signature.0).is_ok())
    }
}
