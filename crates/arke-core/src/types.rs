//! Key material and protocol-level value types.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// Size of every symmetric key produced by the protocol (KEM outputs,
/// aggregate keys and session keys).
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Size of the seed used to regenerate KEM key pairs.
pub const KEY_SEED_SIZE: usize = 32;

/// Label for folding one key into another
const MIX_LABEL: &[u8] = b"arke key mix v1";

/// A 32-byte symmetric key.
///
/// Produced by KEM encapsulation/decapsulation and by the keyed random oracle.
/// Keys are owned by the computation that produced them and are zeroized on
/// drop.
#[derive(Clone)]
pub struct SymmetricKey {
    key: [u8; SYMMETRIC_KEY_SIZE],
}

/// Session key returned by [`crate::Party::send`] and
/// [`crate::Party::receive`].
pub type SessionKey = SymmetricKey;

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn new(key: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.key
    }

    /// Fold `other` into this key.
    ///
    /// `self ← HKDF-SHA256(self ‖ other)`. Not commutative: both parties must
    /// mix keys in the same order to arrive at the same result.
    pub fn mix(&mut self, other: &SymmetricKey) {
        let mut ikm = [0u8; SYMMETRIC_KEY_SIZE * 2];
        ikm[..SYMMETRIC_KEY_SIZE].copy_from_slice(&self.key);
        ikm[SYMMETRIC_KEY_SIZE..].copy_from_slice(&other.key);

        let hkdf = Hkdf::<Sha256>::new(None, &ikm);
        let mut mixed = [0u8; SYMMETRIC_KEY_SIZE];
        let Ok(()) = hkdf.expand(MIX_LABEL, &mut mixed) else {
            unreachable!("32 bytes is a valid HKDF-SHA256 output length");
        };

        ikm.zeroize();
        self.key.zeroize();
        self.key = mixed;
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        // No early exit on the first differing byte
        self.key.iter().zip(other.key.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Seed material for deterministic key pair regeneration.
///
/// Both parties derive the same seed from the keyed random oracle, which lets
/// them agree on the next KEM key pair without sending it.
#[derive(Clone)]
pub struct KeySeed {
    seed: [u8; KEY_SEED_SIZE],
}

impl KeySeed {
    /// Wrap raw seed bytes.
    pub fn new(seed: [u8; KEY_SEED_SIZE]) -> Self {
        Self { seed }
    }

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SEED_SIZE] {
        &self.seed
    }
}

impl fmt::Debug for KeySeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeySeed(<redacted>)")
    }
}

impl Drop for KeySeed {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

/// Caller-supplied context bound into every ciphertext, transcript entry,
/// signature and key update (e.g. a channel identifier).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AssociatedData(Vec<u8>);

impl AssociatedData {
    /// Wrap context bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Context bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for AssociatedData {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for AssociatedData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Which side of the conversation a party plays.
///
/// The role fixes how bootstrap key material is split and tags every
/// transcript entry with the sender of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The party that starts the conversation
    Initiator,
    /// The other party
    Responder,
}

impl Role {
    /// Returns true for [`Role::Initiator`].
    pub fn is_initiator(self) -> bool {
        matches!(self, Self::Initiator)
    }

    /// The communication partner's role.
    #[must_use]
    pub fn peer(self) -> Self {
        match self {
            Self::Initiator => Self::Responder,
            Self::Responder => Self::Initiator,
        }
    }

    /// Transcript direction tag for messages sent by this role.
    pub fn transcript_tag(self) -> u8 {
        match self {
            Self::Initiator => 1,
            Self::Responder => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::new([byte; SYMMETRIC_KEY_SIZE])
    }

    #[test]
    fn mix_is_deterministic() {
        let mut a = key(1);
        let mut b = key(1);
        a.mix(&key(2));
        b.mix(&key(2));
        assert_eq!(a, b);
    }

    #[test]
    fn mix_changes_key() {
        let mut mixed = key(1);
        mixed.mix(&key(2));
        assert_ne!(mixed, key(1));
        assert_ne!(mixed, key(2));
    }

    #[test]
    fn mix_order_matters() {
        let mut ab = key(1);
        ab.mix(&key(2));
        ab.mix(&key(3));

        let mut ba = key(1);
        ba.mix(&key(3));
        ba.mix(&key(2));

        assert_ne!(ab, ba, "folding order must be significant");
    }

    #[test]
    fn debug_redacts_key_material() {
        let rendered = format!("{:?} {:?}", key(0xAB), KeySeed::new([0xCD; KEY_SEED_SIZE]));
        assert!(!rendered.contains("171"));
        assert!(!rendered.to_lowercase().contains("ab"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn roles_are_complementary() {
        assert_eq!(Role::Initiator.peer(), Role::Responder);
        assert_eq!(Role::Responder.peer(), Role::Initiator);
        assert_ne!(Role::Initiator.transcript_tag(), Role::Responder.transcript_tag());
        assert!(Role::Initiator.is_initiator());
        assert!(!Role::Responder.is_initiator());
    }
}
