//! ECIES-style key encapsulation over X25519.
//!
//! ```text
//! shared        = X25519(ephemeral, recipient)
//! key ‖ confirm = HKDF-SHA256(salt = eph_pk ‖ recipient_pk, ikm = shared,
//!                             info = label ‖ context)
//! tag           = HMAC-SHA256(confirm, eph_pk ‖ recipient_pk ‖ context)
//! ciphertext    = eph_pk ‖ tag
//! ```
//!
//! # Security
//!
//! - Low-order recipient keys are rejected (non-contributory shared secret)
//! - The tag confirms the recipient derived the same key, so decapsulating
//!   under the wrong key or context fails instead of yielding garbage
//! - The context binds kuKEM level and identity into every key

use arke_core::{Encode, PrimitiveError, SymmetricKey};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Label for ECIES key derivation
const ECIES_LABEL: &[u8] = b"arke ecies v1";

/// Ephemeral public key plus key confirmation tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EciesCiphertext {
    ephemeral: [u8; 32],
    tag: [u8; 32],
}

impl EciesCiphertext {
    /// Canonical 64-byte encoding.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.ephemeral);
        out[32..].copy_from_slice(&self.tag);
        out
    }

    /// Parse the canonical encoding.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        let mut ephemeral = [0u8; 32];
        let mut tag = [0u8; 32];
        ephemeral.copy_from_slice(&bytes[..32]);
        tag.copy_from_slice(&bytes[32..]);
        Self { ephemeral, tag }
    }
}

impl Encode for EciesCiphertext {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ephemeral);
        out.extend_from_slice(&self.tag);
    }
}

/// Expand `seed` into a static X25519 secret under `label`.
pub(crate) fn secret_from_seed(seed: &[u8; 32], label: &[u8]) -> StaticSecret {
    let hkdf = Hkdf::<Sha256>::new(None, seed);
    let mut bytes = Zeroizing::new([0u8; 32]);
    let Ok(()) = hkdf.expand(label, &mut bytes[..]) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };
    StaticSecret::from(*bytes)
}

/// Session key and a MAC keyed for the confirmation tag.
fn derive(
    shared: &[u8; 32],
    ephemeral: &[u8; 32],
    recipient: &[u8; 32],
    context: &[u8],
) -> (SymmetricKey, Hmac<Sha256>) {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral);
    salt[32..].copy_from_slice(recipient);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt[..]), shared);
    let mut okm = Zeroizing::new([0u8; 64]);
    let Ok(()) = hkdf.expand_multi_info(&[ECIES_LABEL, context], &mut okm[..]) else {
        unreachable!("64 bytes is a valid HKDF-SHA256 output length");
    };

    let mut key = [0u8; 32];
    key.copy_from_slice(&okm[..32]);

    let Ok(mut mac) = <Hmac<Sha256> as Mac>::new_from_slice(&okm[32..]) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(ephemeral);
    mac.update(recipient);
    mac.update(context);

    (SymmetricKey::new(key), mac)
}

/// Encapsulate a fresh key to `recipient`.
pub fn encapsulate<R: RngCore + CryptoRng>(
    rng: &mut R,
    recipient: &PublicKey,
    context: &[u8],
) -> Result<(SymmetricKey, EciesCiphertext), PrimitiveError> {
    let secret = EphemeralSecret::random_from_rng(&mut *rng);
    let ephemeral = PublicKey::from(&secret).to_bytes();
    let shared = secret.diffie_hellman(recipient);
    if !shared.was_contributory() {
        return Err(PrimitiveError::InvalidKey("low-order X25519 public key"));
    }

    let (key, mac) = derive(shared.as_bytes(), &ephemeral, recipient.as_bytes(), context);
    let tag = mac.finalize().into_bytes().into();

    Ok((key, EciesCiphertext { ephemeral, tag }))
}

/// Recover the key in `ciphertext` with the recipient's secret.
pub fn decapsulate(
    secret: &StaticSecret,
    ciphertext: &EciesCiphertext,
    context: &[u8],
) -> Result<SymmetricKey, PrimitiveError> {
    let recipient = PublicKey::from(secret);
    let shared = secret.diffie_hellman(&PublicKey::from(ciphertext.ephemeral));
    if !shared.was_contributory() {
        return Err(PrimitiveError::DecapsulationFailed);
    }

    let (key, mac) =
        derive(shared.as_bytes(), &ciphertext.ephemeral, recipient.as_bytes(), context);
    mac.verify_slice(&ciphertext.tag).map_err(|_| PrimitiveError::DecapsulationFailed)?;

    Ok(key)
}
