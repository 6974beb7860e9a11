//! Protocol ciphertext and its canonical encodings.
//!
//! # Encoding
//!
//! ```text
//! signed message = ad ‖ received_count ‖ public_key ‖ verification_key
//!                  ‖ used_keys ‖ kem_ct ‖ n ‖ kukem_ct_1 … kukem_ct_n
//! entry          = signed message ‖ signature
//! entry digest   = SHA-512(entry)
//! ```
//!
//! Variable-length fields carry a big-endian `u32` length prefix, integers are
//! fixed-width big-endian. The entry digest is what both transcripts fold in,
//! and the entry encoding is what kuKEM update data is derived from.

use std::fmt;

use sha2::{Digest, Sha512};

use crate::{
    error::PrimitiveError,
    primitives::{
        CipherSuite, Encode, KuKemPublicKey, Signature, SignatureManager, VerificationKey,
        encode_field,
    },
    queued_kukem::QueuedCiphertext,
    types::AssociatedData,
};

/// SHA-512 digest of an entry encoding.
pub type EntryDigest = [u8; 64];

/// A signed protocol message.
///
/// Immutable once sealed. Carries the sender's fresh kuKEM public key and
/// one-time verification key so the receiver can encapsulate and verify on
/// the next round.
pub struct Ciphertext<S: CipherSuite> {
    received_count: u64,
    public_key: KuKemPublicKey<S>,
    verification_key: VerificationKey<S>,
    used_keys: u32,
    body: QueuedCiphertext<S>,
    signature: Signature<S>,
}

impl<S: CipherSuite> Ciphertext<S> {
    /// Assemble a ciphertext from its fields without signing.
    ///
    /// Used to reconstruct received messages. Nothing is validated here; a
    /// receiving party checks the signature and every count.
    pub fn from_parts(
        received_count: u64,
        public_key: KuKemPublicKey<S>,
        verification_key: VerificationKey<S>,
        used_keys: u32,
        body: QueuedCiphertext<S>,
        signature: Signature<S>,
    ) -> Self {
        Self { received_count, public_key, verification_key, used_keys, body, signature }
    }

    /// Sign the fields over `ad` with the oldest queued one-time key.
    pub(crate) fn seal(
        signer: &mut S::Signature,
        ad: &AssociatedData,
        received_count: u64,
        public_key: KuKemPublicKey<S>,
        verification_key: VerificationKey<S>,
        used_keys: u32,
        body: QueuedCiphertext<S>,
    ) -> Result<Self, PrimitiveError> {
        let message = signed_message::<S>(
            ad,
            received_count,
            &public_key,
            &verification_key,
            used_keys,
            &body,
        );
        let signature = signer.sign(&message)?;

        Ok(Self::from_parts(
            received_count,
            public_key,
            verification_key,
            used_keys,
            body,
            signature,
        ))
    }

    /// Messages the sender had received since its previous send.
    pub fn received_count(&self) -> u64 {
        self.received_count
    }

    /// Sender's fresh kuKEM public key.
    pub fn public_key(&self) -> &KuKemPublicKey<S> {
        &self.public_key
    }

    /// Verification key for the sender's next message.
    pub fn verification_key(&self) -> &VerificationKey<S> {
        &self.verification_key
    }

    /// Number of public keys the sender encapsulated to (KEM key included).
    pub fn used_keys(&self) -> u32 {
        self.used_keys
    }

    /// Encapsulation body.
    pub fn body(&self) -> &QueuedCiphertext<S> {
        &self.body
    }

    /// Signature over [`Self::signed_message`].
    pub fn signature(&self) -> &Signature<S> {
        &self.signature
    }

    /// Canonical message covered by the signature.
    pub fn signed_message(&self, ad: &AssociatedData) -> Vec<u8> {
        signed_message::<S>(
            ad,
            self.received_count,
            &self.public_key,
            &self.verification_key,
            self.used_keys,
            &self.body,
        )
    }

    /// Signed message followed by the signature.
    pub fn entry_encoding(&self, ad: &AssociatedData) -> Vec<u8> {
        let mut out = self.signed_message(ad);
        encode_field(&mut out, &self.signature.to_encoded());
        out
    }

    /// SHA-512 of [`Self::entry_encoding`].
    pub fn entry_digest(&self, ad: &AssociatedData) -> EntryDigest {
        Sha512::digest(self.entry_encoding(ad)).into()
    }
}

fn signed_message<S: CipherSuite>(
    ad: &AssociatedData,
    received_count: u64,
    public_key: &KuKemPublicKey<S>,
    verification_key: &VerificationKey<S>,
    used_keys: u32,
    body: &QueuedCiphertext<S>,
) -> Vec<u8> {
    let mut out = Vec::new();
    encode_field(&mut out, ad.as_bytes());
    out.extend_from_slice(&received_count.to_be_bytes());
    encode_field(&mut out, &public_key.to_encoded());
    encode_field(&mut out, &verification_key.to_encoded());
    out.extend_from_slice(&used_keys.to_be_bytes());
    body.encode(&mut out);
    out
}

impl<S: CipherSuite> Clone for Ciphertext<S> {
    fn clone(&self) -> Self {
        Self {
            received_count: self.received_count,
            public_key: self.public_key.clone(),
            verification_key: self.verification_key.clone(),
            used_keys: self.used_keys,
            body: self.body.clone(),
            signature: self.signature.clone(),
        }
    }
}

impl<S: CipherSuite> fmt::Debug for Ciphertext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("received_count", &self.received_count)
            .field("public_key", &self.public_key)
            .field("verification_key", &self.verification_key)
            .field("used_keys", &self.used_keys)
            .field("body", &self.body)
            .field("signature", &self.signature)
            .finish()
    }
}
