//! Asynchronous Ratcheted Key Exchange
//!
//! Two long-lived parties derive a fresh session key for every message they
//! exchange over an unreliable, reordering channel. Messages may be delayed or
//! cross in flight; every delivered message still yields a key both sides
//! agree on.
//!
//! # Architecture
//!
//! ```text
//!                 Party::send / Party::receive
//!                            │
//!        ┌───────────────────┼─────────────────────┐
//!        ▼                   ▼                     ▼
//!   QueuedKuKem         Transcript x2        SignatureManager
//!   (KEM + kuKEM        (sending,            (one-time keys,
//!    key queues)         receiving)           rotated per message)
//!        │                   │
//!        └─────────┬─────────┘
//!                  ▼
//!          KeyedRandomOracle → (session key, next key seed)
//! ```
//!
//! Every concrete primitive sits behind a capability trait in
//! [`primitives`]; a [`CipherSuite`] bundles one implementation of each.
//!
//! # Security
//!
//! Forward Secrecy:
//! - The KEM secret key is consumed by the first decapsulation that uses it
//! - kuKEM secret keys are popped from their queue when used and advanced
//!   (never copied) on every receive
//! - One-time signing keys are discarded after a single signature
//!
//! Break-in Recovery:
//! - Every send introduces fresh kuKEM and signature key material
//! - The next KEM key pair is regenerated from oracle output bound to the
//!   transcript, so a compromised state heals after one round trip
//!
//! Rejection:
//! - Forged, replayed or desynchronized ciphertexts are rejected before any
//!   party state is touched
//! - [`Party::receive`] reports rejection as `None` without a reason

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ciphertext;
pub mod error;
pub mod primitives;
pub mod protocol;
pub mod queued_kukem;
pub mod transcript;
pub mod types;

pub use ciphertext::{Ciphertext, EntryDigest};
pub use error::{PrimitiveError, ProtocolError};
pub use primitives::{
    Algorithms, AssociatedDataDeriver, CipherSuite, Encode, KeyPair, KeyUpdateableKem,
    KeyedRandomOracle, Kem, OracleOutput, SignatureManager,
};
pub use protocol::Party;
pub use queued_kukem::{QueuedCiphertext, QueuedKuKem};
pub use transcript::Transcript;
pub use types::{
    AssociatedData, KEY_SEED_SIZE, KeySeed, Role, SYMMETRIC_KEY_SIZE, SessionKey, SymmetricKey,
};
