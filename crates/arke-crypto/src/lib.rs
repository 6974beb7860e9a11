//! Concrete primitives for the arke protocol.
//!
//! [`StandardSuite`] plugs into [`arke_core::Party`]:
//!
//! | Capability        | Implementation                                  |
//! |-------------------|-------------------------------------------------|
//! | KEM               | [`X25519Kem`]: ECIES over X25519, HKDF-SHA256   |
//! | kuKEM             | [`X25519KuKem`]: identity-chained X25519 ECIES  |
//! | Signatures        | [`Ed25519OneTimeSigner`]: one key per message   |
//! | Random oracle     | [`HkdfOracle`]: HKDF-SHA256 chaining keys       |
//! | Update data       | [`Sha256Deriver`]: SHA-256(SHA-512(entry))      |
//! | Transcript hash   | SHA-256                                         |
//!
//! All secret keys zeroize on drop and redact themselves in `Debug` output.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod deriver;
pub mod ecies;
pub mod error;
pub mod kem;
pub mod kukem;
pub mod oracle;
pub mod signature;
pub mod suite;

pub use deriver::Sha256Deriver;
pub use ecies::EciesCiphertext;
pub use error::ConfigError;
pub use kem::{X25519Kem, X25519PublicKey, X25519SecretKey};
pub use kukem::{KuKemPublicKey, KuKemSecretKey, KuKemUpdateData, X25519KuKem};
pub use oracle::{HkdfOracle, OracleConfig};
pub use signature::{Ed25519OneTimeSigner, Ed25519Signature, Ed25519VerificationKey};
pub use suite::StandardSuite;
