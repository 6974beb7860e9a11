//! kuKEM update data derivation.

use arke_core::AssociatedDataDeriver;
use sha2::{Digest, Sha256, Sha512};

use crate::kukem::KuKemUpdateData;

/// Update data = SHA-256(SHA-512(entry encoding)).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Deriver;

impl AssociatedDataDeriver<KuKemUpdateData> for Sha256Deriver {
    fn derive(&self, entry_encoding: &[u8]) -> KuKemUpdateData {
        let inner = Sha512::digest(entry_encoding);
        KuKemUpdateData(Sha256::digest(inner).into())
    }
}
