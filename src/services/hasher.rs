use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// One-way hashing of refresh secrets for the ledger.
///
/// A capability seam rather than a free function so the digest can be
/// swapped (e.g. to a keyed HMAC) without touching the token service.
pub trait SecretHasher: Send + Sync {
    fn hash(&self, secret: &str) -> String;

    /// Constant-time comparison of a presented secret against a stored
    /// hash. Must not reveal where a mismatch occurred.
    fn verify(&self, secret: &str, stored_hash: &str) -> bool;
}

pub struct Sha256Hasher;

impl SecretHasher for Sha256Hasher {
    fn hash(&self, secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        let computed = self.hash(secret);
        computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }
}
