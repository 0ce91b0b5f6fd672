//! Blake3 hashing behind a narrow capability interface.
//!
//! Components that need a digest take a `KeyHasher` at construction instead
//! of picking an implementation themselves.

/// Capability for turning arbitrary bytes into a stable hex digest
pub trait KeyHasher: Send + Sync {
    fn hash_hex(&self, data: &[u8]) -> String;
}

/// Default `KeyHasher` backed by Blake3
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl KeyHasher for Blake3Hasher {
    fn hash_hex(&self, data: &[u8]) -> String {
        blake3_hash(data)
    }
}

/// Compute Blake3 hash of data
pub fn blake3_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hash.to_hex().to_string()
}
