//! Utility functions and helpers.
//!
//! Common functionality used across multiple rbxapi crates.

pub mod canonical;
pub mod hash;

// Re-export commonly used utilities
pub use canonical::canonical_json;
pub use hash::{blake3_hash, Blake3Hasher, KeyHasher};
