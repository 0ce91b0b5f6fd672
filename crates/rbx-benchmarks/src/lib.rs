//! rbxapi benchmarking suite
//!
//! Benchmarks for cache key derivation, the cache adapters and the request
//! engine's hot paths.

pub mod common;

pub use common::*;
