//! # rbx-core
//!
//! Core types and utilities shared across all rbxapi crates.
//!
//! This crate provides:
//! - Plain-data HTTP request/response types consumed by transports
//! - Search parameter and credential types used by endpoint descriptors
//! - RbxError enum for unified error handling
//! - Canonical JSON encoding and key hashing used for cache keys
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (HttpRequest, SearchParams, Credentials, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{BoxError, RbxError, RbxResult};
pub use types::{
    CredentialKind, Credentials, Headers, HttpMethod, HttpRequest, HttpResponse, ParamValue,
    SearchParams,
};
