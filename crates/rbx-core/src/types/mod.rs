//! Core data types for the rbxapi request engine.
//!
//! This module provides the fundamental types used throughout rbxapi:
//! - Plain-data HTTP requests and responses
//! - Search parameters attached to endpoint descriptors
//! - Credential shapes and values

pub mod credentials;
pub mod http;
pub mod params;

// Re-export all public types
pub use credentials::{CredentialKind, Credentials};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use params::{ParamValue, SearchParams};
