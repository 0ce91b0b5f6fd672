//! Request execution engine for the Roblox web APIs
//!
//! This crate turns endpoint descriptors into executed HTTP calls: cache
//! lookup, credential resolution, the anti-forgery token retry loop,
//! response formatting and cache write-through, returning one uniform
//! result envelope.

pub mod credentials;
pub mod engine;
pub mod envelope;
pub mod formatters;
pub mod key;
pub mod registry;
pub mod transport;

// Re-export main types
pub use credentials::{AntiForgeryState, CredentialsResolver};
pub use engine::{CallOptions, EngineBuilder, RequestEngine};
pub use envelope::{ApiResponse, CachedResultType};
pub use key::CacheKey;
pub use registry::{ApiGroup, EndpointBuilder, EndpointDescriptor, Formatter};
pub use transport::{ReqwestTransport, Transport, TransportConfig, TransportFailure};

pub use rbx_core::error::{RbxError, RbxResult};
