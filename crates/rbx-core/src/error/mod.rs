//! Error types and result aliases for rbxapi operations.
//!
//! A failed API call always surfaces as exactly one of `Auth`, `Transport`
//! or `Format`. The remaining variants only come from configuration loading
//! and engine construction.

use thiserror::Error;

/// Boxed error used for formatter and transport sources
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for all rbxapi operations
#[derive(Error, Debug)]
pub enum RbxError {
    // Call errors
    #[error("Authentication failed for '{endpoint}' after {attempts} attempt(s): {message}")]
    Auth {
        endpoint: String,
        attempts: u32,
        message: String,
    },

    #[error("{}", transport_message(.endpoint, .status, .body))]
    Transport {
        endpoint: String,
        status: Option<u16>,
        body: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Failed to format response of '{endpoint}': {message}")]
    Format {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    // Config errors
    #[error("Failed to parse {file}: {message}")]
    ConfigParse { file: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

fn transport_message(endpoint: &str, status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) if body.is_empty() => format!("Request to '{endpoint}' failed with status {status}"),
        Some(status) => format!("Request to '{endpoint}' failed with status {status}: {body}"),
        None => format!("Request to '{endpoint}' could not complete: {body}"),
    }
}

/// Result type alias for rbxapi operations
pub type RbxResult<T> = Result<T, RbxError>;

impl RbxError {
    /// Create a transport error for a call that never produced a response
    pub fn network<E>(endpoint: &str, message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            endpoint: endpoint.to_string(),
            status: None,
            body: message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Endpoint name the error belongs to, for call errors
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            RbxError::Auth { endpoint, .. }
            | RbxError::Transport { endpoint, .. }
            | RbxError::Format { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// HTTP status carried by a transport error
    pub fn status(&self) -> Option<u16> {
        match self {
            RbxError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Number of transport invocations made before an auth failure.
    ///
    /// Zero means no credential was available at all.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RbxError::Auth { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Whether this error is one of the three kinds a call can fail with
    pub fn is_call_error(&self) -> bool {
        matches!(
            self,
            RbxError::Auth { .. } | RbxError::Transport { .. } | RbxError::Format { .. }
        )
    }

    /// Check if this error is recoverable by trying again later
    pub fn is_recoverable(&self) -> bool {
        match self {
            RbxError::Transport { status: None, .. } => true,
            RbxError::Transport { status: Some(status), .. } => *status == 429 || *status >= 500,
            RbxError::Io { .. } => true,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            RbxError::Auth { attempts: 0, .. } => {
                Some("Provide a cookie or API key via the config file, RBX_COOKIE/RBX_API_KEY or --cookie/--api-key")
            },
            RbxError::Auth { .. } => Some("The credential was rejected; check that it is still valid"),
            RbxError::Transport { status: None, .. } => {
                Some("Check your internet connection and try again")
            },
            RbxError::Transport { status: Some(429), .. } => Some("Rate limited; wait before retrying"),
            RbxError::Format { .. } => Some("The response shape may have changed; inspect the raw body"),
            RbxError::ConfigParse { .. } | RbxError::ConfigValidation { .. } => {
                Some("Run 'rbx check' to validate your configuration")
            },
            _ => None,
        }
    }
}
