//! Authentication headers and the anti-forgery token retry state

use rbx_core::error::{RbxError, RbxResult};
use rbx_core::{CredentialKind, Credentials, Headers, HttpResponse};

/// Request header carrying the session cookie
pub const COOKIE_HEADER: &str = "cookie";
/// Name of the session cookie inside the `Cookie` header
pub const SESSION_COOKIE: &str = ".ROBLOSECURITY";
/// Request header carrying an Open Cloud API key
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header used both to hand out and to send back the anti-forgery token
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Status a server answers with when the anti-forgery token is missing or stale
pub const CSRF_REJECTION_STATUS: u16 = 403;

/// Turns credentials into request headers
pub struct CredentialsResolver;

impl CredentialsResolver {
    /// Build the auth headers for one call
    ///
    /// `kind` is the shape the endpoint requires; `None` means the endpoint is
    /// anonymous and no header is produced. The override wins over `config`
    /// per shape.
    pub fn resolve(
        endpoint: &str,
        kind: Option<CredentialKind>,
        override_credentials: Option<&Credentials>,
        config: &Credentials,
    ) -> RbxResult<Headers> {
        let mut headers = Headers::new();
        let Some(kind) = kind else {
            return Ok(headers);
        };

        let value = override_credentials
            .and_then(|credentials| credentials.get(kind))
            .or_else(|| config.get(kind))
            .ok_or_else(|| RbxError::Auth {
                endpoint: endpoint.to_string(),
                attempts: 0,
                message: format!("no {kind} credential configured"),
            })?;

        match kind {
            CredentialKind::Cookie => {
                headers.insert(COOKIE_HEADER, format!("{SESSION_COOKIE}={value}"));
            }
            CredentialKind::ApiKey => {
                headers.insert(API_KEY_HEADER, value);
            }
        }

        Ok(headers)
    }

    /// Fresh anti-forgery token handed out in the headers of a rejected response
    pub fn refresh_anti_forgery_token(previous: &Headers) -> Option<String> {
        previous
            .get(CSRF_HEADER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    /// Token to retry with, if `response` is an anti-forgery rejection
    pub fn anti_forgery_rejection(response: &HttpResponse) -> Option<String> {
        if response.status != CSRF_REJECTION_STATUS {
            return None;
        }
        Self::refresh_anti_forgery_token(&response.headers)
    }
}

/// Per-call anti-forgery token and transport invocation counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntiForgeryState {
    token: Option<String>,
    attempts: u32,
}

impl AntiForgeryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Transport invocations made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Count one transport invocation
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Attach the current token, if any
    pub fn apply(&self, headers: &mut Headers) {
        if let Some(token) = &self.token {
            headers.insert(CSRF_HEADER, token.clone());
        }
    }

    /// Record a rejection carrying `token`
    ///
    /// Returns `true` when another invocation is allowed under `bound`, which
    /// counts total invocations including the first.
    pub fn record_rejection(&mut self, token: String, bound: u32) -> bool {
        self.token = Some(token);
        self.attempts < bound
    }
}
