//! API groups and the endpoint descriptors they hand to the engine
//!
//! A group owns a name, a base URL and the credential shape its endpoints
//! need by default. Descriptors are immutable once built; cursor pagination
//! derives a new descriptor rather than mutating one.

use std::fmt;
use std::sync::Arc;

use rbx_core::error::{RbxError, RbxResult};
use rbx_core::{BoxError, CredentialKind, HttpMethod, ParamValue, SearchParams};
use serde_json::Value;
use url::Url;

/// Raw-to-prettified response transform
pub type Formatter = Arc<dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync>;

/// Named set of endpoints sharing a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiGroup {
    name: String,
    base_url: Url,
    credential: Option<CredentialKind>,
}

impl ApiGroup {
    /// Create a group; `base_url` must be an absolute http(s) URL
    pub fn new(name: impl Into<String>, base_url: &str) -> RbxResult<Self> {
        let name = name.into();
        let base_url = Url::parse(base_url).map_err(|e| RbxError::ConfigValidation {
            field: format!("{name}.base_url"),
            reason: format!("'{base_url}' is not a valid URL: {e}"),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(RbxError::ConfigValidation {
                field: format!("{name}.base_url"),
                reason: format!("unsupported scheme '{}'", base_url.scheme()),
            });
        }

        Ok(Self {
            name,
            base_url,
            credential: None,
        })
    }

    /// Credential shape every endpoint of this group requires unless it says otherwise
    pub fn with_credential(mut self, kind: CredentialKind) -> Self {
        self.credential = Some(kind);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credential(&self) -> Option<CredentialKind> {
        self.credential
    }

    /// Start describing an endpoint; `path` is already interpolated
    pub fn endpoint(&self, name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder {
            descriptor: EndpointDescriptor {
                group: self.name.clone(),
                base_url: self.base_url.clone(),
                name: name.into(),
                method,
                path: path.into(),
                search: SearchParams::new(),
                body: None,
                credential: self.credential,
                formatter: None,
            },
        }
    }

    pub fn get(&self, name: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        self.endpoint(name, HttpMethod::Get, path)
    }

    pub fn post(&self, name: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        self.endpoint(name, HttpMethod::Post, path)
    }

    pub fn patch(&self, name: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        self.endpoint(name, HttpMethod::Patch, path)
    }

    pub fn delete(&self, name: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        self.endpoint(name, HttpMethod::Delete, path)
    }
}

/// Everything the engine needs to perform one call
#[derive(Clone)]
pub struct EndpointDescriptor {
    group: String,
    base_url: Url,
    name: String,
    method: HttpMethod,
    path: String,
    search: SearchParams,
    body: Option<Value>,
    credential: Option<CredentialKind>,
    formatter: Option<Formatter>,
}

impl EndpointDescriptor {
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Stable endpoint name used for cache rules and keys
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn search(&self) -> &SearchParams {
        &self.search
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn credential(&self) -> Option<CredentialKind> {
        self.credential
    }

    pub fn formatter(&self) -> Option<&Formatter> {
        self.formatter.as_ref()
    }

    /// Absolute request URL with the search parameters encoded
    pub fn url(&self) -> RbxResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}")).map_err(|e| RbxError::Transport {
            endpoint: self.name.clone(),
            status: None,
            body: format!("invalid request URL: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !self.search.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in self.search.query_pairs() {
                pairs.append_pair(&name, &value);
            }
        }

        Ok(url)
    }

    /// Same call asking for the page after `cursor`
    pub fn with_cursor(&self, param: &str, cursor: &str) -> Self {
        let mut next = self.clone();
        next.search.insert(param, cursor);
        next
    }
}

impl fmt::Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("base_url", &self.base_url.as_str())
            .field("path", &self.path)
            .field("search", &self.search)
            .field("body", &self.body)
            .field("credential", &self.credential)
            .field("formatter", &self.formatter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Builder returned by [`ApiGroup::endpoint`]
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    descriptor: EndpointDescriptor,
}

impl EndpointBuilder {
    pub fn query(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.descriptor.search.insert(name, value);
        self
    }

    /// Add a search parameter only when a value is present
    pub fn query_opt<V: Into<ParamValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.descriptor.body = Some(body);
        self
    }

    /// Override the group's credential shape
    pub fn credential(mut self, kind: CredentialKind) -> Self {
        self.descriptor.credential = Some(kind);
        self
    }

    /// Mark the endpoint as callable without credentials
    pub fn anonymous(mut self) -> Self {
        self.descriptor.credential = None;
        self
    }

    pub fn format_with(mut self, formatter: Formatter) -> Self {
        self.descriptor.formatter = Some(formatter);
        self
    }

    pub fn build(self) -> EndpointDescriptor {
        self.descriptor
    }
}
