//! Request execution engine
//!
//! One call runs: cache lookup, credential resolution, the transport call
//! with the anti-forgery retry loop, formatting, cache write-through and
//! envelope assembly. The engine keeps no mutable state between calls; the
//! only shared mutable resource is whatever cache adapter is registered.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rbx_cache::{CacheAdapter, CachedResponse, MemoryCache};
use rbx_config::cache::DEFAULT_ADAPTER;
use rbx_config::{CacheRules, CacheSettings, ClientConfig};
use rbx_core::error::{RbxError, RbxResult};
use rbx_core::utils::{Blake3Hasher, KeyHasher};
use rbx_core::{Credentials, HttpRequest, HttpResponse};
use tracing::{debug, instrument, warn};

use crate::credentials::{AntiForgeryState, CredentialsResolver};
use crate::envelope::{decode_body, ApiResponse, CachedResultType};
use crate::key::CacheKey;
use crate::registry::EndpointDescriptor;
use crate::transport::{ReqwestTransport, Transport};

/// Per-call settings
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Credentials used instead of the configured ones for this call only
    pub credentials: Option<Credentials>,
    /// Anti-forgery attempt bound for this call
    pub csrf_retries: Option<u32>,
    /// Limit on each transport invocation
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_csrf_retries(mut self, retries: u32) -> Self {
        self.csrf_retries = Some(retries);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Adapter, settings and key selected for one call
struct CacheTarget<'a> {
    adapter: &'a Arc<dyn CacheAdapter>,
    settings: &'a CacheSettings,
    key: String,
}

/// Executes endpoint descriptors
pub struct RequestEngine {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    csrf_retries: u32,
    cache_rules: CacheRules,
    adapters: HashMap<String, Arc<dyn CacheAdapter>>,
    hasher: Arc<dyn KeyHasher>,
}

impl RequestEngine {
    /// Engine over the default reqwest transport
    pub fn new(config: ClientConfig) -> RbxResult<Self> {
        EngineBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn cache_rules(&self) -> &CacheRules {
        &self.cache_rules
    }

    /// Registered adapter by name
    pub fn adapter(&self, name: &str) -> Option<&Arc<dyn CacheAdapter>> {
        self.adapters.get(name)
    }

    /// Perform one call
    #[instrument(
        name = "api_call",
        skip_all,
        fields(group = %descriptor.group(), endpoint = %descriptor.name(), method = %descriptor.method())
    )]
    pub async fn execute(&self, descriptor: &EndpointDescriptor, options: CallOptions) -> RbxResult<ApiResponse> {
        let cache = self.cache_target(descriptor);

        if let Some(target) = &cache {
            match target.adapter.get(&target.key).await {
                Ok(Some(hit)) => {
                    debug!(adapter = target.adapter.name(), "cache hit");
                    return Ok(ApiResponse::from_cache(hit));
                }
                Ok(None) => debug!(adapter = target.adapter.name(), "cache miss"),
                Err(err) => warn!(adapter = target.adapter.name(), error = %err, "cache lookup failed, fetching live"),
            }
        }

        let response = self.fetch(descriptor, &options).await?;
        let body = decode_body(&response.body);
        let data = apply_formatter(descriptor, &body)?;

        let mut cached_result_type = CachedResultType::Live;
        if let Some(target) = cache {
            let entry = CachedResponse {
                data: data.clone(),
                body: body.clone(),
            };
            match target.adapter.set(target.settings, &target.key, entry).await {
                Ok(()) => cached_result_type = CachedResultType::LiveThenCached,
                Err(err) => warn!(adapter = target.adapter.name(), error = %err, "cache write failed"),
            }
        }

        Ok(ApiResponse {
            response: Some(response),
            data,
            body,
            cached_result_type,
        })
    }

    /// Follow `nextPageCursor` through up to `max_pages` pages
    ///
    /// Each page is an ordinary call, so caching applies per page.
    pub async fn execute_pages(
        &self,
        descriptor: &EndpointDescriptor,
        cursor_param: &str,
        max_pages: usize,
        options: CallOptions,
    ) -> RbxResult<Vec<ApiResponse>> {
        let mut pages = Vec::new();
        let mut current = descriptor.clone();

        while pages.len() < max_pages {
            let page = self.execute(&current, options.clone()).await?;
            let next = page.next_cursor().map(str::to_string);
            pages.push(page);

            match next {
                Some(cursor) => {
                    debug!(endpoint = descriptor.name(), cursor = %cursor, "fetching next page");
                    current = descriptor.with_cursor(cursor_param, &cursor);
                }
                None => break,
            }
        }

        Ok(pages)
    }

    fn cache_target(&self, descriptor: &EndpointDescriptor) -> Option<CacheTarget<'_>> {
        let settings = self.cache_rules.resolve(descriptor.group(), descriptor.name())?;
        let Some(adapter) = self.adapters.get(&settings.adapter) else {
            warn!(adapter = %settings.adapter, "cache adapter not registered, caching skipped");
            return None;
        };

        let key = CacheKey::derive(descriptor).for_adapter(adapter.as_ref(), self.hasher.as_ref());
        Some(CacheTarget { adapter, settings, key })
    }

    /// Transport call plus the anti-forgery retry loop
    async fn fetch(&self, descriptor: &EndpointDescriptor, options: &CallOptions) -> RbxResult<HttpResponse> {
        let endpoint = descriptor.name();
        let auth_headers = CredentialsResolver::resolve(
            endpoint,
            descriptor.credential(),
            options.credentials.as_ref(),
            &self.credentials,
        )?;
        let url = descriptor.url()?;
        let bound = options.csrf_retries.unwrap_or(self.csrf_retries).max(1);

        let mut state = AntiForgeryState::new();
        loop {
            state.begin_attempt();

            let mut headers = auth_headers.clone();
            state.apply(&mut headers);
            let request = HttpRequest {
                method: descriptor.method(),
                url: url.to_string(),
                headers,
                body: descriptor.body().cloned(),
            };

            let response = self.send(endpoint, request, options.timeout).await?;

            if let Some(token) = CredentialsResolver::anti_forgery_rejection(&response) {
                if state.record_rejection(token, bound) {
                    debug!(attempt = state.attempts(), bound, "anti-forgery token refreshed, retrying");
                    continue;
                }
                return Err(RbxError::Auth {
                    endpoint: endpoint.to_string(),
                    attempts: state.attempts(),
                    message: "anti-forgery token kept being rejected".to_string(),
                });
            }

            if response.is_success() {
                return Ok(response);
            }

            if response.status == 401 {
                return Err(RbxError::Auth {
                    endpoint: endpoint.to_string(),
                    attempts: state.attempts(),
                    message: "credentials were rejected".to_string(),
                });
            }

            return Err(RbxError::Transport {
                endpoint: endpoint.to_string(),
                status: Some(response.status),
                body: response.body,
                source: None,
            });
        }
    }

    async fn send(&self, endpoint: &str, request: HttpRequest, timeout: Option<Duration>) -> RbxResult<HttpResponse> {
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .map_err(|elapsed| {
                    RbxError::network(endpoint, format!("timed out after {limit:?}"), elapsed)
                })?,
            None => self.transport.send(request).await,
        };

        outcome.map_err(|failure| RbxError::network(endpoint, failure.to_string(), failure))
    }
}

/// Run the descriptor's formatter, turning errors and panics into `Format`
fn apply_formatter(descriptor: &EndpointDescriptor, body: &serde_json::Value) -> RbxResult<serde_json::Value> {
    let Some(formatter) = descriptor.formatter() else {
        return Ok(body.clone());
    };

    match catch_unwind(AssertUnwindSafe(|| formatter(body))) {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(source)) => Err(RbxError::Format {
            endpoint: descriptor.name().to_string(),
            message: source.to_string(),
            source: Some(source),
        }),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "formatter panicked".to_string());
            Err(RbxError::Format {
                endpoint: descriptor.name().to_string(),
                message,
                source: None,
            })
        }
    }
}

/// Builder for [`RequestEngine`]
pub struct EngineBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    adapters: HashMap<String, Arc<dyn CacheAdapter>>,
    hasher: Arc<dyn KeyHasher>,
}

impl EngineBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            adapters: HashMap::new(),
            hasher: Arc::new(Blake3Hasher),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register a cache adapter under its own name, replacing any previous one
    pub fn adapter(mut self, adapter: Arc<dyn CacheAdapter>) -> Self {
        self.adapters.insert(adapter.name().to_string(), adapter);
        self
    }

    /// Hasher applied to keys for adapters that ask for hashed keys
    pub fn hasher(mut self, hasher: Arc<dyn KeyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Validate the configuration and build the engine
    ///
    /// A `"memory"` adapter referenced by the rules but not registered is
    /// created automatically; any other unknown adapter name is an error.
    pub fn build(mut self) -> RbxResult<RequestEngine> {
        self.config.validate()?;

        let referenced: Vec<String> = self
            .config
            .cache
            .adapter_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        for name in referenced {
            if self.adapters.contains_key(&name) {
                continue;
            }
            if name == DEFAULT_ADAPTER {
                self.adapters.insert(name, Arc::new(MemoryCache::new()));
                continue;
            }
            return Err(RbxError::ConfigValidation {
                field: "cache".to_string(),
                reason: format!("adapter '{name}' is not registered"),
            });
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(RequestEngine {
            transport,
            credentials: self.config.credentials.clone(),
            csrf_retries: self.config.csrf_retries(),
            cache_rules: self.config.cache,
            adapters: self.adapters,
            hasher: self.hasher,
        })
    }
}
