//! Common utilities for benchmarks

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use rbx_client::{Transport, TransportFailure};
use rbx_core::{Headers, HttpRequest, HttpResponse};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// In-process transport answering every request with the same body
pub struct StaticTransport {
    body: String,
    calls: AtomicUsize,
}

impl StaticTransport {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(HttpResponse {
            status: 200,
            headers: Headers::new(),
            body: self.body.clone(),
        })
    }
}

/// JSON body shaped like a paged user list with `n` entries
pub fn user_page(n: usize) -> String {
    let data: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "name": format!("user{i}"),
                "displayName": format!("User {i}"),
                "hasVerifiedBadge": i % 2 == 0,
            })
        })
        .collect();
    serde_json::json!({ "data": data, "nextPageCursor": null }).to_string()
}
