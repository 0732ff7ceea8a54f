//! 🔌 Transport — where bytes actually leave the building.
//!
//! 🚰 A trait, a couple of concrete implementations, and an enum that dispatches
//! between them, so nobody upstream has to care whether the bytes went over TCP
//! or into a `Vec` in RAM.
//!
//! 🧠 Knowledge graph:
//! - [`Transport`]: one request in, one response (or failure) out. No retries. No opinions.
//! - [`ReqwestTransport`]: the real HTTP muscle. Pooled, timeout-bound, thread-safe.
//! - [`InMemoryTransport`]: scripted responses and a request log, for tests and dry runs.
//! - [`TransportBackend`]: the casting agency. Pick one.
//! - [`HttpTransport`]: wraps a backend with the retry policy: on a connection failure,
//!   sleep the configured delay and try exactly once more. Protocol errors never retry.
//!
//! 🦆 The duck stays. The duck always stays.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::common::{SolrRequest, SolrResponse};
use crate::error::{SolrError, SolrResult};

pub mod in_mem;
pub mod reqwest_transport;

pub use in_mem::InMemoryTransport;
pub use reqwest_transport::ReqwestTransport;

/// 📡 Something that can carry one [`SolrRequest`] to a server and bring back what it said.
///
/// # Contract
/// - Connection-level failures come back as [`SolrError::Connection`]. Nothing else does.
/// - Non-200 statuses are NOT errors here. They come back as a normal [`SolrResponse`].
/// - Implementations must be safe to share between tasks.
#[async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    async fn execute(&self, request: &SolrRequest) -> SolrResult<SolrResponse>;
}

/// 🎭 The many faces of a transport.
#[derive(Debug)]
pub enum TransportBackend {
    Reqwest(ReqwestTransport),
    InMemory(InMemoryTransport),
}

#[async_trait]
impl Transport for TransportBackend {
    async fn execute(&self, request: &SolrRequest) -> SolrResult<SolrResponse> {
        match self {
            TransportBackend::Reqwest(t) => t.execute(request).await,
            TransportBackend::InMemory(t) => t.execute(request).await,
        }
    }
}

impl From<ReqwestTransport> for TransportBackend {
    fn from(transport: ReqwestTransport) -> Self {
        TransportBackend::Reqwest(transport)
    }
}

impl From<InMemoryTransport> for TransportBackend {
    fn from(transport: InMemoryTransport) -> Self {
        TransportBackend::InMemory(transport)
    }
}

/// 🔄 How long to wait before the one and only retry. `None` means no retry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    delay: Option<Duration>,
}

impl RetryPolicy {
    /// 🔧 Negative (or non-finite, or absurd) seconds disable the retry. Zero retries immediately.
    pub fn from_secs(secs: f64) -> Self {
        Self {
            delay: Duration::try_from_secs_f64(secs).ok(),
        }
    }

    pub fn after(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }

    pub fn disabled() -> Self {
        Self { delay: None }
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }
}

/// 📡 A transport backend plus the retry policy. Every request in this crate goes through here.
#[derive(Debug)]
pub struct HttpTransport {
    backend: TransportBackend,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(backend: impl Into<TransportBackend>, retry: RetryPolicy) -> Self {
        Self {
            backend: backend.into(),
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// 🚀 Send one request. On a connection failure, maybe send it one more time.
    ///
    /// Whatever the second attempt returns is final, failure included.
    pub async fn request(&self, request: &SolrRequest) -> SolrResult<SolrResponse> {
        debug!("📡 {} {}", request.method, request.url);
        match self.backend.execute(request).await {
            Err(err) if err.is_retryable() => match self.retry.delay() {
                Some(delay) => {
                    warn!(
                        "🔄 Connection to '{}' failed ({}). Sleeping {:?}, then one more try. Just one.",
                        request.url, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    self.backend.execute(request).await
                }
                None => Err(err),
            },
            outcome => outcome,
        }
    }

    /// ✅ Like [`HttpTransport::request`], but anything other than a 200 is a protocol error.
    pub async fn request_ok(&self, request: &SolrRequest) -> SolrResult<SolrResponse> {
        let response = self.request(request).await?;
        if !response.is_success() {
            return Err(SolrError::Protocol {
                method: request.method.to_string(),
                url: request.url.clone(),
                response,
            });
        }
        trace!("✅ {} {} landed with a 200", request.method, request.url);
        Ok(response)
    }
}
