//! # 📡 THE REQWEST TRANSPORT
//!
//! 🎬 COLD OPEN — INT. SERVER ROOM — 3:47 AM
//!
//! The Solr admin page loads. Slowly. The core is green. The engineer exhales.
//! "It's probably fine," they whisper, and fire off forty thousand documents.
//!
//! 🚀 This module carries requests over real HTTP with a shared `reqwest::Client`.
//! It sorts failures into two piles: "the connection never happened" (retryable,
//! see [`crate::transport::HttpTransport`]) and "something else went wrong"
//! (not retryable, because some things should not be attempted twice).

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::common::{HttpMethod, SolrRequest, SolrResponse};
use crate::error::{SolrError, SolrResult};
use crate::transport::Transport;

/// 📡 The HTTP muscle 💪. Cheap to clone, pooled inside, safe to share between tasks.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 🚀 Build a client with a connect timeout and an overall request timeout.
    ///
    /// Like a polite person: we will wait, but not forever.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> SolrResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                SolrError::initialization(format!(
                    "the HTTP client refused to be born ({e}). Probably TLS. It's always TLS."
                ))
            })?;
        Ok(Self { client })
    }

    /// 🔧 Reuse a client someone else already configured.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

// 🕵️ Connect errors, and request errors that were not timeouts, mean the connection
// never completed. Everything else (timeouts, bad URLs, unreadable bodies) is final.
fn classify(url: &str, err: reqwest::Error) -> SolrError {
    if err.is_connect() || (err.is_request() && !err.is_timeout()) {
        SolrError::Connection {
            url: url.to_string(),
            source: Box::new(err),
        }
    } else {
        SolrError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &SolrRequest) -> SolrResult<SolrResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify(&request.url, e))?;
        trace!("📡 {} {} answered {} ({} bytes)", request.method, request.url, status, body.len());
        Ok(SolrResponse::new(status, body))
    }
}
