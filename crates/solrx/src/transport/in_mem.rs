//! # Previously, on solrx...
//!
//! 🎬 The Solr server was down. Or it was never up. Or it was up, but on a
//! laptop that someone closed and took to lunch. Either way, tests still needed
//! to run.
//!
//! `in_mem` provides a scripted [`Transport`]: queue up the responses (and
//! connection failures) you want, hand it to the client, then read back every
//! request it received. Great for assertions. Great for trust issues. Great for both.
//!
//! ⚠️ No network calls. No sockets. Just a `VecDeque` and a `Vec` behind a mutex.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::common::{SolrRequest, SolrResponse};
use crate::error::{SolrError, SolrResult};
use crate::transport::Transport;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(SolrResponse),
    ConnectionFailure(String),
}

#[derive(Debug, Default)]
struct InMemoryState {
    script: VecDeque<Scripted>,
    fallback: Option<SolrResponse>,
    requests: Vec<SolrRequest>,
}

/// 📦 A transport that never forgets a request and only says what it was told to say.
///
/// Clone-able because tests need to peek inside after handing a copy to the client.
/// Every clone shares the same script and the same request log.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        // -- 🔒 a panicking test thread poisons the lock; the log is still worth reading
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 📋 Queue one response. Responses are served in the order they were queued.
    pub fn respond_with(&self, status: u16, body: impl Into<String>) -> &Self {
        self.state()
            .script
            .push_back(Scripted::Respond(SolrResponse::new(status, body)));
        self
    }

    /// 💀 Queue one connection-level failure.
    pub fn fail_connection(&self, reason: impl Into<String>) -> &Self {
        self.state()
            .script
            .push_back(Scripted::ConnectionFailure(reason.into()));
        self
    }

    /// 🔁 The response to give once the script runs out.
    pub fn always_respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.state().fallback = Some(SolrResponse::new(status, body));
        self
    }

    /// 📜 Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<SolrRequest> {
        self.state().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn execute(&self, request: &SolrRequest) -> SolrResult<SolrResponse> {
        let mut state = self.state();
        state.requests.push(request.clone());
        match state.script.pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::ConnectionFailure(reason)) => Err(SolrError::Connection {
                url: request.url.clone(),
                source: reason.into(),
            }),
            None => state.fallback.clone().ok_or_else(|| SolrError::Transport {
                url: request.url.clone(),
                message: "🗑️ the in-memory script ran out of responses".to_string(),
            }),
        }
    }
}
