//! 💀 Errors — the many ways a request to Solr can go sideways, each with a name tag.
//!
//! 🎬 *[a 500 walks into a bar. The bartender says "we don't serve your kind here."]*
//! *[the 500 says "that's fine, I wasn't going to retry anyway."]*
//!
//! 🧠 Knowledge graph:
//! - `ModeViolation` and `Validation` happen BEFORE the network is touched. Zero bytes sent.
//! - `Connection` is the only retryable kind. `HttpTransport` retries it exactly once.
//! - `Protocol` carries the whole [`SolrResponse`], so callers can read the body Solr
//!   sent back (it usually explains which field ruined your afternoon).
//! - `Initialization` is the schema fetch failing at construction. Fatal. No interface for you.
//!
//! The lib speaks `SolrError`. The CLI and config layers speak `anyhow`. They get along.

use thiserror::Error;

use crate::common::{AccessMode, SolrResponse};

/// 📦 Shorthand for results that fail with a [`SolrError`].
pub type SolrResult<T> = std::result::Result<T, SolrError>;

/// 💀 Everything that can stop a Solr operation, sorted by whose fault it was.
#[derive(Debug, Error)]
pub enum SolrError {
    /// 🔒 A read on a write-only connection, or the other way round.
    #[error("💀 '{operation}' is not allowed on a {mode} connection. Nothing was sent.")]
    ModeViolation {
        operation: &'static str,
        mode: AccessMode,
    },

    /// 📡 The request never completed at the connection level. Retryable, once.
    #[error("💀 Could not complete the connection to '{url}'. The network ghosted us.")]
    Connection {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 📡 A transport failure that is not a connection failure (timeouts mid-read, bad URLs).
    #[error("💀 The request to '{url}' failed in transit: {message}")]
    Transport { url: String, message: String },

    /// ⚠️ Solr answered, but not with a 200.
    #[error(
        "💀 Solr answered {method} '{url}' with status {}. Body: '{}'",
        .response.status,
        .response.body
    )]
    Protocol {
        method: String,
        url: String,
        response: SolrResponse,
    },

    /// 🔧 Bad options, bad combinations, bad documents. Caught before any request.
    #[error("💀 Validation failed: {0}")]
    Validation(String),

    /// 🏗️ The schema could not be loaded, so the interface cannot exist.
    #[error("💀 Could not initialize the Solr interface: {message}")]
    Initialization { message: String },

    /// 📦 JSON went in or out and came back wrong.
    #[error("💀 JSON (de)serialization failed")]
    Serialization(#[from] serde_json::Error),
}

impl SolrError {
    /// 🔧 Build a validation error from anything string-shaped.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// 🏗️ Build an initialization error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization {
            message: msg.into(),
        }
    }

    /// 🔄 Only connection-level failures earn a second chance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// 📡 The response Solr sent back, when there was one.
    pub fn response(&self) -> Option<&SolrResponse> {
        match self {
            Self::Protocol { response, .. } => Some(response),
            _ => None,
        }
    }
}
