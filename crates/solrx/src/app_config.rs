//! 🔧 App configuration: where Solr lives, how patient to be with it, how big to batch.
//!
//! 📡 Figment does the layering. We supply the struct, the defaults, and one
//! required key (`solr.url`). A config with no url is a wish, not a config. 🦆

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::bulk::DEFAULT_CHUNK_SIZE;
use crate::common::AccessMode;
use crate::select::DEFAULT_MAX_LENGTH_GET_URL;
use crate::transport::RetryPolicy;

/// 📦 The AppConfig: one struct to rule them all. Currently it rules one thing.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where Solr lives and how to talk to it.
    pub solr: SolrConfig,
}

/// 📡 Everything needed to construct a [`crate::SolrInterface`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SolrConfig {
    /// 📡 The core URL, e.g. `http://localhost:8983/solr/books`. Trailing slashes optional.
    pub url: String,
    /// 🔒 `"r"` read-only, `"w"` write-only, anything else read-write.
    #[serde(default)]
    pub mode: AccessMode,
    /// 🔄 Seconds to wait before the single retry after a connection failure. Negative = no retry.
    #[serde(default = "default_retry_timeout_secs")]
    pub retry_timeout_secs: f64,
    /// 📏 GET URLs longer than this become POSTs.
    #[serde(default = "default_max_length_get_url")]
    pub max_length_get_url: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 📦 Documents per update request for bulk adds.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

// 🔄 -1: no retries unless you ask. Optimism is opt-in.
fn default_retry_timeout_secs() -> f64 {
    -1.0
}

fn default_max_length_get_url() -> usize {
    DEFAULT_MAX_LENGTH_GET_URL
}

// 🔧 10 seconds to handshake. If Solr can't say hi in 10 seconds, it's not having a good day.
fn default_connect_timeout_secs() -> u64 {
    10
}

// 🔧 30 seconds per request. Optimize calls can be meaty; we're not monsters.
fn default_request_timeout_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl SolrConfig {
    /// 🚀 A config with every default, pointed at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: AccessMode::default(),
            retry_timeout_secs: default_retry_timeout_secs(),
            max_length_get_url: default_max_length_get_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            chunk_size: default_chunk_size(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_secs(self.retry_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 🚀 Resolve the [`AppConfig`] from the environment, then an optional TOML file.
///
/// 🔧 `SOLRX_`-prefixed variables come first, `__` separating the levels
/// (`SOLRX_SOLR__URL`, `SOLRX_SOLR__RETRY_TIMEOUT_SECS`). The file, when given,
/// is layered on top, so its keys beat the environment's.
///
/// 💀 The only required key is `solr.url`. Everything else has a default.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    match config_file_name {
        Some(path) => info!("🔧 Reading config from SOLRX_* and '{}'", path.display()),
        None => info!("🔧 Reading config from SOLRX_* only"),
    }

    let layered = Figment::new().merge(Env::prefixed("SOLRX_").split("__"));
    let layered = match config_file_name {
        Some(path) => layered.merge(Toml::file(path)),
        None => layered,
    };

    layered.extract().with_context(|| match config_file_name {
        Some(path) => format!(
            "💀 '{}' plus the SOLRX_* environment did not add up to a Solr config. \
             Is [solr] there, and does it have a url?",
            path.display()
        ),
        None => "💀 The SOLRX_* environment alone did not add up to a Solr config. \
                 SOLRX_SOLR__URL is the one you can't skip."
            .to_string(),
    })
}
