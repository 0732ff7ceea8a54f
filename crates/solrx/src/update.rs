//! # 📮 THE UPDATE REQUEST BUILDER
//!
//! *Previously, on solrx...*
//!
//! Somebody wanted `expungeDeletes` without a commit. Somebody else wanted
//! `maxSegments=0`. Both were gently, firmly, turned away before a single byte
//! left the process. This module is where that happens.
//!
//! 🧠 Knowledge graph:
//! - Every write-side call (add, delete, commit, optimize, rollback) lands here.
//! - `POST {base}update/json[?params]`, params only when explicitly set, sorted by name.
//! - Booleans go out as `"true"`/`"false"`. Integers are validated first.
//! - `expungeDeletes` needs `commit`. `maxSegments` needs `optimize`. No exceptions.
//! - Read-only connection? Validation fails before the network is even considered.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::common::{AccessMode, Endpoints, SolrRequest};
use crate::error::{SolrError, SolrResult};
use crate::transport::HttpTransport;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// 🔧 Query-string knobs for an update request. `None` means "don't send it".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub commit: Option<bool>,
    /// Milliseconds. Must not be negative.
    pub commit_within: Option<i64>,
    pub soft_commit: Option<bool>,
    pub optimize: Option<bool>,
    pub wait_searcher: Option<bool>,
    pub expunge_deletes: Option<bool>,
    /// Must be positive.
    pub max_segments: Option<i64>,
}

fn flag(value: bool) -> String {
    let rendered = if value { "true" } else { "false" };
    rendered.to_string()
}

fn parse_flag(name: &str, raw: &str) -> SolrResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SolrError::validation(format!(
            "{name} should be true or false, got '{raw}'"
        ))),
    }
}

fn parse_int(name: &str, raw: &str) -> SolrResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SolrError::validation(format!("{name} should be a number, got '{raw}'")))
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit(mut self, commit: bool) -> Self {
        self.commit = Some(commit);
        self
    }

    pub fn with_commit_within(mut self, millis: i64) -> Self {
        self.commit_within = Some(millis);
        self
    }

    pub fn with_soft_commit(mut self, soft_commit: bool) -> Self {
        self.soft_commit = Some(soft_commit);
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = Some(optimize);
        self
    }

    pub fn with_wait_searcher(mut self, wait_searcher: bool) -> Self {
        self.wait_searcher = Some(wait_searcher);
        self
    }

    pub fn with_expunge_deletes(mut self, expunge_deletes: bool) -> Self {
        self.expunge_deletes = Some(expunge_deletes);
        self
    }

    pub fn with_max_segments(mut self, max_segments: i64) -> Self {
        self.max_segments = Some(max_segments);
        self
    }

    /// 📋 Parse textual `(name, value)` pairs, using the wire names (`commitWithin`, ...).
    ///
    /// Unknown names and values that are not booleans/numbers are validation errors.
    pub fn from_pairs<I, K, V>(pairs: I) -> SolrResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (name, raw) in pairs {
            let (name, raw) = (name.as_ref(), raw.as_ref());
            match name {
                "commit" => options.commit = Some(parse_flag(name, raw)?),
                "commitWithin" => options.commit_within = Some(parse_int(name, raw)?),
                "softCommit" => options.soft_commit = Some(parse_flag(name, raw)?),
                "optimize" => options.optimize = Some(parse_flag(name, raw)?),
                "waitSearcher" => options.wait_searcher = Some(parse_flag(name, raw)?),
                "expungeDeletes" => options.expunge_deletes = Some(parse_flag(name, raw)?),
                "maxSegments" => options.max_segments = Some(parse_int(name, raw)?),
                unknown => {
                    return Err(SolrError::validation(format!(
                        "'{unknown}' is not an update option"
                    )));
                }
            }
        }
        Ok(options)
    }

    /// 🔍 Validate and render the query parameters, sorted by name.
    pub fn query_params(&self) -> SolrResult<BTreeMap<&'static str, String>> {
        let mut params = BTreeMap::new();
        if let Some(commit) = self.commit {
            params.insert("commit", flag(commit));
        }
        if let Some(millis) = self.commit_within {
            if millis < 0 {
                return Err(SolrError::validation(
                    "commitWithin should be a non-negative number of milliseconds",
                ));
            }
            params.insert("commitWithin", millis.to_string());
        }
        if let Some(soft_commit) = self.soft_commit {
            params.insert("softCommit", flag(soft_commit));
        }
        if let Some(optimize) = self.optimize {
            params.insert("optimize", flag(optimize));
        }
        if let Some(wait_searcher) = self.wait_searcher {
            params.insert("waitSearcher", flag(wait_searcher));
        }
        if let Some(expunge_deletes) = self.expunge_deletes {
            params.insert("expungeDeletes", flag(expunge_deletes));
        }
        if let Some(max_segments) = self.max_segments {
            if max_segments <= 0 {
                return Err(SolrError::validation(
                    "maxSegments should be a positive number",
                ));
            }
            params.insert("maxSegments", max_segments.to_string());
        }
        if params.contains_key("expungeDeletes") && !params.contains_key("commit") {
            return Err(SolrError::validation(
                "can't do expungeDeletes without commit",
            ));
        }
        if params.contains_key("maxSegments") && !params.contains_key("optimize") {
            return Err(SolrError::validation(
                "can't do maxSegments without optimize",
            ));
        }
        Ok(params)
    }
}

/// 📮 Builds and sends everything that goes to the update endpoint.
#[derive(Debug, Clone)]
pub struct UpdateRequestBuilder {
    endpoints: Arc<Endpoints>,
    mode: AccessMode,
    transport: Arc<HttpTransport>,
}

impl UpdateRequestBuilder {
    pub fn new(endpoints: Arc<Endpoints>, mode: AccessMode, transport: Arc<HttpTransport>) -> Self {
        Self {
            endpoints,
            mode,
            transport,
        }
    }

    /// 🔒 Write permission check. Called before anything else happens.
    pub fn ensure_writable(&self, operation: &'static str) -> SolrResult<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(SolrError::ModeViolation {
                operation,
                mode: self.mode,
            })
        }
    }

    /// 🔗 `{base}update/json`, plus sorted, validated parameters if there are any.
    pub fn url_for_update(&self, options: &UpdateOptions) -> SolrResult<String> {
        let params = options.query_params()?;
        if params.is_empty() {
            return Ok(self.endpoints.update.clone());
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        Ok(format!("{}?{}", self.endpoints.update, query))
    }

    /// 🚀 POST a raw body to the update endpoint. Anything but a 200 is a protocol error.
    pub async fn update(&self, body: &str, options: &UpdateOptions) -> SolrResult<()> {
        self.ensure_writable("update")?;
        let url = self.url_for_update(options)?;
        let mut request = SolrRequest::post(url);
        // -- 📦 an empty body travels without a Content-Type. Nothing to describe.
        if !body.is_empty() {
            request = request
                .with_header("Content-Type", JSON_CONTENT_TYPE)
                .with_body(body);
        }
        debug!("📮 update: {} bytes to '{}'", body.len(), request.url);
        self.transport.request_ok(&request).await?;
        Ok(())
    }

    /// ✅ Make index changes visible to new searchers.
    pub async fn commit(
        &self,
        wait_searcher: Option<bool>,
        expunge_deletes: Option<bool>,
        soft_commit: Option<bool>,
    ) -> SolrResult<()> {
        let options = UpdateOptions {
            commit: Some(true),
            wait_searcher,
            expunge_deletes,
            soft_commit,
            ..UpdateOptions::default()
        };
        self.update(r#"{"commit": {}}"#, &options).await
    }

    /// 🏗️ A hard commit that also merges segments, down to `max_segments` if given.
    pub async fn optimize(
        &self,
        wait_searcher: Option<bool>,
        max_segments: Option<i64>,
    ) -> SolrResult<()> {
        let options = UpdateOptions {
            optimize: Some(true),
            wait_searcher,
            max_segments,
            ..UpdateOptions::default()
        };
        self.update(r#"{"optimize": {}}"#, &options).await
    }

    /// 🔄 Throw away every add/delete since the last commit.
    pub async fn rollback(&self) -> SolrResult<()> {
        self.update(r#"{"rollback": {}}"#, &UpdateOptions::default())
            .await
    }
}
