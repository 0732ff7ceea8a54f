//! 🔍 The select dispatcher — reads, and the eternal GET vs POST question.
//!
//! GET is cacheable, debuggable, bookmarkable. GET also has a length limit that
//! varies by server and proxy (Jetty says 4096, Tomcat says 8192, the proxy in
//! front of both says whatever it wants). We stay conservative: past
//! `max_length_get_url` characters, we POST instead and log a warning, because a
//! POSTed query will not be cached at the HTTP layer.
//!
//! 🧠 Knowledge graph:
//! - `select`: `GET {base}select/?{params}&wt=json`, or POST the same params form-encoded.
//! - `more_like_this` with content: `&stream.body=` on the GET URL, or POST the raw content
//!   as `text/plain` with the search params still on the URL.
//! - `more_like_this` without content (think `stream.url`): same fallback as select.
//! - A URL exactly `max_length_get_url` long still goes out as a GET.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::{AccessMode, Endpoints, SolrRequest};
use crate::error::{SolrError, SolrResult};
use crate::transport::HttpTransport;

/// 📏 Below every common server/proxy limit we know of.
pub const DEFAULT_MAX_LENGTH_GET_URL: usize = 2048;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// 📋 Search parameters as ordered `(name, value)` pairs. Repeats are allowed (`fq`, `fl`, ...).
pub type SearchParams = [(String, String)];

fn encode_params(params: &SearchParams) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .append_pair("wt", "json")
        .finish()
}

fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn warn_long_url(url_len: usize, max: usize) {
    warn!(
        "⚠️ Long query URL encountered ({} > {} chars) - POSTing instead of GETting. \
         This query will not be cached at the HTTP layer.",
        url_len, max
    );
}

#[derive(Debug, Clone)]
pub struct SelectRequestDispatcher {
    endpoints: Arc<Endpoints>,
    mode: AccessMode,
    transport: Arc<HttpTransport>,
    max_length_get_url: usize,
}

impl SelectRequestDispatcher {
    pub fn new(
        endpoints: Arc<Endpoints>,
        mode: AccessMode,
        transport: Arc<HttpTransport>,
        max_length_get_url: usize,
    ) -> Self {
        Self {
            endpoints,
            mode,
            transport,
            max_length_get_url,
        }
    }

    fn ensure_readable(&self, operation: &'static str) -> SolrResult<()> {
        if self.mode.is_readable() {
            Ok(())
        } else {
            Err(SolrError::ModeViolation {
                operation,
                mode: self.mode,
            })
        }
    }

    /// 🛠️ Assemble the select request without sending it.
    pub fn build_select(&self, params: &SearchParams) -> SolrResult<SolrRequest> {
        self.ensure_readable("select")?;
        let query = encode_params(params);
        let get_url = format!("{}?{}", self.endpoints.select, query);
        if get_url.len() <= self.max_length_get_url {
            return Ok(SolrRequest::get(get_url));
        }
        warn_long_url(get_url.len(), self.max_length_get_url);
        Ok(SolrRequest::post(self.endpoints.select.as_str())
            .with_header("Content-Type", FORM_CONTENT_TYPE)
            .with_body(query))
    }

    /// 🛠️ Assemble the more-like-this request without sending it.
    pub fn build_more_like_this(
        &self,
        params: &SearchParams,
        content: Option<&str>,
    ) -> SolrResult<SolrRequest> {
        self.ensure_readable("mlt")?;
        let query = encode_params(params);
        let base_url = format!("{}?{}", self.endpoints.mlt, query);
        match content {
            None if base_url.len() <= self.max_length_get_url => Ok(SolrRequest::get(base_url)),
            None => {
                warn_long_url(base_url.len(), self.max_length_get_url);
                Ok(SolrRequest::post(self.endpoints.mlt.as_str())
                    .with_header("Content-Type", FORM_CONTENT_TYPE)
                    .with_body(query))
            }
            Some(content) => {
                let get_url = format!("{}&stream.body={}", base_url, encode_component(content));
                if get_url.len() <= self.max_length_get_url {
                    return Ok(SolrRequest::get(get_url));
                }
                warn_long_url(get_url.len(), self.max_length_get_url);
                // -- 📦 params stay on the URL; only the content moves into the body
                Ok(SolrRequest::post(base_url)
                    .with_header("Content-Type", TEXT_CONTENT_TYPE)
                    .with_body(content))
            }
        }
    }

    /// 🔍 Run a select. Returns the raw body on a 200.
    pub async fn select(&self, params: &SearchParams) -> SolrResult<String> {
        let request = self.build_select(params)?;
        debug!("🔍 select via {}", request.method);
        Ok(self.transport.request_ok(&request).await?.body)
    }

    /// 🔍 Run a more-like-this query, by example content or by params alone.
    pub async fn more_like_this(
        &self,
        params: &SearchParams,
        content: Option<&str>,
    ) -> SolrResult<String> {
        let request = self.build_more_like_this(params, content)?;
        debug!("🔍 mlt via {}", request.method);
        Ok(self.transport.request_ok(&request).await?.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::HttpMethod;
    use crate::transport::{InMemoryTransport, RetryPolicy};

    const THE_BASE: &str = "http://localhost:8983/solr/core";

    fn the_dispatcher(
        mode: AccessMode,
        max_length_get_url: usize,
    ) -> anyhow::Result<(SelectRequestDispatcher, InMemoryTransport)> {
        let the_backend = InMemoryTransport::new();
        let the_dispatcher = SelectRequestDispatcher::new(
            Arc::new(Endpoints::new(THE_BASE)?),
            mode,
            Arc::new(HttpTransport::new(the_backend.clone(), RetryPolicy::disabled())),
            max_length_get_url,
        );
        Ok((the_dispatcher, the_backend))
    }

    fn the_params() -> Vec<(String, String)> {
        vec![
            ("q".to_string(), "title:hello world".to_string()),
            ("fq".to_string(), "type:book".to_string()),
        ]
    }

    const THE_GET_URL: &str =
        "http://localhost:8983/solr/core/select/?q=title%3Ahello+world&fq=type%3Abook&wt=json";

    #[test]
    fn the_one_where_wt_json_always_tags_along() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadWrite, DEFAULT_MAX_LENGTH_GET_URL)?;
        let the_request = the_dispatcher.build_select(&the_params())?;
        assert_eq!(the_request.method, HttpMethod::Get);
        assert_eq!(the_request.url, THE_GET_URL);
        assert_eq!(the_request.body, None);
        Ok(())
    }

    #[test]
    fn the_one_where_exactly_at_the_limit_is_still_a_get() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadWrite, THE_GET_URL.len())?;
        let the_request = the_dispatcher.build_select(&the_params())?;
        assert_eq!(the_request.method, HttpMethod::Get);
        assert_eq!(the_request.url, THE_GET_URL);
        Ok(())
    }

    #[test]
    fn the_one_where_one_char_over_the_limit_becomes_a_post() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadWrite, THE_GET_URL.len() - 1)?;
        let the_request = the_dispatcher.build_select(&the_params())?;
        assert_eq!(the_request.method, HttpMethod::Post);
        assert_eq!(the_request.url, "http://localhost:8983/solr/core/select/");
        assert_eq!(the_request.content_type(), Some(FORM_CONTENT_TYPE));
        // 🎯 same semantic params, just moved into the body
        let the_query = THE_GET_URL.split_once('?').map(|(_, q)| q);
        assert_eq!(the_request.body.as_deref(), the_query);
        Ok(())
    }

    #[test]
    fn the_one_where_short_mlt_content_rides_on_the_url() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadOnly, DEFAULT_MAX_LENGTH_GET_URL)?;
        let the_params = vec![("mlt.fl".to_string(), "text".to_string())];
        let the_request = the_dispatcher.build_more_like_this(&the_params, Some("rust & solr"))?;
        assert_eq!(the_request.method, HttpMethod::Get);
        assert_eq!(
            the_request.url,
            "http://localhost:8983/solr/core/mlt/?mlt.fl=text&wt=json&stream.body=rust+%26+solr"
        );
        Ok(())
    }

    const THE_MLT_GET_URL: &str =
        "http://localhost:8983/solr/core/mlt/?mlt.fl=text&wt=json&stream.body=rust+%26+solr";

    #[test]
    fn the_one_where_mlt_exactly_at_the_limit_is_still_a_get() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadWrite, THE_MLT_GET_URL.len())?;
        let the_params = vec![("mlt.fl".to_string(), "text".to_string())];
        let the_request = the_dispatcher.build_more_like_this(&the_params, Some("rust & solr"))?;
        assert_eq!(the_request.method, HttpMethod::Get);
        assert_eq!(the_request.url, THE_MLT_GET_URL);
        assert_eq!(the_request.body, None);
        Ok(())
    }

    #[test]
    fn the_one_where_mlt_one_char_over_the_limit_posts_plain_text() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadWrite, THE_MLT_GET_URL.len() - 1)?;
        let the_params = vec![("mlt.fl".to_string(), "text".to_string())];
        let the_request = the_dispatcher.build_more_like_this(&the_params, Some("rust & solr"))?;
        assert_eq!(the_request.method, HttpMethod::Post);
        // 🎯 the params stay put; only the content moves out of the URL
        assert_eq!(
            the_request.url,
            "http://localhost:8983/solr/core/mlt/?mlt.fl=text&wt=json"
        );
        assert_eq!(the_request.content_type(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(the_request.body.as_deref(), Some("rust & solr"));
        Ok(())
    }

    #[test]
    fn the_one_where_long_mlt_content_moves_into_the_body() -> anyhow::Result<()> {
        let (the_dispatcher, _) = the_dispatcher(AccessMode::ReadWrite, 100)?;
        let the_params = vec![("mlt.fl".to_string(), "text".to_string())];
        let the_novel = "It was a dark and stormy night. ".repeat(10);
        let the_request = the_dispatcher.build_more_like_this(&the_params, Some(&the_novel))?;
        assert_eq!(the_request.method, HttpMethod::Post);
        assert_eq!(
            the_request.url,
            "http://localhost:8983/solr/core/mlt/?mlt.fl=text&wt=json"
        );
        assert_eq!(the_request.content_type(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(the_request.body.as_deref(), Some(the_novel.as_str()));
        Ok(())
    }

    #[test]
    fn the_one_where_mlt_without_content_mirrors_select() -> anyhow::Result<()> {
        let the_params = vec![(
            "stream.url".to_string(),
            "http://example.com/some/very/long/document/path".to_string(),
        )];
        let (the_roomy, _) = the_dispatcher(AccessMode::ReadWrite, DEFAULT_MAX_LENGTH_GET_URL)?;
        assert_eq!(
            the_roomy.build_more_like_this(&the_params, None)?.method,
            HttpMethod::Get
        );

        let (the_cramped, _) = the_dispatcher(AccessMode::ReadWrite, 40)?;
        let the_request = the_cramped.build_more_like_this(&the_params, None)?;
        assert_eq!(the_request.method, HttpMethod::Post);
        assert_eq!(the_request.url, "http://localhost:8983/solr/core/mlt/");
        assert_eq!(the_request.content_type(), Some(FORM_CONTENT_TYPE));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_write_only_connections_cannot_peek() -> anyhow::Result<()> {
        let (the_dispatcher, the_backend) = the_dispatcher(AccessMode::WriteOnly, DEFAULT_MAX_LENGTH_GET_URL)?;
        the_backend.always_respond(200, "{}");

        assert!(matches!(
            the_dispatcher.select(&the_params()).await,
            Err(SolrError::ModeViolation { .. })
        ));
        assert!(matches!(
            the_dispatcher.more_like_this(&the_params(), Some("x")).await,
            Err(SolrError::ModeViolation { .. })
        ));
        assert_eq!(the_backend.request_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_select_hands_back_the_raw_body() -> anyhow::Result<()> {
        let (the_dispatcher, the_backend) = the_dispatcher(AccessMode::ReadWrite, DEFAULT_MAX_LENGTH_GET_URL)?;
        the_backend
            .respond_with(200, r#"{"response":{"numFound":0,"docs":[]}}"#)
            .respond_with(400, "undefined field nope");

        let the_body = the_dispatcher.select(&the_params()).await?;
        assert_eq!(the_body, r#"{"response":{"numFound":0,"docs":[]}}"#);

        let the_outcome = the_dispatcher
            .select(&[("q".to_string(), "nope:1".to_string())])
            .await;
        assert!(matches!(
            the_outcome,
            Err(SolrError::Protocol { ref response, .. }) if response.status == 400
        ));
        Ok(())
    }
}
