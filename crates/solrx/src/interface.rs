//! 🎭 The Solr interface — the front desk every caller talks to.
//!
//! Construction fetches the schema (once, blocking the caller until it lands or
//! fails). After that, every operation composes one or more requests from the
//! parts below and sends them through the shared transport:
//!
//! ```text
//! SolrInterface
//!   ├── BulkIndexer ──▶ DocumentNormalizer ──▶ SchemaFieldRegistry
//!   │        └────────▶ UpdateRequestBuilder ─┐
//!   ├── UpdateRequestBuilder ─────────────────┼──▶ HttpTransport ──▶ TransportBackend
//!   └── SelectRequestDispatcher ──────────────┘
//! ```
//!
//! ⚠️ Query building and response parsing live elsewhere. Queries come in as
//! strings and `(name, value)` pairs; responses go out as raw JSON bodies.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::app_config::SolrConfig;
use crate::bulk::BulkIndexer;
use crate::common::{AccessMode, Documents, Endpoints};
use crate::error::SolrResult;
use crate::normalizer::DocumentNormalizer;
use crate::schema::SchemaFieldRegistry;
use crate::select::{SearchParams, SelectRequestDispatcher};
use crate::transport::{HttpTransport, ReqwestTransport, TransportBackend};
use crate::update::{UpdateOptions, UpdateRequestBuilder};

/// 🎭 One logical connection to one Solr core. Share it freely; every method takes `&self`.
#[derive(Debug, Clone)]
pub struct SolrInterface {
    endpoints: Arc<Endpoints>,
    mode: AccessMode,
    schema: Arc<SchemaFieldRegistry>,
    updates: UpdateRequestBuilder,
    selects: SelectRequestDispatcher,
    bulk: BulkIndexer,
    chunk_size: usize,
}

impl SolrInterface {
    /// 🚀 Connect over real HTTP and load the schema.
    pub async fn connect(config: &SolrConfig) -> SolrResult<Self> {
        let transport =
            ReqwestTransport::new(config.connect_timeout(), config.request_timeout())?;
        Self::with_transport(config, transport).await
    }

    /// 🧪 Same as [`SolrInterface::connect`], over any transport backend.
    pub async fn with_transport(
        config: &SolrConfig,
        backend: impl Into<TransportBackend>,
    ) -> SolrResult<Self> {
        let endpoints = Arc::new(Endpoints::new(&config.url)?);
        let transport = Arc::new(HttpTransport::new(backend, config.retry_policy()));
        let schema = Arc::new(SchemaFieldRegistry::fetch(&transport, &endpoints).await?);

        let updates = UpdateRequestBuilder::new(endpoints.clone(), config.mode, transport.clone());
        let selects = SelectRequestDispatcher::new(
            endpoints.clone(),
            config.mode,
            transport,
            config.max_length_get_url,
        );
        let bulk = BulkIndexer::new(updates.clone(), DocumentNormalizer::new(schema.clone()));

        info!(
            "🎭 Solr interface ready at '{}' ({} connection)",
            endpoints.base, config.mode
        );
        Ok(Self {
            endpoints,
            mode: config.mode,
            schema,
            updates,
            selects,
            bulk,
            chunk_size: config.chunk_size,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn schema(&self) -> &SchemaFieldRegistry {
        &self.schema
    }

    pub fn is_date_field(&self, name: &str) -> bool {
        self.schema.is_date_field(name)
    }

    /// 📦 Add one or many documents, in chunks of the configured size.
    pub async fn add(&self, documents: Documents, options: &UpdateOptions) -> SolrResult<usize> {
        self.bulk.add(documents, self.chunk_size, options).await
    }

    /// 📦 Add with an explicit chunk size.
    pub async fn add_chunked(
        &self,
        documents: Documents,
        chunk_size: usize,
        options: &UpdateOptions,
    ) -> SolrResult<usize> {
        self.bulk.add(documents, chunk_size, options).await
    }

    /// 🗑️ Delete everything matching a query string.
    pub async fn delete_by_query(&self, query: &str, options: &UpdateOptions) -> SolrResult<()> {
        let body = serde_json::to_string(&json!({"delete": {"query": query}}))?;
        self.updates.update(&body, options).await
    }

    /// 🗑️ Delete by unique key.
    pub async fn delete_by_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: &UpdateOptions,
    ) -> SolrResult<()> {
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        let body = serde_json::to_string(&json!({ "delete": ids }))?;
        self.updates.update(&body, options).await
    }

    /// 🗑️ Delete every document in the core. There is no undo. There is `rollback`, before a commit.
    pub async fn delete_all(&self) -> SolrResult<()> {
        self.delete_by_query("*:*", &UpdateOptions::default()).await
    }

    pub async fn commit(
        &self,
        wait_searcher: Option<bool>,
        expunge_deletes: Option<bool>,
        soft_commit: Option<bool>,
    ) -> SolrResult<()> {
        self.updates
            .commit(wait_searcher, expunge_deletes, soft_commit)
            .await
    }

    pub async fn optimize(
        &self,
        wait_searcher: Option<bool>,
        max_segments: Option<i64>,
    ) -> SolrResult<()> {
        self.updates.optimize(wait_searcher, max_segments).await
    }

    pub async fn rollback(&self) -> SolrResult<()> {
        self.updates.rollback().await
    }

    /// 🔍 Select. The raw JSON body comes back; parsing it is the caller's adventure.
    pub async fn search(&self, params: &SearchParams) -> SolrResult<String> {
        self.selects.select(params).await
    }

    /// 🔍 More-like-this, by inline content or by params alone (e.g. `stream.url`).
    pub async fn mlt_search(
        &self,
        params: &SearchParams,
        content: Option<&str>,
    ) -> SolrResult<String> {
        self.selects.more_like_this(params, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Document, FieldValue, HttpMethod};
    use crate::error::SolrError;
    use crate::transport::InMemoryTransport;

    const THE_SCHEMA: &str = r#"{"schema":{
        "fields":[{"name":"id","type":"string"},{"name":"published","type":"date"}],
        "dynamicFields":[{"name":"*_dt","type":"date"}]}}"#;

    async fn the_interface(
        mode: &str,
    ) -> anyhow::Result<(SolrInterface, InMemoryTransport)> {
        let the_backend = InMemoryTransport::new();
        the_backend.respond_with(200, THE_SCHEMA);
        let the_config = SolrConfig {
            mode: AccessMode::from_mode_str(mode),
            ..SolrConfig::new("http://localhost:8983/solr/core/")
        };
        let the_interface = SolrInterface::with_transport(&the_config, the_backend.clone()).await?;
        Ok((the_interface, the_backend))
    }

    #[tokio::test]
    async fn the_one_where_construction_learns_the_dates_once() -> anyhow::Result<()> {
        let (the_interface, the_backend) = the_interface("").await?;

        assert!(the_interface.is_date_field("published"));
        assert!(the_interface.is_date_field("updated_dt"));
        assert!(!the_interface.is_date_field("id"));
        assert_eq!(the_backend.request_count(), 1);
        assert_eq!(
            the_backend.requests()[0].url,
            "http://localhost:8983/solr/core/schema?wt=json"
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_broken_schema_means_no_interface_at_all() {
        let the_backend = InMemoryTransport::new();
        the_backend.respond_with(500, "core not loaded");

        let the_outcome =
            SolrInterface::with_transport(&SolrConfig::new("http://localhost:8983/solr/core"), the_backend)
                .await;

        assert!(matches!(the_outcome, Err(SolrError::Initialization { .. })));
    }

    #[tokio::test]
    async fn the_one_where_deletes_wear_their_json_envelopes() -> anyhow::Result<()> {
        let (the_interface, the_backend) = the_interface("w").await?;
        the_backend.always_respond(200, "{}");

        the_interface
            .delete_by_query("title:\"old news\"", &UpdateOptions::new().with_commit(true))
            .await?;
        the_interface
            .delete_by_ids(&["a", "b"], &UpdateOptions::new())
            .await?;
        the_interface.delete_all().await?;

        let the_requests = the_backend.requests();
        let the_bodies: Vec<serde_json::Value> = the_requests[1..]
            .iter()
            .map(|r| serde_json::from_str(r.body.as_deref().unwrap_or("null")))
            .collect::<Result<_, _>>()?;
        assert_eq!(the_bodies[0], json!({"delete": {"query": "title:\"old news\""}}));
        assert_eq!(
            the_requests[1].url,
            "http://localhost:8983/solr/core/update/json?commit=true"
        );
        assert_eq!(the_bodies[1], json!({"delete": ["a", "b"]}));
        assert_eq!(the_bodies[2], json!({"delete": {"query": "*:*"}}));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_add_uses_the_configured_chunk_size() -> anyhow::Result<()> {
        let the_backend = InMemoryTransport::new();
        the_backend.respond_with(200, THE_SCHEMA).always_respond(200, "{}");
        let the_config = SolrConfig {
            chunk_size: 2,
            ..SolrConfig::new("http://localhost:8983/solr/core")
        };
        let the_interface = SolrInterface::with_transport(&the_config, the_backend.clone()).await?;

        let the_docs: Vec<Document> = (0..5)
            .map(|n| {
                let mut doc = Document::new();
                doc.insert("id".into(), FieldValue::Int(n));
                doc
            })
            .collect();
        let the_chunks = the_interface
            .add(Documents::Many(the_docs), &UpdateOptions::new())
            .await?;

        assert_eq!(the_chunks, 3);
        assert_eq!(the_backend.request_count(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_read_only_interfaces_search_but_do_not_touch() -> anyhow::Result<()> {
        let (the_interface, the_backend) = the_interface("r").await?;
        the_backend.always_respond(200, r#"{"response":{"docs":[]}}"#);

        let the_body = the_interface
            .search(&[("q".to_string(), "*:*".to_string())])
            .await?;
        assert_eq!(the_body, r#"{"response":{"docs":[]}}"#);

        let the_mlt = the_interface
            .mlt_search(&[("mlt.fl".to_string(), "text".to_string())], Some("hello"))
            .await?;
        assert_eq!(the_mlt, r#"{"response":{"docs":[]}}"#);

        assert!(matches!(
            the_interface.commit(None, None, None).await,
            Err(SolrError::ModeViolation { .. })
        ));
        assert!(matches!(
            the_interface.delete_all().await,
            Err(SolrError::ModeViolation { .. })
        ));

        let the_requests = the_backend.requests();
        assert_eq!(the_requests.len(), 3);
        assert!(the_requests.iter().all(|r| r.method == HttpMethod::Get));
        Ok(())
    }
}
