//! 🗺️ The schema registry — which fields hold dates, asked once, remembered forever.
//!
//! 🎬 *[the client knocks on `/schema?wt=json`. The server hands over a list of
//! every field it has ever known. The client reads it, circles the dates, and
//! never asks again.]*
//!
//! 🧠 Knowledge graph:
//! - Fetched once, when the interface is constructed. A non-200 is fatal.
//! - Only fields whose `type` is exactly `"date"` are kept. Static and dynamic both.
//! - Static names match themselves and anything ending in them: `published` also
//!   catches `unpublished`. Dynamic patterns lose their `*`: `*_dt` matches anything
//!   ending in `_dt`, `dt_*` anything starting with `dt_`.
//! - Immutable after construction. Shared behind an `Arc`, no locks needed.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info};

use crate::common::{Endpoints, SolrRequest};
use crate::error::{SolrError, SolrResult};
use crate::transport::HttpTransport;

const DATE_TYPE: &str = "date";

#[derive(Debug, Deserialize)]
struct SchemaEnvelope {
    schema: RemoteSchema,
}

#[derive(Debug, Deserialize)]
struct RemoteSchema {
    #[serde(default)]
    fields: Vec<SchemaField>,
    #[serde(default, rename = "dynamicFields")]
    dynamic_fields: Vec<SchemaField>,
}

#[derive(Debug, Deserialize)]
struct SchemaField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

/// 🎯 A date field pattern with its wildcard already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateFieldPattern {
    /// A static field name. Matches itself, and any name ending with it.
    Static(String),
    /// From `*_dt`: names ending in `_dt`.
    Suffix(String),
    /// From `dt_*`: names starting with `dt_`.
    Prefix(String),
}

impl DateFieldPattern {
    fn from_dynamic(pattern: &str) -> Self {
        if let Some(rest) = pattern.strip_prefix('*') {
            DateFieldPattern::Suffix(rest.replace('*', ""))
        } else if let Some(rest) = pattern.strip_suffix('*') {
            DateFieldPattern::Prefix(rest.replace('*', ""))
        } else {
            DateFieldPattern::Static(pattern.to_string())
        }
    }
}

/// 🗺️ The immutable snapshot of the remote schema's date fields.
#[derive(Debug, Clone, Default)]
pub struct SchemaFieldRegistry {
    statics: HashSet<String>,
    suffixes: Vec<String>,
    prefixes: Vec<String>,
    raw: serde_json::Value,
}

impl SchemaFieldRegistry {
    /// 📡 `GET {base}schema?wt=json`, once. Anything but a 200 is an initialization error.
    pub async fn fetch(transport: &HttpTransport, endpoints: &Endpoints) -> SolrResult<Self> {
        let request = SolrRequest::get(endpoints.schema.as_str());
        let response = transport.request(&request).await?;
        if !response.is_success() {
            return Err(SolrError::initialization(format!(
                "couldn't retrieve schema document from '{}' - status code {}\n{}",
                endpoints.schema, response.status, response.body
            )));
        }
        let raw: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            SolrError::initialization(format!("schema document is not valid JSON: {e}"))
        })?;
        let registry = Self::from_schema_json(raw)?;
        info!(
            "🗺️ Schema loaded from '{}' — {} date field pattern(s) on file",
            endpoints.schema,
            registry.len()
        );
        Ok(registry)
    }

    /// 🔍 Build from a schema response body: `{"schema": {"fields": [...], "dynamicFields": [...]}}`.
    pub fn from_schema_json(raw: serde_json::Value) -> SolrResult<Self> {
        let envelope: SchemaEnvelope = serde_json::from_value(raw.clone()).map_err(|e| {
            SolrError::initialization(format!("schema document has an unexpected shape: {e}"))
        })?;

        let static_dates = envelope
            .schema
            .fields
            .into_iter()
            .filter(|f| f.field_type == DATE_TYPE)
            .map(|f| DateFieldPattern::Static(f.name));
        let dynamic_dates = envelope
            .schema
            .dynamic_fields
            .into_iter()
            .filter(|f| f.field_type == DATE_TYPE)
            .map(|f| DateFieldPattern::from_dynamic(&f.name));

        let mut registry = Self::from_patterns(static_dates.chain(dynamic_dates));
        registry.raw = raw;
        Ok(registry)
    }

    /// 🧪 Build directly from patterns. Handy when the schema came from somewhere else.
    pub fn from_patterns(patterns: impl IntoIterator<Item = DateFieldPattern>) -> Self {
        let mut registry = Self::default();
        for pattern in patterns {
            debug!("📅 date field pattern: {:?}", pattern);
            match pattern {
                DateFieldPattern::Static(name) => {
                    registry.statics.insert(name);
                }
                DateFieldPattern::Suffix(s) => registry.suffixes.push(s),
                DateFieldPattern::Prefix(p) => registry.prefixes.push(p),
            }
        }
        registry
    }

    /// ✅ Does this field name hold dates, according to the schema?
    pub fn is_date_field(&self, name: &str) -> bool {
        self.statics.iter().any(|s| name.ends_with(s.as_str()))
            || self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
            || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.suffixes.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 📋 Every pattern, sorted, for display.
    pub fn patterns(&self) -> Vec<DateFieldPattern> {
        let mut all: Vec<DateFieldPattern> = self
            .statics
            .iter()
            .cloned()
            .map(DateFieldPattern::Static)
            .chain(self.suffixes.iter().cloned().map(DateFieldPattern::Suffix))
            .chain(self.prefixes.iter().cloned().map(DateFieldPattern::Prefix))
            .collect();
        all.sort();
        all
    }

    /// 📜 The schema document exactly as the server sent it.
    pub fn raw_schema(&self) -> &serde_json::Value {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InMemoryTransport, RetryPolicy};
    use serde_json::json;

    fn the_schema() -> serde_json::Value {
        json!({
            "schema": {
                "fields": [
                    {"name": "id", "type": "string"},
                    {"name": "published", "type": "date"},
                    {"name": "title", "type": "text_general"}
                ],
                "dynamicFields": [
                    {"name": "*_dt", "type": "date"},
                    {"name": "dt_*", "type": "date"},
                    {"name": "*_s", "type": "string"}
                ]
            }
        })
    }

    #[test]
    fn the_one_where_only_the_dates_make_the_guest_list() -> anyhow::Result<()> {
        let the_registry = SchemaFieldRegistry::from_schema_json(the_schema())?;

        assert!(the_registry.is_date_field("published"));
        assert!(the_registry.is_date_field("created_dt"));
        assert!(the_registry.is_date_field("dt_modified"));
        assert!(!the_registry.is_date_field("title"));
        assert!(!the_registry.is_date_field("name_s"));
        assert!(!the_registry.is_date_field("id"));
        assert_eq!(the_registry.len(), 3);
        Ok(())
    }

    #[test]
    fn the_one_where_static_names_also_catch_their_longer_cousins() -> anyhow::Result<()> {
        let the_registry = SchemaFieldRegistry::from_schema_json(json!({
            "schema": {
                "fields": [{"name": "published", "type": "date"}],
                "dynamicFields": [{"name": "dt_*", "type": "date"}]
            }
        }))?;

        assert!(the_registry.is_date_field("published"));
        assert!(the_registry.is_date_field("unpublished"));
        assert!(the_registry.is_date_field("last_published"));
        assert!(the_registry.is_date_field("dt_modified"));
        // 🎯 a prefix pattern only ever matches at the front
        assert!(!the_registry.is_date_field("x_dt_"));
        assert!(!the_registry.is_date_field("published_by"));
        Ok(())
    }

    #[test]
    fn the_one_where_patterns_line_up_in_a_stable_order() -> anyhow::Result<()> {
        let the_registry = SchemaFieldRegistry::from_schema_json(the_schema())?;
        assert_eq!(
            the_registry.patterns(),
            vec![
                DateFieldPattern::Static("published".to_string()),
                DateFieldPattern::Suffix("_dt".to_string()),
                DateFieldPattern::Prefix("dt_".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn the_one_where_a_schema_without_dynamic_fields_is_still_a_schema() -> anyhow::Result<()> {
        let the_registry = SchemaFieldRegistry::from_schema_json(json!({
            "schema": {"fields": [{"name": "when", "type": "date"}]}
        }))?;
        assert!(the_registry.is_date_field("when"));
        assert_eq!(the_registry.len(), 1);
        Ok(())
    }

    #[test]
    fn the_one_where_the_schema_is_shaped_like_a_potato() {
        let the_outcome = SchemaFieldRegistry::from_schema_json(json!({"fields": []}));
        assert!(matches!(the_outcome, Err(SolrError::Initialization { .. })));
    }

    #[tokio::test]
    async fn the_one_where_the_schema_fetch_gets_a_404_and_everything_stops() -> anyhow::Result<()> {
        let the_backend = InMemoryTransport::new();
        the_backend.respond_with(404, "no such core");
        let the_transport = HttpTransport::new(the_backend.clone(), RetryPolicy::disabled());
        let the_endpoints = Endpoints::new("http://localhost:8983/solr/core")?;

        let the_outcome = SchemaFieldRegistry::fetch(&the_transport, &the_endpoints).await;

        match the_outcome {
            Err(SolrError::Initialization { message }) => {
                assert!(message.contains("404"));
                assert!(message.contains("no such core"));
            }
            plot_twist => panic!("💀 expected an initialization error, got {plot_twist:?}"),
        }
        assert_eq!(
            the_backend.requests()[0].url,
            "http://localhost:8983/solr/core/schema?wt=json"
        );
        Ok(())
    }
}
