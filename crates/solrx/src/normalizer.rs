//! 🧹 The document normalizer — makes documents presentable before they meet Solr.
//!
//! Two rules, applied per field, in this order:
//! 1. `null` → the field is removed. Solr wants optional date fields omitted, not nulled.
//! 2. Date field (per the [`SchemaFieldRegistry`]) → value rewritten in the canonical
//!    Solr date format. Non-date-like values in a date field are a validation error.
//!
//! ⚠️ NaN and the infinities are refused wherever they hide. JSON has no spelling
//! for them, so serde_json writes `null`, and a null would sneak past rule 1.
//!
//! Everything else passes through untouched. The caller's documents are never
//! mutated; normalized copies come back instead.

use std::sync::Arc;

use crate::common::{Document, FieldValue};
use crate::dates;
use crate::error::{SolrError, SolrResult};
use crate::schema::SchemaFieldRegistry;

#[derive(Debug, Clone)]
pub struct DocumentNormalizer {
    schema: Arc<SchemaFieldRegistry>,
}

impl DocumentNormalizer {
    pub fn new(schema: Arc<SchemaFieldRegistry>) -> Self {
        Self { schema }
    }

    pub fn normalize(&self, documents: &[Document]) -> SolrResult<Vec<Document>> {
        documents
            .iter()
            .map(|doc| self.normalize_document(doc))
            .collect()
    }

    pub fn normalize_document(&self, document: &Document) -> SolrResult<Document> {
        let mut normalized = Document::new();
        for (name, value) in document {
            if value.is_null() {
                continue;
            }
            let value = if self.schema.is_date_field(name) {
                date_value(name, value)?
            } else {
                ensure_finite(name, value)?;
                value.clone()
            };
            normalized.insert(name.clone(), value);
        }
        Ok(normalized)
    }
}

fn ensure_finite(field: &str, value: &FieldValue) -> SolrResult<()> {
    match value {
        FieldValue::Float(f) if !f.is_finite() => Err(SolrError::validation(format!(
            "field '{field}' holds {f}, which JSON can only spell as null"
        ))),
        FieldValue::List(values) => values.iter().try_for_each(|v| ensure_finite(field, v)),
        FieldValue::Object(map) => map.values().try_for_each(|v| ensure_finite(field, v)),
        _ => Ok(()),
    }
}

fn date_value(field: &str, value: &FieldValue) -> SolrResult<FieldValue> {
    match value {
        FieldValue::Date(dt) => Ok(FieldValue::Text(dates::to_solr_date(dt))),
        FieldValue::Text(raw) => dates::canonicalize(raw)
            .map(FieldValue::Text)
            .map_err(|e| SolrError::validation(format!("date field '{field}': {e}"))),
        // -- 📋 multi-valued: every element gets the same treatment, nulls dropped
        FieldValue::List(values) => values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| date_value(field, v))
            .collect::<SolrResult<Vec<_>>>()
            .map(FieldValue::List),
        // -- 🔧 atomic updates ({"set": ...}, {"add": ...}); a null inside means "remove"
        FieldValue::Object(ops) => ops
            .iter()
            .map(|(op, v)| match v {
                FieldValue::Null => Ok((op.clone(), FieldValue::Null)),
                other => date_value(field, other).map(|v| (op.clone(), v)),
            })
            .collect::<SolrResult<_>>()
            .map(FieldValue::Object),
        other => Err(SolrError::validation(format!(
            "date field '{field}' holds {other:?}, which is not a date"
        ))),
    }
}
