//! 📦 Common data structures — the building blocks of solrx
//!
//! ---
//!
//! 🎬 COLD OPEN — INT. SEARCH CLUSTER — 3:47 AM
//!
//! A `Document` arrives. It has a `title`. It has a `published` date, in three
//! different formats depending on which microservice wrote it. It has a `summary`
//! that is `null`, because someone upstream believes `null` and "absent" are the
//! same thing. Solr disagrees. Solr always disagrees.
//!
//! This module defines the humble structs that carry those documents, the
//! requests wrapped around them, and the responses Solr sends back.
//!
//! 🦆
//!
//! 🧠 Knowledge graph:
//! - [`Document`] / [`FieldValue`]: what callers index. Nullable, nested, dated.
//! - [`Documents`]: "one doc" vs "many docs", spelled out. No guessing from shape.
//! - [`AccessMode`]: read-only, write-only, or read-write. Checked before any I/O.
//! - [`Endpoints`]: base URL plus the derived update/select/mlt/schema URLs.
//! - [`SolrRequest`] / [`SolrResponse`]: the transport's vocabulary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::dates;
use crate::error::{SolrError, SolrResult};

/// 📦 A document: field name → value. Sorted by name, because determinism is a love language.
pub type Document = BTreeMap<String, FieldValue>;

/// 🎯 A single field value as it will travel to Solr.
///
/// `Null` only exists on the way in. The normalizer removes it before anything
/// hits the wire, because Solr wants optional fields omitted, not nulled.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// 📅 A native timestamp. Serialized in the canonical Solr date format.
    Date(DateTime<Utc>),
    /// 📋 Multi-valued fields.
    List(Vec<FieldValue>),
    /// 🔧 Nested objects, e.g. atomic updates like `{"set": "..."}`.
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Date(dt) => serializer.serialize_str(&dates::to_solr_date(dt)),
            FieldValue::List(values) => values.serialize(serializer),
            FieldValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            // -- 🔢 i64 first; anything wider or fractional rides along as f64
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(values) => {
                FieldValue::List(values.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// 📦 Convert a JSON object into a [`Document`]. Anything else is not a document.
pub fn document_from_json(value: serde_json::Value) -> SolrResult<Document> {
    match FieldValue::from(value) {
        FieldValue::Object(map) => Ok(map),
        other => Err(SolrError::validation(format!(
            "a document must be a JSON object, got {other:?}"
        ))),
    }
}

/// 🎭 One document or many. The caller says which; we do not sniff the shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Documents {
    One(Document),
    Many(Vec<Document>),
}

impl Documents {
    pub fn len(&self) -> usize {
        match self {
            Documents::One(_) => 1,
            Documents::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens into a collection. `One` becomes a collection of exactly one.
    pub fn into_vec(self) -> Vec<Document> {
        match self {
            Documents::One(doc) => vec![doc],
            Documents::Many(docs) => docs,
        }
    }

    /// 📦 From a JSON body: an object is one document, an array is many.
    pub fn from_json(value: serde_json::Value) -> SolrResult<Self> {
        match value {
            serde_json::Value::Array(items) => Ok(Documents::Many(
                items
                    .into_iter()
                    .map(document_from_json)
                    .collect::<SolrResult<Vec<_>>>()?,
            )),
            other => Ok(Documents::One(document_from_json(other)?)),
        }
    }
}

impl From<Document> for Documents {
    fn from(doc: Document) -> Self {
        Documents::One(doc)
    }
}

impl From<Vec<Document>> for Documents {
    fn from(docs: Vec<Document>) -> Self {
        Documents::Many(docs)
    }
}

/// 🔒 What a connection is allowed to do.
///
/// Parsed from the classic mode strings: `"r"` is read-only, `"w"` is
/// write-only, anything else (including `""`) is read-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    #[default]
    ReadWrite,
}

impl AccessMode {
    pub fn from_mode_str(mode: &str) -> Self {
        match mode {
            "r" => AccessMode::ReadOnly,
            "w" => AccessMode::WriteOnly,
            _ => AccessMode::ReadWrite,
        }
    }

    pub fn is_readable(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

impl From<String> for AccessMode {
    fn from(mode: String) -> Self {
        AccessMode::from_mode_str(&mode)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        };
        f.write_str(name)
    }
}

/// 📡 The connection target: one base URL, four endpoints derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base: String,
    pub update: String,
    pub select: String,
    pub mlt: String,
    pub schema: String,
}

impl Endpoints {
    /// 🔧 Normalizes the base to exactly one trailing slash, then appends suffixes.
    ///
    /// `http://host/solr`, `http://host/solr/` and `http://host/solr///` all land
    /// on `http://host/solr/`. One slash of difference. Infinite suffering of difference.
    pub fn new(url: &str) -> SolrResult<Self> {
        let base = format!("{}/", url.trim_end_matches('/'));
        url::Url::parse(&base)
            .map_err(|e| SolrError::validation(format!("invalid Solr URL '{url}': {e}")))?;
        Ok(Self {
            update: format!("{base}update/json"),
            select: format!("{base}select/"),
            mlt: format!("{base}mlt/"),
            schema: format!("{base}schema?wt=json"),
            base,
        })
    }
}

/// 📡 The two verbs this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 📦 A fully assembled request, ready for whichever transport backend is on duty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl SolrRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The `Content-Type` header, if one was set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

/// 📡 What came back: a status and the raw body. Parsing it is someone else's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrResponse {
    pub status: u16,
    pub body: String,
}

impl SolrResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// ✅ Solr's idea of success is exactly 200. Not 201. Not 204. 200.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_every_slash_situation_ends_in_exactly_one_slash() -> anyhow::Result<()> {
        for the_url in [
            "http://localhost:8983/solr/core",
            "http://localhost:8983/solr/core/",
            "http://localhost:8983/solr/core///",
        ] {
            let the_endpoints = Endpoints::new(the_url)?;
            assert_eq!(the_endpoints.base, "http://localhost:8983/solr/core/");
            assert_eq!(
                the_endpoints.update,
                "http://localhost:8983/solr/core/update/json"
            );
            assert_eq!(the_endpoints.select, "http://localhost:8983/solr/core/select/");
            assert_eq!(the_endpoints.mlt, "http://localhost:8983/solr/core/mlt/");
            assert_eq!(
                the_endpoints.schema,
                "http://localhost:8983/solr/core/schema?wt=json"
            );
        }
        Ok(())
    }

    #[test]
    fn the_one_where_a_url_without_a_scheme_is_turned_away() {
        let the_verdict = Endpoints::new("localhost solr");
        assert!(matches!(the_verdict, Err(SolrError::Validation(_))));
    }

    #[test]
    fn the_one_where_mode_strings_mean_what_they_always_meant() {
        assert_eq!(AccessMode::from_mode_str("r"), AccessMode::ReadOnly);
        assert_eq!(AccessMode::from_mode_str("w"), AccessMode::WriteOnly);
        assert_eq!(AccessMode::from_mode_str(""), AccessMode::ReadWrite);
        assert_eq!(AccessMode::from_mode_str("rw"), AccessMode::ReadWrite);

        assert!(AccessMode::ReadOnly.is_readable());
        assert!(!AccessMode::ReadOnly.is_writable());
        assert!(!AccessMode::WriteOnly.is_readable());
        assert!(AccessMode::WriteOnly.is_writable());
    }

    #[test]
    fn the_one_where_a_json_object_is_one_document_not_a_bag_of_fields() -> anyhow::Result<()> {
        let the_single = Documents::from_json(json!({"id": "1", "title": "hello"}))?;
        assert_eq!(the_single.len(), 1);
        assert!(matches!(the_single, Documents::One(_)));

        let the_many = Documents::from_json(json!([{"id": "1"}, {"id": "2"}]))?;
        assert_eq!(the_many.len(), 2);

        let the_impostor = Documents::from_json(json!([{"id": "1"}, 42]));
        assert!(matches!(the_impostor, Err(SolrError::Validation(_))));
        Ok(())
    }

    #[test]
    fn the_one_where_field_values_serialize_like_plain_json() -> anyhow::Result<()> {
        let mut the_doc = Document::new();
        the_doc.insert("id".into(), "doc-42".into());
        the_doc.insert("count".into(), FieldValue::Int(7));
        the_doc.insert("tags".into(), vec!["a", "b"].into());
        the_doc.insert("flag".into(), true.into());

        let the_json = serde_json::to_value(&the_doc)?;
        assert_eq!(
            the_json,
            json!({"id": "doc-42", "count": 7, "tags": ["a", "b"], "flag": true})
        );
        Ok(())
    }

    #[test]
    fn the_one_where_a_request_remembers_its_content_type() {
        let the_request = SolrRequest::post("http://h/solr/update/json")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body("{}");
        assert_eq!(
            the_request.content_type(),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(SolrRequest::get("http://h/").content_type(), None);
    }
}
