//! 🔥 solrx — an HTTP client layer for Solr's update/select/mlt/schema API.
//!
//! Builds protocol-correct requests, switches GET to POST when URLs grow too long,
//! retries a failed connection once, learns the schema's date fields at startup,
//! normalizes documents against them, and chunks bulk adds.

pub mod app_config;
pub mod bulk;
pub mod common;
pub mod dates;
pub mod error;
pub mod interface;
pub mod normalizer;
pub mod schema;
pub mod select;
pub mod transport;
pub mod update;

pub use app_config::{AppConfig, SolrConfig, load_config};
pub use bulk::{DEFAULT_CHUNK_SIZE, DocumentChunks, chunk_documents};
pub use common::{AccessMode, Document, Documents, Endpoints, FieldValue, SolrRequest, SolrResponse};
pub use error::{SolrError, SolrResult};
pub use interface::SolrInterface;
pub use schema::{DateFieldPattern, SchemaFieldRegistry};
pub use select::DEFAULT_MAX_LENGTH_GET_URL;
pub use transport::{HttpTransport, InMemoryTransport, ReqwestTransport, RetryPolicy, TransportBackend};
pub use update::UpdateOptions;
