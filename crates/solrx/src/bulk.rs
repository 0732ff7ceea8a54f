//! 📦 Bulk indexing — because one giant POST is how you meet a 413.
//!
//! 🎬 *[250 documents stand in line at the update endpoint. The bouncer lets
//! them in a hundred at a time. The last fifty grumble. They get in anyway.]*
//!
//! 🧠 Knowledge graph:
//! - [`DocumentChunks`]: a forward-only iterator of bounded, order-preserving batches.
//!   Each chunk is built on demand and handed off immediately. Nothing is retained.
//! - [`BulkIndexer::add`]: normalize each chunk, serialize it as a JSON array, POST it
//!   with the same [`UpdateOptions`] every time. The first failing chunk stops the rest.

use tracing::{debug, info};

use crate::common::{Document, Documents};
use crate::error::{SolrError, SolrResult};
use crate::normalizer::DocumentNormalizer;
use crate::update::{UpdateOptions, UpdateRequestBuilder};

/// 📦 Documents per update request unless told otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// 🔄 Successive chunks of at most `size` documents, in input order. The last may be short.
#[derive(Debug)]
pub struct DocumentChunks<I> {
    source: I,
    size: usize,
}

impl<I> Iterator for DocumentChunks<I>
where
    I: Iterator<Item = Document>,
{
    type Item = Vec<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<Document> = self.source.by_ref().take(self.size).collect();
        if chunk.is_empty() { None } else { Some(chunk) }
    }
}

/// 🔧 Chunk any document collection. A chunk size of zero would never make progress.
pub fn chunk_documents<I>(documents: I, size: usize) -> SolrResult<DocumentChunks<I::IntoIter>>
where
    I: IntoIterator<Item = Document>,
{
    if size == 0 {
        return Err(SolrError::validation("chunk size should be at least 1"));
    }
    Ok(DocumentChunks {
        source: documents.into_iter(),
        size,
    })
}

/// 🚚 Moves document collections to the update endpoint, one chunk at a time.
#[derive(Debug, Clone)]
pub struct BulkIndexer {
    updates: UpdateRequestBuilder,
    normalizer: DocumentNormalizer,
}

impl BulkIndexer {
    pub fn new(updates: UpdateRequestBuilder, normalizer: DocumentNormalizer) -> Self {
        Self {
            updates,
            normalizer,
        }
    }

    /// 🚀 Index `documents` in chunks of `chunk_size`. Returns how many chunks were sent.
    pub async fn add(
        &self,
        documents: Documents,
        chunk_size: usize,
        options: &UpdateOptions,
    ) -> SolrResult<usize> {
        self.updates.ensure_writable("add")?;
        let total = documents.len();
        let mut sent = 0;
        for chunk in chunk_documents(documents.into_vec(), chunk_size)? {
            let normalized = self.normalizer.normalize(&chunk)?;
            let body = serde_json::to_string(&normalized)?;
            self.updates.update(&body, options).await?;
            sent += 1;
            debug!("📦 chunk {} landed ({} docs)", sent, normalized.len());
        }
        info!("✅ {} document(s) indexed in {} chunk(s)", total, sent);
        Ok(sent)
    }
}
