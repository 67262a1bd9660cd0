//! Retrieval over the document store's vector search

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::database::DocumentStore;
use crate::models::DocumentMatch;
use crate::Result;

/// Retriever for similarity search over active documents
pub struct DocumentRetriever {
    store: Arc<dyn DocumentStore>,
    threshold: f32,
    limit: usize,
}

impl DocumentRetriever {
    /// Create a new retriever
    pub fn new(store: Arc<dyn DocumentStore>, threshold: f32, limit: usize) -> Self {
        Self {
            store,
            threshold,
            limit,
        }
    }

    /// Similarity search by query embedding, descending by similarity
    pub async fn search(&self, query_embedding: &[f32]) -> Result<Vec<DocumentMatch>> {
        debug!(
            "Searching documents: threshold={}, limit={}",
            self.threshold, self.limit
        );

        let matches = self
            .store
            .match_documents(query_embedding, self.threshold, self.limit)
            .await?;

        debug!("Retrieved {} matches", matches.len());
        Ok(matches)
    }

    /// Fail-open search: a backend error logs a warning and yields no
    /// matches, so retrieval failure degrades to "no context" instead of
    /// blocking the caller
    pub async fn search_or_empty(&self, query_embedding: &[f32]) -> Vec<DocumentMatch> {
        match self.search(query_embedding).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Document search failed, returning no matches: {}", e);
                Vec::new()
            }
        }
    }

    /// Get the configured similarity threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Get the configured match limit
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}
