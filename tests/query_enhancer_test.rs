//! Query enhancement pipeline tests against in-memory fakes

use std::sync::Arc;

use async_trait::async_trait;
use deskrag::database::DocumentStore;
use deskrag::embeddings::Embedder;
use deskrag::models::{DocumentMatch, PendingDocument};
use deskrag::rag::{ContextAssembler, DocumentRetriever, QueryEnhancer};
use deskrag::DeskRagError;
use deskrag::Result;
use uuid::Uuid;

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; 8])
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(DeskRagError::EmbeddingError(
            "provider returned HTTP 500".to_string(),
        ))
    }
}

struct FixedStore {
    matches: Vec<DocumentMatch>,
    fail_search: bool,
}

impl FixedStore {
    fn with_matches(matches: Vec<DocumentMatch>) -> Self {
        Self {
            matches,
            fail_search: false,
        }
    }

    fn failing() -> Self {
        Self {
            matches: Vec::new(),
            fail_search: true,
        }
    }
}

#[async_trait]
impl DocumentStore for FixedStore {
    async fn find_missing_embeddings(&self, _limit: usize) -> Result<Vec<PendingDocument>> {
        Ok(Vec::new())
    }

    async fn has_embedding(&self, _id: Uuid) -> Result<bool> {
        Ok(false)
    }

    async fn set_embedding(&self, _id: Uuid, _embedding: Vec<f32>) -> Result<bool> {
        Ok(true)
    }

    async fn match_documents(
        &self,
        _query_embedding: &[f32],
        threshold: f32,
        _limit: usize,
    ) -> Result<Vec<DocumentMatch>> {
        if self.fail_search {
            return Err(DeskRagError::Database(sqlx::Error::PoolClosed));
        }
        Ok(self
            .matches
            .iter()
            .filter(|m| m.similarity > threshold)
            .cloned()
            .collect())
    }
}

fn doc(name: &str, similarity: f32) -> DocumentMatch {
    DocumentMatch {
        id: Uuid::new_v4(),
        name: name.to_string(),
        document_type: "faq".to_string(),
        source: "upload".to_string(),
        content: format!("{name} content"),
        similarity,
        metadata: serde_json::json!({}),
    }
}

fn enhancer(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> QueryEnhancer {
    QueryEnhancer::new(
        embedder,
        DocumentRetriever::new(store, 0.5, 10),
        ContextAssembler::new(8000),
    )
}

#[tokio::test]
async fn test_matches_above_threshold_enhance_the_query() {
    let store = Arc::new(FixedStore::with_matches(vec![
        doc("refunds", 0.91),
        doc("returns", 0.85),
        doc("shipping", 0.52),
    ]));
    let enhancer = enhancer(Arc::new(FixedEmbedder), store);

    let enhanced = enhancer.enhance("What is the refund policy?").await;

    assert_eq!(enhanced.documents_found, 3);
    assert!(enhanced.has_context);
    assert!(enhanced.error.is_none());
    assert!(!enhanced.is_degraded());
    assert!(enhanced.enhanced_prompt.contains("refunds content"));
    assert!(enhanced
        .enhanced_prompt
        .ends_with("Question: What is the refund policy?"));
}

#[tokio::test]
async fn test_embed_failure_degrades_to_original_query() {
    let store = Arc::new(FixedStore::with_matches(vec![doc("refunds", 0.91)]));
    let enhancer = enhancer(Arc::new(FailingEmbedder), store);

    let enhanced = enhancer.enhance("What is the refund policy?").await;

    assert_eq!(enhanced.enhanced_prompt, "What is the refund policy?");
    assert_eq!(enhanced.documents_found, 0);
    assert!(!enhanced.has_context);
    assert!(enhanced.is_degraded());
    assert!(enhanced.error.as_deref().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn test_search_failure_degrades_to_original_query() {
    let enhancer = enhancer(Arc::new(FixedEmbedder), Arc::new(FixedStore::failing()));

    let enhanced = enhancer.enhance("anything").await;

    assert_eq!(enhanced.enhanced_prompt, "anything");
    assert!(enhanced.is_degraded());
}

#[tokio::test]
async fn test_zero_matches_is_success_not_degradation() {
    let enhancer = enhancer(
        Arc::new(FixedEmbedder),
        Arc::new(FixedStore::with_matches(vec![doc("irrelevant", 0.2)])),
    );

    let enhanced = enhancer.enhance("unrelated question").await;

    assert_eq!(enhanced.documents_found, 0);
    assert!(!enhanced.has_context);
    assert!(enhanced.error.is_none());
    // instructions and query are still emitted around an empty context block
    assert!(enhanced.enhanced_prompt.contains("Question: unrelated question"));
    assert_ne!(enhanced.enhanced_prompt, "unrelated question");
}

#[tokio::test]
async fn test_fail_open_search_returns_empty() {
    let retriever = DocumentRetriever::new(Arc::new(FixedStore::failing()), 0.5, 10);
    let matches = retriever.search_or_empty(&[0.1; 8]).await;
    assert!(matches.is_empty());
}
