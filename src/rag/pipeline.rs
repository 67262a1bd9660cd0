//! Query enhancement pipeline: Embed -> Search -> Assemble -> Return

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::database::DocumentStore;
use crate::embeddings::Embedder;
use crate::models::EnhancedQuery;
use crate::rag::ContextAssembler;
use crate::rag::DocumentRetriever;

/// Orchestrator that turns a raw user query into an enhanced prompt
pub struct QueryEnhancer {
    embedder: Arc<dyn Embedder>,
    retriever: DocumentRetriever,
    context_assembler: ContextAssembler,
}

impl QueryEnhancer {
    /// Create a new enhancer
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: DocumentRetriever,
        context_assembler: ContextAssembler,
    ) -> Self {
        Self {
            embedder,
            retriever,
            context_assembler,
        }
    }

    /// Create an enhancer wired from application configuration
    pub fn from_config(
        config: &crate::config::AppConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let retriever = DocumentRetriever::new(
            store,
            config.similarity_threshold(),
            config.match_limit(),
        );
        let context_assembler = ContextAssembler::new(config.context_budget());

        Self::new(embedder, retriever, context_assembler)
    }

    /// Enhance a query with matched document context.
    ///
    /// Never fails: any embedding or search error degrades to the original
    /// query with the error attached, so the primary chat flow is never
    /// blocked by the optional enhancement path.
    pub async fn enhance(&self, query: &str) -> EnhancedQuery {
        info!("Enhancing query: {}", query);

        // Step 1: Embed the query
        debug!("Step 1: Generating query embedding");
        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Query embedding failed, falling back to raw query: {}", e);
                return EnhancedQuery::degraded(query, e.to_string());
            }
        };

        // Step 2: Similarity search
        debug!("Step 2: Searching for similar documents");
        let matches = match self.retriever.search(&query_embedding).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Document search failed, falling back to raw query: {}", e);
                return EnhancedQuery::degraded(query, e.to_string());
            }
        };

        // Step 3: Assemble the prompt
        debug!("Step 3: Assembling context from {} matches", matches.len());
        let context = self.context_assembler.assemble(&matches);
        let has_context = !context.is_empty();
        let enhanced_prompt = build_enhanced_prompt(query, &context);

        info!(
            "Query enhanced with {} documents (context: {})",
            matches.len(),
            has_context
        );

        EnhancedQuery {
            enhanced_prompt,
            documents_found: matches.len(),
            has_context,
            error: None,
        }
    }

    /// Get the context assembler reference
    #[must_use]
    pub const fn context_assembler(&self) -> &ContextAssembler {
        &self.context_assembler
    }

    /// Get the retriever reference
    #[must_use]
    pub const fn retriever(&self) -> &DocumentRetriever {
        &self.retriever
    }
}

/// Wrap the context block with system instructions and append the query last
fn build_enhanced_prompt(query: &str, context: &str) -> String {
    format!(
        r"You are a knowledgeable support assistant for this workspace.

Context: The following documents from the knowledge base may be relevant to the question:
{context}

Instructions:
1. Answer using the documents above when they are relevant
2. If the documents do not cover the question, answer from general knowledge and say so
3. Cite the document name when you rely on it
4. Be concise but complete

Question: {query}"
    )
}
