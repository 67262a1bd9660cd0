//! RAG (Retrieval-Augmented Generation) module
//!
//! This module turns a user query into an enhanced prompt for the downstream
//! assistant:
//! - Query embedding generation
//! - Vector similarity retrieval over the document store
//! - Budgeted context assembly from retrieved documents
//! - Graceful degradation to the original query on any failure
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use deskrag::config::AppConfig;
//! use deskrag::database::Database;
//! use deskrag::embeddings::EmbeddingService;
//! use deskrag::rag::QueryEnhancer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let database = Arc::new(Database::from_config(&config).await?);
//!     let embedder = Arc::new(EmbeddingService::new(&config)?);
//!     let enhancer = QueryEnhancer::from_config(&config, embedder, database);
//!
//!     let enhanced = enhancer.enhance("What is the refund policy?").await;
//!     println!("{}", enhanced.enhanced_prompt);
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod retriever;

pub use context::ContextAssembler;
pub use pipeline::QueryEnhancer;
pub use retriever::DocumentRetriever;
