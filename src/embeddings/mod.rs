//! Embeddings generation module
//!
//! This module provides functionality for generating text embeddings using various providers:
//! - OpenAI (text-embedding-ada-002, text-embedding-3-small, etc.)
//! - Ollama (local models)
//!
//! # Examples
//!
//! ```rust,no_run
//! use deskrag::embeddings::EmbeddingService;
//! use deskrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.generate("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod backfill;
pub mod client;
pub mod generator;

pub use backfill::BackfillQueue;
pub use backfill::BackfillStats;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::Embedder;
pub use generator::EmbeddingService;

/// Default embedding dimension for OpenAI text-embedding-ada-002
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Default cap on provider input length, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8000;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_input_chars: usize,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let provider = match config.embeddings.provider.as_str() {
            "ollama" => EmbeddingProvider::Ollama,
            _ => EmbeddingProvider::OpenAI,
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.clone(),
            api_key: config.embeddings.api_key.clone(),
            max_input_chars: config.embeddings.max_input_chars,
        }
    }
}

/// Truncate provider input on a char boundary (model context-window safety)
pub fn truncate_for_model(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_unchanged() {
        assert_eq!(truncate_for_model("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let truncated = truncate_for_model(text, 4);
        assert_eq!(truncated, "héll");
        assert_eq!(truncated.chars().count(), 4);
    }

    #[test]
    fn test_truncate_long_input() {
        let text = "a".repeat(10_000);
        assert_eq!(truncate_for_model(&text, 8000).len(), 8000);
    }
}
