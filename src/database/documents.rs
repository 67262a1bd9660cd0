//! Document reads, embedding writes, and vector similarity search

use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use super::Database;
use crate::models::DocumentMatch;
use crate::models::PendingDocument;
use crate::Result;

/// Storage boundary for knowledge-base documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List up to `limit` active documents that have no embedding yet
    async fn find_missing_embeddings(&self, limit: usize) -> Result<Vec<PendingDocument>>;

    /// Whether the document already carries an embedding
    async fn has_embedding(&self, id: Uuid) -> Result<bool>;

    /// Attach an embedding; returns false when the document already had one
    /// (the write is conditional, so concurrent triggers stay idempotent)
    async fn set_embedding(&self, id: Uuid, embedding: Vec<f32>) -> Result<bool>;

    /// Vector similarity search over active, embedded documents,
    /// ordered by descending similarity
    async fn match_documents(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<DocumentMatch>>;
}

#[async_trait]
impl DocumentStore for Database {
    async fn find_missing_embeddings(&self, limit: usize) -> Result<Vec<PendingDocument>> {
        #[derive(sqlx::FromRow)]
        struct RawPending {
            id: Uuid,
            content: String,
        }

        let rows = sqlx::query_as::<_, RawPending>(
            r"
            SELECT id, content
            FROM documents
            WHERE status = 'active' AND embedding IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            ",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PendingDocument {
                id: r.id,
                content: r.content,
            })
            .collect())
    }

    async fn has_embedding(&self, id: Uuid) -> Result<bool> {
        let present: Option<bool> = sqlx::query_scalar(
            "SELECT embedding IS NOT NULL FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(present.unwrap_or(false))
    }

    async fn set_embedding(&self, id: Uuid, embedding: Vec<f32>) -> Result<bool> {
        // Only fills a missing embedding; a concurrent writer that got there
        // first leaves nothing for us to do
        let result = sqlx::query(
            r"
            UPDATE documents
            SET embedding = $2, updated_at = NOW()
            WHERE id = $1 AND embedding IS NULL
            ",
        )
        .bind(id)
        .bind(Vector::from(embedding))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn match_documents(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<DocumentMatch>> {
        #[derive(sqlx::FromRow)]
        struct RawMatch {
            id: Uuid,
            content: String,
            document_type: String,
            metadata: serde_json::Value,
            similarity: f64,
        }

        let raw_matches = sqlx::query_as::<_, RawMatch>(
            r"
            SELECT
                id,
                content,
                document_type,
                metadata,
                1 - (embedding <=> $1::vector) as similarity
            FROM documents
            WHERE status = 'active'
              AND embedding IS NOT NULL
              AND 1 - (embedding <=> $1::vector) > $2
            ORDER BY similarity DESC
            LIMIT $3
            ",
        )
        .bind(Vector::from(query_embedding.to_vec()))
        .bind(f64::from(threshold))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(raw_matches
            .into_iter()
            .map(|r| {
                let name = r.metadata["name"]
                    .as_str()
                    .unwrap_or("Untitled document")
                    .to_string();
                let source = r.metadata["source"]
                    .as_str()
                    .unwrap_or("knowledge base")
                    .to_string();
                DocumentMatch {
                    id: r.id,
                    name,
                    document_type: r.document_type,
                    source,
                    content: r.content,
                    similarity: r.similarity as f32,
                    metadata: r.metadata,
                }
            })
            .collect())
    }
}
