//! Asynchronous embedding backfill queue
//!
//! Ensures every active document eventually carries an embedding without
//! overwhelming the provider's rate limit. Documents are enqueued FIFO and
//! drained in small concurrent batches with a fixed inter-batch delay.
//! The queue is an explicit object owned by the hosting application's
//! startup routine and passed by reference to callers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::generator::Embedder;
use crate::database::DocumentStore;
use crate::models::PendingDocument;

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

/// Snapshot of backfill progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// FIFO embedding backfill queue with a single drain loop per instance
#[derive(Clone)]
pub struct BackfillQueue {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
    batch_delay: Duration,
    queue: Arc<Mutex<VecDeque<PendingDocument>>>,
    draining: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl BackfillQueue {
    /// Create a new queue draining into the given store
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_pacing(embedder, store, 5, Duration::from_millis(200))
    }

    /// Create a queue with explicit batch size and inter-batch delay
    pub fn with_pacing(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
        batch_size: usize,
        batch_delay: Duration,
    ) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
            batch_delay,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            draining: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create a queue from application configuration
    pub fn from_config(
        config: &crate::config::AppConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self::with_pacing(
            embedder,
            store,
            config.backfill_batch_size(),
            Duration::from_millis(config.backfill_batch_delay_ms()),
        )
    }

    /// Append a document to the queue and start the drain loop if idle.
    ///
    /// Enqueues during an active drain simply grow the queue the running
    /// loop is already consuming; at most one drain loop runs per instance.
    pub async fn enqueue(&self, id: Uuid, content: String) {
        {
            let mut queue = self.queue.lock().await;
            queue.push_back(PendingDocument { id, content });
            debug!("Enqueued document {} (queue depth {})", id, queue.len());
        }
        self.spawn_drain_if_idle();
    }

    /// Read up to `limit` active documents lacking an embedding and enqueue
    /// them; returns the number enqueued. Used at startup and on demand.
    pub async fn scan_for_missing(&self, limit: usize) -> crate::Result<usize> {
        let pending = self.store.find_missing_embeddings(limit).await?;
        let count = pending.len();

        if count == 0 {
            info!("No documents missing embeddings");
            return Ok(0);
        }

        info!("Scan found {} documents missing embeddings", count);
        {
            let mut queue = self.queue.lock().await;
            for doc in pending {
                queue.push_back(doc);
            }
        }
        self.spawn_drain_if_idle();

        Ok(count)
    }

    /// Current progress counters
    pub fn stats(&self) -> BackfillStats {
        BackfillStats {
            processed: self.counters.processed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Whether a drain loop is currently running
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Wait until the queue is empty and the drain loop has stopped
    pub async fn wait_idle(&self) {
        loop {
            let empty = self.queue.lock().await.is_empty();
            if empty && !self.is_draining() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn spawn_drain_if_idle(&self) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let worker = self.clone();
            tokio::spawn(async move {
                worker.drain().await;
            });
        }
    }

    /// Drain loop: one batch at a time, strictly FIFO, until the queue is empty
    async fn drain(&self) {
        info!("Backfill drain loop started");

        loop {
            let batch: Vec<PendingDocument> = {
                let mut queue = self.queue.lock().await;
                let take = self.batch_size.min(queue.len());
                queue.drain(..take).collect()
            };

            if batch.is_empty() {
                self.draining.store(false, Ordering::Release);
                // An enqueue may have raced with the latch release; if it did
                // and nobody restarted the loop, pick the work back up
                let refilled = !self.queue.lock().await.is_empty();
                if refilled
                    && self
                        .draining
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                {
                    continue;
                }
                break;
            }

            self.process_batch(batch).await;

            // Pacing between batches to respect the provider rate limit
            tokio::time::sleep(self.batch_delay).await;
        }

        let stats = self.stats();
        info!(
            "Backfill drain loop idle: {} processed, {} skipped, {} failed",
            stats.processed, stats.skipped, stats.failed
        );
    }

    /// Process one batch concurrently; one document's failure never blocks
    /// the others in the batch
    async fn process_batch(&self, batch: Vec<PendingDocument>) {
        debug!("Processing backfill batch of {}", batch.len());

        let tasks = batch.into_iter().map(|doc| self.process_document(doc));
        futures::future::join_all(tasks).await;
    }

    async fn process_document(&self, doc: PendingDocument) {
        // A document that already has an embedding is never recomputed
        match self.store.has_embedding(doc.id).await {
            Ok(true) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to check embedding presence for {}: {}", doc.id, e);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        let embedding = match self.embedder.embed(&doc.content).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Failed to generate embedding for {}: {}", doc.id, e);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        // The write re-checks presence, so a concurrent trigger that won the
        // race turns this into a skip rather than a redundant overwrite
        match self.store.set_embedding(doc.id, embedding).await {
            Ok(true) => {
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!("Failed to persist embedding for {}: {}", doc.id, e);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
