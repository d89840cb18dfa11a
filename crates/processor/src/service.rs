//! The central invariant: parse → skip-check → archive-raw → analyze →
//! upsert-plus-children, in that exact order, for one item at a time.

use std::sync::Arc;
use std::time::Duration;

use sentiment_core::{CollectedItem, ProcessedItem};
use sentiment_db::RelationalStore;
use sentiment_llm::LlmClient;
use sentiment_queue::QueueClient;
use sentiment_storage::ObjectStoreClient;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::error::ProcessorError;

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub item_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchStats {
    pub processed: u64,
    pub skipped: u64,
    pub errors: Vec<ItemError>,
}

impl BatchStats {
    fn merge(&mut self, other: BatchStats) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

enum ItemOutcome {
    Processed,
    Skipped,
    Failed(String),
}

pub struct ProcessorService {
    queue: QueueClient,
    storage: ObjectStoreClient,
    llm: LlmClient,
    db: RelationalStore,
    topic: String,
    batch_size: usize,
    skip_existing: bool,
}

impl ProcessorService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: QueueClient,
        storage: ObjectStoreClient,
        llm: LlmClient,
        db: RelationalStore,
        topic: String,
        batch_size: usize,
        skip_existing: bool,
    ) -> Self {
        Self {
            queue,
            storage,
            llm,
            db,
            topic,
            batch_size,
            skip_existing,
        }
    }

    /// Steps 2–6 of the central invariant for a single item. Any failure
    /// after the skip-check is captured and returned rather than
    /// propagated — the caller moves on to the next message.
    async fn process_item(&self, item: CollectedItem) -> ItemOutcome {
        if self.skip_existing {
            match self.db.exists(&item.id).await {
                Ok(true) => return ItemOutcome::Skipped,
                Ok(false) => {}
                Err(e) => return ItemOutcome::Failed(e.to_string()),
            }
        }

        let storage_key = item.storage_key();
        let payload = match item.to_wire() {
            Ok(p) => p,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        let raw_storage_path = match self.storage.put(&storage_key, payload).await {
            Ok(path) => path,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        let analysis = match self
            .llm
            .analyze(&item.title, &item.content, &item.search_phrase)
            .await
        {
            Ok(a) => a,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        let processed = ProcessedItem::from_collected(item, analysis, raw_storage_path);

        match self.db.insert(&processed).await {
            Ok(()) => ItemOutcome::Processed,
            Err(e) => ItemOutcome::Failed(e.to_string()),
        }
    }

    /// Consume up to `batch_size` (or the configured default) messages and
    /// process each in turn. An empty pull (queue currently drained) is
    /// not an error — it yields zero-valued stats.
    pub async fn process_batch(&self, batch_size: Option<usize>) -> Result<BatchStats, ProcessorError> {
        let batch_size = batch_size.unwrap_or(self.batch_size);
        let items = self.queue.consume(&self.topic, batch_size).await?;
        let mut stats = BatchStats::default();

        for item in items {
            let item_id = item.id.clone();
            match self.process_item(item).await {
                ItemOutcome::Processed => stats.processed += 1,
                ItemOutcome::Skipped => stats.skipped += 1,
                ItemOutcome::Failed(message) => {
                    warn!(item_id = %item_id, error = %message, "item processing failed");
                    stats.errors.push(ItemError { item_id, message });
                }
            }
        }

        Ok(stats)
    }

    /// Drain the queue indefinitely, sleeping (via the queue's own
    /// blocking-pop timeout) when idle. Returns the accumulated tally once
    /// `shutdown` is notified.
    pub async fn run_continuous(&self, shutdown: Arc<Notify>) -> BatchStats {
        let mut totals = BatchStats::default();
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    info!(
                        processed = totals.processed,
                        skipped = totals.skipped,
                        errors = totals.errors.len(),
                        "continuous processing shut down"
                    );
                    return totals;
                }
                result = self.process_batch(None) => {
                    match result {
                        Ok(batch) => totals.merge(batch),
                        Err(e) => {
                            warn!(error = %e, "batch pull failed, backing off");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
    }

    pub async fn health_check(&self) -> ProcessorHealth {
        ProcessorHealth {
            queue_connected: self.queue.health_check().await.connected,
            database_connected: self.db.health_check().await,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessorHealth {
    pub queue_connected: bool,
    pub database_connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_stats_merge_accumulates_all_fields() {
        let mut totals = BatchStats::default();
        totals.merge(BatchStats {
            processed: 9,
            skipped: 1,
            errors: vec![ItemError {
                item_id: "abc".to_string(),
                message: "llm timeout".to_string(),
            }],
        });
        totals.merge(BatchStats {
            processed: 2,
            skipped: 0,
            errors: vec![],
        });

        assert_eq!(totals.processed, 11);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.errors.len(), 1);
        assert_eq!(totals.errors[0].item_id, "abc");
    }
}
