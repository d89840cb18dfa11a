//! Fans a `SearchRequest` out across the configured source adapters,
//! publishing every item to a single queue topic.
//!
//! Adapters run sequentially, not in parallel: the spec's concurrency
//! model scopes parallelism to the processor side, and a sequential walk
//! keeps per-source rate limits (news-api, forum OAuth) predictable.

use std::collections::BTreeMap;

use futures::StreamExt;
use sentiment_core::{SearchRequest, SourceType};
use sentiment_queue::QueueClient;
use sentiment_sources::SourceAdapter;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CollectorError;

#[derive(Debug, Clone, Serialize, Default)]
pub struct SourceError {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CollectStats {
    pub total: u64,
    pub by_source: BTreeMap<String, u64>,
    pub errors: Vec<SourceError>,
}

pub struct CollectorService {
    adapters: Vec<Box<dyn SourceAdapter>>,
    queue: QueueClient,
    topic: String,
}

impl CollectorService {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, queue: QueueClient, topic: String) -> Self {
        Self { adapters, queue, topic }
    }

    fn is_active(&self, source_type: SourceType, wanted: &Option<Vec<SourceType>>) -> bool {
        match wanted {
            Some(sources) => sources.contains(&source_type),
            None => true,
        }
    }

    /// Run every active adapter against `request`, publishing each item as
    /// it's produced. A single adapter's failure (to start, or mid-stream)
    /// is recorded in `errors` and the run continues with the next
    /// adapter. A queue publish failure is not recoverable and aborts the
    /// whole run — the caller has no way to know which items were lost.
    pub async fn collect(&self, request: SearchRequest) -> Result<CollectStats, CollectorError> {
        let active: Vec<&Box<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|a| self.is_active(a.source_type(), &request.sources))
            .collect();

        let mut stats = CollectStats::default();

        for adapter in active {
            let mut stream = match adapter.search(request.clone()).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(source = adapter.name(), error = %e, "adapter search failed to start");
                    stats.errors.push(SourceError {
                        source: adapter.name().to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let mut source_count = 0u64;
            while let Some(next) = stream.next().await {
                match next {
                    Ok(item) => {
                        self.queue.publish(&self.topic, &item).await?;
                        source_count += 1;
                        stats.total += 1;
                    }
                    Err(e) => {
                        warn!(source = adapter.name(), error = %e, "item collection failed");
                        stats.errors.push(SourceError {
                            source: adapter.name().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            if source_count > 0 {
                *stats.by_source.entry(adapter.name().to_string()).or_insert(0) += source_count;
            }
            info!(source = adapter.name(), count = source_count, "adapter collection finished");
        }

        Ok(stats)
    }

    pub async fn health_check(&self) -> bool {
        self.queue.health_check().await.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_defaults_are_empty() {
        let stats = CollectStats::default();
        assert_eq!(stats.total, 0);
        assert!(stats.by_source.is_empty());
        assert!(stats.errors.is_empty());
    }
}
