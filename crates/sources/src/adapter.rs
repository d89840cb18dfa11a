use async_trait::async_trait;
use futures::stream::BoxStream;
use sentiment_core::{CollectedItem, SearchRequest, SourceType};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::SourceError;

/// One item at a time, bounded memory: adapters push into a bounded
/// channel from a background task rather than materializing the full
/// result set.
pub type ItemStream = BoxStream<'static, Result<CollectedItem, SourceError>>;

/// Capacity of the channel backing [`ItemStream`]; bounds how far a
/// producer can run ahead of a slow consumer.
const CHANNEL_CAPACITY: usize = 32;

/// Polymorphic contract every source implements: search plus a health
/// check. `search` must stream — the caller consumes and publishes items
/// one at a time, never buffering the entire result set.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Constant tag identifying this adapter's source type.
    fn source_type(&self) -> SourceType;

    /// Human-readable display name (e.g. feed title, subforum handle).
    fn name(&self) -> &str;

    /// Stream items matching `request`, respecting its date window.
    /// Adapters handle pagination internally and stop when the source
    /// signals exhaustion or the window is crossed.
    async fn search(&self, request: SearchRequest) -> Result<ItemStream, SourceError>;

    /// Cheap reachability probe; does not imply `search` will succeed.
    async fn health_check(&self) -> bool;
}

/// Wrap a paginating producer closure in a bounded channel, returning an
/// [`ItemStream`] immediately while the closure runs in a background task.
pub fn spawn_item_stream<F, Fut>(produce: F) -> ItemStream
where
    F: FnOnce(tokio::sync::mpsc::Sender<Result<CollectedItem, SourceError>>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(produce(tx));
    Box::pin(ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn spawn_item_stream_yields_items_in_order() {
        let stream = spawn_item_stream(|tx| async move {
            for i in 0..3 {
                let item = sentiment_core::CollectedItem::new(
                    SourceType::News,
                    "Test",
                    format!("id-{i}"),
                    "https://example.com",
                    "t",
                    "c",
                    None,
                    chrono::Utc::now(),
                    "phrase",
                    Default::default(),
                );
                if tx.send(Ok(item)).await.is_err() {
                    return;
                }
            }
        });

        let items: Vec<_> = stream.collect::<Vec<_>>().await;
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|r| r.is_ok()));
    }
}
