//! Queue client: producer and consumer over Redis, selectable between two
//! modes at construction time.
//!
//! List mode: `RPUSH` to append, blocking `BLPOP` to consume. On timeout
//! the consumer's sequence ends, signaling "queue currently drained".
//!
//! Stream mode: `XADD` to append, blocking `XREAD` from the last-seen ID
//! with a per-call batch limit. Reserves capacity for consumer groups but
//! this client uses a single logical consumer.

use std::sync::Arc;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use sentiment_core::CollectedItem;
use tokio::sync::Mutex;

use crate::error::QueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    List,
    Stream,
}

impl std::str::FromStr for QueueMode {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(QueueMode::List),
            "stream" => Ok(QueueMode::Stream),
            other => Err(QueueError::UnknownMode(other.to_string())),
        }
    }
}

/// Reports broker reachability for health checks.
#[derive(Debug, Clone)]
pub struct QueueHealth {
    pub connected: bool,
    pub mode: QueueMode,
}

/// Producer/consumer over a single Redis-backed topic, abstracting the
/// list/stream mode distinction behind `publish`/`consume`.
pub struct QueueClient {
    conn: MultiplexedConnection,
    mode: QueueMode,
    poll_timeout: Duration,
    /// Stream mode only: last-seen entry ID, advanced after each read.
    last_stream_id: Arc<Mutex<String>>,
}

impl QueueClient {
    pub async fn connect(url: &str, mode: QueueMode, poll_timeout: Duration) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            mode,
            poll_timeout,
            last_stream_id: Arc::new(Mutex::new("0".to_string())),
        })
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Serialize `item` to the wire format and append it to `topic`.
    pub async fn publish(&self, topic: &str, item: &CollectedItem) -> Result<(), QueueError> {
        let payload = serde_json::to_vec(item)?;
        let mut conn = self.conn.clone();
        match self.mode {
            QueueMode::List => {
                let _: () = conn
                    .rpush(topic, payload)
                    .await
                    .map_err(|e| QueueError::Publish(e.to_string()))?;
            }
            QueueMode::Stream => {
                let _: String = conn
                    .xadd(topic, "*", &[("payload", payload)])
                    .await
                    .map_err(|e| QueueError::Publish(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Pull up to `batch` items. Blocks up to `poll_timeout` waiting for
    /// the first item; returns early (possibly empty) once nothing more is
    /// immediately available. An empty result is the "queue currently
    /// drained" signal — callers loop or stop accordingly.
    pub async fn consume(&self, topic: &str, batch: usize) -> Result<Vec<CollectedItem>, QueueError> {
        match self.mode {
            QueueMode::List => self.consume_list(topic, batch).await,
            QueueMode::Stream => self.consume_stream(topic, batch).await,
        }
    }

    async fn consume_list(&self, topic: &str, batch: usize) -> Result<Vec<CollectedItem>, QueueError> {
        let mut conn = self.conn.clone();
        let mut items = Vec::with_capacity(batch);
        let timeout_secs = self.poll_timeout.as_secs_f64().max(1.0);

        for i in 0..batch {
            // Only the first pop blocks for the full timeout; once the
            // queue has started draining we want the batch to return
            // promptly rather than waiting out the timeout on every slot.
            let wait = if i == 0 { timeout_secs } else { 0.01 };
            let popped: Option<(String, Vec<u8>)> = conn
                .blpop(topic, wait)
                .await
                .map_err(QueueError::Redis)?;
            match popped {
                Some((_key, payload)) => {
                    items.push(CollectedItem::from_wire(&payload).map_err(QueueError::Parse)?);
                }
                None => break,
            }
        }
        Ok(items)
    }

    async fn consume_stream(&self, topic: &str, batch: usize) -> Result<Vec<CollectedItem>, QueueError> {
        let mut conn = self.conn.clone();
        let mut last_id = self.last_stream_id.lock().await;

        let opts = redis::streams::StreamReadOptions::default()
            .count(batch)
            .block(self.poll_timeout.as_millis() as usize);

        let reply: redis::streams::StreamReadReply = conn
            .xread_options(&[topic], &[last_id.as_str()], &opts)
            .await
            .map_err(QueueError::Redis)?;

        let mut items = Vec::new();
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                *last_id = entry.id.clone();
                if let Some(redis::Value::BulkString(payload)) = entry.map.get("payload") {
                    items.push(CollectedItem::from_wire(payload).map_err(QueueError::Parse)?);
                }
            }
        }
        Ok(items)
    }

    pub async fn health_check(&self) -> QueueHealth {
        let mut conn = self.conn.clone();
        let connected: bool = redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|pong| pong == "PONG")
            .unwrap_or(false);
        QueueHealth {
            connected,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_mode_parses_known_values() {
        assert_eq!("list".parse::<QueueMode>().unwrap(), QueueMode::List);
        assert_eq!("stream".parse::<QueueMode>().unwrap(), QueueMode::Stream);
    }

    #[test]
    fn queue_mode_rejects_unknown_value() {
        let result = "kafka".parse::<QueueMode>();
        assert!(result.is_err());
    }
}
