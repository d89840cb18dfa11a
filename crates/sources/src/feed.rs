//! Syndication-feed adapter: a configured `feed_name -> URL` mapping. Each
//! feed is fetched, parsed as RSS/Atom, filtered by a case-insensitive
//! substring match of the search phrase against title ∪ summary, then the
//! date window is enforced. A failing feed is logged and skipped; the
//! adapter continues with the remaining feeds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sentiment_core::{CollectedItem, Metadata, SearchRequest, SourceType};
use serde_json::json;
use tracing::warn;

use crate::adapter::{spawn_item_stream, ItemStream, SourceAdapter};
use crate::error::SourceError;

/// Real feed URLs bundled as sane defaults, used when no explicit mapping
/// is supplied via configuration.
pub fn default_feed_map() -> BTreeMap<String, String> {
    [
        ("BBC World", "http://feeds.bbci.co.uk/news/world/rss.xml"),
        ("Reuters World", "http://feeds.reuters.com/Reuters/worldNews"),
        ("NPR News", "https://feeds.npr.org/1004/rss.xml"),
        ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
        ("The Guardian World", "https://www.theguardian.com/world/rss"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub struct FeedAdapter {
    client: reqwest::Client,
    feeds: BTreeMap<String, String>,
}

impl FeedAdapter {
    pub fn new(feeds: BTreeMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            feeds,
        }
    }
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::Feed
    }

    fn name(&self) -> &str {
        "SyndicationFeed"
    }

    async fn search(&self, request: SearchRequest) -> Result<ItemStream, SourceError> {
        let client = self.client.clone();
        let feeds = self.feeds.clone();

        Ok(spawn_item_stream(move |tx| async move {
            let phrase_lower = request.phrase.to_lowercase();

            for (feed_name, url) in feeds {
                let body = match client.get(&url).send().await {
                    Ok(resp) => match resp.bytes().await {
                        Ok(b) => b,
                        Err(e) => {
                            warn!(feed = %feed_name, error = %e, "feed body read failed, skipping");
                            continue;
                        }
                    },
                    Err(e) => {
                        warn!(feed = %feed_name, error = %e, "feed unreachable, skipping");
                        continue;
                    }
                };

                let parsed = match feed_rs::parser::parse(&body[..]) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!(feed = %feed_name, error = %e, "feed parse failed, skipping");
                        continue;
                    }
                };

                for entry in parsed.entries {
                    let title = entry.title.map(|t| t.content).unwrap_or_default();
                    let summary = entry.summary.map(|s| s.content).unwrap_or_default();
                    let content = entry
                        .content
                        .as_ref()
                        .and_then(|c| c.body.clone())
                        .unwrap_or_else(|| summary.clone());

                    let haystack = format!("{title} {summary}").to_lowercase();
                    if !haystack.contains(&phrase_lower) {
                        continue;
                    }

                    let published_at = entry
                        .published
                        .or(entry.updated)
                        .map(|t| t.with_timezone(&Utc))
                        .unwrap_or_else(Utc::now);

                    if !request.in_window(published_at) {
                        continue;
                    }

                    let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
                    let external_id = if entry.id.is_empty() { link.clone() } else { entry.id.clone() };
                    let author = entry.authors.first().map(|a| a.name.clone());

                    let tags: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();
                    let mut metadata = Metadata::new();
                    metadata.insert("tags".to_string(), json!(tags));

                    let item = CollectedItem::new(
                        SourceType::Feed,
                        feed_name.clone(),
                        external_id,
                        link,
                        title,
                        content,
                        author,
                        published_at,
                        request.phrase.clone(),
                        metadata,
                    );
                    if tx.send(Ok(item)).await.is_err() {
                        return;
                    }
                }
            }
        }))
    }

    async fn health_check(&self) -> bool {
        if let Some(url) = self.feeds.values().next() {
            self.client.head(url).send().await.map(|r| r.status().is_success()).unwrap_or(false)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_feed_map_is_non_empty() {
        assert!(!default_feed_map().is_empty());
    }
}
