//! Microblog adapter: language-restricted, retweet-excluded search with
//! cursor pagination via `next_token`. Author metadata is denormalized
//! from a separate `includes.users` section and joined by `author_id`.
//! API errors are distinguished from empty results by a top-level
//! `errors` array with no `data`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentiment_core::{CollectedItem, Metadata, SearchRequest, SourceType};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::adapter::{spawn_item_stream, ItemStream, SourceAdapter};
use crate::error::SourceError;

pub struct MicroblogAdapter {
    client: reqwest::Client,
    bearer_token: String,
    base_url: String,
}

impl MicroblogAdapter {
    pub fn new(bearer_token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Option<Includes>,
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize, Default)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize, Clone)]
struct User {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
    #[serde(default)]
    entities: Option<TweetEntities>,
}

#[derive(Debug, Deserialize, Default)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
}

#[derive(Debug, Deserialize, Default)]
struct TweetEntities {
    #[serde(default)]
    hashtags: Vec<TagRef>,
    #[serde(default)]
    mentions: Vec<TagRef>,
}

#[derive(Debug, Deserialize)]
struct TagRef {
    tag: Option<String>,
    username: Option<String>,
}

#[async_trait]
impl SourceAdapter for MicroblogAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::Microblog
    }

    fn name(&self) -> &str {
        "Microblog"
    }

    async fn search(&self, request: SearchRequest) -> Result<ItemStream, SourceError> {
        let client = self.client.clone();
        let bearer_token = self.bearer_token.clone();
        let base_url = self.base_url.clone();

        Ok(spawn_item_stream(move |tx| async move {
            let query = format!("{} lang:en -is:retweet", request.phrase);
            let mut next_token: Option<String> = None;

            loop {
                let mut params = vec![
                    ("query", query.clone()),
                    ("max_results", "100".to_string()),
                    ("tweet.fields", "created_at,public_metrics,entities,author_id".to_string()),
                    ("expansions", "author_id".to_string()),
                    ("user.fields", "username".to_string()),
                ];
                if let Some(ref t) = next_token {
                    params.push(("next_token", t.clone()));
                }

                let response = client
                    .get(format!("{base_url}/tweets/search/recent"))
                    .bearer_auth(&bearer_token)
                    .query(&params)
                    .send()
                    .await;

                let response = match response {
                    Ok(r) => r,
                    Err(e) => {
                        let _ = tx.send(Err(SourceError::Request(e))).await;
                        return;
                    }
                };

                let parsed: Result<SearchResponse, _> = response.json().await;
                let body = match parsed {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx.send(Err(SourceError::Parse(e.to_string()))).await;
                        return;
                    }
                };

                if !body.errors.is_empty() && body.data.is_empty() {
                    let msg = body
                        .errors
                        .into_iter()
                        .map(|e| format!("{}: {}", e.title, e.detail))
                        .collect::<Vec<_>>()
                        .join("; ");
                    let _ = tx.send(Err(SourceError::SourceApi(msg))).await;
                    return;
                }

                if body.data.is_empty() {
                    break;
                }

                let users = body.includes.unwrap_or_default().users;

                for tweet in body.data {
                    if !request.in_window(tweet.created_at) {
                        continue;
                    }

                    let author = tweet
                        .author_id
                        .as_ref()
                        .and_then(|id| users.iter().find(|u| &u.id == id))
                        .map(|u: &User| u.username.clone());

                    let mut metadata = Metadata::new();
                    if let Some(metrics) = &tweet.public_metrics {
                        metadata.insert("like_count".to_string(), json!(metrics.like_count));
                        metadata.insert("retweet_count".to_string(), json!(metrics.retweet_count));
                        metadata.insert("reply_count".to_string(), json!(metrics.reply_count));
                    }
                    if let Some(entities) = &tweet.entities {
                        let hashtags: Vec<String> = entities.hashtags.iter().filter_map(|h| h.tag.clone()).collect();
                        let mentions: Vec<String> = entities.mentions.iter().filter_map(|m| m.username.clone()).collect();
                        metadata.insert("hashtags".to_string(), json!(hashtags));
                        metadata.insert("mentions".to_string(), json!(mentions));
                    }

                    let url = format!("https://twitter.com/i/web/status/{}", tweet.id);
                    let item = CollectedItem::new(
                        SourceType::Microblog,
                        "Microblog".to_string(),
                        tweet.id,
                        url,
                        String::new(),
                        tweet.text,
                        author,
                        tweet.created_at,
                        request.phrase.clone(),
                        metadata,
                    );
                    if tx.send(Ok(item)).await.is_err() {
                        return;
                    }
                }

                match body.meta.and_then(|m| m.next_token) {
                    Some(token) => next_token = Some(token),
                    None => break,
                }
            }
        }))
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/tweets/search/recent", self.base_url))
            .bearer_auth(&self.bearer_token)
            .query(&[("query", "ping"), ("max_results", "10")])
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, "microblog health check failed");
                false
            }
        }
    }
}
