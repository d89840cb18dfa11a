//! Forum adapter: OAuth client-credentials grant, then cursor pagination
//! across a configured list of scopes (subforums). The source has no
//! server-side date filter, so pagination stops the moment an item's
//! `published_at` falls before `start_date` — items are returned
//! newest-first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sentiment_core::{CollectedItem, Metadata, SearchRequest, SourceType};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;

use crate::adapter::{spawn_item_stream, ItemStream, SourceAdapter};
use crate::error::SourceError;

pub struct ForumAdapter {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    base_url: String,
    user_agent: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ForumAdapter {
    pub fn new(client_id: String, client_secret: String, scopes: Vec<String>, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            scopes,
            base_url,
            user_agent: "sentiment-ingest/0.1".to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Acquire (or return the cached) access token via client-credentials
    /// grant. Re-authentication on 401 is the caller's responsibility —
    /// token refresh here is unconditional re-fetch, not preemptive.
    async fn access_token(&self) -> Result<String, SourceError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String, SourceError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response = self
            .client
            .post(format!("{}/access_token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Auth(format!(
                "token request failed with status {}",
                response.status()
            )));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| SourceError::Parse(e.to_string()))?;
        *self.token.write().await = Some(parsed.access_token.clone());
        Ok(parsed.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    after: Option<String>,
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    author: Option<String>,
    url: String,
    created_utc: f64,
    #[serde(default)]
    ups: i64,
}

#[async_trait]
impl SourceAdapter for ForumAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::Forum
    }

    fn name(&self) -> &str {
        "Forum"
    }

    async fn search(&self, request: SearchRequest) -> Result<ItemStream, SourceError> {
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let user_agent = self.user_agent.clone();
        let scopes = self.scopes.clone();
        let token = self.access_token().await?;

        Ok(spawn_item_stream(move |tx| async move {
            for scope in scopes {
                let mut after: Option<String> = None;
                let mut scope_count = 0u32;

                'paging: loop {
                    let mut query = vec![
                        ("q", request.phrase.clone()),
                        ("sort", "new".to_string()),
                        ("restrict_sr", "true".to_string()),
                        ("limit", "100".to_string()),
                    ];
                    if let Some(ref a) = after {
                        query.push(("after", a.clone()));
                    }

                    let url = format!("{base_url}/r/{scope}/search");
                    let response = client
                        .get(&url)
                        .header("Authorization", format!("Bearer {token}"))
                        .header("User-Agent", &user_agent)
                        .query(&query)
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

                    if body.data.children.is_empty() {
                        break 'paging;
                    }

                    for child in body.data.children {
                        let post = child.data;
                        let published_at = Utc
                            .timestamp_opt(post.created_utc as i64, 0)
                            .single()
                            .unwrap_or_else(Utc::now);

                        if published_at < request.start_date {
                            break 'paging;
                        }
                        if published_at > request.end_date {
                            continue;
                        }

                        let mut metadata = Metadata::new();
                        metadata.insert("ups".to_string(), json!(post.ups));
                        metadata.insert("scope".to_string(), json!(scope));

                        let item = CollectedItem::new(
                            SourceType::Forum,
                            scope.clone(),
                            post.id,
                            post.url,
                            post.title,
                            post.selftext,
                            post.author,
                            published_at,
                            request.phrase.clone(),
                            metadata,
                        );
                        scope_count += 1;
                        if tx.send(Ok(item)).await.is_err() {
                            return;
                        }
                    }

                    after = body.data.after;
                    if after.is_none() {
                        break 'paging;
                    }
                }

                info!(scope = %scope, count = scope_count, "forum scope collection finished");
            }
        }))
    }

    async fn health_check(&self) -> bool {
        self.access_token().await.is_ok()
    }
}
