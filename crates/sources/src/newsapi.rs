//! News-API adapter: windowed query with page index, server-side date
//! filtering, page size 100. Stops when `page * page_size >= total_results`
//! or an empty page is returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentiment_core::{CollectedItem, SearchRequest, SourceType};
use serde::Deserialize;
use tracing::{info, warn};

use crate::adapter::{spawn_item_stream, ItemStream, SourceAdapter};
use crate::error::SourceError;

const PAGE_SIZE: u32 = 100;

pub struct NewsApiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiAdapter {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    source: ArticleSource,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::News
    }

    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn search(&self, request: SearchRequest) -> Result<ItemStream, SourceError> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();

        Ok(spawn_item_stream(move |tx| async move {
            let mut page: u32 = 1;
            loop {
                let url = format!("{base_url}/everything");
                let response = client
                    .get(&url)
                    .query(&[
                        ("q", request.phrase.as_str()),
                        ("from", &request.start_date.to_rfc3339()),
                        ("to", &request.end_date.to_rfc3339()),
                        ("pageSize", &PAGE_SIZE.to_string()),
                        ("page", &page.to_string()),
                        ("apiKey", &api_key),
                    ])
                    .send()
                    .await;

                let response = match response {
                    Ok(r) => r,
                    Err(e) => {
                        let _ = tx.send(Err(SourceError::Request(e))).await;
                        return;
                    }
                };

                let parsed: Result<NewsApiResponse, _> = response.json().await;
                let body = match parsed {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx.send(Err(SourceError::Parse(e.to_string()))).await;
                        return;
                    }
                };

                if body.status != "ok" {
                    let msg = body.message.unwrap_or_else(|| body.code.unwrap_or_default());
                    let _ = tx.send(Err(SourceError::SourceApi(msg))).await;
                    return;
                }

                if body.articles.is_empty() {
                    break;
                }

                let fetched = body.articles.len() as u32;

                for article in body.articles {
                    if !request.in_window(article.published_at) {
                        continue;
                    }
                    let content = [article.description, article.content]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join("\n\n");
                    let item = CollectedItem::new(
                        SourceType::News,
                        article.source.name.unwrap_or_else(|| "NewsAPI".to_string()),
                        article.url.clone(),
                        article.url,
                        article.title.unwrap_or_default(),
                        content,
                        article.author,
                        article.published_at,
                        request.phrase.clone(),
                        Default::default(),
                    );
                    if tx.send(Ok(item)).await.is_err() {
                        return;
                    }
                }

                if page * PAGE_SIZE >= body.total_results {
                    break;
                }
                page += 1;
            }

            info!(pages = page, "news-api collection finished");
        }))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/top-headlines?country=us&pageSize=1&apiKey={}", self.base_url, self.api_key);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, "news-api health check failed");
                false
            }
        }
    }
}
