//! Builds the active adapter set from configuration. An adapter is
//! included only when its `*_enabled` flag is set and its required
//! credentials are present; missing credentials are logged and the
//! adapter is skipped rather than the whole service failing to start.

use sentiment_core::config::SourcesConfig;
use sentiment_sources::{FeedAdapter, ForumAdapter, MicroblogAdapter, NewsApiAdapter, SourceAdapter};
use tracing::warn;

pub fn build_adapters(config: &SourcesConfig) -> Vec<Box<dyn SourceAdapter>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

    if config.news_enabled {
        match &config.news_api_key {
            Some(key) => adapters.push(Box::new(NewsApiAdapter::new(key.clone(), config.news_base_url.clone()))),
            None => warn!("news adapter enabled but NEWSAPI_API_KEY is not set, skipping"),
        }
    }

    if config.forum_enabled {
        match (&config.forum_client_id, &config.forum_client_secret) {
            (Some(id), Some(secret)) => adapters.push(Box::new(ForumAdapter::new(
                id.clone(),
                secret.clone(),
                config.forum_scopes.clone(),
                config.forum_base_url.clone(),
            ))),
            _ => warn!("forum adapter enabled but FORUM_CLIENT_ID/FORUM_CLIENT_SECRET are not set, skipping"),
        }
    }

    if config.feed_enabled {
        adapters.push(Box::new(FeedAdapter::new(sentiment_sources::default_feed_map())));
    }

    if config.microblog_enabled {
        match &config.microblog_bearer_token {
            Some(token) => adapters.push(Box::new(MicroblogAdapter::new(token.clone(), config.microblog_base_url.clone()))),
            None => warn!("microblog adapter enabled but MICROBLOG_BEARER_TOKEN is not set, skipping"),
        }
    }

    adapters
}
