use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub sources: SourcesConfig,
    pub object_store: ObjectStoreConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub processor: ProcessorConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &["DATABASE_URL", "QUEUE_URL", "S3_BUCKET", "LLM_PROVIDER"];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SENTIMENT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to
    /// `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SENTIMENT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            queue: QueueConfig::from_env_profiled(p),
            sources: SourcesConfig::from_env_profiled(p),
            object_store: ObjectStoreConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            database: DatabaseConfig::from_env_profiled(p),
            processor: ProcessorConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for
    /// `{PREFIX}_{MARKER_KEY}` patterns. Always includes "default".
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    host={}, port={}", self.server.host, self.server.port);
        tracing::info!("  queue:     mode={}, topic={}", self.queue.mode, self.queue.topic);
        tracing::info!(
            "  sources:   news={} forum={} feed={} microblog={}",
            self.sources.news_enabled,
            self.sources.forum_enabled,
            self.sources.feed_enabled,
            self.sources.microblog_enabled
        );
        tracing::info!(
            "  storage:   backend={}, bucket={}",
            self.object_store.backend,
            self.object_store.bucket.as_deref().unwrap_or("(none)")
        );
        tracing::info!("  llm:       provider={}", self.llm.provider);
        tracing::info!(
            "  processor: batch_size={}, skip_existing={}",
            self.processor.batch_size,
            self.processor.skip_existing
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "queue": { "mode": self.queue.mode, "topic": self.queue.topic },
            "sources": {
                "news": self.sources.news_enabled,
                "forum": self.sources.forum_enabled,
                "feed": self.sources.feed_enabled,
                "microblog": self.sources.microblog_enabled,
            },
            "object_store": {
                "backend": self.object_store.backend,
                "bucket": self.object_store.bucket,
                "configured": self.object_store.is_configured(),
            },
            "llm": { "provider": self.llm.provider, "configured": self.llm.is_configured() },
            "database": { "configured": self.database.is_configured() },
            "processor": {
                "batch_size": self.processor.batch_size,
                "skip_existing": self.processor.skip_existing,
            },
        })
    }
}

// ── Server (Collector / Processor HTTP surface) ───────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_or(p, "PORT", "8080").parse().unwrap_or(8080),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Queue ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub url: String,
    /// "list" or "stream".
    pub mode: String,
    pub topic: String,
    pub poll_timeout_secs: u32,
    pub stream_consumer_group: String,
}

impl QueueConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "QUEUE_URL", "redis://127.0.0.1:6379"),
            mode: profiled_env_or(p, "QUEUE_MODE", "list"),
            topic: profiled_env_or(p, "QUEUE_TOPIC", "raw_content"),
            poll_timeout_secs: profiled_env_u32(p, "QUEUE_POLL_TIMEOUT_SECS", 5),
            stream_consumer_group: profiled_env_or(p, "QUEUE_CONSUMER_GROUP", "processors"),
        }
    }
}

// ── Source adapters ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub news_enabled: bool,
    pub news_api_key: Option<String>,
    pub news_base_url: String,

    pub forum_enabled: bool,
    pub forum_client_id: Option<String>,
    pub forum_client_secret: Option<String>,
    pub forum_scopes: Vec<String>,
    pub forum_base_url: String,

    pub feed_enabled: bool,

    pub microblog_enabled: bool,
    pub microblog_bearer_token: Option<String>,
    pub microblog_base_url: String,
}

impl SourcesConfig {
    fn from_env_profiled(p: &str) -> Self {
        let forum_scopes = profiled_env_opt(p, "FORUM_SCOPES")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
        Self {
            news_enabled: profiled_env_bool(p, "NEWS_ENABLED", true),
            news_api_key: profiled_env_opt(p, "NEWSAPI_API_KEY"),
            news_base_url: profiled_env_or(p, "NEWSAPI_BASE_URL", "https://newsapi.org/v2"),

            forum_enabled: profiled_env_bool(p, "FORUM_ENABLED", true),
            forum_client_id: profiled_env_opt(p, "FORUM_CLIENT_ID"),
            forum_client_secret: profiled_env_opt(p, "FORUM_CLIENT_SECRET"),
            forum_scopes,
            forum_base_url: profiled_env_or(p, "FORUM_BASE_URL", "https://oauth.reddit.com"),

            feed_enabled: profiled_env_bool(p, "FEED_ENABLED", true),

            microblog_enabled: profiled_env_bool(p, "MICROBLOG_ENABLED", true),
            microblog_bearer_token: profiled_env_opt(p, "MICROBLOG_BEARER_TOKEN"),
            microblog_base_url: profiled_env_or(p, "MICROBLOG_BASE_URL", "https://api.twitter.com/2"),
        }
    }
}

// ── Object store ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// "s3" or "gcs".
    pub backend: String,
    pub bucket: Option<String>,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub gcs_service_account_path: Option<String>,
}

impl ObjectStoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "OBJECT_STORE_BACKEND", "s3"),
            bucket: profiled_env_opt(p, "S3_BUCKET").or_else(|| profiled_env_opt(p, "GCS_BUCKET")),
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            endpoint_url: profiled_env_opt(p, "S3_ENDPOINT_URL"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            gcs_service_account_path: profiled_env_opt(p, "GCS_SERVICE_ACCOUNT_PATH"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bucket.is_some()
    }
}

// ── LLM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "vertex"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub vertex_project_id: Option<String>,
    pub vertex_region: String,
    pub vertex_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "anthropic"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            vertex_project_id: profiled_env_opt(p, "VERTEX_PROJECT_ID"),
            vertex_region: profiled_env_or(p, "VERTEX_REGION", "europe-west1"),
            vertex_model: profiled_env_or(p, "VERTEX_MODEL", "claude-sonnet-4-5@20250929"),
            temperature: profiled_env_or(p, "LLM_TEMPERATURE", "0.1").parse().unwrap_or(0.1),
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 2048),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" => self.anthropic_api_key.is_some(),
            "vertex" => self.vertex_project_id.is_some(),
            _ => false,
        }
    }
}

// ── Database ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(
                p,
                "DATABASE_URL",
                "postgres://postgres@localhost:5432/sentiment",
            ),
            max_connections: profiled_env_u32(p, "DATABASE_MAX_CONNECTIONS", 10),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

// ── Processor ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub batch_size: u32,
    pub skip_existing: bool,
}

impl ProcessorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            batch_size: profiled_env_u32(p, "PROCESSOR_BATCH_SIZE", 10),
            skip_existing: profiled_env_bool(p, "PROCESSOR_SKIP_EXISTING", true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_has_sane_defaults() {
        let cfg = Config::for_profile("");
        assert_eq!(cfg.queue.mode, "list");
        assert_eq!(cfg.queue.topic, "raw_content");
        assert_eq!(cfg.processor.batch_size, 10);
        assert!(cfg.processor.skip_existing);
    }

    #[test]
    fn profiled_key_overrides_unprefixed() {
        std::env::set_var("QUEUE_TOPIC", "base_topic");
        std::env::set_var("TEST_QUEUE_TOPIC", "profiled_topic");
        let cfg = Config::for_profile("TEST");
        assert_eq!(cfg.queue.topic, "profiled_topic");
        std::env::remove_var("QUEUE_TOPIC");
        std::env::remove_var("TEST_QUEUE_TOPIC");
    }

    #[test]
    fn env_bool_accepts_one_and_true() {
        assert!(env_bool("SENTIMENT_CORE_TEST_BOOL_UNSET", true));
    }
}
