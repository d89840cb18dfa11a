use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Origin of a [`CollectedItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    News,
    Forum,
    Feed,
    Microblog,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceType::News => "news",
            SourceType::Forum => "forum",
            SourceType::Feed => "feed",
            SourceType::Microblog => "microblog",
        };
        write!(f, "{s}")
    }
}

/// Derive the canonical primary key: first 16 hex chars of
/// `SHA-256("{source_type}:{external_id}")`. Deterministic and stable
/// across restarts — this is the dedup key through the whole pipeline.
pub fn derive_id(source_type: SourceType, external_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{source_type}:{external_id}").as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

/// Free-form, source-specific extras (engagement counts, tags, image URL).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// The wire format on the queue: a normalized record emitted by a source
/// adapter. `id` is pre-computed so consumers can dedup without
/// recomputing the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedItem {
    pub id: String,
    pub source_type: SourceType,
    pub source_name: String,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub search_phrase: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CollectedItem {
    /// Construct an item, deriving `id` from `source_type` and `external_id`.
    ///
    /// Falls back `external_id` to `url` when the source has no stable ID
    /// (News-API adapter) — callers decide that fallback before calling
    /// this constructor so `external_id` here is always the final value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_type: SourceType,
        source_name: impl Into<String>,
        external_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        author: Option<String>,
        published_at: DateTime<Utc>,
        search_phrase: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        let external_id = external_id.into();
        let id = derive_id(source_type, &external_id);
        Self {
            id,
            source_type,
            source_name: source_name.into(),
            external_id,
            url: url.into(),
            title: title.into(),
            content: content.into(),
            author,
            published_at,
            collected_at: Utc::now(),
            search_phrase: search_phrase.into(),
            metadata,
        }
    }

    /// The raw-blob storage key for this item: `raw/{source_type}/{id}.json`.
    pub fn storage_key(&self) -> String {
        format!("raw/{}/{}.json", self.source_type, self.id)
    }

    pub fn to_wire(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Categorical sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sentiment::VeryNegative => "very_negative",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
            Sentiment::VeryPositive => "very_positive",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very_negative" => Ok(Sentiment::VeryNegative),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            "very_positive" => Ok(Sentiment::VeryPositive),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

/// LLMs sometimes return `confidence`/`sentiment_score` as a quoted
/// numeric string rather than a JSON number. Accept either, coercing to
/// `f64` the way every provider's response handling does.
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// One entry in [`Analysis::themes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub confidence: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// The LLM's structured product for a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub themes: Vec<Theme>,
    pub sentiment: Sentiment,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub sentiment_score: f64,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

/// The result row: a `CollectedItem` joined with its `Analysis` and
/// archival reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedItem {
    pub id: String,
    pub source_type: SourceType,
    pub source_name: String,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub search_phrase: String,
    pub processed_at: DateTime<Utc>,
    pub analysis: Analysis,
    pub raw_storage_path: String,
}

impl ProcessedItem {
    pub fn from_collected(item: CollectedItem, analysis: Analysis, raw_storage_path: String) -> Self {
        Self {
            id: item.id,
            source_type: item.source_type,
            source_name: item.source_name,
            external_id: item.external_id,
            url: item.url,
            title: item.title,
            content: item.content,
            author: item.author,
            published_at: item.published_at,
            collected_at: item.collected_at,
            search_phrase: item.search_phrase,
            processed_at: Utc::now(),
            analysis,
            raw_storage_path,
        }
    }
}

/// Input to the collector: a phrase plus a `[start_date, end_date]` window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub phrase: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub job_id: String,
    /// When `None`, all configured adapters run. Otherwise intersected
    /// with the configured set.
    #[serde(default)]
    pub sources: Option<Vec<SourceType>>,
}

impl SearchRequest {
    /// True when `published_at` falls within the inclusive window.
    pub fn in_window(&self, published_at: DateTime<Utc>) -> bool {
        published_at >= self.start_date && published_at <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_is_deterministic() {
        let a = derive_id(SourceType::News, "abc-123");
        let b = derive_id(SourceType::News, "abc-123");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn analysis_accepts_numeric_sentiment_score() {
        let json = r#"{"sentiment":"positive","sentiment_score":0.42,"summary":"x"}"#;
        let analysis: Analysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.sentiment_score, 0.42);
    }

    #[test]
    fn analysis_coerces_quoted_sentiment_score() {
        let json = r#"{"sentiment":"negative","sentiment_score":"-0.7","summary":"x"}"#;
        let analysis: Analysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.sentiment_score, -0.7);
    }

    #[test]
    fn theme_coerces_quoted_confidence() {
        let json = r#"{"name":"policy","confidence":"0.85","keywords":[]}"#;
        let theme: Theme = serde_json::from_str(json).unwrap();
        assert_eq!(theme.confidence, 0.85);
    }

    #[test]
    fn derive_id_differs_by_source_type() {
        let a = derive_id(SourceType::News, "abc-123");
        let b = derive_id(SourceType::Forum, "abc-123");
        assert_ne!(a, b);
    }

    #[test]
    fn sentiment_round_trips_through_str() {
        for s in ["very_negative", "negative", "neutral", "positive", "very_positive"] {
            let parsed: Sentiment = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn sentiment_rejects_unknown_label() {
        let result: Result<Sentiment, _> = "mixed".parse();
        assert!(result.is_err());
    }

    #[test]
    fn collected_item_storage_key_format() {
        let item = CollectedItem::new(
            SourceType::Feed,
            "Example Feed",
            "entry-1",
            "https://example.com/a",
            "Title",
            "Body",
            None,
            Utc::now(),
            "climate",
            Metadata::new(),
        );
        assert_eq!(item.storage_key(), format!("raw/feed/{}.json", item.id));
    }

    #[test]
    fn collected_item_wire_round_trip_preserves_id() {
        let item = CollectedItem::new(
            SourceType::News,
            "Example News",
            "ext-42",
            "https://example.com/b",
            "Title",
            "Body",
            Some("Jane".to_string()),
            Utc::now(),
            "climate",
            Metadata::new(),
        );
        let wire = item.to_wire().unwrap();
        let restored = CollectedItem::from_wire(&wire).unwrap();
        assert_eq!(restored.id, derive_id(SourceType::News, "ext-42"));
        assert_eq!(restored.id, item.id);
    }

    #[test]
    fn search_request_in_window_is_inclusive() {
        let start = "2024-01-01T00:00:00Z".parse().unwrap();
        let end = "2024-01-08T00:00:00Z".parse().unwrap();
        let req = SearchRequest {
            phrase: "climate".into(),
            start_date: start,
            end_date: end,
            job_id: "job-1".into(),
            sources: None,
        };
        assert!(req.in_window(start));
        assert!(req.in_window(end));
        assert!(!req.in_window("2023-12-31T23:59:59Z".parse().unwrap()));
    }
}
