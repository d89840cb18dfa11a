use sentiment_core::config::LlmConfig;
use sentiment_core::Analysis;
use tracing::{debug, info};

use crate::normalizer::extract_json;
use crate::provider::{LlmError, LlmProvider, Message, Role};

/// `analyze(title, content, search_phrase) -> Analysis`, backed by a
/// provider-specific transport. The prompt instructs the model to return
/// the fixed JSON shape documented alongside [`Analysis`]; only the
/// structured output is validated here, not the prompt wording itself.
pub struct LlmClient {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(llm_config: &LlmConfig) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config)?;
        Ok(Self::new(provider, llm_config.temperature, llm_config.max_tokens))
    }

    pub async fn analyze(&self, title: &str, content: &str, search_phrase: &str) -> Result<Analysis, LlmError> {
        let messages = vec![
            Message {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: Role::User,
                content: build_user_prompt(title, content, search_phrase),
            },
        ];

        info!(title, "requesting analysis");

        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;

        debug!(response = %response, "raw LLM response");

        let json_str = extract_json(&response);
        let analysis: Analysis = serde_json::from_str(json_str)
            .map_err(|e| LlmError::ParseError(format!("{e}: {json_str}")))?;

        Ok(analysis)
    }
}

const SYSTEM_PROMPT: &str = r#"You are a sentiment and thematic analysis engine for news and social content. Given a title, body content, and a search phrase it was collected for, respond with ONLY a JSON object of this exact shape:

{"themes":[{"name":str,"confidence":float,"keywords":[str]}],
 "sentiment":"very_negative"|"negative"|"neutral"|"positive"|"very_positive",
 "sentiment_score":float,"summary":str,"key_points":[str],"entities":[str]}

themes: 1-5 entries, each a 2-4 word theme name. sentiment_score is in [-1, 1]. summary is 1-2 sentences. key_points and entities each have 2-5 entries. Respond with ONLY the JSON object, no explanation or markdown."#;

fn build_user_prompt(title: &str, content: &str, search_phrase: &str) -> String {
    format!(
        "Search phrase: {search_phrase}\n\nTitle: {title}\n\nContent:\n{content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedProvider {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(&self, _messages: Vec<Message>, _temperature: f32, _max_tokens: u32) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn analyze_parses_fenced_json_response() {
        let response = "```json\n{\"themes\":[{\"name\":\"policy\",\"confidence\":0.8,\"keywords\":[\"law\"]}],\"sentiment\":\"positive\",\"sentiment_score\":0.6,\"summary\":\"Good news.\",\"key_points\":[\"a\"],\"entities\":[\"Acme\"]}\n```".to_string();
        let client = LlmClient::new(Box::new(CannedProvider { response }), 0.1, 1024);
        let analysis = client.analyze("Title", "Body", "acme").await.unwrap();
        assert_eq!(analysis.themes.len(), 1);
        assert_eq!(analysis.sentiment_score, 0.6);
    }

    #[tokio::test]
    async fn analyze_rejects_unknown_sentiment() {
        let response = "{\"themes\":[],\"sentiment\":\"mixed\",\"sentiment_score\":0.0,\"summary\":\"x\",\"key_points\":[],\"entities\":[]}".to_string();
        let client = LlmClient::new(Box::new(CannedProvider { response }), 0.1, 1024);
        let result = client.analyze("Title", "Body", "acme").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn analyze_defaults_absent_optional_fields() {
        let response = "{\"sentiment\":\"neutral\",\"sentiment_score\":0.0,\"summary\":\"x\"}".to_string();
        let client = LlmClient::new(Box::new(CannedProvider { response }), 0.1, 1024);
        let analysis = client.analyze("Title", "Body", "acme").await.unwrap();
        assert!(analysis.themes.is_empty());
        assert!(analysis.key_points.is_empty());
        assert!(analysis.entities.is_empty());
    }
}
