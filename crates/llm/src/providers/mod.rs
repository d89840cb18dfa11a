pub mod anthropic;
pub mod openai;
pub mod vertex;

use sentiment_core::config::LlmConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the configured LLM provider. Provider selection is a single
/// configuration choice (`llm.provider`).
pub fn create_provider(llm_config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.openai_model.clone(),
                "https://api.openai.com".to_string(),
            )))
        }
        "anthropic" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Box::new(anthropic::AnthropicProvider::new(
                api_key.clone(),
                llm_config.anthropic_model.clone(),
            )))
        }
        "vertex" => {
            let project_id = llm_config
                .vertex_project_id
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("VERTEX_PROJECT_ID not set".into()))?;
            Ok(Box::new(vertex::VertexProvider::new(
                project_id.clone(),
                llm_config.vertex_region.clone(),
                llm_config.vertex_model.clone(),
                None,
            )))
        }
        other => Err(LlmError::NotConfigured(format!("unknown LLM provider: '{other}'"))),
    }
}
