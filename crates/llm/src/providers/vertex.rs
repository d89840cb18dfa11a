//! Cloud-mediated provider: Claude models served through Vertex AI.
//!
//! Authenticates via Application Default Credentials — when running on
//! GCP infrastructure this means the instance metadata server; a
//! pre-fetched token can also be supplied directly for local development.
//! Request/response shape mirrors the direct Anthropic provider, modulo
//! the Vertex-specific URL and auth header.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const METADATA_TOKEN_URL: &str = "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

pub struct VertexProvider {
    client: reqwest::Client,
    project_id: String,
    region: String,
    model: String,
    static_token: Option<String>,
}

impl VertexProvider {
    pub fn new(project_id: String, region: String, model: String, static_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            project_id,
            region,
            model,
            static_token,
        }
    }

    async fn access_token(&self) -> Result<String, LlmError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(LlmError::NotConfigured(
                "no Vertex access token available: supply one directly or run on GCP infrastructure with Application Default Credentials".into(),
            ));
        }

        let body: serde_json::Value = response.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("missing access_token in metadata response".into()))
    }
}

#[async_trait]
impl LlmProvider for VertexProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let token = self.access_token().await?;

        let url = format!(
            "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/anthropic/models/{model}:rawPredict",
            region = self.region,
            project = self.project_id,
            model = self.model,
        );

        let system_msg = messages
            .iter()
            .find(|m| matches!(m.role, Role::System))
            .map(|m| m.content.clone());

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| !matches!(m.role, Role::System))
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                        Role::System => unreachable!(),
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "anthropic_version": "vertex-2023-10-16",
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        if let Some(system) = system_msg {
            body["system"] = json!(system);
        }

        debug!("Vertex request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["content"][0]["text"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing content[0].text".into()))?
            .to_string();

        Ok(content)
    }
}
