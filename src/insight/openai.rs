//! OpenAI chat completions backend

use super::InsightBackend;
use crate::{
    config::BackendConfig,
    constants::{INSIGHT_MAX_TOKENS, INSIGHT_TEMPERATURE, OPENAI_MODEL, REQUEST_TIMEOUT_SECS},
    error::InsightError,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pulls `choices[0].message.content` out of a response body
fn extract_text(body: &str) -> Result<String, InsightError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| InsightError::InvalidResponse(format!("OpenAI response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| InsightError::InvalidResponse("OpenAI response has no choices".to_string()))
}

/// Backend for the OpenAI chat completions API
pub struct OpenAiBackend {
    client: Client,
    config: BackendConfig,
}

impl OpenAiBackend {
    pub fn new(config: BackendConfig) -> Result<Self, InsightError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS * 3))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl InsightBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, InsightError> {
        if !self.is_configured() {
            return Err(InsightError::NotConfigured(self.backend_name()));
        }

        let request = ChatRequest {
            model: self.config.model.as_deref().unwrap_or(OPENAI_MODEL),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: INSIGHT_MAX_TOKENS,
            temperature: INSIGHT_TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InsightError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        extract_text(&body)
    }

    fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 150,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 150);
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Bullish."}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Bullish.");
    }

    #[test]
    fn test_extract_text_without_choices() {
        assert!(matches!(
            extract_text(r#"{"error":{"message":"bad key"}}"#),
            Err(InsightError::InvalidResponse(_))
        ));
        assert!(extract_text("not json").is_err());
    }

    #[tokio::test]
    async fn test_placeholder_key_is_not_configured() {
        let backend = OpenAiBackend::new(BackendConfig::openai()).unwrap();
        assert!(!backend.is_configured());
        assert!(matches!(
            backend.complete("prompt").await,
            Err(InsightError::NotConfigured("openai"))
        ));
    }
}
