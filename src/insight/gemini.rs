//! Google Gemini generateContent backend

use super::InsightBackend;
use crate::{
    config::BackendConfig, constants::REQUEST_TIMEOUT_SECS, error::InsightError,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body
fn extract_text(body: &str) -> Result<String, InsightError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| InsightError::InvalidResponse(format!("Gemini response: {}", e)))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            InsightError::InvalidResponse("Gemini response has no candidates".to_string())
        })
}

/// Backend for the Gemini generateContent API
///
/// The key travels as the `key` query parameter.
pub struct GeminiBackend {
    client: Client,
    config: BackendConfig,
}

impl GeminiBackend {
    pub fn new(config: BackendConfig) -> Result<Self, InsightError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS * 3))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl InsightBackend for GeminiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, InsightError> {
        if !self.is_configured() {
            return Err(InsightError::NotConfigured(self.backend_name()));
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.config.url)
            .query(&[("key", self.config.api_key.as_str())])
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
        "gemini"
    }
}
