//! Short AI-written commentary on a coin
//!
//! Two interchangeable text-completion backends sit behind `InsightBackend`.
//! `InsightClient` never fails: without a credential it answers from a small
//! set of canned texts, and when a real call fails it answers with a fixed
//! sentence built from the coin's name and price.

pub mod gemini;
pub mod openai;

pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use crate::{
    config::DashboardConfig,
    error::InsightError,
    format::{format_large_number, format_price},
    types::CoinSummary,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Answers given when the selected backend has no credential
pub const DEMO_INSIGHTS: [&str; 5] = [
    "This cryptocurrency shows interesting market patterns. Consider the current trend and market conditions before making any investment decisions.",
    "The recent price movement indicates market volatility. Always do your own research and never invest more than you can afford to lose.",
    "Market sentiment appears mixed for this asset. Consider diversifying your portfolio and consulting with financial advisors.",
    "This crypto has shown resilience in recent market conditions. However, past performance doesn't guarantee future results.",
    "The trading volume suggests active interest from investors. Consider the long-term fundamentals before making decisions.",
];

/// Which backend answers insight requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightProvider {
    #[default]
    OpenAi,
    Gemini,
}

impl InsightProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightProvider::OpenAi => "openai",
            InsightProvider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for InsightProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightProvider {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(InsightProvider::OpenAi),
            "gemini" => Ok(InsightProvider::Gemini),
            _ => Err(InsightError::UnknownProvider(s.to_string())),
        }
    }
}

/// A text-completion service
#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Sends `prompt` and returns the generated text
    async fn complete(&self, prompt: &str) -> Result<String, InsightError>;

    /// False when the credential is missing or still the placeholder
    fn is_configured(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

/// Builds the prompt sent to every backend
pub fn build_prompt(coin: &CoinSummary) -> String {
    let change = coin
        .price_change_percentage_24h
        .map(|c| format!("{:.2}%", c))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "Analyze this cryptocurrency data and provide a brief investment insight (2-3 sentences):\n\n\
         Name: {} ({})\n\
         Price: ${}\n\
         24h Change: {}\n\
         Market Cap: ${}\n\
         Volume: ${}\n\n\
         Please provide a simple analysis suitable for beginners.",
        coin.name,
        coin.symbol,
        coin.current_price,
        change,
        format_large_number(coin.market_cap),
        format_large_number(coin.total_volume),
    )
}

/// One of the canned answers, picked at random
pub fn demo_insight() -> &'static str {
    let index = (Uuid::new_v4().as_u128() % DEMO_INSIGHTS.len() as u128) as usize;
    DEMO_INSIGHTS[index]
}

/// Answer used when a configured backend call fails
pub fn fallback_insight(coin: &CoinSummary) -> String {
    format!(
        "{} is currently trading at {}. Please note that cryptocurrency investments carry significant risks and you should always do your own research.",
        coin.name,
        format_price(coin.current_price)
    )
}

/// Generates insights with the selected backend
pub struct InsightClient {
    provider: RwLock<InsightProvider>,
    openai: Arc<dyn InsightBackend>,
    gemini: Arc<dyn InsightBackend>,
}

impl InsightClient {
    pub fn new(
        provider: InsightProvider,
        openai: Arc<dyn InsightBackend>,
        gemini: Arc<dyn InsightBackend>,
    ) -> Self {
        Self {
            provider: RwLock::new(provider),
            openai,
            gemini,
        }
    }

    /// Builds both HTTP backends from the configuration
    pub fn from_config(config: &DashboardConfig) -> Result<Self, InsightError> {
        Ok(Self::new(
            config.insight_provider,
            Arc::new(OpenAiBackend::new(config.openai.clone())?),
            Arc::new(GeminiBackend::new(config.gemini.clone())?),
        ))
    }

    pub async fn provider(&self) -> InsightProvider {
        *self.provider.read().await
    }

    /// Selects the backend by name ("openai" or "gemini")
    ///
    /// An unknown name leaves the current selection in place.
    pub async fn set_provider(&self, name: &str) -> Result<(), InsightError> {
        let provider = name.parse::<InsightProvider>()?;
        *self.provider.write().await = provider;
        tracing::info!(provider = %provider, "Insight provider selected");
        Ok(())
    }

    fn backend(&self, provider: InsightProvider) -> &Arc<dyn InsightBackend> {
        match provider {
            InsightProvider::OpenAi => &self.openai,
            InsightProvider::Gemini => &self.gemini,
        }
    }

    /// Returns insight text for `coin`; never empty
    pub async fn generate_insight(&self, coin: &CoinSummary) -> String {
        let provider = self.provider().await;
        let backend = self.backend(provider);

        if !backend.is_configured() {
            tracing::debug!(provider = %provider, "No credential, answering in demo mode");
            return demo_insight().to_string();
        }

        let prompt = build_prompt(coin);
        match backend.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(provider = %provider, coin = %coin.id, "Backend returned empty text");
                fallback_insight(coin)
            }
            Err(e) => {
                tracing::warn!(provider = %provider, coin = %coin.id, error = %e, "Insight request failed");
                fallback_insight(coin)
            }
        }
    }
}
