//! Runtime configuration
//!
//! Defaults come from `constants`; `from_env` applies overrides.

use crate::constants::{
    COINGECKO_API_URL, DEFAULT_LIST_LIMIT, FEATURED_COIN_ID, FEATURED_COIN_SYMBOL,
    GEMINI_API_URL, GEMINI_KEY_PLACEHOLDER, OPENAI_API_URL, OPENAI_KEY_PLACEHOLDER, OPENAI_MODEL,
};
use crate::insight::InsightProvider;

/// Coin pinned to the top of the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedCoin {
    pub id: String,
    pub symbol: Option<String>,
}

impl FeaturedCoin {
    pub fn new(id: impl Into<String>, symbol: Option<String>) -> Self {
        Self {
            id: id.into(),
            symbol,
        }
    }

    /// True when `id` contains the featured id or `symbol` equals the featured
    /// symbol, ignoring case
    ///
    /// A blank featured id or symbol never matches.
    pub fn matches(&self, id: &str, symbol: &str) -> bool {
        let featured_id = self.id.trim().to_lowercase();
        let id_match = !featured_id.is_empty() && id.to_lowercase().contains(&featured_id);
        let symbol_match = self
            .symbol
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty() && s.eq_ignore_ascii_case(symbol));
        id_match || symbol_match
    }
}

impl Default for FeaturedCoin {
    fn default() -> Self {
        Self::new(FEATURED_COIN_ID, Some(FEATURED_COIN_SYMBOL.to_string()))
    }
}

/// Endpoint and credential for one insight backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    /// Value that means "no key configured"
    pub placeholder: String,
    pub model: Option<String>,
}

impl BackendConfig {
    /// True when the key is real rather than empty or the placeholder
    pub fn has_credential(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != self.placeholder
    }

    pub fn openai() -> Self {
        Self {
            url: OPENAI_API_URL.to_string(),
            api_key: OPENAI_KEY_PLACEHOLDER.to_string(),
            placeholder: OPENAI_KEY_PLACEHOLDER.to_string(),
            model: Some(OPENAI_MODEL.to_string()),
        }
    }

    pub fn gemini() -> Self {
        Self {
            url: GEMINI_API_URL.to_string(),
            api_key: GEMINI_KEY_PLACEHOLDER.to_string(),
            placeholder: GEMINI_KEY_PLACEHOLDER.to_string(),
            model: None,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub list_limit: u32,
    pub featured: FeaturedCoin,
    pub insight_provider: InsightProvider,
    pub openai: BackendConfig,
    pub gemini: BackendConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: COINGECKO_API_URL.to_string(),
            list_limit: DEFAULT_LIST_LIMIT,
            featured: FeaturedCoin::default(),
            insight_provider: InsightProvider::default(),
            openai: BackendConfig::openai(),
            gemini: BackendConfig::gemini(),
        }
    }
}

impl DashboardConfig {
    /// Builds the configuration from the process environment
    ///
    /// Recognised variables: `COINGECKO_API_URL`, `COIN_LIST_LIMIT`,
    /// `FEATURED_COIN_ID`, `FEATURED_COIN_SYMBOL`, `INSIGHT_PROVIDER`
    /// ("openai" or "gemini"), `OPENAI_API_KEY`, `OPENAI_MODEL`,
    /// `GEMINI_API_KEY`. Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("COINGECKO_API_URL") {
            config.api_base_url = url;
        }

        if let Some(raw) = lookup("COIN_LIST_LIMIT") {
            match raw.parse::<u32>() {
                Ok(limit) if limit > 0 => config.list_limit = limit,
                _ => tracing::warn!(value = %raw, "Ignoring invalid COIN_LIST_LIMIT"),
            }
        }

        let featured_id = match lookup("FEATURED_COIN_ID") {
            Some(id) if id.trim().is_empty() => {
                tracing::warn!("Ignoring blank FEATURED_COIN_ID");
                None
            }
            other => other,
        };
        if let Some(id) = featured_id {
            // A new id without a new symbol must not keep matching the old ticker
            config.featured = FeaturedCoin::new(id.trim(), lookup("FEATURED_COIN_SYMBOL"));
        } else if let Some(symbol) = lookup("FEATURED_COIN_SYMBOL") {
            config.featured.symbol = Some(symbol);
        }

        if let Some(name) = lookup("INSIGHT_PROVIDER") {
            match name.parse::<InsightProvider>() {
                Ok(provider) => config.insight_provider = provider,
                Err(e) => tracing::warn!(error = %e, "Ignoring INSIGHT_PROVIDER"),
            }
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            config.openai.api_key = key;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            config.openai.model = Some(model);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            config.gemini.api_key = key;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.api_base_url, COINGECKO_API_URL);
        assert_eq!(config.list_limit, 100);
        assert_eq!(config.featured.id, "vanar-chain");
        assert_eq!(config.insight_provider, InsightProvider::OpenAi);
        assert!(!config.openai.has_credential());
        assert!(!config.gemini.has_credential());
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("COIN_LIST_LIMIT", "25"),
            ("FEATURED_COIN_ID", "solana"),
            ("INSIGHT_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "abc123"),
        ]));
        assert_eq!(config.list_limit, 25);
        assert_eq!(config.featured, FeaturedCoin::new("solana", None));
        assert_eq!(config.insight_provider, InsightProvider::Gemini);
        assert!(config.gemini.has_credential());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("COIN_LIST_LIMIT", "lots"),
            ("INSIGHT_PROVIDER", "claude"),
        ]));
        assert_eq!(config.list_limit, 100);
        assert_eq!(config.insight_provider, InsightProvider::OpenAi);
    }

    #[test]
    fn test_featured_match() {
        let featured = FeaturedCoin::default();
        assert!(featured.matches("vanar-chain", "vanry"));
        assert!(featured.matches("some-id", "VANRY"));
        assert!(!featured.matches("bitcoin", "btc"));

        let by_id = FeaturedCoin::new("Vanar-Chain", None);
        assert!(by_id.matches("vanar-chain", "x"));
    }

    #[test]
    fn test_blank_featured_id_is_ignored() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("FEATURED_COIN_ID", "  "),
            ("FEATURED_COIN_SYMBOL", "sol"),
        ]));
        assert_eq!(config.featured.id, "vanar-chain");
        assert_eq!(config.featured.symbol.as_deref(), Some("sol"));
    }

    #[test]
    fn test_blank_featured_never_matches() {
        let featured = FeaturedCoin::new("", Some(String::new()));
        assert!(!featured.matches("bitcoin", "btc"));
        assert!(!featured.matches("", ""));
    }

    #[test]
    fn test_credential_detection() {
        let mut backend = BackendConfig::openai();
        assert!(!backend.has_credential());
        backend.api_key = "   ".to_string();
        assert!(!backend.has_credential());
        backend.api_key = "sk-real".to_string();
        assert!(backend.has_credential());
    }
}
