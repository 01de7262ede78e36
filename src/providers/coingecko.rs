//! CoinGecko market data provider and its response shapes

use crate::{
    constants::{COINGECKO_API_URL, REQUEST_TIMEOUT_SECS, USER_AGENT, VS_CURRENCY},
    error::FetchError,
    provider::MarketDataProvider,
    types::{
        CoinDetail, CoinLinks, CoinSummary, GlobalMarket, PriceExtreme, PricePoint, SearchHit,
        TrendingCoin,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko market data provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Creates a provider against the public CoinGecko API
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(COINGECKO_API_URL)
    }

    /// Creates a provider against another CoinGecko-compatible base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_json(&self, endpoint: &str) -> Result<Value, FetchError> {
        let url = self.build_url(endpoint);
        tracing::debug!(url = %url, "Fetching from CoinGecko");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(FetchError::from_request)?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(FetchError::RateLimitExceeded);
        }

        // Check for other errors
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let response_text = response.text().await.map_err(FetchError::from_request)?;

        serde_json::from_str(&response_text).map_err(|e| {
            FetchError::invalid(format!(
                "Failed to parse CoinGecko response for {}: {}",
                endpoint, e
            ))
        })
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

/// Decodes a cached payload into one of the response shapes below
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(
    endpoint: &str,
    payload: Value,
) -> Result<T, FetchError> {
    serde_json::from_value(payload).map_err(|e| {
        FetchError::invalid(format!("Unexpected shape from {}: {}", endpoint, e))
    })
}

/// Per-currency values, e.g. `{"usd": 1.0, "eur": 0.9}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CurrencyMap(HashMap<String, Option<f64>>);

impl CurrencyMap {
    fn get(&self, currency: &str) -> Option<f64> {
        self.0.get(currency).copied().flatten()
    }
}

fn usd(map: &Option<CurrencyMap>) -> Option<f64> {
    map.as_ref().and_then(|m| m.get(VS_CURRENCY))
}

fn strings(values: Option<Vec<Option<String>>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Entry of `/coins/markets`
#[derive(Debug, Deserialize)]
pub(crate) struct MarketCoin {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap_rank: Option<u32>,
}

impl From<MarketCoin> for CoinSummary {
    fn from(coin: MarketCoin) -> Self {
        CoinSummary {
            id: coin.id,
            symbol: coin.symbol,
            name: coin.name,
            image: coin.image.unwrap_or_default(),
            current_price: coin.current_price.unwrap_or(0.0),
            market_cap: coin.market_cap.unwrap_or(0.0),
            total_volume: coin.total_volume.unwrap_or(0.0),
            price_change_percentage_24h: coin.price_change_percentage_24h,
            market_cap_rank: coin.market_cap_rank,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ImageSet {
    thumb: Option<String>,
    small: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Localized {
    en: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReposUrl {
    github: Option<Vec<Option<String>>>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksResponse {
    homepage: Option<Vec<Option<String>>>,
    blockchain_site: Option<Vec<Option<String>>>,
    subreddit_url: Option<String>,
    repos_url: Option<ReposUrl>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketDataResponse {
    current_price: Option<CurrencyMap>,
    market_cap: Option<CurrencyMap>,
    total_volume: Option<CurrencyMap>,
    high_24h: Option<CurrencyMap>,
    low_24h: Option<CurrencyMap>,
    ath: Option<CurrencyMap>,
    ath_change_percentage: Option<CurrencyMap>,
    ath_date: Option<HashMap<String, Option<DateTime<Utc>>>>,
    atl: Option<CurrencyMap>,
    atl_change_percentage: Option<CurrencyMap>,
    atl_date: Option<HashMap<String, Option<DateTime<Utc>>>>,
    price_change_percentage_24h: Option<f64>,
    market_cap_rank: Option<u32>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
}

fn extreme(
    price: &Option<CurrencyMap>,
    change: &Option<CurrencyMap>,
    date: &Option<HashMap<String, Option<DateTime<Utc>>>>,
) -> Option<PriceExtreme> {
    Some(PriceExtreme {
        price: usd(price)?,
        change_percentage: usd(change),
        date: date
            .as_ref()
            .and_then(|d| d.get(VS_CURRENCY).copied().flatten()),
    })
}

/// Body of `/coins/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct CoinResponse {
    id: String,
    symbol: String,
    name: String,
    image: Option<ImageSet>,
    description: Option<Localized>,
    links: Option<LinksResponse>,
    categories: Option<Vec<Option<String>>>,
    genesis_date: Option<String>,
    market_cap_rank: Option<u32>,
    market_data: Option<MarketDataResponse>,
}

impl CoinResponse {
    /// Reduces the detail record to a list row
    ///
    /// Missing prices and volumes become zero and a missing 24h change becomes
    /// `0.0`, so a coin fetched this way renders like one from the list.
    pub(crate) fn to_summary(&self) -> CoinSummary {
        let image = self.image.as_ref().and_then(|i| {
            i.small
                .clone()
                .or_else(|| i.thumb.clone())
                .or_else(|| i.large.clone())
        });
        let market = self.market_data.as_ref();

        CoinSummary {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            image: image.unwrap_or_default(),
            current_price: market.and_then(|m| usd(&m.current_price)).unwrap_or(0.0),
            market_cap: market.and_then(|m| usd(&m.market_cap)).unwrap_or(0.0),
            total_volume: market.and_then(|m| usd(&m.total_volume)).unwrap_or(0.0),
            price_change_percentage_24h: Some(
                market
                    .and_then(|m| m.price_change_percentage_24h)
                    .unwrap_or(0.0),
            ),
            market_cap_rank: self
                .market_cap_rank
                .or_else(|| market.and_then(|m| m.market_cap_rank)),
        }
    }

    pub(crate) fn into_detail(self) -> CoinDetail {
        let mut summary = self.to_summary();
        let market = self.market_data.unwrap_or_default();
        // Keep "unknown" distinguishable from a flat day on the detail page
        summary.price_change_percentage_24h = market.price_change_percentage_24h;

        let links = self.links.unwrap_or_default();

        CoinDetail {
            summary,
            description: self.description.and_then(|d| d.en).unwrap_or_default(),
            links: CoinLinks {
                homepage: strings(links.homepage),
                blockchain_site: strings(links.blockchain_site),
                subreddit_url: links.subreddit_url.filter(|s| !s.trim().is_empty()),
                repos: strings(links.repos_url.and_then(|r| r.github)),
            },
            categories: strings(self.categories),
            genesis_date: self.genesis_date,
            all_time_high: extreme(&market.ath, &market.ath_change_percentage, &market.ath_date),
            all_time_low: extreme(&market.atl, &market.atl_change_percentage, &market.atl_date),
            high_24h: usd(&market.high_24h),
            low_24h: usd(&market.low_24h),
            circulating_supply: market.circulating_supply,
            total_supply: market.total_supply,
            max_supply: market.max_supply,
        }
    }
}

/// Body of `/coins/{id}/market_chart`
#[derive(Debug, Deserialize)]
pub(crate) struct MarketChartResponse {
    prices: Option<Vec<(f64, Option<f64>)>>,
}

impl MarketChartResponse {
    pub(crate) fn into_points(self) -> Vec<PricePoint> {
        self.prices
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(ts, price)| {
                Some(PricePoint {
                    timestamp: DateTime::from_timestamp_millis(ts as i64)?,
                    price: price?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    name: String,
    symbol: String,
    market_cap_rank: Option<u32>,
    thumb: Option<String>,
}

/// Body of `/search`
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    coins: Option<Vec<SearchCoin>>,
}

impl SearchResponse {
    pub(crate) fn into_hits(self) -> Vec<SearchHit> {
        self.coins
            .unwrap_or_default()
            .into_iter()
            .map(|c| SearchHit {
                id: c.id,
                name: c.name,
                symbol: c.symbol,
                market_cap_rank: c.market_cap_rank,
                thumb: c.thumb.unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    id: String,
    name: String,
    symbol: String,
    market_cap_rank: Option<u32>,
    thumb: Option<String>,
    score: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TrendingEntry {
    item: TrendingItem,
}

/// Body of `/search/trending`
#[derive(Debug, Deserialize)]
pub(crate) struct TrendingResponse {
    coins: Option<Vec<TrendingEntry>>,
}

impl TrendingResponse {
    pub(crate) fn into_coins(self) -> Vec<TrendingCoin> {
        self.coins
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(position, entry)| TrendingCoin {
                id: entry.item.id,
                name: entry.item.name,
                symbol: entry.item.symbol,
                market_cap_rank: entry.item.market_cap_rank,
                thumb: entry.item.thumb.unwrap_or_default(),
                score: entry.item.score.unwrap_or(position as u32),
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GlobalData {
    active_cryptocurrencies: Option<u64>,
    markets: Option<u64>,
    total_market_cap: Option<CurrencyMap>,
    total_volume: Option<CurrencyMap>,
    market_cap_percentage: Option<CurrencyMap>,
    market_cap_change_percentage_24h_usd: Option<f64>,
}

/// Body of `/global`
#[derive(Debug, Deserialize)]
pub(crate) struct GlobalResponse {
    data: Option<GlobalData>,
}

impl GlobalResponse {
    pub(crate) fn into_market(self) -> GlobalMarket {
        let data = self.data.unwrap_or_default();
        let dominance = data.market_cap_percentage.unwrap_or_default();

        GlobalMarket {
            active_cryptocurrencies: data.active_cryptocurrencies.unwrap_or(0),
            markets: data.markets.unwrap_or(0),
            total_market_cap_usd: usd(&data.total_market_cap).unwrap_or(0.0),
            total_volume_usd: usd(&data.total_volume).unwrap_or(0.0),
            btc_dominance: dominance.get("btc").unwrap_or(0.0),
            eth_dominance: dominance.get("eth").unwrap_or(0.0),
            market_cap_change_percentage_24h: data
                .market_cap_change_percentage_24h_usd
                .unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_market_coin_defaults_missing_numbers() {
        let coin: MarketCoin = decode(
            "/coins/markets",
            json!({
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "image": null,
                "current_price": 50000.0,
                "market_cap": null,
                "price_change_percentage_24h": null,
                "market_cap_rank": 1
            }),
        )
        .unwrap();
        let summary = CoinSummary::from(coin);

        assert_eq!(summary.image, "");
        assert_eq!(summary.current_price, 50000.0);
        assert_eq!(summary.market_cap, 0.0);
        assert_eq!(summary.total_volume, 0.0);
        assert_eq!(summary.price_change_percentage_24h, None);
        assert_eq!(summary.market_cap_rank, Some(1));
    }

    #[test]
    fn test_coin_response_to_summary() {
        let coin: CoinResponse = decode(
            "/coins/vanar-chain",
            json!({
                "id": "vanar-chain",
                "symbol": "vanry",
                "name": "Vanar Chain",
                "image": {"thumb": "t.png", "small": "s.png"},
                "market_data": {
                    "current_price": {"usd": 0.12},
                    "total_volume": {"usd": 1000.0},
                    "market_cap_rank": 250
                }
            }),
        )
        .unwrap();
        let summary = coin.to_summary();

        assert_eq!(summary.image, "s.png");
        assert_eq!(summary.current_price, 0.12);
        assert_eq!(summary.market_cap, 0.0);
        assert_eq!(summary.total_volume, 1000.0);
        assert_eq!(summary.price_change_percentage_24h, Some(0.0));
        assert_eq!(summary.market_cap_rank, Some(250));
    }

    #[test]
    fn test_coin_response_into_detail() {
        let coin: CoinResponse = decode(
            "/coins/bitcoin",
            json!({
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "description": {"en": "Digital gold."},
                "links": {
                    "homepage": ["https://bitcoin.org", "", null],
                    "subreddit_url": "https://reddit.com/r/bitcoin",
                    "repos_url": {"github": ["https://github.com/bitcoin/bitcoin"]}
                },
                "categories": ["Layer 1 (L1)", null],
                "market_cap_rank": 1,
                "market_data": {
                    "current_price": {"usd": 60000.0},
                    "ath": {"usd": 73000.0},
                    "ath_change_percentage": {"usd": -17.8},
                    "ath_date": {"usd": "2024-03-14T07:10:36.635Z"},
                    "circulating_supply": 19700000.0,
                    "max_supply": 21000000.0
                }
            }),
        )
        .unwrap();
        let detail = coin.into_detail();

        assert_eq!(detail.id(), "bitcoin");
        assert_eq!(detail.description, "Digital gold.");
        assert_eq!(detail.links.homepage, vec!["https://bitcoin.org".to_string()]);
        assert_eq!(detail.links.repos.len(), 1);
        assert_eq!(detail.categories, vec!["Layer 1 (L1)".to_string()]);
        assert_eq!(detail.summary.price_change_percentage_24h, None);
        let ath = detail.all_time_high.unwrap();
        assert_eq!(ath.price, 73000.0);
        assert!(ath.date.is_some());
        assert!(detail.all_time_low.is_none());
        assert_eq!(detail.max_supply, Some(21000000.0));
    }

    #[test]
    fn test_market_chart_points() {
        let chart: MarketChartResponse = decode(
            "/coins/bitcoin/market_chart",
            json!({"prices": [[1700000000000.0, 100.0], [1700086400000.0, null], [1700172800000.0, 102.5]]}),
        )
        .unwrap();
        let points = chart.into_points();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, 100.0);
        assert_eq!(points[0].timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(points[1].price, 102.5);
    }

    #[test]
    fn test_search_and_trending_tolerate_missing_arrays() {
        let search: SearchResponse = decode("/search", json!({})).unwrap();
        assert!(search.into_hits().is_empty());

        let trending: TrendingResponse = decode(
            "/search/trending",
            json!({"coins": [{"item": {"id": "pepe", "name": "Pepe", "symbol": "PEPE", "market_cap_rank": 30, "thumb": "p.png"}}]}),
        )
        .unwrap();
        let coins = trending.into_coins();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].score, 0);
    }

    #[test]
    fn test_global_market() {
        let global: GlobalResponse = decode(
            "/global",
            json!({"data": {
                "active_cryptocurrencies": 14000,
                "markets": 1100,
                "total_market_cap": {"usd": 2.5e12},
                "total_volume": {"usd": 9.0e10},
                "market_cap_percentage": {"btc": 52.1, "eth": 16.9},
                "market_cap_change_percentage_24h_usd": -1.2
            }}),
        )
        .unwrap();
        let market = global.into_market();

        assert_eq!(market.active_cryptocurrencies, 14000);
        assert_eq!(market.total_market_cap_usd, 2.5e12);
        assert_eq!(market.btc_dominance, 52.1);
        assert_eq!(market.market_cap_change_percentage_24h, -1.2);
    }

    #[test]
    fn test_decode_reports_parse_failure() {
        let result: Result<Vec<MarketCoin>, _> = decode("/coins/markets", json!({"error": "x"}));
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn test_build_url() {
        let provider = CoinGeckoProvider::with_base_url("http://localhost:8080/api/v3/").unwrap();
        assert_eq!(
            provider.build_url("/coins/bitcoin"),
            "http://localhost:8080/api/v3/coins/bitcoin"
        );
    }
}
