//! Market data client
//!
//! Reads coin lists, coin details, price history, search results, trending
//! coins and global figures through the response cache, and turns the raw
//! payloads into domain types. Default substitution for missing fields
//! happens here and nowhere downstream.

use crate::{
    cache::FetchCache,
    config::FeaturedCoin,
    constants::VS_CURRENCY,
    error::FetchError,
    metrics::{FetchMetrics, MetricsCollector},
    provider::MarketDataProvider,
    providers::coingecko::{
        decode, CoinResponse, GlobalResponse, MarketChartResponse, MarketCoin, SearchResponse,
        TrendingResponse,
    },
    types::{CoinDetail, CoinSummary, GlobalMarket, HistoricalSeries, SearchHit, TrendingCoin},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub(crate) fn markets_endpoint(limit: u32) -> String {
    format!(
        "/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1&sparkline=false&price_change_percentage=24h",
        VS_CURRENCY, limit
    )
}

pub(crate) fn coin_endpoint(id: &str) -> String {
    format!("/coins/{}", id)
}

pub(crate) fn market_chart_endpoint(id: &str, days: u32) -> String {
    format!(
        "/coins/{}/market_chart?vs_currency={}&days={}&interval=daily",
        id, VS_CURRENCY, days
    )
}

pub(crate) fn search_endpoint(query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("/search?query={}", encoded)
}

pub(crate) const TRENDING_ENDPOINT: &str = "/search/trending";
pub(crate) const GLOBAL_ENDPOINT: &str = "/global";

/// Moves the first coin matching `featured` to the front
///
/// Returns `false` when no coin matches. Everything else keeps its relative
/// order.
pub fn promote_featured(coins: &mut Vec<CoinSummary>, featured: &FeaturedCoin) -> bool {
    match coins
        .iter()
        .position(|c| featured.matches(&c.id, &c.symbol))
    {
        Some(0) => true,
        Some(index) => {
            let coin = coins.remove(index);
            coins.insert(0, coin);
            true
        }
        None => false,
    }
}

/// Client for the market data endpoint
pub struct MarketDataClient {
    provider: Arc<dyn MarketDataProvider>,
    cache: FetchCache<Value>,
    featured: FeaturedCoin,
    metrics: Arc<MetricsCollector>,
}

impl MarketDataClient {
    /// Creates a client with the default cache timeout
    pub fn new(provider: Arc<dyn MarketDataProvider>, featured: FeaturedCoin) -> Self {
        Self::with_cache(provider, featured, FetchCache::new())
    }

    pub fn with_cache_timeout(
        provider: Arc<dyn MarketDataProvider>,
        featured: FeaturedCoin,
        timeout: Duration,
    ) -> Self {
        Self::with_cache(provider, featured, FetchCache::with_timeout(timeout))
    }

    fn with_cache(
        provider: Arc<dyn MarketDataProvider>,
        featured: FeaturedCoin,
        cache: FetchCache<Value>,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));
        Self {
            provider,
            cache,
            featured,
            metrics,
        }
    }

    pub fn featured(&self) -> &FeaturedCoin {
        &self.featured
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn fetch_metrics(&self) -> FetchMetrics {
        self.metrics.get_metrics().await
    }

    /// Reads `endpoint` through the cache, recording network outcomes
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
        self.cache
            .get_or_fetch(endpoint, || async {
                let start = Instant::now();
                let result = self.provider.fetch_json(endpoint).await;
                match &result {
                    Ok(_) => self.metrics.record_success(start.elapsed()).await,
                    Err(e) => {
                        tracing::warn!(
                            endpoint,
                            provider = self.provider.provider_name(),
                            error = %e,
                            "Market data request failed"
                        );
                        self.metrics.record_failure(&e.to_string()).await;
                    }
                }
                result
            })
            .await
    }

    /// Fetches the top `limit` coins by market cap with the featured coin first
    ///
    /// When the featured coin is not on the page it is looked up on its own
    /// and prepended. That lookup is best effort: if it fails the page is
    /// returned as fetched.
    pub async fn list_coins(&self, limit: u32) -> Result<Vec<CoinSummary>, FetchError> {
        let endpoint = markets_endpoint(limit);
        let payload = self.fetch(&endpoint).await?;
        let raw: Vec<MarketCoin> = decode(&endpoint, payload)?;
        let mut coins: Vec<CoinSummary> = raw.into_iter().map(CoinSummary::from).collect();

        if !promote_featured(&mut coins, &self.featured) {
            match self.featured_summary().await {
                Ok(featured) => coins.insert(0, featured),
                Err(e) => tracing::warn!(
                    featured = %self.featured.id,
                    error = %e,
                    "Featured coin lookup failed, continuing without it"
                ),
            }
        }

        tracing::debug!(count = coins.len(), "Fetched coin list");
        Ok(coins)
    }

    async fn featured_summary(&self) -> Result<CoinSummary, FetchError> {
        let endpoint = coin_endpoint(&self.featured.id);
        let payload = self.fetch(&endpoint).await?;
        let coin: CoinResponse = decode(&endpoint, payload)?;
        Ok(coin.to_summary())
    }

    /// Fetches the full record for one coin
    pub async fn coin_detail(&self, id: &str) -> Result<CoinDetail, FetchError> {
        let endpoint = coin_endpoint(id);
        let payload = self.fetch(&endpoint).await?;
        let coin: CoinResponse = decode(&endpoint, payload)?;
        Ok(coin.into_detail())
    }

    /// Fetches daily prices for the last `days` days
    pub async fn historical_series(
        &self,
        id: &str,
        days: u32,
    ) -> Result<HistoricalSeries, FetchError> {
        let endpoint = market_chart_endpoint(id, days);
        let payload = self.fetch(&endpoint).await?;
        let chart: MarketChartResponse = decode(&endpoint, payload)?;

        Ok(HistoricalSeries {
            coin_id: id.to_string(),
            days,
            points: chart.into_points(),
        })
    }

    /// Free-text coin search; no matches gives an empty list
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, FetchError> {
        let endpoint = search_endpoint(query);
        let payload = self.fetch(&endpoint).await?;
        let response: SearchResponse = decode(&endpoint, payload)?;
        Ok(response.into_hits())
    }

    pub async fn trending(&self) -> Result<Vec<TrendingCoin>, FetchError> {
        let payload = self.fetch(TRENDING_ENDPOINT).await?;
        let response: TrendingResponse = decode(TRENDING_ENDPOINT, payload)?;
        Ok(response.into_coins())
    }

    pub async fn global_market(&self) -> Result<GlobalMarket, FetchError> {
        let payload = self.fetch(GLOBAL_ENDPOINT).await?;
        let response: GlobalResponse = decode(GLOBAL_ENDPOINT, payload)?;
        Ok(response.into_market())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    pub fn market_coin(id: &str, symbol: &str, market_cap: f64) -> Value {
        json!({
            "id": id,
            "symbol": symbol,
            "name": id.to_uppercase(),
            "image": format!("https://img.example/{}.png", id),
            "current_price": market_cap / 10.0,
            "market_cap": market_cap,
            "total_volume": market_cap / 2.0,
            "price_change_percentage_24h": 1.5,
            "market_cap_rank": null
        })
    }

    pub fn coin_detail(id: &str, symbol: &str, price: f64) -> Value {
        json!({
            "id": id,
            "symbol": symbol,
            "name": id.to_uppercase(),
            "image": {"small": format!("https://img.example/{}-s.png", id)},
            "description": {"en": format!("About {}", id)},
            "market_data": {
                "current_price": {"usd": price},
                "market_cap": {"usd": price * 1000.0},
                "total_volume": {"usd": price * 10.0},
                "price_change_percentage_24h": -3.0
            }
        })
    }

    pub fn market_chart(prices: &[f64]) -> Value {
        let points: Vec<Value> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| json!([1_700_000_000_000i64 + i as i64 * 86_400_000, p]))
            .collect();
        json!({ "prices": points, "market_caps": [], "total_volumes": [] })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::provider::mock::MockProvider;
    use serde_json::json;

    fn client(mock: &MockProvider) -> MarketDataClient {
        MarketDataClient::new(Arc::new(mock.clone()), FeaturedCoin::default())
    }

    fn ids(coins: &[CoinSummary]) -> Vec<&str> {
        coins.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_featured_coin_moved_to_front() {
        let mock = MockProvider::new();
        mock.set_json(
            &markets_endpoint(3),
            json!([
                market_coin("btc", "btc", 900.0),
                market_coin("eth", "eth", 500.0),
                market_coin("vanar-chain", "vanry", 10.0),
            ]),
        );

        let coins = client(&mock).list_coins(3).await.unwrap();

        assert_eq!(ids(&coins), vec!["vanar-chain", "btc", "eth"]);
        assert_eq!(mock.call_count(&coin_endpoint("vanar-chain")), 0);
    }

    #[tokio::test]
    async fn test_featured_coin_in_middle_keeps_others_in_order() {
        let mock = MockProvider::new();
        mock.set_json(
            &markets_endpoint(4),
            json!([
                market_coin("btc", "btc", 900.0),
                market_coin("eth", "eth", 500.0),
                market_coin("vanar-chain", "vanry", 10.0),
                market_coin("sol", "sol", 300.0),
            ]),
        );

        let coins = client(&mock).list_coins(4).await.unwrap();

        assert_eq!(ids(&coins), vec!["vanar-chain", "btc", "eth", "sol"]);
    }

    #[tokio::test]
    async fn test_featured_coin_already_first() {
        let mock = MockProvider::new();
        mock.set_json(
            &markets_endpoint(2),
            json!([market_coin("vanar-chain", "vanry", 10.0), market_coin("btc", "btc", 900.0)]),
        );

        let coins = client(&mock).list_coins(2).await.unwrap();

        assert_eq!(ids(&coins), vec!["vanar-chain", "btc"]);
    }

    #[tokio::test]
    async fn test_missing_featured_coin_is_looked_up_and_prepended() {
        let mock = MockProvider::new();
        mock.set_json(
            &markets_endpoint(2),
            json!([market_coin("btc", "btc", 900.0), market_coin("eth", "eth", 500.0)]),
        );
        mock.set_json(
            &coin_endpoint("vanar-chain"),
            json!({"id": "vanar-chain", "symbol": "vanry", "name": "Vanar Chain"}),
        );

        let coins = client(&mock).list_coins(2).await.unwrap();

        assert_eq!(coins.len(), 3);
        assert_eq!(ids(&coins), vec!["vanar-chain", "btc", "eth"]);
        let featured = &coins[0];
        assert_eq!(featured.current_price, 0.0);
        assert_eq!(featured.market_cap, 0.0);
        assert_eq!(featured.price_change_percentage_24h, Some(0.0));
        assert_eq!(featured.image, "");
    }

    #[tokio::test]
    async fn test_featured_lookup_failure_is_not_fatal() {
        let mock = MockProvider::new();
        mock.set_json(
            &markets_endpoint(2),
            json!([market_coin("btc", "btc", 900.0), market_coin("eth", "eth", 500.0)]),
        );
        mock.set_error(&coin_endpoint("vanar-chain"), "boom");

        let coins = client(&mock).list_coins(2).await.unwrap();

        assert_eq!(ids(&coins), vec!["btc", "eth"]);
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let mock = MockProvider::new();
        mock.set_error(&markets_endpoint(10), "down");

        let result = client(&mock).list_coins(10).await;

        assert!(matches!(result, Err(FetchError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_malformed_list_is_parse_failure() {
        let mock = MockProvider::new();
        mock.set_json(&markets_endpoint(10), json!({"status": "maintenance"}));

        let err = client(&mock).list_coins(10).await.unwrap_err();

        assert_eq!(err.kind(), crate::error::FailureKind::Parse);
    }

    #[tokio::test]
    async fn test_repeated_list_uses_cache() {
        let mock = MockProvider::new();
        mock.set_json(&markets_endpoint(1), json!([market_coin("vanar-chain", "vanry", 1.0)]));
        let client = client(&mock);

        client.list_coins(1).await.unwrap();
        client.list_coins(1).await.unwrap();

        assert_eq!(mock.call_count(&markets_endpoint(1)), 1);
        let metrics = client.fetch_metrics().await;
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.provider_name, "mock");
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let mock = MockProvider::new();
        mock.set_json(&markets_endpoint(1), json!([market_coin("vanar-chain", "vanry", 1.0)]));
        let client = MarketDataClient::with_cache_timeout(
            Arc::new(mock.clone()),
            FeaturedCoin::default(),
            Duration::ZERO,
        );

        client.list_coins(1).await.unwrap();
        client.list_coins(1).await.unwrap();

        assert_eq!(mock.call_count(&markets_endpoint(1)), 2);
    }

    #[tokio::test]
    async fn test_coin_detail() {
        let mock = MockProvider::new();
        mock.set_json(&coin_endpoint("bitcoin"), coin_detail("bitcoin", "btc", 60_000.0));

        let detail = client(&mock).coin_detail("bitcoin").await.unwrap();

        assert_eq!(detail.id(), "bitcoin");
        assert_eq!(detail.summary.current_price, 60_000.0);
        assert_eq!(detail.summary.price_change_percentage_24h, Some(-3.0));
        assert_eq!(detail.description, "About bitcoin");
    }

    #[tokio::test]
    async fn test_historical_series() {
        let mock = MockProvider::new();
        mock.set_json(
            &market_chart_endpoint("bitcoin", 30),
            market_chart(&[1.0, 2.0, 3.0]),
        );

        let series = client(&mock).historical_series("bitcoin", 30).await.unwrap();

        assert_eq!(series.coin_id, "bitcoin");
        assert_eq!(series.days, 30);
        let prices: Vec<f64> = series.points.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
        assert!(series.points[0].timestamp < series.points[2].timestamp);
    }

    #[tokio::test]
    async fn test_search_encodes_query_and_handles_no_matches() {
        let mock = MockProvider::new();
        assert_eq!(search_endpoint("shiba inu"), "/search?query=shiba+inu");
        mock.set_json(&search_endpoint("shiba inu"), json!({"coins": []}));
        mock.set_json(
            &search_endpoint("btc"),
            json!({"coins": [{"id": "bitcoin", "name": "Bitcoin", "symbol": "BTC", "market_cap_rank": 1, "thumb": "b.png"}]}),
        );
        let client = client(&mock);

        assert!(client.search("shiba inu").await.unwrap().is_empty());
        let hits = client.search("btc").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "bitcoin");
    }

    #[tokio::test]
    async fn test_trending_and_global() {
        let mock = MockProvider::new();
        mock.set_json(TRENDING_ENDPOINT, json!({"coins": []}));
        mock.set_json(GLOBAL_ENDPOINT, json!({}));
        let client = client(&mock);

        assert!(client.trending().await.unwrap().is_empty());
        let global = client.global_market().await.unwrap();
        assert_eq!(global.total_market_cap_usd, 0.0);
    }

    #[test]
    fn test_promote_featured_not_found() {
        let mut coins = vec![];
        assert!(!promote_featured(&mut coins, &FeaturedCoin::default()));
    }
}
