//! Types for the dashboard data core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One row of the ranked coin list
///
/// Numbers the API omits are already replaced with `0.0`; only the fields
/// that are meaningfully absent stay optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Logo URL, empty when the API has none
    pub image: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap_rank: Option<u32>,
}

impl CoinSummary {
    /// Value used when sorting by `key`; missing values count as zero
    pub fn sort_value(&self, key: SortKey) -> f64 {
        match key {
            SortKey::MarketCap => self.market_cap,
            SortKey::PriceChange24h => self.price_change_percentage_24h.unwrap_or(0.0),
            SortKey::CurrentPrice => self.current_price,
            SortKey::TotalVolume => self.total_volume,
        }
    }

    /// Case-insensitive substring match on name or symbol
    ///
    /// `needle` must already be lowercase.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

/// Project links shown on the detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinLinks {
    pub homepage: Vec<String>,
    pub blockchain_site: Vec<String>,
    pub subreddit_url: Option<String>,
    pub repos: Vec<String>,
}

/// All-time high or low
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceExtreme {
    pub price: f64,
    /// Distance from the extreme, in percent
    pub change_percentage: Option<f64>,
    pub date: Option<DateTime<Utc>>,
}

/// Full record of one coin for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub summary: CoinSummary,
    /// English description, may contain HTML
    pub description: String,
    pub links: CoinLinks,
    pub categories: Vec<String>,
    pub genesis_date: Option<String>,
    pub all_time_high: Option<PriceExtreme>,
    pub all_time_low: Option<PriceExtreme>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
}

impl CoinDetail {
    pub fn id(&self) -> &str {
        &self.summary.id
    }
}

/// A single (timestamp, price) sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Price history of one coin over a lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub coin_id: String,
    pub days: u32,
    pub points: Vec<PricePoint>,
}

impl HistoricalSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Percent change between the first and last sample
    pub fn change_percentage(&self) -> Option<f64> {
        let first = self.points.first()?.price;
        let last = self.points.last()?.price;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

/// Chart lookback windows offered by the detail view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartPeriod {
    #[default]
    Week,
    Month,
    Quarter,
}

impl ChartPeriod {
    pub fn days(&self) -> u32 {
        match self {
            ChartPeriod::Week => 7,
            ChartPeriod::Month => 30,
            ChartPeriod::Quarter => 90,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(ChartPeriod::Week),
            30 => Some(ChartPeriod::Month),
            90 => Some(ChartPeriod::Quarter),
            _ => None,
        }
    }

    pub fn all() -> &'static [ChartPeriod] {
        &[ChartPeriod::Week, ChartPeriod::Month, ChartPeriod::Quarter]
    }
}

/// Result of a free-text coin search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<u32>,
    pub thumb: String,
}

/// Entry of the trending list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<u32>,
    pub thumb: String,
    /// Position in the trending list, 0 is hottest
    pub score: u32,
}

/// Whole-market aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMarket {
    pub active_cryptocurrencies: u64,
    pub markets: u64,
    pub total_market_cap_usd: f64,
    pub total_volume_usd: f64,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
    pub market_cap_change_percentage_24h: f64,
}

/// Columns the list can be sorted by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    MarketCap,
    #[serde(rename = "price_change_percentage_24h")]
    PriceChange24h,
    CurrentPrice,
    TotalVolume,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::MarketCap => "market_cap",
            SortKey::PriceChange24h => "price_change_percentage_24h",
            SortKey::CurrentPrice => "current_price",
            SortKey::TotalVolume => "total_volume",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market_cap" => Ok(SortKey::MarketCap),
            "price_change_percentage_24h" | "change_24h" => Ok(SortKey::PriceChange24h),
            "current_price" | "price" => Ok(SortKey::CurrentPrice),
            "total_volume" | "volume" => Ok(SortKey::TotalVolume),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

/// Which screen the dashboard is showing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    #[default]
    List,
    Detail { coin_id: String, period: ChartPeriod },
}

impl View {
    pub fn is_detail(&self) -> bool {
        matches!(self, View::Detail { .. })
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::List => write!(f, "list"),
            View::Detail { coin_id, period } => {
                write!(f, "detail({}, {}d)", coin_id, period.days())
            }
        }
    }
}

/// Light or dark color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Updates handed to the rendering surface
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderUpdate {
    /// Visible list changed (new snapshot, filter or sort)
    ListUpdated {
        id: Uuid,
        coins: Vec<CoinSummary>,
        timestamp: DateTime<Utc>,
    },

    /// Detail view entered or refreshed
    DetailLoaded {
        id: Uuid,
        detail: Box<CoinDetail>,
        series: HistoricalSeries,
        timestamp: DateTime<Utc>,
    },

    /// Chart window changed
    SeriesUpdated {
        id: Uuid,
        series: HistoricalSeries,
        timestamp: DateTime<Utc>,
    },

    /// View switched without new data (back navigation)
    ViewChanged {
        id: Uuid,
        view: View,
        timestamp: DateTime<Utc>,
    },

    /// Insight text ready for a coin
    InsightReady {
        id: Uuid,
        coin_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Something failed; `retryable` means a retry control makes sense
    ErrorRaised {
        id: Uuid,
        message: String,
        retryable: bool,
        timestamp: DateTime<Utc>,
    },
}

impl RenderUpdate {
    pub fn list(coins: Vec<CoinSummary>) -> Self {
        RenderUpdate::ListUpdated {
            id: Uuid::new_v4(),
            coins,
            timestamp: Utc::now(),
        }
    }

    pub fn detail(detail: CoinDetail, series: HistoricalSeries) -> Self {
        RenderUpdate::DetailLoaded {
            id: Uuid::new_v4(),
            detail: Box::new(detail),
            series,
            timestamp: Utc::now(),
        }
    }

    pub fn series(series: HistoricalSeries) -> Self {
        RenderUpdate::SeriesUpdated {
            id: Uuid::new_v4(),
            series,
            timestamp: Utc::now(),
        }
    }

    pub fn view(view: View) -> Self {
        RenderUpdate::ViewChanged {
            id: Uuid::new_v4(),
            view,
            timestamp: Utc::now(),
        }
    }

    pub fn insight(coin_id: &str, text: String) -> Self {
        RenderUpdate::InsightReady {
            id: Uuid::new_v4(),
            coin_id: coin_id.to_string(),
            text,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, retryable: bool) -> Self {
        RenderUpdate::ErrorRaised {
            id: Uuid::new_v4(),
            message: message.into(),
            retryable,
            timestamp: Utc::now(),
        }
    }

    /// Get the update ID
    pub fn id(&self) -> Uuid {
        match self {
            RenderUpdate::ListUpdated { id, .. } => *id,
            RenderUpdate::DetailLoaded { id, .. } => *id,
            RenderUpdate::SeriesUpdated { id, .. } => *id,
            RenderUpdate::ViewChanged { id, .. } => *id,
            RenderUpdate::InsightReady { id, .. } => *id,
            RenderUpdate::ErrorRaised { id, .. } => *id,
        }
    }

    /// Get the update type as string
    pub fn update_type(&self) -> &'static str {
        match self {
            RenderUpdate::ListUpdated { .. } => "LIST_UPDATED",
            RenderUpdate::DetailLoaded { .. } => "DETAIL_LOADED",
            RenderUpdate::SeriesUpdated { .. } => "SERIES_UPDATED",
            RenderUpdate::ViewChanged { .. } => "VIEW_CHANGED",
            RenderUpdate::InsightReady { .. } => "INSIGHT_READY",
            RenderUpdate::ErrorRaised { .. } => "ERROR_RAISED",
        }
    }
}

impl fmt::Display for RenderUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderUpdate::ListUpdated { coins, .. } => {
                write!(f, "List updated: {} coins", coins.len())
            }
            RenderUpdate::DetailLoaded { detail, series, .. } => write!(
                f,
                "Detail loaded: {} ({} points)",
                detail.summary.name,
                series.points.len()
            ),
            RenderUpdate::SeriesUpdated { series, .. } => {
                write!(f, "Series updated: {} {}d", series.coin_id, series.days)
            }
            RenderUpdate::ViewChanged { view, .. } => write!(f, "View changed: {}", view),
            RenderUpdate::InsightReady { coin_id, .. } => write!(f, "Insight ready for {}", coin_id),
            RenderUpdate::ErrorRaised { message, .. } => write!(f, "Error: {}", message),
        }
    }
}

/// Overall system health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh data and the last refresh succeeded
    Healthy,
    /// Data is shown but the last refresh failed
    Degraded,
    /// No data to show
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
