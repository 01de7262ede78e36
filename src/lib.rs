//! # Crypto Pulse SDK
//!
//! Data core of a cryptocurrency market dashboard: fetches coin lists,
//! coin details and price history from CoinGecko, caches responses, keeps a
//! featured coin pinned to the top of the list, and drives the list/detail
//! navigation of the dashboard. Optional AI-written insights come from
//! OpenAI or Gemini, with canned demo text when no key is configured.
//!
//! ## Usage
//!
//! ```no_run
//! use crypto_pulse_sdk::{DashboardConfig, DashboardController, RenderUpdate};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = Arc::new(DashboardController::from_config(&DashboardConfig::from_env())?);
//! let mut updates = controller.subscribe();
//!
//! controller.load_list().await?;
//! controller.start_refresh_task();
//!
//! while let Ok(update) = updates.recv().await {
//!     if let RenderUpdate::ListUpdated { coins, .. } = update {
//!         println!("{} coins on screen", coins.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod format;
pub mod insight;
pub mod metrics;
pub mod preferences;
pub mod provider;
pub mod providers;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use cache::FetchCache;
pub use client::MarketDataClient;
pub use config::{BackendConfig, DashboardConfig, FeaturedCoin};
pub use controller::DashboardController;
pub use error::{DashboardError, FailureKind, FetchError, InsightError, PreferenceError};
pub use insight::{InsightClient, InsightProvider};
pub use metrics::FetchMetrics;
pub use preferences::PreferenceStore;
pub use provider::MarketDataProvider;
pub use types::{
    ChartPeriod, CoinDetail, CoinSummary, ComponentHealth, HealthStatus, HistoricalSeries,
    RenderUpdate, SortKey, Theme, View,
};
