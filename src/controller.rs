//! Dashboard controller
//!
//! Owns what the dashboard shows: the latest coin snapshot, the filtered and
//! sorted subset on screen, and the coin open in the detail view. User
//! actions and the periodic refresh both go through here, and every change is
//! published to the rendering surface as a `RenderUpdate`.
//!
//! ```text
//!            select(id)                 back()
//!   List ─────────────────▶ Detail ───────────────▶ List
//!     ▲  (detail + series      │  change_period(p)
//!     │   both loaded)         └──────▶ Detail (new series)
//!     └── refresh(): reload whatever the current view shows
//! ```
//!
//! Results that arrive after the user has navigated elsewhere are dropped:
//! each navigation bumps a generation counter and detail results only land
//! if the counter has not moved. List results carry a ticket so an older
//! list fetch never overwrites a newer one.

use crate::{
    client::MarketDataClient,
    config::DashboardConfig,
    constants::{REFRESH_INTERVAL_SECS, RENDER_CHANNEL_CAPACITY},
    error::{DashboardError, FetchError},
    insight::InsightClient,
    providers::CoinGeckoProvider,
    types::{
        ChartPeriod, CoinDetail, CoinSummary, ComponentHealth, HealthStatus, HistoricalSeries,
        RenderUpdate, SortKey, View,
    },
    view::visible_coins,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Default)]
struct DashboardState {
    snapshot: Vec<CoinSummary>,
    visible: Vec<CoinSummary>,
    query: String,
    sort: Option<SortKey>,
    view: View,
    /// Where the latest navigation is heading; equals `view` once it lands
    target: View,
    detail: Option<CoinDetail>,
    series: Option<HistoricalSeries>,
    /// Bumped on every navigation
    generation: u64,
    list_tickets_issued: u64,
    list_ticket_applied: u64,
    last_refresh: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl DashboardState {
    fn recompute_visible(&mut self) {
        self.visible = visible_coins(&self.snapshot, &self.query, self.sort);
    }

    fn find_coin(&self, id: &str) -> Option<CoinSummary> {
        self.snapshot
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .or_else(|| {
                self.detail
                    .as_ref()
                    .filter(|d| d.id() == id)
                    .map(|d| d.summary.clone())
            })
    }
}

/// Coordinates data loading, list presentation and view navigation
pub struct DashboardController {
    client: Arc<MarketDataClient>,
    insight: Arc<InsightClient>,
    list_limit: u32,
    refresh_interval: Duration,
    state: RwLock<DashboardState>,
    updates: broadcast::Sender<RenderUpdate>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl DashboardController {
    pub fn new(client: Arc<MarketDataClient>, insight: Arc<InsightClient>, list_limit: u32) -> Self {
        let (updates, _) = broadcast::channel(RENDER_CHANNEL_CAPACITY);
        Self {
            client,
            insight,
            list_limit,
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            state: RwLock::new(DashboardState::default()),
            updates,
            refresh_task: Mutex::new(None),
        }
    }

    /// Builds the CoinGecko client, insight backends and controller from `config`
    pub fn from_config(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let provider = CoinGeckoProvider::with_base_url(config.api_base_url.clone())
            .map_err(|e| DashboardError::Setup(e.to_string()))?;
        let client = MarketDataClient::new(Arc::new(provider), config.featured.clone());
        let insight =
            InsightClient::from_config(config).map_err(|e| DashboardError::Setup(e.to_string()))?;

        tracing::info!(
            base_url = %config.api_base_url,
            featured = %config.featured.id,
            list_limit = config.list_limit,
            insight_provider = %config.insight_provider,
            "Dashboard controller configured"
        );

        Ok(Self::new(
            Arc::new(client),
            Arc::new(insight),
            config.list_limit,
        ))
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn client(&self) -> &Arc<MarketDataClient> {
        &self.client
    }

    pub fn insight(&self) -> &Arc<InsightClient> {
        &self.insight
    }

    /// Receiver for render updates published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RenderUpdate> {
        self.updates.subscribe()
    }

    fn publish(&self, update: RenderUpdate) {
        tracing::trace!(update = %update, "Publishing render update");
        // No subscribers is fine; state is still readable through the accessors
        let _ = self.updates.send(update);
    }

    async fn report_failure(&self, message: String, error: &DashboardError) {
        tracing::warn!(error = %error, "{}", message);
        self.state.write().await.last_error = Some(error.to_string());
        self.publish(RenderUpdate::error(message, error.is_retryable()));
    }

    /// Reports a failed detail or series fetch issued under `generation`
    ///
    /// Failures of requests the user has navigated away from are only logged.
    /// With `abandon` the pending navigation falls back to the view on screen.
    async fn report_detail_failure(
        &self,
        generation: u64,
        abandon: bool,
        message: String,
        error: &DashboardError,
    ) {
        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                tracing::debug!(error = %error, "Ignoring failure of a superseded request");
                return;
            }
            if abandon {
                state.target = state.view.clone();
            }
            state.last_error = Some(error.to_string());
        }
        tracing::warn!(error = %error, "{}", message);
        self.publish(RenderUpdate::error(message, error.is_retryable()));
    }

    pub async fn view(&self) -> View {
        self.state.read().await.view.clone()
    }

    /// Full result of the latest successful list fetch
    pub async fn snapshot(&self) -> Vec<CoinSummary> {
        self.state.read().await.snapshot.clone()
    }

    /// The filtered and sorted list currently on screen
    pub async fn visible_coins(&self) -> Vec<CoinSummary> {
        self.state.read().await.visible.clone()
    }

    pub async fn current_detail(&self) -> Option<CoinDetail> {
        self.state.read().await.detail.clone()
    }

    pub async fn current_series(&self) -> Option<HistoricalSeries> {
        self.state.read().await.series.clone()
    }

    pub async fn query(&self) -> String {
        self.state.read().await.query.clone()
    }

    pub async fn sort_key(&self) -> Option<SortKey> {
        self.state.read().await.sort
    }

    /// Fetches the coin list and replaces the snapshot
    pub async fn load_list(&self) -> Result<(), DashboardError> {
        let ticket = {
            let mut state = self.state.write().await;
            state.list_tickets_issued += 1;
            state.list_tickets_issued
        };

        let coins = match self.client.list_coins(self.list_limit).await {
            Ok(coins) => coins,
            Err(e) => {
                let error = DashboardError::from(e);
                self.report_failure(
                    "Failed to load cryptocurrency data. Please try again later.".to_string(),
                    &error,
                )
                .await;
                return Err(error);
            }
        };

        let visible = {
            let mut state = self.state.write().await;
            if ticket <= state.list_ticket_applied {
                tracing::debug!(ticket, "Discarding list result superseded by a newer fetch");
                return Ok(());
            }
            state.list_ticket_applied = ticket;
            state.snapshot = coins;
            state.recompute_visible();
            state.last_refresh = Some(Utc::now());
            state.last_error = None;
            state.visible.clone()
        };

        tracing::debug!(count = visible.len(), "Coin list applied");
        self.publish(RenderUpdate::list(visible));
        Ok(())
    }

    /// Narrows the visible list to coins whose name or symbol contains `query`
    ///
    /// A blank query shows the whole snapshot. The active sort is kept.
    pub async fn filter(&self, query: &str) -> Vec<CoinSummary> {
        let visible = {
            let mut state = self.state.write().await;
            state.query = query.to_string();
            state.recompute_visible();
            state.visible.clone()
        };
        self.publish(RenderUpdate::list(visible.clone()));
        visible
    }

    /// Sorts the visible list descending by `key` and keeps that order for
    /// later snapshots and filters
    pub async fn sort(&self, key: SortKey) -> Vec<CoinSummary> {
        let visible = {
            let mut state = self.state.write().await;
            state.sort = Some(key);
            state.recompute_visible();
            state.visible.clone()
        };
        self.publish(RenderUpdate::list(visible.clone()));
        visible
    }

    async fn fetch_detail(
        &self,
        coin_id: &str,
        period: ChartPeriod,
    ) -> Result<(CoinDetail, HistoricalSeries), FetchError> {
        futures::future::try_join(
            self.client.coin_detail(coin_id),
            self.client.historical_series(coin_id, period.days()),
        )
        .await
    }

    /// Stores a loaded detail if no navigation happened since `generation`
    async fn apply_detail(
        &self,
        generation: u64,
        coin_id: &str,
        period: ChartPeriod,
        detail: CoinDetail,
        series: HistoricalSeries,
    ) -> bool {
        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                tracing::debug!(coin = coin_id, "Discarding stale detail result");
                return false;
            }
            state.view = View::Detail {
                coin_id: coin_id.to_string(),
                period,
            };
            state.target = state.view.clone();
            state.detail = Some(detail.clone());
            state.series = Some(series.clone());
            state.last_refresh = Some(Utc::now());
            state.last_error = None;
        }
        self.publish(RenderUpdate::detail(detail, series));
        true
    }

    /// Opens the detail view for `coin_id`
    ///
    /// Detail and price history are fetched together and the view only
    /// switches once both have arrived. On failure the current view stays.
    pub async fn select(&self, coin_id: &str) -> Result<(), DashboardError> {
        let period = ChartPeriod::default();
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.target = View::Detail {
                coin_id: coin_id.to_string(),
                period,
            };
            state.generation
        };

        match self.fetch_detail(coin_id, period).await {
            Ok((detail, series)) => {
                self.apply_detail(generation, coin_id, period, detail, series)
                    .await;
                Ok(())
            }
            Err(e) => {
                let error = DashboardError::from(e);
                self.report_detail_failure(
                    generation,
                    true,
                    format!("Failed to load details for {}. Please try again.", coin_id),
                    &error,
                )
                .await;
                Err(error)
            }
        }
    }

    /// Returns to the list view and drops the detail data
    ///
    /// Also cancels the effect of any selection still loading.
    pub async fn back(&self) {
        let changed = {
            let mut state = self.state.write().await;
            state.generation += 1;
            let changed = state.view.is_detail();
            state.view = View::List;
            state.target = View::List;
            state.detail = None;
            state.series = None;
            changed
        };
        if changed {
            self.publish(RenderUpdate::view(View::List));
        }
    }

    /// Reloads the chart of the viewed coin for another window
    ///
    /// On failure the previous series stays on screen.
    pub async fn change_period(&self, period: ChartPeriod) -> Result<(), DashboardError> {
        let (coin_id, generation) = {
            let mut state = self.state.write().await;
            let coin_id = match &state.view {
                View::Detail { coin_id, .. } => coin_id.clone(),
                View::List => return Err(DashboardError::NotInDetailView),
            };
            state.generation += 1;
            state.target = View::Detail {
                coin_id: coin_id.clone(),
                period,
            };
            (coin_id, state.generation)
        };

        let series = match self.client.historical_series(&coin_id, period.days()).await {
            Ok(series) => series,
            Err(e) => {
                let error = DashboardError::from(e);
                self.report_detail_failure(
                    generation,
                    true,
                    format!("Failed to update chart for {}.", coin_id),
                    &error,
                )
                .await;
                return Err(error);
            }
        };

        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                tracing::debug!(coin = %coin_id, "Discarding stale series result");
                return Ok(());
            }
            state.view = View::Detail {
                coin_id: coin_id.clone(),
                period,
            };
            state.target = state.view.clone();
            state.series = Some(series.clone());
        }
        self.publish(RenderUpdate::series(series));
        Ok(())
    }

    /// Re-runs the fetch for the current view
    ///
    /// While a navigation is loading, its destination is fetched instead of
    /// the view it is leaving. A failure is published and returned; view and
    /// data stay as they are.
    pub async fn refresh(&self) -> Result<(), DashboardError> {
        let (target, generation) = {
            let state = self.state.read().await;
            (state.target.clone(), state.generation)
        };

        match target {
            View::List => self.load_list().await,
            View::Detail { coin_id, period } => match self.fetch_detail(&coin_id, period).await {
                Ok((detail, series)) => {
                    self.apply_detail(generation, &coin_id, period, detail, series)
                        .await;
                    Ok(())
                }
                Err(e) => {
                    let error = DashboardError::from(e);
                    self.report_detail_failure(
                        generation,
                        false,
                        format!("Failed to refresh {}. Showing the last loaded data.", coin_id),
                        &error,
                    )
                    .await;
                    Err(error)
                }
            },
        }
    }

    /// Hook for the page becoming visible again
    pub async fn on_visible(&self) -> Result<(), DashboardError> {
        tracing::debug!("Dashboard visible again, refreshing");
        self.refresh().await
    }

    fn task_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.refresh_task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Starts the periodic refresh, replacing a task that is already running
    ///
    /// The first refresh happens one interval from now. The task stops by
    /// itself once the controller is dropped.
    pub fn start_refresh_task(self: &Arc<Self>) {
        let controller = Arc::downgrade(self);
        let period = self.refresh_interval;

        let handle = tokio::spawn(async move {
            tracing::info!(
                refresh_interval_ms = period.as_millis() as u64,
                "Starting dashboard refresh task"
            );

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                if let Err(e) = controller.refresh().await {
                    tracing::warn!(error = %e, "Periodic refresh failed");
                }
            }
        });

        if let Some(previous) = self.task_slot().replace(handle) {
            previous.abort();
        }
    }

    /// Stops the periodic refresh; returns false if none was running
    pub fn stop_refresh_task(&self) -> bool {
        match self.task_slot().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_refresh_task_running(&self) -> bool {
        self.task_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Generates insight text for a coin in the snapshot or detail view
    pub async fn request_insight(&self, coin_id: &str) -> Result<String, DashboardError> {
        let coin = self
            .state
            .read()
            .await
            .find_coin(coin_id)
            .ok_or_else(|| DashboardError::CoinNotFound(coin_id.to_string()))?;

        let text = self.insight.generate_insight(&coin).await;
        self.publish(RenderUpdate::insight(coin_id, text.clone()));
        Ok(text)
    }

    /// Perform a health check on the dashboard data
    pub async fn health_check(&self) -> ComponentHealth {
        let metrics = self.client.fetch_metrics().await;
        let state = self.state.read().await;

        let mut details = HashMap::new();
        details.insert("snapshot_size".to_string(), serde_json::json!(state.snapshot.len()));
        details.insert("view".to_string(), serde_json::json!(state.view.to_string()));
        details.insert("last_refresh".to_string(), serde_json::json!(state.last_refresh));
        details.insert("provider_name".to_string(), serde_json::json!(metrics.provider_name));
        details.insert("success_rate".to_string(), serde_json::json!(metrics.success_rate));
        details.insert("latency_p50_ms".to_string(), serde_json::json!(metrics.latency_p50_ms));
        details.insert(
            "refresh_task_running".to_string(),
            serde_json::json!(self.is_refresh_task_running()),
        );

        let (status, message) = if state.snapshot.is_empty() && state.detail.is_none() {
            (
                HealthStatus::Unhealthy,
                "Dashboard has no market data".to_string(),
            )
        } else if let Some(error) = &state.last_error {
            (
                HealthStatus::Degraded,
                format!("Showing earlier data; last refresh failed: {}", error),
            )
        } else {
            (
                HealthStatus::Healthy,
                "Dashboard data is up to date".to_string(),
            )
        };

        ComponentHealth {
            name: "dashboard".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: Utc::now(),
        }
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        if let Some(handle) = self.task_slot().take() {
            handle.abort();
        }
    }
}
