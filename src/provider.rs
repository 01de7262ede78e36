//! Provider abstraction for reading market data from an external API

use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for market data providers
///
/// A provider turns an endpoint path with its query string (for example
/// `/coins/bitcoin`) into the decoded JSON body. Parsing into domain types is
/// left to `MarketDataClient`, so the raw payload is what gets cached.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Performs a GET for `endpoint` and returns the JSON body
    ///
    /// # Arguments
    /// * `endpoint` - Path relative to the provider's base URL, query included
    async fn fetch_json(&self, endpoint: &str) -> Result<Value, FetchError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    enum MockResponse {
        Json(Value),
        Error(String),
    }

    /// Mock provider for testing
    ///
    /// Responses are keyed by the exact endpoint string.
    #[derive(Clone, Default)]
    pub struct MockProvider {
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        calls: Arc<Mutex<HashMap<String, usize>>>,
        delay: Arc<Mutex<HashMap<String, Duration>>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_json(&self, endpoint: &str, body: Value) {
            self.responses
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), MockResponse::Json(body));
        }

        pub fn set_error(&self, endpoint: &str, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), MockResponse::Error(message.to_string()));
        }

        /// Makes requests for `endpoint` take `delay` before answering
        pub fn set_delay(&self, endpoint: &str, delay: Duration) {
            self.delay
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), delay);
        }

        pub fn call_count(&self, endpoint: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .get(endpoint)
                .copied()
                .unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_json(&self, endpoint: &str) -> Result<Value, FetchError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(endpoint.to_string())
                .or_insert(0) += 1;

            let delay = self.delay.lock().unwrap().get(endpoint).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let response = self.responses.lock().unwrap().get(endpoint).cloned();
            match response {
                Some(MockResponse::Json(body)) => Ok(body),
                Some(MockResponse::Error(msg)) => Err(FetchError::ApiError(msg)),
                None => Err(FetchError::Status {
                    status: 404,
                    body: format!("no mock for {}", endpoint),
                }),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
