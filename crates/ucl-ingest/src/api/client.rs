//! Authenticated, rate-guarded HTTP client for the upstream API.

use crate::api::{ApiError, Result};
use crate::config::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Client for the upstream sports API.
///
/// Auth headers are set once at construction. Calls are spaced by the
/// internal [`RateGuard`]; concurrent callers are serialized through it, so
/// the minimum inter-call interval holds globally for this client.
pub struct ApiClient {
    client: Client,
    base_url: String,
    guard: RateGuard,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-RapidAPI-Key",
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| ApiError::Config(format!("API key is not a valid header: {}", e)))?,
        );
        headers.insert(
            "X-RapidAPI-Host",
            HeaderValue::from_str(&config.host)
                .map_err(|e| ApiError::Config(format!("API host is not a valid header: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .user_agent("ucl-lake-ingest/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            guard: RateGuard::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    /// Issue one GET against `{base_url}/{endpoint}`.
    ///
    /// Returns the parsed JSON body on HTTP 200. Any other status becomes
    /// [`ApiError::Status`] carrying the status code and response body. No
    /// retry happens here; retry and fallback policy belong to the caller.
    pub async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        self.guard.acquire().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, ?params, "Fetching from API");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::OK {
            let body = response.json::<Value>().await?;
            info!(endpoint, "Fetch succeeded");
            Ok(body)
        } else {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Credential pre-flight: one team-list probe for the given season.
    pub async fn check(&self, year: i32) -> Result<()> {
        self.fetch("team/list", &[("year", year.to_string())])
            .await
            .map(|_| ())
    }
}

/// Minimum-spacing guard between API calls.
///
/// The lock is held across the pacing sleep, so concurrent callers queue up
/// behind it and calls leave this client at most once per `min_interval`.
struct RateGuard {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGuard {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
