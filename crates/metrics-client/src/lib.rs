use analysis_core::{AnalysisError, MetricsProvider, MetricsSnapshot, RevenueSegment};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod models;

pub use models::{CompanyFacts, PriceSnapshot};
use models::{
    assemble_snapshot, parse_segments, ratio_bag, CompanyFactsResponse, FinancialMetricsResponse,
    PriceSnapshotResponse, SegmentedRevenuesResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.financialdatasets.ai";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_WAIT: Duration = Duration::from_secs(15);

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }
            let Some(&oldest) = ts.front() else {
                return;
            };

            // Wait until the oldest request falls out of the window
            let sleep_dur = (oldest + self.window).saturating_duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Connection settings for the financial data API.
#[derive(Debug, Clone)]
pub struct MetricsClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Requests per minute.
    pub rate_limit: usize,
    pub timeout: Duration,
}

impl Default for MetricsClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: 300,
            timeout: Duration::from_secs(30),
        }
    }
}

impl MetricsClientConfig {
    /// Read `FINANCIAL_DATASETS_API_KEY`, `FINANCIAL_DATASETS_BASE_URL` and
    /// `FINANCIAL_DATASETS_RATE_LIMIT`, keeping defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("FINANCIAL_DATASETS_API_KEY").unwrap_or_default(),
            base_url: std::env::var("FINANCIAL_DATASETS_BASE_URL").unwrap_or(defaults.base_url),
            rate_limit: std::env::var("FINANCIAL_DATASETS_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit),
            timeout: defaults.timeout,
        }
    }
}

/// HTTP `MetricsProvider` backed by the financial data REST API.
#[derive(Clone)]
pub struct MetricsClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl MetricsClient {
    pub fn new(config: MetricsClientConfig) -> Self {
        if config.api_key.is_empty() {
            tracing::warn!("No API key configured; requests will be limited to free tickers");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            rate_limiter: RateLimiter::new(config.rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder
            .header("X-API-KEY", &self.api_key)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            tracing::warn!(
                "429 rate limited, waiting {}s before retry {}/{}",
                RETRY_WAIT.as_secs(),
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(RETRY_WAIT).await;
        }

        Err(AnalysisError::ApiError(format!(
            "Rate limited after {} retries",
            MAX_ATTEMPTS
        )))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], ticker: &str) -> Result<T, AnalysisError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.send_request(self.client.get(&url).query(query)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, ticker, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("{} decode error: {}", path, e)))
    }

    pub async fn get_price_snapshot(&self, ticker: &str) -> Result<PriceSnapshot, AnalysisError> {
        let resp: PriceSnapshotResponse = self
            .get_json("/prices/snapshot/", &[("ticker", ticker)], ticker)
            .await?;
        Ok(resp.snapshot)
    }

    pub async fn get_company_facts(&self, ticker: &str) -> Result<CompanyFacts, AnalysisError> {
        let resp: CompanyFactsResponse = self
            .get_json("/company/facts/", &[("ticker", ticker)], ticker)
            .await?;
        Ok(resp.company_facts)
    }

    /// Latest ratio snapshot, keyed by the provider's metric names.
    pub async fn get_financial_metrics(&self, ticker: &str) -> Result<BTreeMap<String, Option<f64>>, AnalysisError> {
        let resp: FinancialMetricsResponse = self
            .get_json("/financial-metrics/snapshot/", &[("ticker", ticker)], ticker)
            .await?;
        Ok(ratio_bag(resp.snapshot))
    }

    /// Consolidated revenue and segment breakdown from the latest annual report.
    pub async fn get_segmented_revenues(&self, ticker: &str) -> Result<(Option<f64>, Vec<RevenueSegment>), AnalysisError> {
        let resp: SegmentedRevenuesResponse = self
            .get_json(
                "/financials/segmented-revenues/",
                &[("ticker", ticker), ("period", "annual"), ("limit", "1")],
                ticker,
            )
            .await?;
        Ok(resp
            .segmented_revenues
            .first()
            .map(parse_segments)
            .unwrap_or((None, Vec::new())))
    }
}

#[async_trait]
impl MetricsProvider for MetricsClient {
    /// The price snapshot is required; facts, ratios and segments degrade to
    /// empty when their endpoint fails.
    async fn get_metrics(&self, ticker: &str) -> Result<MetricsSnapshot, AnalysisError> {
        let (price, facts, ratios, segments) = tokio::join!(
            self.get_price_snapshot(ticker),
            self.get_company_facts(ticker),
            self.get_financial_metrics(ticker),
            self.get_segmented_revenues(ticker),
        );

        let price = price?;

        let facts = facts
            .map_err(|e| tracing::warn!("Company facts unavailable for {}: {}", ticker, e))
            .ok();
        let ratios = ratios.unwrap_or_else(|e| {
            tracing::warn!("Financial metrics unavailable for {}: {}", ticker, e);
            BTreeMap::new()
        });
        let (revenue, segments) = segments.unwrap_or_else(|e| {
            tracing::debug!("Segmented revenues unavailable for {}: {}", ticker, e);
            (None, Vec::new())
        });

        Ok(assemble_snapshot(ticker, price, facts, ratios, revenue, segments))
    }
}

/// 404 means the provider has no record; anything else is an API fault.
fn status_error(status: StatusCode, ticker: &str, body: &str) -> AnalysisError {
    if status == StatusCode::NOT_FOUND {
        AnalysisError::NoData(ticker.to_string())
    } else {
        AnalysisError::ApiError(format!("HTTP {}: {}", status, body))
    }
}
