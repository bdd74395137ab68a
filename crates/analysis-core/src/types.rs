use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::AnalysisError;

/// Keys of the ratio bag, matching the provider's financial-metrics payload.
pub mod ratios {
    pub const PRICE_TO_EARNINGS: &str = "price_to_earnings_ratio";
    pub const PRICE_TO_BOOK: &str = "price_to_book_ratio";
    pub const PRICE_TO_SALES: &str = "price_to_sales_ratio";
    pub const REVENUE_GROWTH: &str = "revenue_growth";
    pub const GROSS_MARGIN: &str = "gross_margin";
    pub const NET_MARGIN: &str = "net_margin";
}

/// One reported revenue segment (e.g. "iPhone", "Data Center").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSegment {
    pub name: String,
    pub revenue: f64,
}

/// A company at one point in time, as returned by a `MetricsProvider`.
///
/// Ratios are stored as `Option<f64>`: a key mapped to `None` (or absent) means
/// "not reported", which is distinct from a reported zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub day_change_percent: Option<f64>,
    #[serde(default)]
    pub ratios: BTreeMap<String, Option<f64>>,
    /// Latest annual revenue, used as the denominator for segment attribution.
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub segments: Vec<RevenueSegment>,
    pub as_of: DateTime<Utc>,
}

impl MetricsSnapshot {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            sector: None,
            industry: None,
            price: None,
            market_cap: None,
            day_change_percent: None,
            ratios: BTreeMap::new(),
            revenue: None,
            segments: Vec::new(),
            as_of: Utc::now(),
        }
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_classification(mut self, sector: Option<&str>, industry: Option<&str>) -> Self {
        self.sector = sector.map(str::to_string);
        self.industry = industry.map(str::to_string);
        self
    }

    pub fn with_ratio(mut self, key: &str, value: f64) -> Self {
        self.ratios.insert(key.to_string(), Some(value));
        self
    }

    pub fn with_revenue(mut self, revenue: f64, segments: Vec<RevenueSegment>) -> Self {
        self.revenue = Some(revenue);
        self.segments = segments;
        self
    }

    /// Reported value for a ratio key. Non-finite values count as unreported.
    pub fn ratio(&self, key: &str) -> Option<f64> {
        self.ratios
            .get(key)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    pub fn pe_ratio(&self) -> Option<f64> {
        self.ratio(ratios::PRICE_TO_EARNINGS)
    }

    pub fn pb_ratio(&self) -> Option<f64> {
        self.ratio(ratios::PRICE_TO_BOOK)
    }

    pub fn ps_ratio(&self) -> Option<f64> {
        self.ratio(ratios::PRICE_TO_SALES)
    }

    /// Net margin as a fraction (0.25 = 25%).
    pub fn net_margin(&self) -> Option<f64> {
        self.ratio(ratios::NET_MARGIN)
    }

    /// Year-over-year revenue growth as a fraction (0.20 = 20%).
    pub fn revenue_growth(&self) -> Option<f64> {
        self.ratio(ratios::REVENUE_GROWTH)
    }

    /// A zero, negative or missing market cap marks the record as unusable.
    pub fn has_usable_market_cap(&self) -> bool {
        self.market_cap.map_or(false, |cap| cap.is_finite() && cap > 0.0)
    }
}

/// Trim and uppercase a ticker, rejecting anything outside `[A-Z0-9.-]`.
pub fn normalize_ticker(raw: &str) -> Result<String, AnalysisError> {
    let ticker = raw.trim().to_uppercase();
    let valid = !ticker.is_empty()
        && ticker.chars().next().map_or(false, |c| c.is_ascii_alphanumeric())
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(ticker)
    } else {
        Err(AnalysisError::InvalidTicker(raw.to_string()))
    }
}
