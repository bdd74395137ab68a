//! Response payloads and their assembly into a `MetricsSnapshot`.

use analysis_core::{MetricsSnapshot, RevenueSegment};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub(crate) struct PriceSnapshotResponse {
    pub snapshot: PriceSnapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSnapshot {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub day_change_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompanyFactsResponse {
    pub company_facts: CompanyFacts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyFacts {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FinancialMetricsResponse {
    pub snapshot: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SegmentedRevenuesResponse {
    #[serde(default)]
    pub segmented_revenues: Vec<SegmentedRevenuePeriod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SegmentedRevenuePeriod {
    #[serde(default)]
    pub items: Vec<SegmentedRevenueItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SegmentedRevenueItem {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub segments: Vec<SegmentLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SegmentLabel {
    pub label: String,
    #[serde(rename = "type", default)]
    pub segment_type: Option<String>,
}

/// Keep numeric and null entries of the metrics payload; drop strings
/// (ticker, period, currency).
pub(crate) fn ratio_bag(raw: BTreeMap<String, serde_json::Value>) -> BTreeMap<String, Option<f64>> {
    raw.into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => Some((key, None)),
            serde_json::Value::Number(n) => Some((key, n.as_f64())),
            _ => None,
        })
        .collect()
}

/// Consolidated revenue plus one breakdown from the latest period.
///
/// The consolidated line is the item without segment labels. Segment rows are
/// single-label items; when several breakdowns are reported (product, geography)
/// the first one that appears is used.
pub(crate) fn parse_segments(period: &SegmentedRevenuePeriod) -> (Option<f64>, Vec<RevenueSegment>) {
    let total = period
        .items
        .iter()
        .find(|item| item.segments.is_empty())
        .and_then(|item| item.amount);

    let axis = period
        .items
        .iter()
        .find(|item| item.segments.len() == 1)
        .map(|item| item.segments[0].segment_type.clone());

    let segments = match axis {
        Some(axis) => period
            .items
            .iter()
            .filter(|item| item.segments.len() == 1 && item.segments[0].segment_type == axis)
            .filter_map(|item| {
                item.amount.map(|amount| RevenueSegment {
                    name: item.segments[0].label.clone(),
                    revenue: amount,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    (total, segments)
}

pub(crate) fn assemble_snapshot(
    ticker: &str,
    price: PriceSnapshot,
    facts: Option<CompanyFacts>,
    ratios: BTreeMap<String, Option<f64>>,
    revenue: Option<f64>,
    segments: Vec<RevenueSegment>,
) -> MetricsSnapshot {
    let facts = facts.unwrap_or_default();
    MetricsSnapshot {
        ticker: ticker.to_string(),
        name: facts.name.unwrap_or_else(|| ticker.to_string()),
        sector: facts.sector,
        industry: facts.industry,
        price: price.price,
        market_cap: price.market_cap.or(facts.market_cap),
        day_change_percent: price.day_change_percent,
        ratios,
        revenue,
        segments,
        as_of: Utc::now(),
    }
}
