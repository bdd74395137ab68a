//! Relief-from-royalty valuation of intangible assets per revenue segment.

use analysis_core::stats::annuity_factor;
use analysis_core::{MetricsSnapshot, RevenueSegment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpValuationParams {
    pub tax_rate: f64,
    pub discount_rate: f64,
    /// Years of protection the royalty stream is assumed to last.
    pub protection_years: u32,
}

impl Default for IpValuationParams {
    fn default() -> Self {
        Self {
            tax_rate: 0.21,
            discount_rate: 0.10,
            protection_years: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IpCategory {
    Patent,
    Trademark,
    TradeSecret,
    Technology,
}

/// Royalty bucket a segment falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndustryBucket {
    Software,
    Semiconductor,
    #[serde(rename = "Consumer Electronics")]
    ConsumerElectronics,
    Pharmaceutical,
    Technology,
}

const SOFTWARE_KEYWORDS: &[&str] = &["software", "cloud", "saas", "subscription", "licens", "productivity"];
const SEMICONDUCTOR_KEYWORDS: &[&str] = &["semiconductor", "chip", "data center", "gpu", "processor", "foundry", "wafer"];
const CONSUMER_ELECTRONICS_KEYWORDS: &[&str] = &[
    "iphone", "ipad", "mac ", "macbook", "wearable", "device", "hardware", "electronic", "phone", "console", "television",
];
const PHARMACEUTICAL_KEYWORDS: &[&str] = &[
    "pharma", "drug", "oncology", "vaccine", "biolog", "therapeut", "medic", "immunology",
];

impl IndustryBucket {
    /// Keyword match at word starts, case-insensitive. A keyword with a
    /// trailing space must match a whole word. Buckets are checked in order
    /// Software, Semiconductor, Pharmaceutical, ConsumerElectronics; anything
    /// unmatched is `Technology`.
    pub fn classify(segment_name: &str) -> Self {
        let normalized = format!(
            " {} ",
            segment_name
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let matches = |keywords: &[&str]| keywords.iter().any(|k| normalized.contains(&format!(" {}", k)));

        if matches(SOFTWARE_KEYWORDS) {
            IndustryBucket::Software
        } else if matches(SEMICONDUCTOR_KEYWORDS) {
            IndustryBucket::Semiconductor
        } else if matches(PHARMACEUTICAL_KEYWORDS) {
            IndustryBucket::Pharmaceutical
        } else if matches(CONSUMER_ELECTRONICS_KEYWORDS) {
            IndustryBucket::ConsumerElectronics
        } else {
            IndustryBucket::Technology
        }
    }

    pub fn royalty_rate(&self) -> f64 {
        match self {
            IndustryBucket::Software => 0.10,
            IndustryBucket::Semiconductor => 0.08,
            IndustryBucket::ConsumerElectronics => 0.03,
            IndustryBucket::Pharmaceutical => 0.15,
            IndustryBucket::Technology => 0.05,
        }
    }

    pub fn ip_category(&self) -> IpCategory {
        match self {
            IndustryBucket::Software => IpCategory::TradeSecret,
            IndustryBucket::Semiconductor | IndustryBucket::Pharmaceutical => IpCategory::Patent,
            IndustryBucket::ConsumerElectronics => IpCategory::Trademark,
            IndustryBucket::Technology => IpCategory::Technology,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAsset {
    pub segment: String,
    pub segment_revenue: f64,
    pub bucket: IndustryBucket,
    pub category: IpCategory,
    pub royalty_rate: f64,
    /// Segment revenue ÷ total revenue.
    pub attribution: f64,
    pub present_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpValuation {
    pub assets: Vec<IpAsset>,
    pub total_value: f64,
    /// `None` when market cap is zero or negative.
    pub percent_of_market_cap: Option<f64>,
    pub annuity_factor: f64,
    /// Segment with the highest present value.
    pub largest_asset: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IpValuationEngine {
    params: IpValuationParams,
}

impl IpValuationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: IpValuationParams) -> Self {
        Self { params }
    }

    /// Present-value factor for the configured discount rate and life.
    pub fn annuity_factor(&self) -> f64 {
        annuity_factor(self.params.discount_rate, self.params.protection_years)
    }

    /// After-tax royalty stream on `revenue`, discounted over the protection life.
    pub fn royalty_value(&self, revenue: f64, royalty_rate: f64) -> f64 {
        revenue * royalty_rate * (1.0 - self.params.tax_rate) * self.annuity_factor()
    }

    pub fn value_intangibles(&self, segments: &[RevenueSegment], total_revenue: f64, market_cap: f64) -> IpValuation {
        let factor = self.annuity_factor();

        let assets: Vec<IpAsset> = segments
            .iter()
            .map(|segment| {
                // Negative or non-finite segment revenue contributes nothing.
                let revenue = if segment.revenue.is_finite() { segment.revenue.max(0.0) } else { 0.0 };
                let bucket = IndustryBucket::classify(&segment.name);
                let royalty_rate = bucket.royalty_rate();
                let attribution = if total_revenue > 0.0 { revenue / total_revenue } else { 0.0 };

                if bucket == IndustryBucket::Technology {
                    tracing::debug!("Segment '{}' matched no bucket, using Technology", segment.name);
                }

                IpAsset {
                    segment: segment.name.clone(),
                    segment_revenue: revenue,
                    bucket,
                    category: bucket.ip_category(),
                    royalty_rate,
                    attribution,
                    present_value: self.royalty_value(revenue, royalty_rate),
                }
            })
            .collect();

        let total_value: f64 = assets.iter().map(|a| a.present_value).sum();
        let percent_of_market_cap = (market_cap > 0.0).then(|| total_value / market_cap * 100.0);
        let largest_asset = assets
            .iter()
            .filter(|a| a.present_value > 0.0)
            .max_by(|a, b| a.present_value.total_cmp(&b.present_value))
            .map(|a| a.segment.clone());

        IpValuation {
            assets,
            total_value,
            percent_of_market_cap,
            annuity_factor: factor,
            largest_asset,
        }
    }

    /// Value a company's reported segments. Total revenue falls back to the
    /// sum of segments when the snapshot has none.
    pub fn value_company(&self, snapshot: &MetricsSnapshot) -> IpValuation {
        let segment_sum: f64 = snapshot.segments.iter().map(|s| s.revenue.max(0.0)).sum();
        let total_revenue = snapshot
            .revenue
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(segment_sum);
        self.value_intangibles(&snapshot.segments, total_revenue, snapshot.market_cap.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(name: &str, revenue: f64) -> RevenueSegment {
        RevenueSegment { name: name.to_string(), revenue }
    }

    #[test]
    fn test_annuity_factor_at_defaults() {
        assert!((IpValuationEngine::new().annuity_factor() - 7.6061).abs() < 1e-4);
    }

    #[test]
    fn test_hundred_million_segment_at_five_percent() {
        let engine = IpValuationEngine::new();
        let value = engine.royalty_value(100_000_000.0, 0.05);
        assert!((value - 30_044_000.0).abs() < 10_000.0, "got {}", value);

        // "Other" matches no bucket and gets the 5% Technology rate.
        let result = engine.value_intangibles(&[seg("Other", 100_000_000.0)], 100_000_000.0, 1e9);
        assert_eq!(result.assets[0].bucket, IndustryBucket::Technology);
        assert!((result.total_value - value).abs() < 1e-6);
        assert!((result.percent_of_market_cap.unwrap() - value / 1e9 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification() {
        assert_eq!(IndustryBucket::classify("Intelligent Cloud"), IndustryBucket::Software);
        assert_eq!(IndustryBucket::classify("Data Center"), IndustryBucket::Semiconductor);
        assert_eq!(IndustryBucket::classify("iPhone"), IndustryBucket::ConsumerElectronics);
        assert_eq!(IndustryBucket::classify("Mac"), IndustryBucket::ConsumerElectronics);
        assert_eq!(IndustryBucket::classify("Pharmaceuticals"), IndustryBucket::Pharmaceutical);
        assert_eq!(IndustryBucket::classify("ONCOLOGY"), IndustryBucket::Pharmaceutical);
        assert_eq!(IndustryBucket::classify("Services"), IndustryBucket::Technology);
        assert_eq!(IndustryBucket::classify(""), IndustryBucket::Technology);
    }

    #[test]
    fn test_classification_ignores_word_prefix_collisions() {
        assert_eq!(IndustryBucket::classify("Machine Learning"), IndustryBucket::Technology);
        assert_eq!(IndustryBucket::classify("Machinery"), IndustryBucket::Technology);
        assert_eq!(IndustryBucket::classify("Medical Devices"), IndustryBucket::Pharmaceutical);
        assert_eq!(IndustryBucket::classify("MacBook Pro"), IndustryBucket::ConsumerElectronics);
        assert_eq!(IndustryBucket::classify("Mac and iPad"), IndustryBucket::ConsumerElectronics);
        assert_eq!(IndustryBucket::classify("Wearables, Home and Accessories"), IndustryBucket::ConsumerElectronics);
    }

    #[test]
    fn test_royalty_rates_in_range() {
        for bucket in [
            IndustryBucket::Software,
            IndustryBucket::Semiconductor,
            IndustryBucket::ConsumerElectronics,
            IndustryBucket::Pharmaceutical,
            IndustryBucket::Technology,
        ] {
            let rate = bucket.royalty_rate();
            assert!((0.02..=0.15).contains(&rate));
        }
    }

    #[test]
    fn test_attribution_sums_to_at_most_one() {
        let engine = IpValuationEngine::new();
        let segments = vec![seg("iPhone", 200.0), seg("Mac", 30.0), seg("Services", 70.0)];

        let exact = engine.value_intangibles(&segments, 300.0, 1_000.0);
        let sum: f64 = exact.assets.iter().map(|a| a.attribution).sum();
        assert!((sum - 1.0).abs() < 1e-12);

        let partial = engine.value_intangibles(&segments, 400.0, 1_000.0);
        let sum: f64 = partial.assets.iter().map(|a| a.attribution).sum();
        assert!(sum <= 1.0 + 1e-12);
        assert_eq!(partial.largest_asset.as_deref(), Some("iPhone"));
    }

    #[test]
    fn test_total_value_monotonic_in_segment_revenue() {
        let engine = IpValuationEngine::new();
        let mut previous = -1.0;
        for revenue in [-50.0, 0.0, 10.0, 1_000.0, 1e9] {
            let segments = vec![seg("Software", revenue), seg("Other", 500.0)];
            let total = engine.value_intangibles(&segments, 1e10, 1e12).total_value;
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        let engine = IpValuationEngine::new();

        let result = engine.value_intangibles(&[seg("Software", 100.0)], 0.0, 0.0);
        assert_eq!(result.assets[0].attribution, 0.0);
        assert_eq!(result.percent_of_market_cap, None);
        assert!(result.total_value > 0.0);

        let result = engine.value_intangibles(&[], 100.0, -1.0);
        assert!(result.assets.is_empty());
        assert_eq!(result.total_value, 0.0);
        assert_eq!(result.largest_asset, None);
        assert_eq!(result.percent_of_market_cap, None);
    }

    #[test]
    fn test_value_company_falls_back_to_segment_sum() {
        let snap = MetricsSnapshot::new("ACME", "Acme")
            .with_market_cap(1e9)
            .with_revenue(0.0, vec![seg("Software", 60.0), seg("Hardware", 40.0)]);
        let result = IpValuationEngine::new().value_company(&snap);
        assert!((result.assets[0].attribution - 0.6).abs() < 1e-12);
        assert!((result.assets[1].attribution - 0.4).abs() < 1e-12);
        assert_eq!(result.assets[1].category, IpCategory::Trademark);
    }

    #[test]
    fn test_injected_params() {
        let engine = IpValuationEngine::with_params(IpValuationParams {
            tax_rate: 0.0,
            discount_rate: 0.0,
            protection_years: 10,
        });
        assert_eq!(engine.annuity_factor(), 10.0);
        assert!((engine.royalty_value(1_000.0, 0.05) - 500.0).abs() < 1e-9);
    }
}
