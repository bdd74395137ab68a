//! Insight Generator
//!
//! Turns rankings into a short list of plain-language observations using
//! fixed threshold rules.

use analysis_core::MetricsSnapshot;
use serde::{Deserialize, Serialize};

use crate::ranking::{Averages, ComparisonMetric, RankingResult, Rankings};

/// Insights returned per request.
pub const MAX_INSIGHTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Favorable,
    Unfavorable,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub metric: ComparisonMetric,
    pub polarity: Polarity,
    pub text: String,
}

impl Insight {
    fn new(metric: ComparisonMetric, polarity: Polarity, text: String) -> Self {
        Self { metric, polarity, text }
    }
}

#[derive(Debug, Clone)]
pub struct InsightGenerator {
    max_insights: usize,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightGenerator {
    pub fn new() -> Self {
        Self { max_insights: MAX_INSIGHTS }
    }

    /// Evaluate the rules in priority order (valuation, profitability,
    /// growth, size) and keep the first `MAX_INSIGHTS` that fire.
    pub fn generate(&self, subject: &MetricsSnapshot, rankings: &Rankings, averages: &Averages) -> Vec<Insight> {
        ComparisonMetric::ALL
            .iter()
            .filter_map(|metric| {
                let result = rankings.get(metric).copied().unwrap_or(RankingResult::NOT_RANKED);
                // One peer or fewer is not a comparison.
                if result.total < 2 || !result.is_ranked() {
                    return None;
                }
                let value = metric.value(subject)?;
                let average = averages.get(metric).copied().unwrap_or(0.0);
                rule(*metric, &subject.name, result, value, average)
            })
            .take(self.max_insights)
            .collect()
    }
}

fn rule(metric: ComparisonMetric, name: &str, r: RankingResult, value: f64, average: f64) -> Option<Insight> {
    match metric {
        ComparisonMetric::Valuation => {
            if r.rank == 1 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} has the lowest P/E ratio in its peer group at {:.1}x, versus a peer average of {:.1}x.",
                        name, value, average
                    ),
                ))
            } else if r.rank <= 2 && r.total >= 3 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} ranks {} most attractive on valuation among {} companies, with a P/E of {:.1}x.",
                        name,
                        ordinal(r.rank),
                        r.total,
                        value
                    ),
                ))
            } else if r.rank == r.total {
                Some(Insight::new(
                    metric,
                    Polarity::Unfavorable,
                    format!(
                        "{} trades at a premium to its peers, with the highest P/E ratio in the group ({:.1}x vs. {:.1}x average).",
                        name, value, average
                    ),
                ))
            } else {
                None
            }
        }
        ComparisonMetric::ProfitMargin => {
            if r.rank == 1 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} leads its peer group in profitability with a {:.1}% net margin (peer average {:.1}%).",
                        name,
                        value * 100.0,
                        average * 100.0
                    ),
                ))
            } else if r.rank <= 2 && r.total >= 3 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} ranks {} in profitability among {} companies with a {:.1}% net margin.",
                        name,
                        ordinal(r.rank),
                        r.total,
                        value * 100.0
                    ),
                ))
            } else {
                None
            }
        }
        ComparisonMetric::RevenueGrowth => {
            if r.rank == 1 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} is growing revenue faster than any peer at {:.1}% year over year (peer average {:.1}%).",
                        name,
                        value * 100.0,
                        average * 100.0
                    ),
                ))
            } else if r.rank <= 2 && r.total >= 3 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} ranks {} for revenue growth among {} companies at {:.1}% year over year.",
                        name,
                        ordinal(r.rank),
                        r.total,
                        value * 100.0
                    ),
                ))
            } else {
                None
            }
        }
        ComparisonMetric::MarketCap => {
            if r.rank == 1 {
                Some(Insight::new(
                    metric,
                    Polarity::Favorable,
                    format!(
                        "{} is the largest company in its peer group with a market cap of {}.",
                        name,
                        format_market_cap(value)
                    ),
                ))
            } else if r.rank == r.total {
                Some(Insight::new(
                    metric,
                    Polarity::Neutral,
                    format!(
                        "{} is the smallest company in its peer group ({}), which can leave more room for growth.",
                        name,
                        format_market_cap(value)
                    ),
                ))
            } else {
                None
            }
        }
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// "$2.85T", "$412.0B", "$950.3M".
pub fn format_market_cap(value: f64) -> String {
    if value >= 1e12 {
        format!("${:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("${:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else {
        format!("${:.0}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::ratios;

    fn subject() -> MetricsSnapshot {
        MetricsSnapshot::new("ACME", "Acme Corp")
            .with_market_cap(50e9)
            .with_ratio(ratios::PRICE_TO_EARNINGS, 14.0)
            .with_ratio(ratios::NET_MARGIN, 0.22)
            .with_ratio(ratios::REVENUE_GROWTH, 0.15)
    }

    fn rankings(pairs: [(usize, usize); 4]) -> Rankings {
        ComparisonMetric::ALL
            .iter()
            .zip(pairs)
            .map(|(m, (rank, total))| (*m, RankingResult { rank, total }))
            .collect()
    }

    fn averages() -> Averages {
        ComparisonMetric::ALL.iter().map(|m| (*m, 1.0)).collect()
    }

    #[test]
    fn test_best_everywhere_truncates_to_three_in_priority_order() {
        let out = InsightGenerator::new().generate(&subject(), &rankings([(1, 5); 4]), &averages());
        assert_eq!(out.len(), 3);
        assert_eq!(
            out.iter().map(|i| i.metric).collect::<Vec<_>>(),
            vec![
                ComparisonMetric::Valuation,
                ComparisonMetric::ProfitMargin,
                ComparisonMetric::RevenueGrowth
            ]
        );
        assert!(out[0].text.contains("lowest P/E ratio"));
        assert!(out.iter().all(|i| i.polarity == Polarity::Favorable));
    }

    #[test]
    fn test_premium_valuation_is_unfavorable() {
        let out = InsightGenerator::new().generate(&subject(), &rankings([(4, 4), (3, 4), (3, 4), (2, 4)]), &averages());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metric, ComparisonMetric::Valuation);
        assert_eq!(out[0].polarity, Polarity::Unfavorable);
        assert!(out[0].text.contains("premium"));
    }

    #[test]
    fn test_second_place_needs_three_entries() {
        // rank 2 of 3 -> "2nd most attractive"
        let out = InsightGenerator::new().generate(&subject(), &rankings([(2, 3), (0, 0), (0, 0), (0, 0)]), &averages());
        assert_eq!(out.len(), 1);
        assert!(out[0].text.contains("2nd most attractive"));

        // rank 2 of 2 is the worst -> premium, not "2nd"
        let out = InsightGenerator::new().generate(&subject(), &rankings([(2, 2), (0, 0), (0, 0), (0, 0)]), &averages());
        assert_eq!(out[0].polarity, Polarity::Unfavorable);
    }

    #[test]
    fn test_single_member_rankings_are_suppressed() {
        let out = InsightGenerator::new().generate(&subject(), &rankings([(1, 1); 4]), &averages());
        assert!(out.is_empty());

        let out = InsightGenerator::new().generate(&subject(), &Rankings::new(), &Averages::new());
        assert!(out.is_empty());
    }

    #[test]
    fn test_size_rules() {
        let out = InsightGenerator::new().generate(&subject(), &rankings([(3, 5), (3, 5), (3, 5), (1, 5)]), &averages());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metric, ComparisonMetric::MarketCap);
        assert!(out[0].text.contains("largest"));
        assert!(out[0].text.contains("$50.0B"));

        let out = InsightGenerator::new().generate(&subject(), &rankings([(3, 5), (3, 5), (3, 5), (5, 5)]), &averages());
        assert_eq!(out[0].polarity, Polarity::Neutral);
        assert!(out[0].text.contains("smallest"));
    }

    #[test]
    fn test_middle_of_pack_fires_nothing() {
        let out = InsightGenerator::new().generate(&subject(), &rankings([(3, 5); 4]), &averages());
        assert!(out.is_empty());
    }

    #[test]
    fn test_ordinal_and_market_cap_format() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(format_market_cap(2.85e12), "$2.85T");
        assert_eq!(format_market_cap(950.3e6), "$950.3M");
    }
}
