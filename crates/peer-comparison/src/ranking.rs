//! Ranking Engine
//!
//! Positions the subject against its peers on a fixed set of metrics and
//! computes peer-only averages.

use analysis_core::stats::{mean, percentile_position};
use analysis_core::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregator::{ComparisonGroup, PeerSet};

/// Metrics the subject is ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// P/E ratio; lower is better.
    Valuation,
    /// Net margin; higher is better.
    ProfitMargin,
    /// Revenue growth; higher is better.
    RevenueGrowth,
    /// Market capitalization; higher is better.
    MarketCap,
}

impl ComparisonMetric {
    /// Priority order used for ranking output and insights.
    pub const ALL: [ComparisonMetric; 4] = [
        ComparisonMetric::Valuation,
        ComparisonMetric::ProfitMargin,
        ComparisonMetric::RevenueGrowth,
        ComparisonMetric::MarketCap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComparisonMetric::Valuation => "P/E Ratio",
            ComparisonMetric::ProfitMargin => "Net Margin",
            ComparisonMetric::RevenueGrowth => "Revenue Growth",
            ComparisonMetric::MarketCap => "Market Cap",
        }
    }

    pub fn lower_is_better(&self) -> bool {
        matches!(self, ComparisonMetric::Valuation)
    }

    /// The member's value for this metric, or `None` when it fails the
    /// metric's validity filter.
    pub fn value(&self, snapshot: &MetricsSnapshot) -> Option<f64> {
        match self {
            ComparisonMetric::Valuation => snapshot.pe_ratio().filter(|v| *v > 0.0),
            ComparisonMetric::ProfitMargin => snapshot.net_margin().filter(|v| *v != 0.0),
            ComparisonMetric::RevenueGrowth => snapshot.revenue_growth().filter(|v| *v != 0.0),
            ComparisonMetric::MarketCap => snapshot.market_cap.filter(|v| v.is_finite() && *v > 0.0),
        }
    }
}

/// 1-based position of the subject among `total` valid members.
/// `rank == total == 0` means "not ranked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResult {
    pub rank: usize,
    pub total: usize,
}

impl RankingResult {
    pub const NOT_RANKED: RankingResult = RankingResult { rank: 0, total: 0 };

    pub fn is_ranked(&self) -> bool {
        self.rank > 0 && self.total > 0
    }

    pub fn is_best(&self) -> bool {
        self.is_ranked() && self.rank == 1
    }

    pub fn is_worst(&self) -> bool {
        self.is_ranked() && self.rank == self.total
    }

    /// 0-100 where 100 is best; `None` when not ranked or alone.
    pub fn percentile(&self) -> Option<f64> {
        percentile_position(self.rank, self.total)
    }
}

pub type Rankings = BTreeMap<ComparisonMetric, RankingResult>;
pub type Averages = BTreeMap<ComparisonMetric, f64>;

#[derive(Debug, Clone, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rank the subject on every tracked metric.
    pub fn rank(&self, group: &ComparisonGroup) -> Rankings {
        ComparisonMetric::ALL
            .iter()
            .map(|metric| (*metric, self.rank_metric(group, *metric)))
            .collect()
    }

    /// Rank the subject on one metric.
    ///
    /// Members failing the validity filter are left out of both rank and
    /// total. If the subject itself fails it, the result is `NOT_RANKED`.
    /// Equal values are ordered by ticker, ascending.
    pub fn rank_metric(&self, group: &ComparisonGroup, metric: ComparisonMetric) -> RankingResult {
        let Some(subject_value) = metric.value(&group.subject) else {
            return RankingResult::NOT_RANKED;
        };

        let mut valid: Vec<(&str, f64)> = group
            .members()
            .filter_map(|m| metric.value(m).map(|v| (m.ticker.as_str(), v)))
            .collect();

        valid.sort_by(|a, b| {
            let by_value = if metric.lower_is_better() {
                a.1.total_cmp(&b.1)
            } else {
                b.1.total_cmp(&a.1)
            };
            by_value.then_with(|| a.0.cmp(b.0))
        });

        let subject = group.subject.ticker.as_str();
        match valid
            .iter()
            .position(|(ticker, value)| *ticker == subject && *value == subject_value)
        {
            Some(idx) => RankingResult {
                rank: idx + 1,
                total: valid.len(),
            },
            None => RankingResult::NOT_RANKED,
        }
    }

    /// Mean of each metric over the peers only (subject excluded). Metrics
    /// with no valid peer value average to 0.
    pub fn averages(&self, peers: &PeerSet) -> Averages {
        ComparisonMetric::ALL
            .iter()
            .map(|metric| {
                let values: Vec<f64> = peers.iter().filter_map(|p| metric.value(p)).collect();
                (*metric, mean(&values))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::ratios;

    fn company(ticker: &str, cap: f64, pe: Option<f64>, margin: Option<f64>, growth: Option<f64>) -> MetricsSnapshot {
        let mut snap = MetricsSnapshot::new(ticker, format!("{} Corp", ticker)).with_market_cap(cap);
        if let Some(pe) = pe {
            snap = snap.with_ratio(ratios::PRICE_TO_EARNINGS, pe);
        }
        if let Some(m) = margin {
            snap = snap.with_ratio(ratios::NET_MARGIN, m);
        }
        if let Some(g) = growth {
            snap = snap.with_ratio(ratios::REVENUE_GROWTH, g);
        }
        snap
    }

    fn group(subject: MetricsSnapshot, peers: Vec<MetricsSnapshot>) -> ComparisonGroup {
        let peer_set = PeerSet::from_candidates(&subject.ticker, peers);
        ComparisonGroup::new(subject, peer_set)
    }

    #[test]
    fn test_valuation_lower_is_better() {
        let g = group(
            company("SUBJ", 5e9, Some(12.0), Some(0.2), Some(0.1)),
            vec![
                company("A", 1e9, Some(30.0), Some(0.1), Some(0.05)),
                company("B", 2e9, Some(18.0), Some(0.3), Some(0.2)),
            ],
        );
        let rankings = RankingEngine::new().rank(&g);

        assert_eq!(rankings[&ComparisonMetric::Valuation], RankingResult { rank: 1, total: 3 });
        assert_eq!(rankings[&ComparisonMetric::ProfitMargin], RankingResult { rank: 2, total: 3 });
        assert_eq!(rankings[&ComparisonMetric::RevenueGrowth], RankingResult { rank: 2, total: 3 });
        assert_eq!(rankings[&ComparisonMetric::MarketCap], RankingResult { rank: 1, total: 3 });
    }

    #[test]
    fn test_invalid_values_excluded_from_total() {
        let g = group(
            company("SUBJ", 5e9, Some(20.0), Some(0.1), Some(0.1)),
            vec![
                company("NEG", 1e9, Some(-4.0), Some(0.0), None),
                company("ZERO", 1e9, Some(0.0), None, Some(0.0)),
                company("OK", 1e9, Some(10.0), Some(0.05), Some(0.3)),
            ],
        );
        let engine = RankingEngine::new();
        assert_eq!(
            engine.rank_metric(&g, ComparisonMetric::Valuation),
            RankingResult { rank: 2, total: 2 }
        );
        assert_eq!(
            engine.rank_metric(&g, ComparisonMetric::ProfitMargin),
            RankingResult { rank: 1, total: 2 }
        );
        assert_eq!(
            engine.rank_metric(&g, ComparisonMetric::RevenueGrowth),
            RankingResult { rank: 2, total: 2 }
        );
    }

    #[test]
    fn test_negative_margin_is_valid_and_ranks_low() {
        let g = group(
            company("SUBJ", 5e9, None, Some(-0.15), None),
            vec![company("A", 1e9, None, Some(0.05), None)],
        );
        let result = RankingEngine::new().rank_metric(&g, ComparisonMetric::ProfitMargin);
        assert_eq!(result, RankingResult { rank: 2, total: 2 });
        assert!(result.is_worst());
    }

    #[test]
    fn test_subject_without_value_is_not_ranked() {
        let g = group(
            company("SUBJ", 5e9, None, None, None),
            vec![company("A", 1e9, Some(10.0), Some(0.1), Some(0.1))],
        );
        let rankings = RankingEngine::new().rank(&g);
        assert_eq!(rankings[&ComparisonMetric::Valuation], RankingResult::NOT_RANKED);
        assert!(!rankings[&ComparisonMetric::Valuation].is_ranked());
        assert_eq!(rankings[&ComparisonMetric::MarketCap], RankingResult { rank: 1, total: 2 });
    }

    #[test]
    fn test_ties_broken_by_ticker() {
        // Subject "MMM" ties with "AAA" and "ZZZ" on P/E.
        let g = group(
            company("MMM", 1e9, Some(15.0), None, None),
            vec![
                company("ZZZ", 1e9, Some(15.0), None, None),
                company("AAA", 1e9, Some(15.0), None, None),
            ],
        );
        let engine = RankingEngine::new();
        assert_eq!(
            engine.rank_metric(&g, ComparisonMetric::Valuation),
            RankingResult { rank: 2, total: 3 }
        );
        // Same for a higher-is-better metric.
        assert_eq!(
            engine.rank_metric(&g, ComparisonMetric::MarketCap),
            RankingResult { rank: 2, total: 3 }
        );

        // Peer order does not change the outcome.
        let reordered = group(
            company("MMM", 1e9, Some(15.0), None, None),
            vec![
                company("AAA", 1e9, Some(15.0), None, None),
                company("ZZZ", 1e9, Some(15.0), None, None),
            ],
        );
        assert_eq!(
            engine.rank_metric(&reordered, ComparisonMetric::Valuation),
            RankingResult { rank: 2, total: 3 }
        );
    }

    #[test]
    fn test_rank_never_exceeds_total() {
        let peers: Vec<MetricsSnapshot> = (0..8)
            .map(|i| {
                let v = i as f64 - 3.0;
                company(&format!("P{}", i), (i as f64) * 1e8, Some(v * 5.0), Some(v / 10.0), Some(v / 20.0))
            })
            .collect();
        for subject_pe in [-5.0, 0.0, 1.0, 12.0, 100.0] {
            let g = group(company("SUBJ", 3e8, Some(subject_pe), Some(0.01), Some(-0.02)), peers.clone());
            for (_, r) in RankingEngine::new().rank(&g) {
                if r.total > 0 {
                    assert!(r.rank >= 1 && r.rank <= r.total);
                } else {
                    assert_eq!(r.rank, 0);
                }
                assert!(r.total <= g.peers.len() + 1);
            }
        }
    }

    #[test]
    fn test_averages_exclude_subject_and_invalid() {
        let subject = company("SUBJ", 100e9, Some(100.0), Some(0.9), Some(0.9));
        let peers = PeerSet::from_candidates(
            "SUBJ",
            vec![
                company("A", 1e9, Some(10.0), Some(0.1), None),
                company("B", 3e9, Some(-5.0), Some(0.3), Some(0.2)),
                subject.clone(),
            ],
        );
        let avg = RankingEngine::new().averages(&peers);

        assert!((avg[&ComparisonMetric::Valuation] - 10.0).abs() < 1e-9);
        assert!((avg[&ComparisonMetric::ProfitMargin] - 0.2).abs() < 1e-9);
        assert!((avg[&ComparisonMetric::RevenueGrowth] - 0.2).abs() < 1e-9);
        assert!((avg[&ComparisonMetric::MarketCap] - 2e9).abs() < 1e-3);
    }

    #[test]
    fn test_averages_of_empty_peer_set_are_zero() {
        let avg = RankingEngine::new().averages(&PeerSet::default());
        assert_eq!(avg.len(), 4);
        assert!(avg.values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_percentile() {
        assert_eq!(RankingResult { rank: 1, total: 5 }.percentile(), Some(100.0));
        assert_eq!(RankingResult::NOT_RANKED.percentile(), None);
        assert_eq!(RankingResult { rank: 1, total: 1 }.percentile(), None);
    }
}
