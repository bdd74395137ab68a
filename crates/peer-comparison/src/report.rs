//! Peer comparison output assembled for the rendering layer.

use analysis_core::MetricsSnapshot;
use serde::{Deserialize, Serialize};

use crate::aggregator::ComparisonGroup;
use crate::insights::{Insight, InsightGenerator};
use crate::ranking::{Averages, RankingEngine, Rankings};
use crate::resolver::PeerSource;

/// One table row per company in the comparison, subject first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRow {
    pub ticker: String,
    pub name: String,
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub net_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub is_subject: bool,
}

impl PeerRow {
    pub fn from_snapshot(snapshot: &MetricsSnapshot, is_subject: bool) -> Self {
        Self {
            ticker: snapshot.ticker.clone(),
            name: snapshot.name.clone(),
            market_cap: snapshot.market_cap,
            price: snapshot.price,
            pe_ratio: snapshot.pe_ratio(),
            net_margin: snapshot.net_margin(),
            revenue_growth: snapshot.revenue_growth(),
            is_subject,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    pub ticker: String,
    pub peer_source: PeerSource,
    pub rankings: Rankings,
    pub averages: Averages,
    pub insights: Vec<Insight>,
    pub peer_rows: Vec<PeerRow>,
}

impl PeerComparison {
    /// Insight sentences only, in priority order.
    pub fn insight_texts(&self) -> Vec<&str> {
        self.insights.iter().map(|i| i.text.as_str()).collect()
    }
}

/// Rank, average and describe one comparison group. Pure.
pub fn compare_group(group: &ComparisonGroup, peer_source: PeerSource) -> PeerComparison {
    let engine = RankingEngine::new();
    let rankings = engine.rank(group);
    let averages = engine.averages(&group.peers);
    let insights = InsightGenerator::new().generate(&group.subject, &rankings, &averages);

    let peer_rows = group
        .members()
        .enumerate()
        .map(|(i, snap)| PeerRow::from_snapshot(snap, i == 0))
        .collect();

    PeerComparison {
        ticker: group.subject.ticker.clone(),
        peer_source,
        rankings,
        averages,
        insights,
        peer_rows,
    }
}
