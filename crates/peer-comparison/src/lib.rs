//! Peer comparison pipeline: resolve peers, fetch them, rank the subject and
//! describe the result.

pub mod aggregator;
pub mod insights;
pub mod ranking;
pub mod report;
pub mod resolver;

pub use aggregator::{AggregatorConfig, ComparisonGroup, PeerAggregator, PeerSet};
pub use insights::{Insight, InsightGenerator, Polarity};
pub use ranking::{Averages, ComparisonMetric, RankingEngine, RankingResult, Rankings};
pub use report::{compare_group, PeerComparison, PeerRow};
pub use resolver::{PeerResolution, PeerResolver, PeerSource, PeerUniverse};
