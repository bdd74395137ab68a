use analysis_core::{normalize_ticker, AnalysisError, MetricsProvider, MetricsSnapshot};
use fundamental_analysis::{IpValuation, IpValuationEngine, ValuationScore, ValuationScorer};
use peer_comparison::{compare_group, ComparisonGroup, PeerAggregator, PeerComparison, PeerResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub use config::EngineConfig;

/// All three analyses for one company, sharing a single subject fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    pub ticker: String,
    pub name: String,
    pub comparison: PeerComparison,
    pub valuation: ValuationScore,
    pub ip_valuation: IpValuation,
}

pub struct ComparativeAnalyticsEngine {
    provider: Arc<dyn MetricsProvider>,
    resolver: PeerResolver,
    aggregator: PeerAggregator,
    scorer: ValuationScorer,
    ip_engine: IpValuationEngine,
    subject_timeout: Duration,
}

impl ComparativeAnalyticsEngine {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self::with_config(provider, EngineConfig::default())
    }

    pub fn with_config(provider: Arc<dyn MetricsProvider>, config: EngineConfig) -> Self {
        Self {
            resolver: PeerResolver::new(config.peer_limit),
            aggregator: PeerAggregator::with_config(provider.clone(), config.aggregator.clone()),
            scorer: ValuationScorer::with_params(config.valuation),
            ip_engine: IpValuationEngine::with_params(config.ip),
            subject_timeout: config.aggregator.fetch_timeout,
            provider,
        }
    }

    /// Fetch the subject. Unlike peer lookups, failure here aborts the analysis.
    pub async fn fetch_subject(&self, raw_ticker: &str) -> Result<MetricsSnapshot, AnalysisError> {
        let ticker = normalize_ticker(raw_ticker)?;

        match tokio::time::timeout(self.subject_timeout, self.provider.get_metrics(&ticker)).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => {
                tracing::warn!("Subject {} unavailable: {}", ticker, e);
                Err(e)
            }
            Err(_) => {
                tracing::warn!("Subject {} fetch timed out after {:?}", ticker, self.subject_timeout);
                Err(AnalysisError::Timeout(ticker))
            }
        }
    }

    /// Rank `ticker` against its resolved peers.
    pub async fn compare(&self, ticker: &str) -> Result<PeerComparison, AnalysisError> {
        let subject = self.fetch_subject(ticker).await?;
        Ok(self.compare_snapshot(subject).await)
    }

    /// Peer comparison for a subject that has already been fetched.
    pub async fn compare_snapshot(&self, subject: MetricsSnapshot) -> PeerComparison {
        let resolution = self.resolver.resolve_detailed(
            &subject.ticker,
            subject.industry.as_deref(),
            subject.sector.as_deref(),
        );
        tracing::info!(
            "Comparing {} against {} candidate peers ({:?})",
            subject.ticker,
            resolution.peers.len(),
            resolution.source
        );

        let peers = self.aggregator.aggregate(&subject.ticker, &resolution.peers).await;
        if peers.is_empty() {
            tracing::warn!("No usable peers for {}; rankings will be empty", subject.ticker);
        }

        let group = ComparisonGroup::new(subject, peers);
        compare_group(&group, resolution.source)
    }

    pub async fn valuation_score(&self, ticker: &str) -> Result<ValuationScore, AnalysisError> {
        let subject = self.fetch_subject(ticker).await?;
        Ok(self.scorer.score(&subject))
    }

    pub async fn ip_valuation(&self, ticker: &str) -> Result<IpValuation, AnalysisError> {
        let subject = self.fetch_subject(ticker).await?;
        Ok(self.ip_engine.value_company(&subject))
    }

    /// Run comparison, valuation score and IP valuation off one subject fetch.
    pub async fn full_report(&self, ticker: &str) -> Result<CompanyReport, AnalysisError> {
        let subject = self.fetch_subject(ticker).await?;
        let valuation = self.scorer.score(&subject);
        let ip_valuation = self.ip_engine.value_company(&subject);
        let ticker = subject.ticker.clone();
        let name = subject.name.clone();
        let comparison = self.compare_snapshot(subject).await;

        tracing::info!(
            "Report for {}: {} peers, valuation {} ({:.0}%), IP value {:.0}",
            ticker,
            comparison.peer_rows.len().saturating_sub(1),
            valuation.verdict,
            valuation.percentage,
            ip_valuation.total_value
        );

        Ok(CompanyReport {
            ticker,
            name,
            comparison,
            valuation,
            ip_valuation,
        })
    }
}
