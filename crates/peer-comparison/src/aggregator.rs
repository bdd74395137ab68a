//! Peer Aggregator
//!
//! Fetches peer snapshots concurrently through a bounded worker pool and
//! assembles a `PeerSet`. Individual failures are dropped, never propagated.

use analysis_core::{AnalysisError, MetricsProvider, MetricsSnapshot};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Worker pool bound and per-fetch timeout for peer lookups.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub max_concurrency: usize,
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Peers of one subject: no duplicates, never the subject, market cap > 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeerSet {
    peers: Vec<MetricsSnapshot>,
}

impl PeerSet {
    /// Build a peer set from raw candidates, keeping input order and dropping
    /// the subject, repeated tickers and records without a usable market cap.
    pub fn from_candidates<I>(subject_ticker: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = MetricsSnapshot>,
    {
        let subject = subject_ticker.trim().to_uppercase();
        let mut seen = HashSet::new();
        let peers = candidates
            .into_iter()
            .filter(|snap| {
                let ticker = snap.ticker.trim().to_uppercase();
                if ticker == subject || !snap.has_usable_market_cap() {
                    return false;
                }
                seen.insert(ticker)
            })
            .collect();
        Self { peers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricsSnapshot> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.peers.iter().map(|p| p.ticker.as_str()).collect()
    }

    pub fn as_slice(&self) -> &[MetricsSnapshot] {
        &self.peers
    }
}

/// Subject plus its peers; the unit every ranking is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonGroup {
    pub subject: MetricsSnapshot,
    pub peers: PeerSet,
}

impl ComparisonGroup {
    pub fn new(subject: MetricsSnapshot, peers: PeerSet) -> Self {
        // Re-filter against this subject in case the set was built for another.
        let peers = PeerSet::from_candidates(&subject.ticker, peers.peers);
        Self { subject, peers }
    }

    /// Subject first, then peers in order.
    pub fn members(&self) -> impl Iterator<Item = &MetricsSnapshot> {
        std::iter::once(&self.subject).chain(self.peers.iter())
    }
}

pub struct PeerAggregator {
    provider: Arc<dyn MetricsProvider>,
    config: AggregatorConfig,
}

impl PeerAggregator {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self::with_config(provider, AggregatorConfig::default())
    }

    pub fn with_config(provider: Arc<dyn MetricsProvider>, config: AggregatorConfig) -> Self {
        Self { provider, config }
    }

    /// Fetch every peer concurrently and wait for all of them to settle.
    ///
    /// The subject and repeated tickers are removed before any call is made.
    /// An empty result is valid.
    pub async fn aggregate(&self, subject_ticker: &str, peer_tickers: &[String]) -> PeerSet {
        let candidates = unique_candidates(subject_ticker, peer_tickers);
        if candidates.is_empty() {
            return PeerSet::default();
        }

        tracing::debug!(
            "Fetching {} peers for {} (concurrency {}, timeout {:?})",
            candidates.len(),
            subject_ticker,
            self.config.max_concurrency,
            self.config.fetch_timeout
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (slot, ticker) in candidates.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let fetch_timeout = self.config.fetch_timeout;

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (slot, ticker, Err(AnalysisError::Unknown("worker pool closed".to_string())));
                    }
                };
                let result = match tokio::time::timeout(fetch_timeout, provider.get_metrics(&ticker)).await {
                    Ok(result) => result,
                    Err(_) => Err(AnalysisError::Timeout(ticker.clone())),
                };
                (slot, ticker, result)
            });
        }

        // Each task owns one slot; assembly happens after every slot settles.
        let mut slots: Vec<Option<MetricsSnapshot>> = vec![None; candidates.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, ticker, Ok(snapshot))) => {
                    if snapshot.has_usable_market_cap() {
                        slots[slot] = Some(snapshot);
                    } else {
                        tracing::debug!("Dropping peer {}: no usable market cap", ticker);
                    }
                }
                Ok((_, ticker, Err(e))) => {
                    tracing::warn!("Dropping peer {}: {}", ticker, e);
                }
                Err(e) => {
                    tracing::error!("Peer fetch task error: {}", e);
                }
            }
        }

        let peer_set = PeerSet::from_candidates(subject_ticker, slots.into_iter().flatten());
        tracing::info!(
            "Aggregated {}/{} peers for {}",
            peer_set.len(),
            candidates.len(),
            subject_ticker
        );
        peer_set
    }
}

fn unique_candidates(subject_ticker: &str, peer_tickers: &[String]) -> Vec<String> {
    let subject = subject_ticker.trim().to_uppercase();
    let mut seen = HashSet::new();
    peer_tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty() && *t != subject)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
