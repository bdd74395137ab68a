use async_trait::async_trait;
use crate::{AnalysisError, MetricsSnapshot};

/// Source of per-company metric snapshots.
///
/// Implementations return `AnalysisError::NoData` when the provider has no
/// record for the ticker; any other error is a transport or decoding fault.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn get_metrics(&self, ticker: &str) -> Result<MetricsSnapshot, AnalysisError>;
}
