use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The provider has nothing for this ticker (null / 404 / empty record).
    #[error("No data available for {0}")]
    NoData(String),

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AnalysisError {
    /// True when the failure means "nothing to show" rather than a fault.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AnalysisError::NoData(_))
    }
}
