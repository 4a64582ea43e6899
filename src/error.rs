use crate::config::SearchDirection;

#[derive(Debug, thiserror::Error)]
pub enum DropRateSearchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unsupported search direction: {0}")]
    UnsupportedDirection(SearchDirection),
    #[error("Invalid search range: {0}")]
    InvalidSearchRange(String),
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),
    #[error("Linear search FAILED")]
    LinearSearchFailed,
    #[error("Search FAILED")]
    SearchFailed,
    #[error("No search has been run")]
    NoSearchResult,
    #[error("Trial measurement failed: {0}")]
    MeasurerError(#[from] anyhow::Error),
}
