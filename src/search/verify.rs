// Result verification for callers that need a found rate.

use crate::error::DropRateSearchError;
use crate::measurer::{LatencySummary, TrialMeasurer};

use super::DropRateSearch;

impl<M: TrialMeasurer> DropRateSearch<M> {
    /// Rate found by the latest search and the measurer's latency.
    ///
    /// Fails with `SearchFailed` when the latest search found no acceptable
    /// rate, and with `NoSearchResult` when no search has completed. Check
    /// `search_result()` to tell a confirmed rate from a suspicious one.
    pub fn verify_search_result(&self) -> Result<(f64, Vec<LatencySummary>), DropRateSearchError> {
        let outcome = self
            .last_outcome
            .as_ref()
            .ok_or(DropRateSearchError::NoSearchResult)?;

        match outcome.rate {
            Some(rate) if outcome.result.has_rate() => Ok((rate, self.measurer.latency()?)),
            _ => Err(DropRateSearchError::SearchFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SearchConfiguration;
    use crate::error::DropRateSearchError;
    use crate::search::{DropRateSearch, SearchResults};
    use crate::testutil::{ScriptedMeasurer, ThresholdMeasurer, DEFAULT_LATENCY};

    fn engine(threshold: f64) -> DropRateSearch<ThresholdMeasurer> {
        let mut config = SearchConfiguration::new();
        config.set_binary_convergence_threshold(0.5).unwrap();
        DropRateSearch::new(config, ThresholdMeasurer::new(threshold))
    }

    #[test]
    fn test_verify_before_search() {
        let engine = engine(32.0);
        assert!(matches!(
            engine.verify_search_result(),
            Err(DropRateSearchError::NoSearchResult)
        ));
    }

    #[test]
    fn test_verify_success_returns_rate_and_latency() {
        let mut engine = engine(32.0);
        engine.linear_search("profile").unwrap();
        let (rate, latency) = engine.verify_search_result().unwrap();
        assert_eq!(rate, 30.0);
        assert_eq!(latency, DEFAULT_LATENCY.to_vec());
    }

    #[test]
    fn test_verify_failure_raises() {
        let mut engine = engine(0.5);
        engine.linear_search("profile").unwrap();
        let err = engine.verify_search_result().unwrap_err();
        assert_eq!(err.to_string(), "Search FAILED");
    }

    #[test]
    fn test_verify_suspicious_returns_linear_rate() {
        let verdicts = [false, true, false, false, false, false];
        let mut config = SearchConfiguration::new();
        config.set_binary_convergence_threshold(0.5).unwrap();
        let mut engine = DropRateSearch::new(config, ScriptedMeasurer::new(verdicts));
        engine.combined_search("profile").unwrap();

        assert_eq!(engine.search_result(), Some(SearchResults::Suspicious));
        let (rate, _) = engine.verify_search_result().unwrap();
        assert_eq!(rate, 90.0);
    }

    #[test]
    fn test_verify_after_failed_binary() {
        let mut engine = engine(0.5);
        engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();
        assert!(matches!(
            engine.verify_search_result(),
            Err(DropRateSearchError::SearchFailed)
        ));
    }

    #[test]
    fn test_verify_after_errored_search_has_no_result() {
        let mut engine = engine(32.0);
        engine.linear_search("profile").unwrap();
        engine.config_mut().set_search_rate_start(150.0).unwrap();
        assert!(engine.linear_search("profile").is_err());
        assert!(matches!(
            engine.verify_search_result(),
            Err(DropRateSearchError::NoSearchResult)
        ));
    }
}
