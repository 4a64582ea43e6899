// Binary search: bisect [b_min, b_max] until successive candidates converge.

use crate::error::DropRateSearchError;
use crate::measurer::TrialMeasurer;

use super::{DropRateSearch, SearchOutcome, SearchPhase, SearchResults, TrialReport};

/// Accumulator threaded through the bisection steps of one run.
#[derive(Debug, Default)]
struct BinaryRunState {
    last_binary_rate: f64,
    result_rate: Option<f64>,
}

impl<M: TrialMeasurer> DropRateSearch<M> {
    /// Binary search over `[b_min, b_max]`.
    ///
    /// Unless `skip_max_rate` is set the first candidate is `b_max` itself, so
    /// an acceptable ceiling finishes the search right away. Every later
    /// candidate is the interval midpoint and skips the warm-up. The search
    /// stops once a candidate lies closer than `binary_convergence_threshold`
    /// to the previous one; it is a `Success` if any candidate passed.
    pub fn binary_search(
        &mut self,
        b_min: f64,
        b_max: f64,
        traffic_profile: &str,
        skip_max_rate: bool,
        skip_warmup: bool,
    ) -> Result<SearchOutcome, DropRateSearchError> {
        self.last_outcome = None;
        let mut trials = Vec::new();
        let (result, rate) = self.run_binary(
            b_min,
            b_max,
            traffic_profile,
            skip_max_rate,
            skip_warmup,
            &mut trials,
        )?;
        Ok(self.finish(
            "binary",
            SearchOutcome {
                result,
                rate,
                trials,
            },
        ))
    }

    pub(crate) fn run_binary(
        &mut self,
        b_min: f64,
        b_max: f64,
        traffic_profile: &str,
        mut skip_max_rate: bool,
        mut skip_warmup: bool,
        trials: &mut Vec<TrialReport>,
    ) -> Result<(SearchResults, Option<f64>), DropRateSearchError> {
        self.check_config()?;
        self.check_binary_range(b_min, b_max)?;

        let threshold = self.config.binary_convergence_threshold();
        let mut state = BinaryRunState::default();
        let (mut low, mut high) = (b_min, b_max);

        loop {
            let rate = if skip_max_rate {
                low + (high - low) / 2.0
            } else {
                high
            };

            if (state.last_binary_rate - rate).abs() < threshold {
                let result = if state.result_rate.is_some() {
                    SearchResults::Success
                } else {
                    SearchResults::Failure
                };
                return Ok((result, state.result_rate));
            }

            state.last_binary_rate = rate;
            if self.measure_at(rate, traffic_profile, skip_warmup, SearchPhase::Binary, trials)? {
                state.result_rate = Some(rate);
                low = rate;
            } else {
                high = rate;
            }

            // refinement steps never re-probe the ceiling or repeat the warm-up
            skip_max_rate = true;
            skip_warmup = true;
        }
    }

    fn check_binary_range(&self, b_min: f64, b_max: f64) -> Result<(), DropRateSearchError> {
        if !self.config.contains_rate(b_min) {
            return Err(DropRateSearchError::InvalidSearchRange(format!(
                "Min rate {} is not in min,max range",
                b_min
            )));
        }
        if !self.config.contains_rate(b_max) {
            return Err(DropRateSearchError::InvalidSearchRange(format!(
                "Max rate {} is not in min,max range",
                b_max
            )));
        }
        if b_max < b_min {
            return Err(DropRateSearchError::InvalidSearchRange(format!(
                "Min rate {} is greater than max rate {}",
                b_min, b_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SearchConfiguration;
    use crate::error::DropRateSearchError;
    use crate::search::{DropRateSearch, SearchPhase, SearchResults};
    use crate::testutil::{FailingMeasurer, ThresholdMeasurer};
    use proptest::prelude::*;

    fn engine(threshold: f64, convergence: f64) -> DropRateSearch<ThresholdMeasurer> {
        let mut config = SearchConfiguration::new();
        config.set_search_rate_boundaries(100.0, 1.0).unwrap();
        config.set_binary_convergence_threshold(convergence).unwrap();
        DropRateSearch::new(config, ThresholdMeasurer::new(threshold))
    }

    #[test]
    fn test_converges_below_threshold_rate() {
        let mut engine = engine(32.0, 0.5);
        let outcome = engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();

        assert_eq!(outcome.result, SearchResults::Success);
        assert_eq!(outcome.rate, Some(31.9375));
        assert_eq!(outcome.trials.len(), 8);
        assert!(outcome.trials.iter().all(|t| t.phase == SearchPhase::Binary));
    }

    #[test]
    fn test_first_probe_is_ceiling_unless_skipped() {
        let mut engine = engine(32.0, 0.5);
        let probed = engine
            .binary_search(1.0, 100.0, "profile", false, false)
            .unwrap()
            .probed_rates();
        assert_eq!(probed[0], 100.0);
        assert_eq!(probed[1], 50.5);

        let probed = engine
            .binary_search(1.0, 100.0, "profile", true, false)
            .unwrap()
            .probed_rates();
        assert_eq!(probed[0], 50.5);
        assert!(!probed.contains(&100.0));
    }

    #[test]
    fn test_acceptable_ceiling_short_circuits() {
        let mut engine = engine(150.0, 0.5);
        let outcome = engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();
        assert_eq!(outcome.result, SearchResults::Success);
        assert_eq!(outcome.rate, Some(100.0));
        assert_eq!(outcome.trials.len(), 1);
    }

    #[test]
    fn test_only_first_probe_may_warm_up() {
        let mut engine = engine(32.0, 0.5);
        engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();
        let probes = engine.measurer().probes();
        assert!(!probes[0].skip_warmup);
        assert!(probes[1..].iter().all(|p| p.skip_warmup));
    }

    #[test]
    fn test_caller_can_skip_first_warmup() {
        let mut engine = engine(32.0, 0.5);
        engine.binary_search(1.0, 100.0, "profile", false, true).unwrap();
        assert!(engine.measurer().probes().iter().all(|p| p.skip_warmup));
    }

    #[test]
    fn test_nothing_acceptable_is_failure() {
        let mut engine = engine(0.5, 0.5);
        let outcome = engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();
        assert_eq!(outcome.result, SearchResults::Failure);
        assert_eq!(outcome.rate, None);
        assert_eq!(engine.search_result(), Some(SearchResults::Failure));
    }

    #[test]
    fn test_degenerate_interval() {
        let mut engine = engine(50.0, 0.5);
        let outcome = engine.binary_search(40.0, 40.0, "profile", true, false).unwrap();
        assert_eq!(outcome.result, SearchResults::Success);
        assert_eq!(outcome.rate, Some(40.0));
        assert_eq!(outcome.trials.len(), 1);
    }

    #[test]
    fn test_first_candidate_within_threshold_of_zero_stops_immediately() {
        let mut engine = engine(50.0, 5000.0);
        let outcome = engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();
        assert_eq!(outcome.result, SearchResults::Failure);
        assert!(outcome.trials.is_empty());
    }

    #[test]
    fn test_range_validation() {
        let mut engine = engine(50.0, 0.5);
        assert!(matches!(
            engine.binary_search(0.5, 100.0, "profile", false, false),
            Err(DropRateSearchError::InvalidSearchRange(_))
        ));
        assert!(matches!(
            engine.binary_search(1.0, 101.0, "profile", false, false),
            Err(DropRateSearchError::InvalidSearchRange(_))
        ));
        let err = engine.binary_search(60.0, 40.0, "profile", false, false).unwrap_err();
        assert!(err.to_string().contains("greater than max rate"));
        assert!(engine.measurer().probes().is_empty());
    }

    #[test]
    fn test_measurer_error_propagates() {
        let mut config = SearchConfiguration::new();
        config.set_binary_convergence_threshold(0.5).unwrap();
        let mut engine = DropRateSearch::new(config, FailingMeasurer::new("trex crashed"));
        let err = engine.binary_search(1.0, 100.0, "profile", false, false).unwrap_err();
        assert!(matches!(err, DropRateSearchError::MeasurerError(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// The result never exceeds the acceptance threshold and lies within
        /// twice the convergence threshold below it; the number of steps stays
        /// logarithmic in the range width.
        #[test]
        fn prop_converges_near_threshold(
            threshold in 3.0f64..99.0,
            convergence in 0.1f64..1.0,
        ) {
            let mut engine = engine(threshold, convergence);
            let outcome = engine.binary_search(1.0, 100.0, "profile", false, false).unwrap();

            prop_assert_eq!(outcome.result, SearchResults::Success);
            let rate = outcome.rate.unwrap();
            prop_assert!(rate <= threshold);
            prop_assert!(threshold - rate < 2.0 * convergence);
            let max_steps = (99.0 / convergence).log2().ceil() as usize + 3;
            prop_assert!(outcome.trials.len() <= max_steps);
        }

        /// Every candidate stays inside the requested interval.
        #[test]
        fn prop_candidates_stay_in_interval(
            low in 1.0f64..50.0,
            width in 0.0f64..50.0,
            threshold in 0.0f64..120.0,
            skip_max_rate in any::<bool>(),
        ) {
            let high = low + width;
            let mut engine = engine(threshold, 0.25);
            let outcome = engine.binary_search(low, high, "profile", skip_max_rate, false).unwrap();
            for rate in outcome.probed_rates() {
                prop_assert!(low <= rate && rate <= high);
            }
        }
    }
}
