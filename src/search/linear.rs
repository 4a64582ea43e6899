// Linear search: sweep from rate_start in fixed steps until a rate passes.

use crate::config::SearchDirection;
use crate::error::DropRateSearchError;
use crate::measurer::TrialMeasurer;

use super::{DropRateSearch, SearchOutcome, SearchPhase, SearchResults, TrialReport};

impl<M: TrialMeasurer> DropRateSearch<M> {
    /// Linear search starting at the configured `rate_start`.
    ///
    /// Top-down: every rejected rate is lowered by `rate_linear_step`; the first
    /// accepted rate is the result. When the next step would drop below
    /// `rate_min`, `rate_min` itself is tried once before giving up with
    /// `Failure`.
    pub fn linear_search(
        &mut self,
        traffic_profile: &str,
    ) -> Result<SearchOutcome, DropRateSearchError> {
        self.last_outcome = None;
        let mut trials = Vec::new();
        let (result, rate) = self.run_linear(traffic_profile, &mut trials)?;
        Ok(self.finish(
            "linear",
            SearchOutcome {
                result,
                rate,
                trials,
            },
        ))
    }

    pub(crate) fn run_linear(
        &mut self,
        traffic_profile: &str,
        trials: &mut Vec<TrialReport>,
    ) -> Result<(SearchResults, Option<f64>), DropRateSearchError> {
        self.check_config()?;
        let start_rate = self.config.rate_start();
        if !self.config.contains_rate(start_rate) {
            return Err(DropRateSearchError::InvalidSearchRange(format!(
                "Start rate {} is not in min,max range [{}, {}]",
                start_rate,
                self.config.rate_min(),
                self.config.rate_max()
            )));
        }

        match self.config.search_linear_direction() {
            SearchDirection::TopDown => self.linear_top_down(start_rate, traffic_profile, trials),
            direction @ SearchDirection::BottomUp => {
                Err(DropRateSearchError::UnsupportedDirection(direction))
            }
        }
    }

    fn linear_top_down(
        &mut self,
        start_rate: f64,
        traffic_profile: &str,
        trials: &mut Vec<TrialReport>,
    ) -> Result<(SearchResults, Option<f64>), DropRateSearchError> {
        let rate_min = self.config.rate_min();
        let step = self.config.rate_linear_step();
        let mut rate = start_rate;

        loop {
            if self.measure_at(rate, traffic_profile, false, SearchPhase::Linear, trials)? {
                return Ok((SearchResults::Success, Some(rate)));
            }

            let prev_rate = rate;
            rate -= step;
            if rate == prev_rate {
                return Err(DropRateSearchError::ConfigError(format!(
                    "linear step {} is too small to lower rate {}",
                    step, prev_rate
                )));
            }
            if rate < rate_min {
                // rate_min is only ever assigned verbatim, so exact comparison
                // tells whether the floor has been tried already.
                if prev_rate != rate_min {
                    rate = rate_min;
                } else {
                    return Ok((SearchResults::Failure, None));
                }
            }
        }
    }
}
