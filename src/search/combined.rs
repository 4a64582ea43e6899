// Combined search: linear sweep, then binary refinement inside the last step.

use tracing::warn;

use crate::error::DropRateSearchError;
use crate::measurer::TrialMeasurer;
use crate::tolerance::floats_are_close;

use super::{DropRateSearch, SearchOutcome, SearchResults};

impl<M: TrialMeasurer> DropRateSearch<M> {
    /// Linear search from `rate_start`, refined by a binary search over
    /// `[r, min(r + rate_linear_step, rate_max)]` where `r` is the linear result.
    ///
    /// A failed linear search is an error. When the refinement cannot confirm a
    /// rate the outcome is `Suspicious` with the linear rate.
    pub fn combined_search(
        &mut self,
        traffic_profile: &str,
    ) -> Result<SearchOutcome, DropRateSearchError> {
        self.last_outcome = None;
        let mut trials = Vec::new();

        let linear_rate = match self.run_linear(traffic_profile, &mut trials)? {
            (result, Some(rate)) if result.has_rate() => rate,
            _ => {
                self.finish(
                    "combined",
                    SearchOutcome {
                        result: SearchResults::Failure,
                        rate: None,
                        trials,
                    },
                );
                return Err(DropRateSearchError::LinearSearchFailed);
            }
        };

        let rate_max = self.config.rate_max();
        if floats_are_close(linear_rate, rate_max) {
            return Ok(self.finish(
                "combined",
                SearchOutcome {
                    result: SearchResults::Success,
                    rate: Some(linear_rate),
                    trials,
                },
            ));
        }

        let b_max = (linear_rate + self.config.rate_linear_step()).min(rate_max);
        let refined = self.run_binary(
            linear_rate,
            b_max,
            traffic_profile,
            true,
            false,
            &mut trials,
        )?;

        let outcome = match refined {
            (SearchResults::Success, Some(rate)) => SearchOutcome {
                result: SearchResults::Success,
                rate: Some(rate),
                trials,
            },
            (result, _) => {
                warn!(
                    linear_rate,
                    binary_result = %result,
                    unit = self.config.rate_type_str(),
                    "binary refinement did not confirm linear result"
                );
                SearchOutcome {
                    result: SearchResults::Suspicious,
                    rate: Some(linear_rate),
                    trials,
                }
            }
        };
        Ok(self.finish("combined", outcome))
    }
}
