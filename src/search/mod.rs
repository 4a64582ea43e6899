// Drop rate search engine
//
// Holds the configuration and the trial measurer and runs the linear, binary
// and combined searches on top of them. Trials are issued strictly one at a
// time: they share the device under test, so concurrent trials would spoil
// each other's loss counts.

pub mod binary;
pub mod combined;
pub mod linear;
pub mod verify;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::config::SearchConfiguration;
use crate::error::DropRateSearchError;
use crate::measurer::{Trial, TrialMeasurer};

/// 探索の最終判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchResults {
    Success,
    Failure,
    /// Linear search found a rate that the binary refinement could not confirm.
    Suspicious,
}

impl SearchResults {
    pub fn label(&self) -> &'static str {
        match self {
            SearchResults::Success => "success",
            SearchResults::Failure => "failure",
            SearchResults::Suspicious => "suspicious",
        }
    }

    /// True for the classifications that carry a result rate.
    pub fn has_rate(&self) -> bool {
        matches!(self, SearchResults::Success | SearchResults::Suspicious)
    }
}

impl fmt::Display for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Linear,
    Binary,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPhase::Linear => f.write_str("linear"),
            SearchPhase::Binary => f.write_str("binary"),
        }
    }
}

/// 各レートステップの結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    pub step: usize,
    pub phase: SearchPhase,
    pub rate: f64,
    /// Verdict of every attempt at this rate, in order.
    pub verdicts: Vec<bool>,
    /// Aggregated verdict.
    pub passed: bool,
}

/// 探索結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub result: SearchResults,
    /// Only set for `Success` and `Suspicious`.
    pub rate: Option<f64>,
    #[serde(default)]
    pub trials: Vec<TrialReport>,
}

impl SearchOutcome {
    /// Total number of trials run, counting every attempt.
    pub fn trial_count(&self) -> usize {
        self.trials.iter().map(|t| t.verdicts.len()).sum()
    }

    /// Rates probed, in order.
    pub fn probed_rates(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.rate).collect()
    }
}

/// Drop rate search engine.
///
/// One engine runs one search at a time; the outcome of the latest search is
/// kept until the next search starts.
pub struct DropRateSearch<M> {
    config: SearchConfiguration,
    measurer: M,
    last_outcome: Option<SearchOutcome>,
}

impl<M: TrialMeasurer> DropRateSearch<M> {
    pub fn new(config: SearchConfiguration, measurer: M) -> Self {
        Self {
            config,
            measurer,
            last_outcome: None,
        }
    }

    /// Engine with the default configuration.
    pub fn with_measurer(measurer: M) -> Self {
        Self::new(SearchConfiguration::default(), measurer)
    }

    pub fn config(&self) -> &SearchConfiguration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SearchConfiguration {
        &mut self.config
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }

    pub fn into_measurer(self) -> M {
        self.measurer
    }

    pub fn last_outcome(&self) -> Option<&SearchOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn search_result(&self) -> Option<SearchResults> {
        self.last_outcome.as_ref().map(|o| o.result)
    }

    pub fn search_result_rate(&self) -> Option<f64> {
        self.last_outcome.as_ref().and_then(|o| o.rate)
    }

    /// Reject a configuration that never went through the setters, such as one
    /// deserialized directly.
    fn check_config(&self) -> Result<(), DropRateSearchError> {
        self.config.validate().map_err(|errors| {
            DropRateSearchError::ConfigError(format!("Validation errors: {}", errors.join("; ")))
        })
    }

    /// Run `max_attempts` trials at `rate`, aggregate them and append the
    /// step to `trials`.
    fn measure_at(
        &mut self,
        rate: f64,
        traffic_profile: &str,
        skip_warmup: bool,
        phase: SearchPhase,
        trials: &mut Vec<TrialReport>,
    ) -> Result<bool, DropRateSearchError> {
        let trial = Trial::from_config(&self.config, rate, traffic_profile, skip_warmup);
        let attempts = self.config.max_attempts();
        let mut verdicts = Vec::with_capacity(attempts as usize);
        for _ in 0..attempts {
            verdicts.push(self.measurer.measure_loss(&trial)?);
        }
        let passed = self.config.search_result_type().aggregate(&verdicts);

        debug!(
            %phase,
            rate,
            unit = self.config.rate_type_str(),
            ?verdicts,
            passed,
            "rate step measured"
        );

        trials.push(TrialReport {
            step: trials.len() + 1,
            phase,
            rate,
            verdicts,
            passed,
        });
        Ok(passed)
    }

    /// Store the outcome as the latest one and hand a copy back.
    fn finish(&mut self, algorithm: &'static str, outcome: SearchOutcome) -> SearchOutcome {
        info!(
            algorithm,
            result = %outcome.result,
            rate = ?outcome.rate,
            unit = self.config.rate_type_str(),
            steps = outcome.trials.len(),
            trials = outcome.trial_count(),
            "search finished"
        );
        self.last_outcome = Some(outcome.clone());
        outcome
    }
}
