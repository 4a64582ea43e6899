// Trial measurer module
//
// The search engine never generates traffic itself. Every trial is delegated
// to a TrialMeasurer, which runs one timed trial at the requested rate and
// reports whether the observed loss stayed within the acceptance bound.

pub mod measurement;

pub use measurement::ReceiveRateMeasurement;

use serde::{Deserialize, Serialize};

use crate::config::{LossAcceptanceType, RateType, SearchConfiguration};

/// Parameters of one timed traffic trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial<'a> {
    pub rate: f64,
    pub rate_type: RateType,
    pub frame_size: &'a str,
    pub loss_acceptance: f64,
    pub loss_acceptance_type: LossAcceptanceType,
    pub traffic_profile: &'a str,
    pub skip_warmup: bool,
    /// Seconds the trial is expected to run.
    pub duration: u64,
}

impl<'a> Trial<'a> {
    /// Build a trial at `rate` from the configured frame size, loss bound and duration.
    pub fn from_config(
        config: &'a SearchConfiguration,
        rate: f64,
        traffic_profile: &'a str,
        skip_warmup: bool,
    ) -> Self {
        Self {
            rate,
            rate_type: config.rate_type(),
            frame_size: config.frame_size(),
            loss_acceptance: config.loss_acceptance(),
            loss_acceptance_type: config.loss_acceptance_type(),
            traffic_profile,
            skip_warmup,
            duration: config.duration(),
        }
    }
}

/// Latency observed in one traffic direction, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min_us: f64,
    pub avg_us: f64,
    pub max_us: f64,
}

/// Runs timed traffic trials for the search engine.
///
/// `measure_loss` returns `Ok(true)` when the loss of the trial stayed within
/// the acceptance bound, `Ok(false)` when it did not. Errors are propagated
/// to the caller of the search unchanged; the engine never retries them.
pub trait TrialMeasurer {
    fn measure_loss(&mut self, trial: &Trial<'_>) -> anyhow::Result<bool>;

    /// Latency of the most recent trials, one entry per traffic direction.
    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>>;
}

impl<M: TrialMeasurer + ?Sized> TrialMeasurer for &mut M {
    fn measure_loss(&mut self, trial: &Trial<'_>) -> anyhow::Result<bool> {
        (**self).measure_loss(trial)
    }

    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>> {
        (**self).latency()
    }
}

impl<M: TrialMeasurer + ?Sized> TrialMeasurer for Box<M> {
    fn measure_loss(&mut self, trial: &Trial<'_>) -> anyhow::Result<bool> {
        (**self).measure_loss(trial)
    }

    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>> {
        (**self).latency()
    }
}
