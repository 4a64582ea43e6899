use std::collections::VecDeque;

use anyhow::anyhow;

use crate::config::{LossAcceptanceType, RateType};
use crate::measurer::{LatencySummary, ReceiveRateMeasurement, Trial, TrialMeasurer};

/// Latency reported by the test measurers, one entry per direction.
pub const DEFAULT_LATENCY: [LatencySummary; 2] = [
    LatencySummary {
        min_us: 5.0,
        avg_us: 12.0,
        max_us: 40.0,
    },
    LatencySummary {
        min_us: 6.0,
        avg_us: 13.0,
        max_us: 42.0,
    },
];

/// Ethernet preamble plus inter-frame gap, in bytes.
const L1_OVERHEAD_BYTES: f64 = 20.0;

/// テスト用の試行記録（Trial の所有版）
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTrial {
    pub rate: f64,
    pub rate_type: RateType,
    pub frame_size: String,
    pub loss_acceptance: f64,
    pub loss_acceptance_type: LossAcceptanceType,
    pub traffic_profile: String,
    pub skip_warmup: bool,
    pub duration: u64,
}

impl From<&Trial<'_>> for RecordedTrial {
    fn from(trial: &Trial<'_>) -> Self {
        Self {
            rate: trial.rate,
            rate_type: trial.rate_type,
            frame_size: trial.frame_size.to_string(),
            loss_acceptance: trial.loss_acceptance,
            loss_acceptance_type: trial.loss_acceptance_type,
            traffic_profile: trial.traffic_profile.to_string(),
            skip_warmup: trial.skip_warmup,
            duration: trial.duration,
        }
    }
}

/// Accepts every rate up to `threshold`.
pub struct ThresholdMeasurer {
    threshold: f64,
    probes: Vec<RecordedTrial>,
}

impl ThresholdMeasurer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            probes: Vec::new(),
        }
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 記録された全試行
    pub fn probes(&self) -> &[RecordedTrial] {
        &self.probes
    }
}

impl TrialMeasurer for ThresholdMeasurer {
    fn measure_loss(&mut self, trial: &Trial<'_>) -> anyhow::Result<bool> {
        self.probes.push(trial.into());
        Ok(trial.rate <= self.threshold)
    }

    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>> {
        Ok(DEFAULT_LATENCY.to_vec())
    }
}

/// Replays a fixed sequence of verdicts, one per trial.
pub struct ScriptedMeasurer {
    verdicts: VecDeque<bool>,
    probes: Vec<RecordedTrial>,
}

impl ScriptedMeasurer {
    pub fn new(verdicts: impl IntoIterator<Item = bool>) -> Self {
        Self {
            verdicts: verdicts.into_iter().collect(),
            probes: Vec::new(),
        }
    }

    /// 未使用の判定数
    pub fn remaining(&self) -> usize {
        self.verdicts.len()
    }

    pub fn probes(&self) -> &[RecordedTrial] {
        &self.probes
    }
}

impl TrialMeasurer for ScriptedMeasurer {
    fn measure_loss(&mut self, trial: &Trial<'_>) -> anyhow::Result<bool> {
        self.probes.push(trial.into());
        self.verdicts
            .pop_front()
            .ok_or_else(|| anyhow!("scripted verdicts exhausted at rate {}", trial.rate))
    }

    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>> {
        Ok(DEFAULT_LATENCY.to_vec())
    }
}

/// A device that forwards up to `capacity_pps` without loss and drops the
/// excess. Percentage rates are read against `line_rate_pps`.
pub struct SimulatedDevice {
    capacity_pps: f64,
    line_rate_pps: f64,
    measurements: Vec<ReceiveRateMeasurement>,
}

impl SimulatedDevice {
    pub fn new(capacity_pps: f64, line_rate_pps: f64) -> Self {
        Self {
            capacity_pps,
            line_rate_pps,
            measurements: Vec::new(),
        }
    }

    pub fn measurements(&self) -> &[ReceiveRateMeasurement] {
        &self.measurements
    }

    /// Offered load of `trial` in packets per second.
    fn offered_pps(&self, trial: &Trial<'_>) -> anyhow::Result<f64> {
        match trial.rate_type {
            RateType::Percentage => Ok(trial.rate / 100.0 * self.line_rate_pps),
            RateType::PacketsPerSecond => Ok(trial.rate),
            RateType::BitsPerSecond => {
                let frame_bytes: f64 = trial
                    .frame_size
                    .parse()
                    .map_err(|_| anyhow!("frame size '{}' is not a byte count", trial.frame_size))?;
                Ok(trial.rate / ((frame_bytes + L1_OVERHEAD_BYTES) * 8.0))
            }
        }
    }
}

impl TrialMeasurer for SimulatedDevice {
    fn measure_loss(&mut self, trial: &Trial<'_>) -> anyhow::Result<bool> {
        let offered = self.offered_pps(trial)?;
        let duration = trial.duration as f64;
        let transmit_count = (offered * duration).round() as u64;
        let drop_count = (((offered - self.capacity_pps).max(0.0)) * duration).round() as u64;
        let measurement = ReceiveRateMeasurement::new(
            duration,
            trial.rate,
            transmit_count,
            drop_count.min(transmit_count),
        )?;
        let accepted = trial
            .loss_acceptance_type
            .accepts(trial.loss_acceptance, &measurement);
        self.measurements.push(measurement);
        Ok(accepted)
    }

    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>> {
        Ok(DEFAULT_LATENCY.to_vec())
    }
}

/// Fails every trial with the given message.
pub struct FailingMeasurer {
    message: String,
}

impl FailingMeasurer {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl TrialMeasurer for FailingMeasurer {
    fn measure_loss(&mut self, _trial: &Trial<'_>) -> anyhow::Result<bool> {
        Err(anyhow!("{}", self.message))
    }

    fn latency(&self) -> anyhow::Result<Vec<LatencySummary>> {
        Err(anyhow!("{}", self.message))
    }
}
