// Receive-rate measurement: normalized counters of one trial.

use serde::{Deserialize, Serialize};

use crate::config::LossAcceptanceType;
use crate::error::DropRateSearchError;

/// Counters of one trial and the rates derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveRateMeasurement {
    pub duration: f64,
    pub target_rate: f64,
    pub transmit_count: u64,
    pub drop_count: u64,
    pub receive_count: u64,
    pub transmit_rate: f64,
    pub drop_rate: f64,
    pub receive_rate: f64,
    /// Dropped share of transmitted frames, 1.0 when nothing was sent.
    pub drop_fraction: f64,
}

impl ReceiveRateMeasurement {
    pub fn new(
        duration: f64,
        target_rate: f64,
        transmit_count: u64,
        drop_count: u64,
    ) -> Result<Self, DropRateSearchError> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(DropRateSearchError::InvalidMeasurement(
                "duration must be greater than 0".to_string(),
            ));
        }
        if drop_count > transmit_count {
            return Err(DropRateSearchError::InvalidMeasurement(format!(
                "drop_count {} exceeds transmit_count {}",
                drop_count, transmit_count
            )));
        }

        let receive_count = transmit_count - drop_count;
        let drop_fraction = if transmit_count == 0 {
            1.0
        } else {
            drop_count as f64 / transmit_count as f64
        };

        Ok(Self {
            duration,
            target_rate,
            transmit_count,
            drop_count,
            receive_count,
            transmit_rate: transmit_count as f64 / duration,
            drop_rate: drop_count as f64 / duration,
            receive_rate: receive_count as f64 / duration,
            drop_fraction,
        })
    }
}

impl LossAcceptanceType {
    /// Whether `measurement` stayed within `loss_acceptance`, read as a frame
    /// count or as a percentage of transmitted frames.
    pub fn accepts(&self, loss_acceptance: f64, measurement: &ReceiveRateMeasurement) -> bool {
        match self {
            LossAcceptanceType::Frames => measurement.drop_count as f64 <= loss_acceptance,
            LossAcceptanceType::Percentage => measurement.drop_fraction * 100.0 <= loss_acceptance,
        }
    }
}
