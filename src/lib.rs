//! Drop-rate search for throughput benchmarking.
//!
//! Finds the highest offered rate a device under test sustains while loss
//! stays within an acceptance bound, using a linear sweep, a binary search, or
//! a linear sweep refined by a binary search. Traffic itself is generated by a
//! caller-supplied [`measurer::TrialMeasurer`].

pub mod aggregator;
pub mod config;
pub mod error;
pub mod measurer;
pub mod search;
pub mod testutil;
pub mod tolerance;

pub use config::{
    LossAcceptanceType, RateType, SearchConfiguration, SearchDirection, SearchResultType,
};
pub use error::DropRateSearchError;
pub use measurer::{LatencySummary, ReceiveRateMeasurement, Trial, TrialMeasurer};
pub use search::{DropRateSearch, SearchOutcome, SearchPhase, SearchResults, TrialReport};
