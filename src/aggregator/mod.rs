// Trial aggregation module
//
// Collapses the verdicts of repeated trials at one rate into a single verdict.

use crate::config::SearchResultType;

/// Optimistic: one acceptable trial clears the rate.
pub fn best_of_n(verdicts: &[bool]) -> bool {
    verdicts.iter().any(|&v| v)
}

/// Pessimistic: any unacceptable trial condemns the rate.
pub fn worst_of_n(verdicts: &[bool]) -> bool {
    verdicts.iter().all(|&v| v)
}

impl SearchResultType {
    /// Aggregate the verdicts collected at one rate step.
    pub fn aggregate(&self, verdicts: &[bool]) -> bool {
        match self {
            SearchResultType::BestOfN => best_of_n(verdicts),
            SearchResultType::WorstOfN => worst_of_n(verdicts),
        }
    }
}
