//! Counters describing a finished fit.

use std::time::Duration;

/// What a fit did and why it stopped.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FitStats {
    /// Name of the search strategy the fit started with.
    pub strategy: String,
    /// Series searched, counting repeats on later passes.
    pub series_searched: usize,
    /// Candidates handed to the quality measure.
    pub candidates_evaluated: u64,
    /// Candidates abandoned by the quality bound.
    pub early_abandons: u64,
    /// Passes over the data started.
    pub passes: usize,
    /// Wall-clock time, including time before a resumed checkpoint.
    pub elapsed: Duration,
    /// True if adaptive timing switched to exhaustive search.
    pub switched_to_full: bool,
    /// True if the fit stopped because the contract ran out.
    pub contract_exhausted: bool,
}

impl FitStats {
    /// Candidates that were scored to completion.
    #[must_use]
    pub fn candidates_scored(&self) -> u64 {
        self.candidates_evaluated - self.early_abandons
    }
}
