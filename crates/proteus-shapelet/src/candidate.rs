//! Candidate locations inside a source series.

/// Where a candidate shapelet sits in its source series.
///
/// For dependent (all-channel) shapelets `dimension` is always 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct CandidateLocation {
    /// First time step covered.
    pub start: usize,
    /// Number of time steps covered.
    pub length: usize,
    /// Channel the candidate was cut from.
    pub dimension: usize,
}

impl CandidateLocation {
    /// Create a location.
    #[must_use]
    pub fn new(start: usize, length: usize, dimension: usize) -> Self {
        Self {
            start,
            length,
            dimension,
        }
    }

    /// One past the last covered time step.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Return true if both locations cover a common time step of the same channel.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.start < other.end() && other.start < self.end()
    }
}
