//! Shapelet-to-series distance built on the sliding subsequence kernel.

use proteus_series::{
    Rescaling, SubsequenceQuery, TimeSeries, min_dependent_distance, min_subsequence_distance,
};

use crate::candidate::CandidateLocation;
use crate::shapelet::Shapelet;

/// How multichannel shapelets are compared with multichannel series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum DistanceType {
    /// A shapelet covers one channel and is compared with that channel only.
    #[default]
    Independent,
    /// A shapelet covers every channel at one start; channel sums are added
    /// at each offset.
    Dependent,
}

/// A shapelet's content wrapped as ready-to-slide queries.
#[derive(Debug, Clone)]
pub struct PreparedShapelet {
    queries: Vec<SubsequenceQuery>,
    dimension: usize,
}

impl PreparedShapelet {
    /// Length of the underlying shapelet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.first().map_or(0, SubsequenceQuery::len)
    }

    /// Return true if the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distance settings shared by the search and the transform stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ShapeletDistance {
    rescaling: Rescaling,
    distance_type: DistanceType,
}

impl ShapeletDistance {
    /// Create distance settings.
    #[must_use]
    pub fn new(rescaling: Rescaling, distance_type: DistanceType) -> Self {
        Self {
            rescaling,
            distance_type,
        }
    }

    /// The rescaling policy.
    #[must_use]
    pub fn rescaling(&self) -> Rescaling {
        self.rescaling
    }

    /// The multichannel distance type.
    #[must_use]
    pub fn distance_type(&self) -> DistanceType {
        self.distance_type
    }

    /// Cut and rescale the content at `location` from `series`.
    ///
    /// Independent: the single channel `location.dimension`. Dependent: every
    /// channel. The caller guarantees the location fits the series.
    #[must_use]
    pub fn extract(&self, series: &TimeSeries, location: CandidateLocation) -> Vec<Vec<f64>> {
        let range = location.start..location.end();
        match self.distance_type {
            DistanceType::Independent => {
                vec![self.rescaling.apply(&series.channel(location.dimension)[range])]
            }
            DistanceType::Dependent => series
                .channels()
                .iter()
                .map(|channel| self.rescaling.apply(&channel[range.clone()]))
                .collect(),
        }
    }

    /// Wrap already-rescaled content for sliding comparison.
    #[must_use]
    pub fn prepare(&self, content: &[Vec<f64>], dimension: usize) -> PreparedShapelet {
        PreparedShapelet {
            queries: content
                .iter()
                .map(|row| SubsequenceQuery::from_rescaled(row.clone(), self.rescaling))
                .collect(),
            dimension,
        }
    }

    /// Prepare a stored shapelet.
    #[must_use]
    pub fn prepare_shapelet(&self, shapelet: &Shapelet) -> PreparedShapelet {
        self.prepare(shapelet.content(), shapelet.dimension())
    }

    /// Minimum mean squared distance from the shapelet to `series`.
    ///
    /// A single-row shapelet is compared with its own channel; a multi-row
    /// shapelet with all channels together. Infinite when the series is too
    /// short or lacks the channel.
    #[must_use]
    pub fn distance(&self, prepared: &PreparedShapelet, series: &TimeSeries) -> f64 {
        match prepared.queries.as_slice() {
            [single] => {
                if prepared.dimension >= series.n_channels() {
                    return f64::INFINITY;
                }
                min_subsequence_distance(single, series.channel(prepared.dimension)).value()
            }
            queries => min_dependent_distance(queries, series.channels()).value(),
        }
    }
}
