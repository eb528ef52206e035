//! A fitted shapelet set used as a feature dictionary.

use proteus_series::Dataset;
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::distance::ShapeletDistance;
use crate::error::ShapeletError;
use crate::feature::FeatureMatrix;
use crate::shapelet::Shapelet;
use crate::stats::FitStats;

/// Shapelets selected by a fit, with the distance settings they were found
/// with. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedShapeletTransform {
    shapelets: Vec<Shapelet>,
    distance: ShapeletDistance,
    stats: FitStats,
}

impl FittedShapeletTransform {
    pub(crate) fn new(shapelets: Vec<Shapelet>, distance: ShapeletDistance, stats: FitStats) -> Self {
        Self {
            shapelets,
            distance,
            stats,
        }
    }

    /// Wrap a shapelet set loaded from elsewhere. Statistics are empty.
    #[must_use]
    pub fn from_shapelets(shapelets: Vec<Shapelet>, distance: ShapeletDistance) -> Self {
        Self::new(shapelets, distance, FitStats::default())
    }

    /// The shapelets in output-column order.
    #[must_use]
    pub fn shapelets(&self) -> &[Shapelet] {
        &self.shapelets
    }

    /// Consume the transform and return the shapelets.
    #[must_use]
    pub fn into_shapelets(self) -> Vec<Shapelet> {
        self.shapelets
    }

    /// Distance settings.
    #[must_use]
    pub fn distance(&self) -> ShapeletDistance {
        self.distance
    }

    /// Statistics of the fit that produced this set.
    #[must_use]
    pub fn stats(&self) -> &FitStats {
        &self.stats
    }

    /// Number of shapelets, and so of feature columns.
    #[must_use]
    pub fn n_shapelets(&self) -> usize {
        self.shapelets.len()
    }

    /// Channels a dataset needs for every shapelet to apply.
    fn required_channels(&self) -> usize {
        self.shapelets
            .iter()
            .map(|s| {
                if s.n_dimensions() > 1 {
                    s.n_dimensions()
                } else {
                    s.dimension() + 1
                }
            })
            .max()
            .unwrap_or(0)
    }

    /// Distance from every shapelet to every series of `dataset`.
    ///
    /// Rows follow the dataset order; labels are carried over when present.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::SeriesTooShort`] | a shapelet is longer than the series |
    /// | [`ShapeletError::DimensionMismatch`] | a shapelet needs a missing channel |
    #[instrument(skip_all, fields(n_series = dataset.len(), n_shapelets = self.shapelets.len()))]
    pub fn transform(&self, dataset: &Dataset) -> Result<FeatureMatrix, ShapeletError> {
        // --- Validate inputs ---
        let series_length = dataset.series_length();
        if let Some(required) = self.shapelets.iter().map(Shapelet::length).max()
            && required > series_length
        {
            return Err(ShapeletError::SeriesTooShort {
                series_length,
                required,
            });
        }
        let required = self.required_channels();
        if required > dataset.n_channels() {
            return Err(ShapeletError::DimensionMismatch {
                required,
                got: dataset.n_channels(),
            });
        }

        let prepared: Vec<_> = self
            .shapelets
            .iter()
            .map(|s| self.distance.prepare_shapelet(s))
            .collect();
        let distance = self.distance;
        let rows: Vec<Vec<f64>> = dataset
            .series()
            .par_iter()
            .map(|series| {
                prepared
                    .iter()
                    .map(|p| distance.distance(p, series))
                    .collect()
            })
            .collect();

        info!(n_rows = rows.len(), "shapelet transform complete");

        Ok(FeatureMatrix::new(
            rows,
            dataset.labels().map(<[_]>::to_vec),
            self.shapelets.len(),
        ))
    }
}
