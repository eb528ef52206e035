//! Stateful fit-then-transform facade.

use proteus_series::{Dataset, TimeSeries};

use crate::config::ShapeletTransformConfig;
use crate::error::ShapeletError;
use crate::feature::FeatureMatrix;
use crate::transform::FittedShapeletTransform;

/// Holds a configuration and, once fitted, the shapelet set.
#[derive(Debug, Clone)]
pub struct ShapeletTransformer {
    config: ShapeletTransformConfig,
    fitted: Option<FittedShapeletTransform>,
}

impl ShapeletTransformer {
    /// Create an unfitted transformer.
    #[must_use]
    pub fn new(config: ShapeletTransformConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ShapeletTransformConfig {
        &self.config
    }

    /// The fitted shapelet set, if [`fit`](Self::fit) has run.
    #[must_use]
    pub fn fitted(&self) -> Option<&FittedShapeletTransform> {
        self.fitted.as_ref()
    }

    /// Discover shapelets in `dataset`, replacing any earlier fit.
    ///
    /// # Errors
    ///
    /// See [`ShapeletTransformConfig::fit`].
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&FittedShapeletTransform, ShapeletError> {
        let fitted = self.config.fit(dataset)?;
        Ok(&*self.fitted.insert(fitted))
    }

    /// Compute distance features with the fitted shapelets.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::NotFitted`] before [`fit`](Self::fit), and
    /// otherwise the errors of [`FittedShapeletTransform::transform`].
    pub fn transform(&self, dataset: &Dataset) -> Result<FeatureMatrix, ShapeletError> {
        self.fitted
            .as_ref()
            .ok_or(ShapeletError::NotFitted)?
            .transform(dataset)
    }

    /// Fit on `dataset`, then transform it.
    ///
    /// # Errors
    ///
    /// Any error of [`fit`](Self::fit) or [`transform`](Self::transform).
    pub fn fit_transform(&mut self, dataset: &Dataset) -> Result<FeatureMatrix, ShapeletError> {
        self.fit(dataset)?.transform(dataset)
    }

    /// Not supported: features are defined over whole datasets.
    ///
    /// # Errors
    ///
    /// Always returns [`ShapeletError::Unsupported`].
    pub fn transform_instance(&self, _series: &TimeSeries) -> Result<Vec<f64>, ShapeletError> {
        Err(ShapeletError::Unsupported {
            operation: "transforming a single instance",
        })
    }
}

#[cfg(test)]
mod tests {
    use proteus_series::ClassLabel;

    use super::*;

    fn dataset() -> Dataset {
        let series = vec![
            TimeSeries::new(vec![0.0, 1.0, 5.0, 1.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, 0.0, 1.0, 5.0, 1.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, -1.0, -5.0, -1.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, 0.0, -1.0, -5.0, -1.0, 0.0]).unwrap(),
        ];
        let labels = [0, 0, 1, 1].into_iter().map(ClassLabel::new).collect();
        Dataset::labelled(series, labels).unwrap()
    }

    #[test]
    fn transform_before_fit_fails() {
        let transformer = ShapeletTransformer::new(ShapeletTransformConfig::new(2, 3, 4).unwrap());
        assert!(matches!(
            transformer.transform(&dataset()),
            Err(ShapeletError::NotFitted)
        ));
        assert!(transformer.fitted().is_none());
    }

    #[test]
    fn fit_transform_matches_fit_then_transform() {
        let config = ShapeletTransformConfig::new(2, 3, 4).unwrap();
        let mut a = ShapeletTransformer::new(config.clone());
        let features = a.fit_transform(&dataset()).unwrap();

        let mut b = ShapeletTransformer::new(config);
        b.fit(&dataset()).unwrap();
        assert_eq!(b.transform(&dataset()).unwrap(), features);
        assert_eq!(features.n_rows(), 4);
        assert_eq!(features.n_shapelets(), 2);
    }

    #[test]
    fn single_instances_are_unsupported() {
        let transformer = ShapeletTransformer::new(ShapeletTransformConfig::new(1, 2, 3).unwrap());
        let series = TimeSeries::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            transformer.transform_instance(&series),
            Err(ShapeletError::Unsupported { .. })
        ));
    }
}
