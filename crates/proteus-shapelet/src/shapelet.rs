//! Scored shapelets and the ranking used everywhere they are ordered.

use std::cmp::Ordering;

use proteus_series::ClassLabel;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;

/// A candidate subsequence together with its quality score.
///
/// `content` holds one rescaled sequence per covered channel: a single row
/// for an independent shapelet, one row per channel for a dependent one.
/// The source series is referred to by index only.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shapelet {
    series_id: usize,
    location: CandidateLocation,
    class_value: ClassLabel,
    quality: f64,
    content: Vec<Vec<f64>>,
}

/// Replace a non-finite quality with zero.
pub(crate) fn sanitize_quality(quality: f64) -> f64 {
    if quality.is_finite() { quality } else { 0.0 }
}

impl Shapelet {
    /// Build a shapelet from stored parts.
    ///
    /// A non-finite `quality` is stored as 0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::InvalidShapelet`] | `content` is empty, a row's length differs from `location.length`, or a value is not finite |
    pub fn new(
        series_id: usize,
        location: CandidateLocation,
        class_value: ClassLabel,
        quality: f64,
        content: Vec<Vec<f64>>,
    ) -> Result<Self, ShapeletError> {
        if location.length == 0 {
            return Err(ShapeletError::InvalidShapelet {
                reason: "length must be at least 1".to_string(),
            });
        }
        if content.is_empty() {
            return Err(ShapeletError::InvalidShapelet {
                reason: "content has no channels".to_string(),
            });
        }
        for (channel, row) in content.iter().enumerate() {
            if row.len() != location.length {
                return Err(ShapeletError::InvalidShapelet {
                    reason: format!(
                        "channel {channel} has {} values, expected {}",
                        row.len(),
                        location.length
                    ),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ShapeletError::InvalidShapelet {
                    reason: format!("channel {channel} has a non-finite value"),
                });
            }
        }
        Ok(Self::scored(series_id, location, class_value, quality, content))
    }

    /// Build a shapelet from an evaluation whose content is already consistent.
    pub(crate) fn scored(
        series_id: usize,
        location: CandidateLocation,
        class_value: ClassLabel,
        quality: f64,
        content: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            series_id,
            location,
            class_value,
            quality: sanitize_quality(quality),
            content,
        }
    }

    /// Index of the source series in the training dataset.
    #[must_use]
    pub fn series_id(&self) -> usize {
        self.series_id
    }

    /// Location in the source series.
    #[must_use]
    pub fn location(&self) -> CandidateLocation {
        self.location
    }

    /// First covered time step.
    #[must_use]
    pub fn start(&self) -> usize {
        self.location.start
    }

    /// Number of covered time steps.
    #[must_use]
    pub fn length(&self) -> usize {
        self.location.length
    }

    /// Source channel (0 for dependent shapelets).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.location.dimension
    }

    /// Class of the source series.
    #[must_use]
    pub fn class_value(&self) -> ClassLabel {
        self.class_value
    }

    /// Quality score; higher is better, always finite.
    #[must_use]
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Rescaled content, one row per covered channel.
    #[must_use]
    pub fn content(&self) -> &[Vec<f64>] {
        &self.content
    }

    /// Number of channels the content covers.
    #[must_use]
    pub fn n_dimensions(&self) -> usize {
        self.content.len()
    }

    /// Ranking: quality descending, then length ascending, then source
    /// series, start and dimension ascending.
    ///
    /// `Ordering::Less` means `self` ranks before `other`.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .quality
            .total_cmp(&self.quality)
            .then_with(|| self.location.length.cmp(&other.location.length))
            .then_with(|| self.series_id.cmp(&other.series_id))
            .then_with(|| self.location.start.cmp(&other.location.start))
            .then_with(|| self.location.dimension.cmp(&other.location.dimension))
    }

    /// Return true if both come from overlapping ranges of the same channel
    /// of the same source series.
    #[must_use]
    pub fn is_self_similar(&self, other: &Self) -> bool {
        self.series_id == other.series_id && self.location.overlaps(&other.location)
    }

    /// Mean squared difference between the two contents, summed over
    /// channels. Infinite when the shapes differ.
    #[must_use]
    pub fn content_distance(&self, other: &Self) -> f64 {
        if self.content.len() != other.content.len() || self.length() != other.length() {
            return f64::INFINITY;
        }
        let sum: f64 = self
            .content
            .iter()
            .zip(&other.content)
            .flat_map(|(a, b)| a.iter().zip(b))
            .map(|(x, y)| (x - y) * (x - y))
            .sum();
        sum / self.length() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapelet(series_id: usize, start: usize, length: usize, quality: f64) -> Shapelet {
        Shapelet::scored(
            series_id,
            CandidateLocation::new(start, length, 0),
            ClassLabel::new(0),
            quality,
            vec![vec![0.0; length]],
        )
    }

    #[test]
    fn higher_quality_ranks_first() {
        let a = shapelet(0, 0, 5, 0.9);
        let b = shapelet(0, 0, 3, 0.5);
        assert_eq!(a.rank_cmp(&b), Ordering::Less);
        assert_eq!(b.rank_cmp(&a), Ordering::Greater);
    }

    #[test]
    fn ties_broken_by_length_then_position() {
        let short = shapelet(3, 4, 3, 0.5);
        let long = shapelet(0, 0, 4, 0.5);
        assert_eq!(short.rank_cmp(&long), Ordering::Less);

        let early_series = shapelet(1, 9, 3, 0.5);
        let late_series = shapelet(2, 0, 3, 0.5);
        assert_eq!(early_series.rank_cmp(&late_series), Ordering::Less);

        let early_start = shapelet(1, 0, 3, 0.5);
        assert_eq!(early_start.rank_cmp(&early_series), Ordering::Less);
        assert_eq!(early_start.rank_cmp(&early_start.clone()), Ordering::Equal);
    }

    #[test]
    fn non_finite_quality_becomes_zero() {
        assert_eq!(shapelet(0, 0, 3, f64::NAN).quality(), 0.0);
        assert_eq!(shapelet(0, 0, 3, f64::INFINITY).quality(), 0.0);
    }

    #[test]
    fn self_similarity_requires_same_series_and_overlap() {
        let a = shapelet(0, 0, 4, 0.5);
        assert!(a.is_self_similar(&shapelet(0, 3, 4, 0.1)));
        assert!(!a.is_self_similar(&shapelet(0, 4, 4, 0.1)));
        assert!(!a.is_self_similar(&shapelet(1, 0, 4, 0.1)));
    }

    #[test]
    fn content_distance_between_shapes() {
        let a = shapelet(0, 0, 3, 0.5);
        let mut b = shapelet(1, 0, 3, 0.5);
        assert_eq!(a.content_distance(&b), 0.0);
        b.content[0][1] = 3.0;
        assert!((a.content_distance(&b) - 3.0).abs() < 1e-12);
        assert!(a.content_distance(&shapelet(0, 0, 4, 0.5)).is_infinite());
    }

    #[test]
    fn new_validates_content() {
        let loc = CandidateLocation::new(0, 3, 0);
        let ok = Shapelet::new(0, loc, ClassLabel::new(1), 0.2, vec![vec![1.0, 2.0, 3.0]]);
        assert!(ok.is_ok());

        let short = Shapelet::new(0, loc, ClassLabel::new(1), 0.2, vec![vec![1.0, 2.0]]);
        assert!(matches!(short, Err(ShapeletError::InvalidShapelet { .. })));

        let empty = Shapelet::new(0, loc, ClassLabel::new(1), 0.2, vec![]);
        assert!(matches!(empty, Err(ShapeletError::InvalidShapelet { .. })));

        let nan = Shapelet::new(0, loc, ClassLabel::new(1), 0.2, vec![vec![1.0, f64::NAN, 3.0]]);
        assert!(matches!(nan, Err(ShapeletError::InvalidShapelet { .. })));
    }
}
