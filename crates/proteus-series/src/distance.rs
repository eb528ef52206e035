//! Minimum sliding-window distance between a query subsequence and a series.

use std::cmp::Ordering;
use std::fmt;

use crate::normalize::{CONSTANT_STD_THRESHOLD, Rescaling, mean_std};

/// Per-point squared distance charged when exactly one of the two windows is
/// constant under z-normalization (the zero-correlation distance).
const UNCORRELATED_POINT_DISTANCE: f64 = 2.0;

/// A non-negative subsequence distance: the mean squared point-wise
/// difference at the best-matching offset.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SubsequenceDistance(f64);

impl SubsequenceDistance {
    /// Sentinel for a query that has no valid offset in the series.
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw distance value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SubsequenceDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A query subsequence already rescaled for sliding comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsequenceQuery {
    values: Vec<f64>,
    constant: bool,
    rescaling: Rescaling,
}

impl SubsequenceQuery {
    /// Rescale raw values and wrap them as a query.
    #[must_use]
    pub fn new(raw: &[f64], rescaling: Rescaling) -> Self {
        Self::from_rescaled(rescaling.apply(raw), rescaling)
    }

    /// Wrap values that were already rescaled with `rescaling`.
    ///
    /// Under z-normalization a constant window rescales to all zeros, so an
    /// all-zero query is recognized as constant.
    #[must_use]
    pub fn from_rescaled(values: Vec<f64>, rescaling: Rescaling) -> Self {
        let constant = match rescaling {
            Rescaling::ZNormalize => values.iter().all(|&v| v == 0.0),
            Rescaling::None => false,
        };
        Self {
            values,
            constant,
            rescaling,
        }
    }

    /// Return the query length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return true if the query has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the rescaled values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Return true if the source window was constant.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Return the rescaling policy the query was built with.
    #[must_use]
    pub fn rescaling(&self) -> Rescaling {
        self.rescaling
    }

    /// Sum of squared differences against one window, abandoned once the
    /// running sum reaches `limit`.
    ///
    /// `window.len()` must equal `self.len()`.
    fn window_sum(&self, window: &[f64], limit: f64) -> f64 {
        match self.rescaling {
            Rescaling::None => {
                let mut sum = 0.0;
                for (&q, &x) in self.values.iter().zip(window) {
                    let d = q - x;
                    sum += d * d;
                    if sum >= limit {
                        return sum;
                    }
                }
                sum
            }
            Rescaling::ZNormalize => {
                let (mean, std) = mean_std(window);
                let window_constant = std < CONSTANT_STD_THRESHOLD;
                match (self.constant, window_constant) {
                    (true, true) => 0.0,
                    (true, false) | (false, true) => {
                        UNCORRELATED_POINT_DISTANCE * self.values.len() as f64
                    }
                    (false, false) => {
                        let mut sum = 0.0;
                        for (&q, &x) in self.values.iter().zip(window) {
                            let d = q - (x - mean) / std;
                            sum += d * d;
                            if sum >= limit {
                                return sum;
                            }
                        }
                        sum
                    }
                }
            }
        }
    }
}

/// Minimum distance of `query` over every offset of `series`.
///
/// Returns the mean squared difference at the best offset. Each offset's
/// accumulation is abandoned once it reaches the best sum seen so far.
/// Returns [`SubsequenceDistance::INFINITY`] when the query is empty or longer
/// than the series.
#[must_use]
pub fn min_subsequence_distance(query: &SubsequenceQuery, series: &[f64]) -> SubsequenceDistance {
    let length = query.len();
    if length == 0 || length > series.len() {
        return SubsequenceDistance::INFINITY;
    }
    let mut best = f64::INFINITY;
    for window in series.windows(length) {
        let sum = query.window_sum(window, best);
        if sum < best {
            best = sum;
            if best == 0.0 {
                break;
            }
        }
    }
    SubsequenceDistance::new(best / length as f64)
}

/// Minimum distance of a multichannel query whose channels move together.
///
/// At each offset the per-channel sums are added; `queries[d]` is compared
/// with `channels[d]`. Returns [`SubsequenceDistance::INFINITY`] when there
/// are no queries, the queries differ in length, or a channel is missing or
/// too short.
#[must_use]
pub fn min_dependent_distance(
    queries: &[SubsequenceQuery],
    channels: &[Vec<f64>],
) -> SubsequenceDistance {
    let Some(first) = queries.first() else {
        return SubsequenceDistance::INFINITY;
    };
    let length = first.len();
    if length == 0
        || queries.len() > channels.len()
        || queries.iter().any(|q| q.len() != length)
        || channels.iter().any(|c| c.len() < length)
    {
        return SubsequenceDistance::INFINITY;
    }
    let n_offsets = channels[0].len() - length + 1;
    let mut best = f64::INFINITY;
    for offset in 0..n_offsets {
        let mut total = 0.0;
        for (query, channel) in queries.iter().zip(channels) {
            total += query.window_sum(&channel[offset..offset + length], best - total);
            if total >= best {
                break;
            }
        }
        if total < best {
            best = total;
            if best == 0.0 {
                break;
            }
        }
    }
    SubsequenceDistance::new(best / length as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(query: &[f64], series: &[f64]) -> f64 {
        let q = Rescaling::ZNormalize.apply(query);
        series
            .windows(query.len())
            .map(|w| {
                let z = Rescaling::ZNormalize.apply(w);
                q.iter().zip(&z).map(|(a, b)| (a - b) * (a - b)).sum::<f64>()
            })
            .fold(f64::INFINITY, f64::min)
            / query.len() as f64
    }

    #[test]
    fn self_distance_is_exactly_zero() {
        let series = [0.3, 1.7, -2.2, 4.1, 0.9, 3.3, -1.0];
        let query = SubsequenceQuery::new(&series[2..5], Rescaling::ZNormalize);
        let d = min_subsequence_distance(&query, &series);
        assert_eq!(d.value(), 0.0);
    }

    #[test]
    fn matches_brute_force() {
        let series = [1.0, 3.0, 2.0, 5.0, 4.0, 4.5, 0.0, -1.0, 2.0];
        let raw = [2.0, 1.0, 3.0, 0.5];
        let query = SubsequenceQuery::new(&raw, Rescaling::ZNormalize);
        let d = min_subsequence_distance(&query, &series);
        assert!((d.value() - brute_force(&raw, &series)).abs() < 1e-12);
    }

    #[test]
    fn scale_and_offset_invariant_under_znormalization() {
        let series = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0];
        let shifted: Vec<f64> = [0.0, 1.0, 0.0].iter().map(|x| x * 10.0 + 5.0).collect();
        let query = SubsequenceQuery::new(&shifted, Rescaling::ZNormalize);
        let d = min_subsequence_distance(&query, &series);
        assert!(d.value() < 1e-12);
    }

    #[test]
    fn raw_distance_sees_offsets() {
        let series = [0.0, 1.0, 0.0];
        let query = SubsequenceQuery::new(&[5.0, 6.0, 5.0], Rescaling::None);
        let d = min_subsequence_distance(&query, &series);
        assert!((d.value() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn constant_windows_of_equal_value_are_zero_apart() {
        let series = [4.0, 4.0, 4.0, 4.0];
        let query = SubsequenceQuery::new(&[4.0, 4.0, 4.0], Rescaling::ZNormalize);
        assert!(query.is_constant());
        assert_eq!(min_subsequence_distance(&query, &series).value(), 0.0);
    }

    #[test]
    fn constant_against_varying_is_finite() {
        let series = [1.0, 2.0, 3.0, 1.0];
        let query = SubsequenceQuery::new(&[7.0, 7.0, 7.0], Rescaling::ZNormalize);
        let d = min_subsequence_distance(&query, &series).value();
        assert!(d.is_finite());
        assert!((d - UNCORRELATED_POINT_DISTANCE).abs() < 1e-12);

        let varying = SubsequenceQuery::new(&[1.0, 2.0, 3.0], Rescaling::ZNormalize);
        let d = min_subsequence_distance(&varying, &[5.0, 5.0, 5.0]).value();
        assert!((d - UNCORRELATED_POINT_DISTANCE).abs() < 1e-12);
    }

    #[test]
    fn query_longer_than_series_is_infinite() {
        let query = SubsequenceQuery::new(&[1.0, 2.0, 3.0], Rescaling::ZNormalize);
        let d = min_subsequence_distance(&query, &[1.0, 2.0]);
        assert_eq!(d, SubsequenceDistance::INFINITY);
    }

    #[test]
    fn dependent_distance_sums_channels() {
        let channels = vec![vec![0.0, 1.0, 2.0, 1.0], vec![3.0, 1.0, 3.0, 1.0]];
        let queries = vec![
            SubsequenceQuery::new(&[0.0, 1.0, 2.0], Rescaling::None),
            SubsequenceQuery::new(&[3.0, 1.0, 3.0], Rescaling::None),
        ];
        assert_eq!(min_dependent_distance(&queries, &channels).value(), 0.0);

        let single = min_subsequence_distance(&queries[0], &channels[0]).value()
            + min_subsequence_distance(&queries[1], &channels[1]).value();
        let shifted = vec![
            SubsequenceQuery::new(&[1.0, 2.0, 1.0], Rescaling::None),
            SubsequenceQuery::new(&[3.0, 1.0, 3.0], Rescaling::None),
        ];
        let joint = min_dependent_distance(&shifted, &channels).value();
        assert!(joint >= single);
    }

    #[test]
    fn dependent_distance_rejects_missing_channels() {
        let queries = vec![
            SubsequenceQuery::new(&[0.0, 1.0], Rescaling::None),
            SubsequenceQuery::new(&[0.0, 1.0], Rescaling::None),
        ];
        let d = min_dependent_distance(&queries, &[vec![0.0, 1.0, 2.0]]);
        assert_eq!(d, SubsequenceDistance::INFINITY);
    }

    #[test]
    fn display_format() {
        let d = SubsequenceDistance::new(1.234567);
        assert_eq!(format!("{d}"), "1.234567");
    }

    #[test]
    fn total_cmp_ordering() {
        let a = SubsequenceDistance::new(1.0);
        let b = SubsequenceDistance::new(2.0);
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(b.total_cmp(&a), Ordering::Greater);
    }
}
