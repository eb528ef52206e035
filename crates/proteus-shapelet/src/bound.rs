//! Optimistic information-gain bound for abandoning weak candidates early.

use crate::order_line::OrderLineEntry;
use crate::quality::{entropy, split_gain};

/// Tracks a partially built order line and decides whether the candidate
/// can still beat `threshold`.
///
/// The bound assumes each class's unprocessed series all land on whichever
/// side of the split already holds more of that class. It is only checked
/// when the number of processed entries is a multiple of the class count
/// and at least the start percentage of the dataset has been processed.
#[derive(Debug, Clone)]
pub struct InformationGainBound {
    distribution: Vec<usize>,
    parent_entropy: f64,
    threshold: f64,
    min_entries: usize,
    total: usize,
    entries: Vec<OrderLineEntry>,
}

impl InformationGainBound {
    /// Create a bound for a candidate that must beat `threshold`.
    ///
    /// `start_percentage` is in [0, 100].
    #[must_use]
    pub fn new(distribution: Vec<usize>, threshold: f64, start_percentage: f64) -> Self {
        let total: usize = distribution.iter().sum();
        let min_entries = (start_percentage / 100.0 * total as f64).ceil() as usize;
        Self {
            parent_entropy: entropy(&distribution),
            distribution,
            threshold,
            min_entries,
            total,
            entries: Vec::with_capacity(total),
        }
    }

    /// Record one processed series.
    pub fn push(&mut self, distance: f64, class: usize) {
        self.entries.push(OrderLineEntry { distance, class });
    }

    /// Number of processed series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if nothing has been processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return true if the candidate provably cannot beat the threshold.
    #[must_use]
    pub fn should_prune(&self) -> bool {
        let n = self.entries.len();
        let n_classes = self.distribution.len();
        if n == 0 || n_classes == 0 || n >= self.total {
            return false;
        }
        if n % n_classes != 0 || n < self.min_entries {
            return false;
        }
        self.bound() <= self.threshold
    }

    /// Best gain reachable from the processed entries.
    #[must_use]
    pub fn bound(&self) -> f64 {
        let n_classes = self.distribution.len();
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut right = vec![0usize; n_classes];
        for entry in sorted.iter().filter(|e| e.class < n_classes) {
            right[entry.class] += 1;
        }
        let unprocessed: Vec<usize> = self
            .distribution
            .iter()
            .zip(&right)
            .map(|(&total, &seen)| total.saturating_sub(seen))
            .collect();
        let mut left = vec![0usize; n_classes];

        let mut best = self.optimistic_gain(&left, &right, &unprocessed);
        for (k, entry) in sorted.iter().enumerate() {
            if entry.class >= n_classes {
                continue;
            }
            left[entry.class] += 1;
            right[entry.class] -= 1;
            let at_boundary = sorted
                .get(k + 1)
                .is_none_or(|next| next.distance != entry.distance);
            if at_boundary {
                best = best.max(self.optimistic_gain(&left, &right, &unprocessed));
            }
        }
        best
    }

    fn optimistic_gain(&self, left: &[usize], right: &[usize], unprocessed: &[usize]) -> f64 {
        let mut l = left.to_vec();
        let mut r = right.to_vec();
        for (c, &u) in unprocessed.iter().enumerate() {
            if l[c] > r[c] {
                l[c] += u;
            } else {
                r[c] += u;
            }
        }
        split_gain(self.parent_entropy, &l, &r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separable_prefix_is_kept() {
        let mut bound = InformationGainBound::new(vec![2, 2], 0.5, 0.0);
        bound.push(0.0, 0);
        bound.push(0.9, 1);
        assert!((bound.bound() - 1.0).abs() < 1e-12);
        assert!(!bound.should_prune());
    }

    #[test]
    fn maximal_threshold_prunes_once_checked() {
        let mut bound = InformationGainBound::new(vec![3, 3], 1.0, 0.0);
        bound.push(0.5, 0);
        bound.push(0.5, 1);
        assert!(bound.should_prune());
    }

    #[test]
    fn not_checked_between_class_multiples() {
        let mut bound = InformationGainBound::new(vec![3, 3], 1.0, 0.0);
        bound.push(0.5, 0);
        assert!(!bound.should_prune());
        bound.push(0.5, 1);
        bound.push(0.6, 1);
        assert!(!bound.should_prune());
    }

    #[test]
    fn not_checked_before_start_percentage() {
        let mut bound = InformationGainBound::new(vec![5, 5], 1.0, 50.0);
        bound.push(0.1, 0);
        bound.push(0.1, 1);
        assert!(!bound.should_prune());
        bound.push(0.2, 0);
        bound.push(0.2, 1);
        assert!(!bound.should_prune());
        bound.push(0.3, 0);
        bound.push(0.3, 1);
        assert!(bound.should_prune());
    }

    #[test]
    fn negative_threshold_never_prunes() {
        let mut bound = InformationGainBound::new(vec![2, 2], -1.0, 0.0);
        bound.push(0.5, 0);
        bound.push(0.5, 1);
        assert!(!bound.should_prune());
    }

    #[test]
    fn bound_is_not_below_final_gain() {
        use crate::order_line::OrderLine;
        use crate::quality::QualityMeasure;

        let full = [(0.1, 0), (0.4, 1), (0.2, 0), (0.8, 1), (0.3, 1), (0.9, 0)];
        let line: OrderLine = full.iter().copied().collect();
        let actual = QualityMeasure::InformationGain.quality(&line, &[3, 3]);

        let mut bound = InformationGainBound::new(vec![3, 3], 0.0, 0.0);
        for &(d, c) in &full[..4] {
            bound.push(d, c);
        }
        assert!(bound.bound() + 1e-12 >= actual);
    }
}
