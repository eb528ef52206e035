//! Quality measures computed from an order line.

use crate::order_line::{OrderLine, OrderLineEntry};
use crate::shapelet::sanitize_quality;

/// Floor on the within-group mean square so the F-statistic stays finite.
const MIN_WITHIN_VARIANCE: f64 = 1e-12;

/// How a candidate's order line is turned into a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum QualityMeasure {
    /// Information gain (bits) of the best binary split by distance.
    #[default]
    InformationGain,
    /// One-way ANOVA F-statistic of the distances grouped by class.
    FStat,
    /// Kruskal-Wallis H statistic of the distances grouped by class.
    KruskalWallis,
}

impl QualityMeasure {
    /// Score an order line against the class distribution it was drawn from.
    ///
    /// `distribution[c]` is the number of series of (mapped) class `c`.
    /// Always finite and non-negative; an empty order line scores 0.
    #[must_use]
    pub fn quality(self, line: &OrderLine, distribution: &[usize]) -> f64 {
        if line.is_empty() {
            return 0.0;
        }
        let sorted = line.sorted();
        let raw = match self {
            QualityMeasure::InformationGain => information_gain(&sorted, distribution),
            QualityMeasure::FStat => f_stat(&sorted, distribution.len()),
            QualityMeasure::KruskalWallis => kruskal_wallis(&sorted, distribution.len()),
        };
        sanitize_quality(raw).max(0.0)
    }

    /// Return true if an optimistic bound exists for early candidate pruning.
    #[must_use]
    pub fn supports_bound(self) -> bool {
        matches!(self, QualityMeasure::InformationGain)
    }
}

/// Shannon entropy in bits of a class-count vector.
#[must_use]
pub fn entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Information gain of splitting `left`/`right` counts out of `parent_entropy`.
pub(crate) fn split_gain(parent_entropy: f64, left: &[usize], right: &[usize]) -> f64 {
    let n_left: usize = left.iter().sum();
    let n_right: usize = right.iter().sum();
    let total = (n_left + n_right) as f64;
    if total == 0.0 {
        return 0.0;
    }
    parent_entropy
        - (n_left as f64 / total) * entropy(left)
        - (n_right as f64 / total) * entropy(right)
}

fn information_gain(sorted: &[OrderLineEntry], distribution: &[usize]) -> f64 {
    let parent = entropy(distribution);
    let mut left = vec![0usize; distribution.len()];
    let mut right = distribution.to_vec();
    let mut best = 0.0;
    for (i, entry) in sorted.iter().enumerate().take(sorted.len().saturating_sub(1)) {
        if entry.class >= left.len() {
            continue;
        }
        left[entry.class] += 1;
        right[entry.class] = right[entry.class].saturating_sub(1);
        if sorted[i + 1].distance == entry.distance {
            continue;
        }
        let gain = split_gain(parent, &left, &right);
        if gain > best {
            best = gain;
        }
    }
    best
}

fn f_stat(sorted: &[OrderLineEntry], n_classes: usize) -> f64 {
    let mut sums = vec![0.0; n_classes];
    let mut counts = vec![0usize; n_classes];
    for entry in sorted.iter().filter(|e| e.class < n_classes) {
        sums[entry.class] += entry.distance;
        counts[entry.class] += 1;
    }
    let n: usize = counts.iter().sum();
    let groups = counts.iter().filter(|&&c| c > 0).count();
    if groups < 2 || n <= groups {
        return 0.0;
    }
    let grand_mean = sums.iter().sum::<f64>() / n as f64;
    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    let between: f64 = means
        .iter()
        .zip(&counts)
        .map(|(&m, &c)| c as f64 * (m - grand_mean) * (m - grand_mean))
        .sum();
    let within: f64 = sorted
        .iter()
        .filter(|e| e.class < n_classes)
        .map(|e| {
            let d = e.distance - means[e.class];
            d * d
        })
        .sum();

    let between_ms = between / (groups - 1) as f64;
    let within_ms = (within / (n - groups) as f64).max(MIN_WITHIN_VARIANCE);
    between_ms / within_ms
}

fn kruskal_wallis(sorted: &[OrderLineEntry], n_classes: usize) -> f64 {
    let entries: Vec<&OrderLineEntry> = sorted.iter().filter(|e| e.class < n_classes).collect();
    let n = entries.len();
    if n < 2 {
        return 0.0;
    }
    // Average ranks over runs of equal distances (1-based).
    let mut rank_sums = vec![0.0; n_classes];
    let mut counts = vec![0usize; n_classes];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && entries[j + 1].distance == entries[i].distance {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for entry in &entries[i..=j] {
            rank_sums[entry.class] += rank;
            counts[entry.class] += 1;
        }
        i = j + 1;
    }
    if counts.iter().filter(|&&c| c > 0).count() < 2 {
        return 0.0;
    }
    let n = n as f64;
    let sum: f64 = rank_sums
        .iter()
        .zip(&counts)
        .filter(|(_, c)| **c > 0)
        .map(|(&r, &c)| r * r / c as f64)
        .sum();
    12.0 / (n * (n + 1.0)) * sum - 3.0 * (n + 1.0)
}
