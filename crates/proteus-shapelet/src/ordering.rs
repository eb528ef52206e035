//! Series visiting order.

use std::collections::VecDeque;

use proteus_series::ClassLabel;

/// Interleave series by class: the first series of class 0, then of class 1,
/// and so on, skipping classes that have run out.
///
/// Returns series ids; within a class the original order is kept.
#[must_use]
pub fn round_robin(labels: &[ClassLabel], n_classes: usize) -> Vec<usize> {
    let mut buckets: Vec<VecDeque<usize>> = vec![VecDeque::new(); n_classes];
    for (id, label) in labels.iter().enumerate() {
        if let Some(bucket) = buckets.get_mut(label.index()) {
            bucket.push_back(id);
        }
    }
    let mut order = Vec::with_capacity(labels.len());
    while order.len() < labels.len() {
        let before = order.len();
        for bucket in &mut buckets {
            order.extend(bucket.pop_front());
        }
        if order.len() == before {
            break;
        }
    }
    order
}
