//! Best-K retention: self-similarity removal, capped merge and class buckets.

use proteus_series::ClassLabel;

use crate::shapelet::Shapelet;

/// Content distance below which two equally ranked shapelets are duplicates.
pub const NEAR_DUPLICATE_TOLERANCE: f64 = 1e-6;

/// Sort shapelets by rank.
pub fn sort_by_rank(shapelets: &mut [Shapelet]) {
    shapelets.sort_by(Shapelet::rank_cmp);
}

/// Drop every shapelet that overlaps a better one from the same source
/// series and channel.
///
/// `sorted` must be in rank order; the better of each overlapping pair is
/// the one kept.
#[must_use]
pub fn remove_self_similar(sorted: Vec<Shapelet>) -> Vec<Shapelet> {
    let mut kept: Vec<Shapelet> = Vec::with_capacity(sorted.len());
    for shapelet in sorted {
        if !kept.iter().any(|k| k.is_self_similar(&shapelet)) {
            kept.push(shapelet);
        }
    }
    kept
}

fn is_near_duplicate(retained: &[Shapelet], candidate: &Shapelet) -> bool {
    retained
        .iter()
        .rev()
        .take_while(|s| s.quality() == candidate.quality() && s.length() == candidate.length())
        .any(|s| s.content_distance(candidate) < NEAR_DUPLICATE_TOLERANCE)
}

/// Merge two rank-ordered lists, keeping at most `k`.
///
/// A shapelet present in both lists is kept once. With
/// `prune_near_duplicates`, a shapelet whose quality and length equal an
/// already retained one with (almost) identical content is skipped.
#[must_use]
pub fn merge(
    k: usize,
    best: Vec<Shapelet>,
    new: Vec<Shapelet>,
    prune_near_duplicates: bool,
) -> Vec<Shapelet> {
    let mut out = Vec::with_capacity(k.min(best.len() + new.len()));
    let mut a = best.into_iter().peekable();
    let mut b = new.into_iter().peekable();
    while out.len() < k {
        let next = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => match x.rank_cmp(y) {
                std::cmp::Ordering::Less => a.next(),
                std::cmp::Ordering::Greater => b.next(),
                std::cmp::Ordering::Equal => {
                    b.next();
                    a.next()
                }
            },
            (Some(_), None) => a.next(),
            (None, Some(_)) => b.next(),
            (None, None) => None,
        };
        let Some(candidate) = next else {
            break;
        };
        if prune_near_duplicates && is_near_duplicate(&out, &candidate) {
            continue;
        }
        out.push(candidate);
    }
    out
}

/// The retained shapelets: one list capped at K, or one list per class
/// capped at `floor(K / classes)`.
///
/// Every list stays in rank order and within its cap.
#[derive(Debug, Clone, PartialEq)]
pub enum BestKStore {
    /// One list for all classes.
    Global {
        /// Cap.
        k: usize,
        /// Retained shapelets in rank order.
        list: Vec<Shapelet>,
    },
    /// One list per class.
    Balanced {
        /// Cap of each class list.
        quota: usize,
        /// Retained shapelets per class, in rank order.
        lists: Vec<Vec<Shapelet>>,
    },
}

impl BestKStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(k: usize, n_classes: usize, balanced: bool) -> Self {
        if balanced && n_classes > 0 {
            BestKStore::Balanced {
                quota: k / n_classes,
                lists: vec![Vec::new(); n_classes],
            }
        } else {
            BestKStore::Global {
                k,
                list: Vec::new(),
            }
        }
    }

    /// Quality of the worst retained shapelet of the list `class` merges
    /// into, when that list is full.
    #[must_use]
    pub fn bound(&self, class: ClassLabel) -> Option<f64> {
        let (cap, list) = match self {
            BestKStore::Global { k, list } => (*k, list),
            BestKStore::Balanced { quota, lists } => (*quota, lists.get(class.index())?),
        };
        if cap > 0 && list.len() >= cap {
            list.last().map(Shapelet::quality)
        } else {
            None
        }
    }

    /// Merge one series' rank-ordered shapelets.
    pub fn merge(&mut self, found: Vec<Shapelet>, prune_near_duplicates: bool) {
        match self {
            BestKStore::Global { k, list } => {
                *list = merge(*k, std::mem::take(list), found, prune_near_duplicates);
            }
            BestKStore::Balanced { quota, lists } => {
                let mut by_class: Vec<Vec<Shapelet>> = vec![Vec::new(); lists.len()];
                for shapelet in found {
                    if let Some(bucket) = by_class.get_mut(shapelet.class_value().index()) {
                        bucket.push(shapelet);
                    }
                }
                for (list, bucket) in lists.iter_mut().zip(by_class) {
                    if !bucket.is_empty() {
                        *list = merge(*quota, std::mem::take(list), bucket, prune_near_duplicates);
                    }
                }
            }
        }
    }

    /// Number of shapelets retained across all lists.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            BestKStore::Global { list, .. } => list.len(),
            BestKStore::Balanced { lists, .. } => lists.iter().map(Vec::len).sum(),
        }
    }

    /// Return true if nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the retained lists (one list in global mode).
    #[must_use]
    pub fn lists(&self) -> Vec<Vec<Shapelet>> {
        match self {
            BestKStore::Global { list, .. } => vec![list.clone()],
            BestKStore::Balanced { lists, .. } => lists.clone(),
        }
    }

    /// Replace the retained lists with a saved copy.
    ///
    /// Returns false, leaving the store unchanged, if the number of lists
    /// does not match this store's mode.
    pub fn restore(&mut self, saved: Vec<Vec<Shapelet>>) -> bool {
        match self {
            BestKStore::Global { list, .. } => {
                let Ok([saved]) = <[Vec<Shapelet>; 1]>::try_from(saved) else {
                    return false;
                };
                *list = saved;
            }
            BestKStore::Balanced { lists, .. } => {
                if saved.len() != lists.len() {
                    return false;
                }
                *lists = saved;
            }
        }
        true
    }

    /// The final shapelet set.
    ///
    /// Balanced mode interleaves the classes by rank: every class's best,
    /// then every class's second best, and so on.
    #[must_use]
    pub fn finalize(self) -> Vec<Shapelet> {
        match self {
            BestKStore::Global { list, .. } => list,
            BestKStore::Balanced { lists, .. } => {
                let depth = lists.iter().map(Vec::len).max().unwrap_or(0);
                let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
                let mut out = Vec::new();
                for _ in 0..depth {
                    for it in &mut iters {
                        out.extend(it.next());
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::candidate::CandidateLocation;

    use super::*;

    fn shapelet(series_id: usize, start: usize, length: usize, quality: f64, class: usize) -> Shapelet {
        Shapelet::scored(
            series_id,
            CandidateLocation::new(start, length, 0),
            ClassLabel::new(class),
            quality,
            vec![(0..length).map(|i| (i + start + series_id) as f64).collect()],
        )
    }

    fn qualities(list: &[Shapelet]) -> Vec<f64> {
        list.iter().map(Shapelet::quality).collect()
    }

    #[test]
    fn self_similar_keeps_the_better() {
        let mut found = vec![
            shapelet(0, 0, 4, 0.3, 0),
            shapelet(0, 2, 4, 0.9, 0),
            shapelet(0, 10, 4, 0.5, 0),
        ];
        sort_by_rank(&mut found);
        let kept = remove_self_similar(found);
        assert_eq!(qualities(&kept), vec![0.9, 0.5]);
    }

    #[test]
    fn merge_caps_and_orders() {
        let best = vec![shapelet(0, 0, 3, 0.9, 0), shapelet(0, 5, 3, 0.4, 0)];
        let new = vec![shapelet(1, 0, 3, 0.7, 0), shapelet(1, 5, 3, 0.1, 0)];
        let merged = merge(3, best, new, false);
        assert_eq!(qualities(&merged), vec![0.9, 0.7, 0.4]);
    }

    #[test]
    fn merge_keeps_identical_once() {
        let a = shapelet(0, 0, 3, 0.9, 0);
        let merged = merge(5, vec![a.clone()], vec![a.clone()], false);
        assert_eq!(merged, vec![a]);
    }

    #[test]
    fn merge_prunes_near_duplicates() {
        let a = shapelet(0, 0, 3, 0.5, 0);
        let mut b = shapelet(1, 0, 3, 0.5, 0);
        b = Shapelet::scored(
            b.series_id(),
            b.location(),
            b.class_value(),
            b.quality(),
            a.content().to_vec(),
        );
        let kept = merge(5, vec![a.clone()], vec![b.clone()], false);
        assert_eq!(kept.len(), 2);
        let pruned = merge(5, vec![a.clone()], vec![b], true);
        assert_eq!(pruned, vec![a]);
    }

    #[test]
    fn global_bound_only_when_full() {
        let mut store = BestKStore::new(2, 2, false);
        assert_eq!(store.bound(ClassLabel::new(0)), None);
        store.merge(vec![shapelet(0, 0, 3, 0.8, 0)], false);
        assert_eq!(store.bound(ClassLabel::new(0)), None);
        store.merge(vec![shapelet(1, 0, 3, 0.6, 1)], false);
        assert_eq!(store.bound(ClassLabel::new(1)), Some(0.6));
    }

    #[test]
    fn balanced_buckets_respect_quota() {
        let mut store = BestKStore::new(5, 2, true);
        let mut found: Vec<Shapelet> = (0..6)
            .map(|i| shapelet(i, 0, 3, 0.1 * i as f64, i % 2))
            .collect();
        sort_by_rank(&mut found);
        store.merge(found, false);

        let BestKStore::Balanced { quota, lists } = &store else {
            panic!("expected balanced store");
        };
        assert_eq!(*quota, 2);
        for list in lists {
            assert!(list.len() <= 2);
            assert!(list.windows(2).all(|w| w[0].rank_cmp(&w[1]).is_lt()));
        }
        assert_eq!(store.bound(ClassLabel::new(0)), Some(0.2));
        assert_eq!(store.bound(ClassLabel::new(1)), Some(0.30000000000000004));

        let finalized = store.finalize();
        assert!(finalized.len() <= 5);
        let classes: Vec<usize> = finalized.iter().map(|s| s.class_value().index()).collect();
        assert_eq!(classes, vec![0, 1, 0, 1]);
        assert_eq!(qualities(&finalized)[0], 0.4);
    }

    #[test]
    fn restore_checks_list_count() {
        let mut store = BestKStore::new(4, 2, true);
        assert!(!store.restore(vec![Vec::new()]));
        assert!(store.restore(vec![vec![shapelet(0, 0, 3, 0.5, 0)], Vec::new()]));
        assert_eq!(store.len(), 1);

        let mut global = BestKStore::new(4, 2, false);
        assert!(global.restore(vec![vec![shapelet(0, 0, 3, 0.5, 0)]]));
        assert!(!global.restore(vec![Vec::new(), Vec::new()]));
        assert_eq!(global.lists().len(), 1);
    }
}
