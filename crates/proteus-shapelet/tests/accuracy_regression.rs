//! Accuracy regression tests for proteus-shapelet.
//!
//! End-to-end fits on small hand-built datasets where the best shapelets
//! are known, plus the invariants every strategy must keep.

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use proteus_series::{ClassLabel, Dataset, Rescaling, TimeSeries};
use proteus_shapelet::{
    CheckpointState, DistanceType, FittedShapeletTransform, SearchStrategy, Shapelet,
    ShapeletError, ShapeletTransformConfig,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Four series of length 10: a spike in class 0, a dip in class 1.
fn spike_dip_data() -> Dataset {
    let series = vec![
        TimeSeries::new(vec![0.0, 0.0, 1.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap(),
        TimeSeries::new(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 5.0, 1.0, 0.0, 0.0]).unwrap(),
        TimeSeries::new(vec![0.0, 0.0, -1.0, -5.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap(),
        TimeSeries::new(vec![0.0, 0.0, 0.0, 0.0, 0.0, -1.0, -5.0, -1.0, 0.0, 0.0]).unwrap(),
    ];
    let labels = [0, 0, 1, 1].into_iter().map(ClassLabel::new).collect();
    Dataset::labelled(series, labels).unwrap()
}

/// Noisy series in `n_classes` classes; class `c` carries a ramp of slope
/// `c + 1` at a random offset.
fn noisy_data(n_per_class: usize, n_classes: usize, length: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut series = Vec::new();
    let mut labels = Vec::new();
    for class in 0..n_classes {
        for _ in 0..n_per_class {
            let at = rng.gen_range(0..length - 6);
            let values: Vec<f64> = (0..length)
                .map(|t| {
                    let ramp = if (at..at + 6).contains(&t) {
                        (t - at) as f64 * (class + 1) as f64
                    } else {
                        0.0
                    };
                    ramp + rng.r#gen::<f64>() * 0.5
                })
                .collect();
            series.push(TimeSeries::new(values).unwrap());
            labels.push(ClassLabel::new(class));
        }
    }
    Dataset::labelled(series, labels).unwrap()
}

fn is_strictly_ranked(shapelets: &[Shapelet]) -> bool {
    shapelets.windows(2).all(|w| w[0].rank_cmp(&w[1]).is_lt())
}

fn has_self_similar_pair(shapelets: &[Shapelet]) -> bool {
    shapelets.iter().enumerate().any(|(i, a)| {
        shapelets
            .iter()
            .skip(i + 1)
            .any(|b| a.is_self_similar(b))
    })
}

// ---------------------------------------------------------------------------
// a) exhaustive_finds_perfect_separators
// ---------------------------------------------------------------------------

/// The spike separates the classes perfectly, so the best shapelets have the
/// maximal two-class information gain of 1 bit and the shortest length.
#[test]
fn exhaustive_finds_perfect_separators() {
    let data = spike_dip_data();
    let fitted = ShapeletTransformConfig::new(2, 3, 5).unwrap().fit(&data).unwrap();

    assert_eq!(fitted.n_shapelets(), 2);
    let best = &fitted.shapelets()[0];
    assert!((best.quality() - 1.0).abs() < 1e-12, "quality {}", best.quality());
    assert_eq!(best.length(), 3);
    assert!(is_strictly_ranked(fitted.shapelets()));
    assert_eq!(fitted.stats().candidates_evaluated, 4 * (8 + 7 + 6));
}

// ---------------------------------------------------------------------------
// b) random_with_full_coverage_matches_exhaustive
// ---------------------------------------------------------------------------

/// A random quota covering the whole space visits every candidate, only in a
/// different order, so the retained set must be identical.
#[test]
fn random_with_full_coverage_matches_exhaustive() {
    let data = spike_dip_data();
    let exhaustive = ShapeletTransformConfig::new(2, 3, 5).unwrap().fit(&data).unwrap();
    let random = ShapeletTransformConfig::new(2, 3, 5)
        .unwrap()
        .with_search(SearchStrategy::Random {
            candidates_per_series: 21,
        })
        .with_seed(7)
        .fit(&data)
        .unwrap();
    assert_eq!(random.shapelets(), exhaustive.shapelets());
}

// ---------------------------------------------------------------------------
// c) fits_are_deterministic
// ---------------------------------------------------------------------------

#[test]
fn fits_are_deterministic() {
    let data = noisy_data(5, 2, 30, 11);
    for search in [
        SearchStrategy::default(),
        SearchStrategy::Random {
            candidates_per_series: 20,
        },
        SearchStrategy::ImprovedRandom {
            total_candidates: 60,
        },
        SearchStrategy::tabu(15),
        SearchStrategy::genetic(15, 6, 3),
    ] {
        let config = ShapeletTransformConfig::new(5, 4, 8)
            .unwrap()
            .with_search(search.clone())
            .with_seed(99);
        let a = config.fit(&data).unwrap();
        let b = config.fit(&data).unwrap();
        assert_eq!(a.shapelets(), b.shapelets(), "{search:?} is not deterministic");
        assert_eq!(a.transform(&data).unwrap(), b.transform(&data).unwrap());
    }
}

// ---------------------------------------------------------------------------
// d) every_strategy_keeps_the_best_k_invariant
// ---------------------------------------------------------------------------

#[test]
fn every_strategy_keeps_the_best_k_invariant() {
    let data = noisy_data(4, 2, 24, 5);
    let strategies = vec![
        SearchStrategy::Full {
            length_step: 2,
            position_step: 3,
        },
        SearchStrategy::Random {
            candidates_per_series: 10,
        },
        SearchStrategy::ImprovedRandom {
            total_candidates: 40,
        },
        SearchStrategy::SubsampleRandom {
            total_candidates: 40,
            proportion: 0.5,
        },
        SearchStrategy::RefinedRandom {
            total_candidates: 40,
            min_ratio: 0.1,
        },
        SearchStrategy::SkewedRandom {
            total_candidates: 40,
            length_weights: vec![0.0, 1.0, 2.0, 4.0, 1.0],
        },
        SearchStrategy::tabu(10),
        SearchStrategy::Local {
            candidates_per_series: 10,
            max_steps: 5,
        },
        SearchStrategy::genetic(10, 4, 2),
        SearchStrategy::Skipping {
            position_skip: 3,
            length_skip: 2,
        },
        SearchStrategy::timed(Some(Duration::from_micros(50))),
    ];
    for search in strategies {
        let fitted = ShapeletTransformConfig::new(6, 4, 8)
            .unwrap()
            .with_search(search.clone())
            .fit(&data)
            .unwrap();
        let shapelets = fitted.shapelets();
        assert!(!shapelets.is_empty(), "{search:?} found nothing");
        assert!(shapelets.len() <= 6, "{search:?} exceeded K");
        assert!(is_strictly_ranked(shapelets), "{search:?} broke the ranking");
        assert!(!has_self_similar_pair(shapelets), "{search:?} kept overlaps");
        assert!(
            shapelets.iter().all(|s| (4..=8).contains(&s.length())),
            "{search:?} left the length range"
        );
    }
}

// ---------------------------------------------------------------------------
// e) self_distance_is_exactly_zero
// ---------------------------------------------------------------------------

#[test]
fn self_distance_is_exactly_zero() {
    let data = noisy_data(4, 2, 20, 3);
    let fitted = ShapeletTransformConfig::new(5, 3, 6).unwrap().fit(&data).unwrap();
    let features = fitted.transform(&data).unwrap();
    for (column, shapelet) in fitted.shapelets().iter().enumerate() {
        assert_eq!(features.value(shapelet.series_id(), column), Some(0.0));
    }
}

// ---------------------------------------------------------------------------
// f) zero_variance_windows_stay_finite
// ---------------------------------------------------------------------------

#[test]
fn zero_variance_windows_stay_finite() {
    let series = vec![
        TimeSeries::new(vec![2.0; 8]).unwrap(),
        TimeSeries::new(vec![2.0; 8]).unwrap(),
        TimeSeries::new(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]).unwrap(),
        TimeSeries::new(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]).unwrap(),
    ];
    let labels = [0, 0, 1, 1].into_iter().map(ClassLabel::new).collect();
    let data = Dataset::labelled(series, labels).unwrap();

    let fitted = ShapeletTransformConfig::new(3, 3, 4).unwrap().fit(&data).unwrap();
    let features = fitted.transform(&data).unwrap();
    for row in features.rows() {
        assert!(row.iter().all(|d| d.is_finite() && *d >= 0.0));
    }
    // A constant shapelet is at distance 0 from both constant series and at
    // the uncorrelated distance 2 from the alternating ones.
    let constant = fitted
        .shapelets()
        .iter()
        .position(|s| s.content()[0].iter().all(|&v| v == 0.0))
        .expect("a constant window separates the classes perfectly");
    assert_eq!(features.value(0, constant), Some(0.0));
    assert_eq!(features.value(1, constant), Some(0.0));
    assert_eq!(features.value(2, constant), Some(2.0));
}

// ---------------------------------------------------------------------------
// g) persisted_shapelets_reproduce_the_transform
// ---------------------------------------------------------------------------

#[test]
fn persisted_shapelets_reproduce_the_transform() {
    let data = noisy_data(4, 3, 20, 21);
    let fitted = ShapeletTransformConfig::new(4, 3, 6)
        .unwrap()
        .with_rescaling(Rescaling::ZNormalize)
        .fit(&data)
        .unwrap();

    let bytes = bincode::serialize(fitted.shapelets()).unwrap();
    let restored: Vec<Shapelet> = bincode::deserialize(&bytes).unwrap();
    let reloaded = FittedShapeletTransform::from_shapelets(restored, fitted.distance());

    let original = fitted.transform(&data).unwrap();
    let replayed = reloaded.transform(&data).unwrap();
    for (a, b) in original.rows().iter().zip(replayed.rows()) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-12);
        }
    }
}

// ---------------------------------------------------------------------------
// h) contract_stops_after_the_overrunning_series
// ---------------------------------------------------------------------------

#[test]
fn contract_stops_after_the_overrunning_series() {
    let data = noisy_data(10, 2, 40, 8);
    let fitted = ShapeletTransformConfig::new(5, 3, 20)
        .unwrap()
        .with_contract(Some(Duration::from_nanos(1)))
        .fit(&data)
        .unwrap();
    assert!(fitted.stats().contract_exhausted);
    assert_eq!(fitted.stats().series_searched, 1);
    assert!(fitted.n_shapelets() > 0);
}

#[test]
fn contract_preset_fits_small_datasets() {
    let data = noisy_data(4, 2, 30, 4);
    let config = ShapeletTransformConfig::for_contract(&data, Duration::from_secs(120)).unwrap();
    let fitted = config.fit(&data).unwrap();
    assert!(fitted.n_shapelets() <= config.k());
    assert!(fitted.n_shapelets() > 0);
    assert!(!fitted.stats().contract_exhausted);
}

#[test]
fn timed_search_needs_a_budget() {
    let data = noisy_data(2, 2, 20, 1);
    let err = ShapeletTransformConfig::new(2, 3, 5)
        .unwrap()
        .with_search(SearchStrategy::timed(None))
        .fit(&data)
        .unwrap_err();
    assert!(matches!(err, ShapeletError::TimedSearchWithoutBudget));
}

// ---------------------------------------------------------------------------
// i) balanced_buckets_respect_their_quota
// ---------------------------------------------------------------------------

#[test]
fn balanced_buckets_respect_their_quota() {
    let data = noisy_data(4, 3, 20, 17);
    let config = ShapeletTransformConfig::new(7, 3, 6)
        .unwrap()
        .with_balanced_classes(true)
        .with_round_robin(true);
    let mut snapshots: Vec<CheckpointState> = Vec::new();
    let mut sink = |state: &CheckpointState| -> Result<(), ShapeletError> {
        snapshots.push(state.clone());
        Ok(())
    };
    let fitted = config.fit_with_checkpoint(&data, &mut sink).unwrap();

    for state in &snapshots {
        assert_eq!(state.retained.len(), 3);
        for bucket in &state.retained {
            assert!(bucket.len() <= 2);
            assert!(is_strictly_ranked(bucket));
        }
    }
    // Round robin interleaves the classes.
    assert_eq!(&snapshots[0].order[..3], &[0, 4, 8]);

    let shapelets = fitted.shapelets();
    assert!(shapelets.len() <= 6);
    let classes: Vec<usize> = shapelets.iter().map(|s| s.class_value().index()).collect();
    assert_eq!(&classes[..3], &[0, 1, 2]);
}

#[test]
fn balancing_needs_a_shapelet_per_class() {
    let data = noisy_data(2, 3, 20, 2);
    let err = ShapeletTransformConfig::new(2, 3, 5)
        .unwrap()
        .with_balanced_classes(true)
        .fit(&data)
        .unwrap_err();
    assert!(matches!(
        err,
        ShapeletError::TooFewShapeletsForBalancing { k: 2, n_classes: 3 }
    ));
}

// ---------------------------------------------------------------------------
// j) multichannel_distance_types
// ---------------------------------------------------------------------------

fn two_channel_data() -> Dataset {
    let spike = vec![0.0, 0.0, 1.0, 5.0, 1.0, 0.0, 0.0, 0.0];
    let dip: Vec<f64> = spike.iter().map(|v| -v).collect();
    let ramp: Vec<f64> = (0..8).map(|t| t as f64).collect();
    let series = vec![
        TimeSeries::multivariate(vec![ramp.clone(), spike.clone()]).unwrap(),
        TimeSeries::multivariate(vec![ramp.clone(), spike.clone()]).unwrap(),
        TimeSeries::multivariate(vec![ramp.clone(), dip.clone()]).unwrap(),
        TimeSeries::multivariate(vec![ramp, dip]).unwrap(),
    ];
    let labels = [0, 0, 1, 1].into_iter().map(ClassLabel::new).collect();
    Dataset::labelled(series, labels).unwrap()
}

#[test]
fn independent_shapelets_come_from_the_informative_channel() {
    let data = two_channel_data();
    let fitted = ShapeletTransformConfig::new(2, 3, 4)
        .unwrap()
        .with_distance_type(DistanceType::Independent)
        .fit(&data)
        .unwrap();
    let best = &fitted.shapelets()[0];
    assert_eq!(best.dimension(), 1);
    assert_eq!(best.n_dimensions(), 1);
    assert!((best.quality() - 1.0).abs() < 1e-12);
    assert_eq!(fitted.transform(&data).unwrap().n_shapelets(), 2);
}

#[test]
fn dependent_shapelets_cover_every_channel() {
    let data = two_channel_data();
    let fitted = ShapeletTransformConfig::new(2, 3, 4)
        .unwrap()
        .with_distance_type(DistanceType::Dependent)
        .fit(&data)
        .unwrap();
    assert!(fitted.shapelets().iter().all(|s| s.n_dimensions() == 2));
    assert!((fitted.shapelets()[0].quality() - 1.0).abs() < 1e-12);

    let ids: HashSet<usize> = fitted.shapelets().iter().map(Shapelet::dimension).collect();
    assert_eq!(ids, HashSet::from([0]));
}
