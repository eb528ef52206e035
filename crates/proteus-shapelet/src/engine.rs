//! The per-series search loop: evaluate, merge into best-K, time and checkpoint.

use std::time::{Duration, Instant};

use proteus_series::{ClassLabel, Dataset, TimeSeries};
use tracing::{debug, info, instrument, warn};

use crate::best_k::{BestKStore, remove_self_similar, sort_by_rank};
use crate::bound::InformationGainBound;
use crate::candidate::CandidateLocation;
use crate::checkpoint::{Checkpoint, CheckpointState};
use crate::class_value::ClassValues;
use crate::config::ShapeletTransformConfig;
use crate::distance::{DistanceType, ShapeletDistance};
use crate::error::ShapeletError;
use crate::order_line::OrderLine;
use crate::ordering::round_robin;
use crate::quality::QualityMeasure;
use crate::search::{FullSearch, SearchContext, SearchSpace, SeriesRef, ShapeletSearch};
use crate::shapelet::Shapelet;
use crate::stats::FitStats;
use crate::timing::AdaptiveTimer;
use crate::transform::FittedShapeletTransform;

/// Scores candidates cut from one series against the whole dataset.
struct CandidateEvaluator<'a> {
    series: &'a [TimeSeries],
    labels: &'a [ClassLabel],
    distance: ShapeletDistance,
    class_values: &'a ClassValues,
    quality: QualityMeasure,
    pruning_start_percentage: f64,
    source: usize,
    class: ClassLabel,
    /// Quality to beat, when the relevant best-K list is full.
    threshold: Option<f64>,
    evaluated: u64,
    abandoned: u64,
}

impl CandidateEvaluator<'_> {
    fn evaluate(&mut self, location: CandidateLocation) -> Option<Shapelet> {
        self.evaluated += 1;
        let source = &self.series[self.source];
        let content = self.distance.extract(source, location);
        let prepared = self.distance.prepare(&content, location.dimension);
        let distribution = self.class_values.distribution(self.class);
        let mut bound = self.threshold.map(|threshold| {
            InformationGainBound::new(distribution.clone(), threshold, self.pruning_start_percentage)
        });

        let mut line = OrderLine::with_capacity(self.series.len());
        for (id, (series, &label)) in self.series.iter().zip(self.labels).enumerate() {
            let d = if id == self.source {
                0.0
            } else {
                self.distance.distance(&prepared, series)
            };
            let class = self.class_values.map(label, self.class);
            line.push(d, class);
            if let Some(bound) = bound.as_mut() {
                bound.push(d, class);
                if bound.should_prune() {
                    self.abandoned += 1;
                    return None;
                }
            }
        }

        let quality = self.quality.quality(&line, &distribution);
        Some(Shapelet::scored(
            self.source,
            location,
            self.class,
            quality,
            content,
        ))
    }
}

/// Run the shapelet search over `dataset`.
///
/// With `resume`, the loop restarts from the snapshot's cursor, pass,
/// counters and retained shapelets instead of from scratch.
#[instrument(skip_all, fields(k = config.k, n_series = dataset.len()))]
pub(crate) fn fit(
    config: &ShapeletTransformConfig,
    dataset: &Dataset,
    resume: Option<CheckpointState>,
    mut checkpoint: Option<&mut dyn Checkpoint>,
) -> Result<FittedShapeletTransform, ShapeletError> {
    // --- Validate inputs ---
    config.validate(dataset)?;
    let labels = dataset.labels().ok_or(ShapeletError::MissingLabels)?;
    let n_series = dataset.len();
    let n_classes = dataset.n_classes();

    // --- Build the search ---
    let n_dimensions = match config.distance_type {
        DistanceType::Independent => dataset.n_channels(),
        DistanceType::Dependent => 1,
    };
    let space = SearchSpace::new(
        dataset.series_length(),
        config.min_length,
        config.max_length,
        n_dimensions,
    );
    let context = SearchContext {
        space,
        labels,
        n_classes,
        contract: config.contract,
    };
    let mut strategy: Box<dyn ShapeletSearch> = config.search.build(config.seed);
    strategy.init(&context)?;

    let distance = ShapeletDistance::new(config.rescaling, config.distance_type);
    let class_values = ClassValues::new(config.class_value_mode, dataset.class_counts());
    let mut store = BestKStore::new(config.k, n_classes, config.balanced_classes);
    let mut order: Vec<usize> = if config.round_robin {
        round_robin(labels, n_classes)
    } else {
        (0..n_series).collect()
    };
    let mut timer = match config.contract {
        Some(contract) if config.adaptive_timing => {
            Some(AdaptiveTimer::new(contract, config.initial_time_per_candidate))
        }
        _ => None,
    };

    let mut stats = FitStats {
        strategy: strategy.name().to_string(),
        ..FitStats::default()
    };
    let mut cursor = 0;
    let mut pass = 0;
    let mut prior_elapsed = Duration::ZERO;

    // --- Restore a snapshot ---
    if let Some(state) = resume {
        let valid_order = state.order.len() == n_series && state.order.iter().all(|&id| id < n_series);
        if state.n_series != n_series || !valid_order || !store.restore(state.retained) {
            return Err(ShapeletError::CheckpointMismatch {
                expected: n_series,
                found: state.n_series,
            });
        }
        order = state.order;
        cursor = state.cursor;
        pass = state.pass;
        stats.series_searched = state.series_searched;
        stats.candidates_evaluated = state.candidates_evaluated;
        stats.early_abandons = state.early_abandons;
        prior_elapsed = state.elapsed;
        timer = timer.map(|t| t.with_estimate(state.time_per_candidate_nanos));
        if state.switched_to_full {
            let mut full = FullSearch::new(1, 1);
            full.init(&context)?;
            strategy = Box::new(full);
            stats.switched_to_full = true;
        }
        info!(cursor, pass, retained = store.len(), "resuming shapelet search");
    }

    let start = Instant::now();
    let used = |start: Instant| prior_elapsed + start.elapsed();

    // --- Search loop ---
    loop {
        if cursor >= order.len() {
            let time_left = config.contract.is_some_and(|c| used(start) < c);
            if time_left && strategy.can_restart() && pass + 1 < config.max_passes {
                pass += 1;
                cursor = 0;
                debug!(pass, "data exhausted with time left, starting another pass");
                continue;
            }
            break;
        }

        let id = order[cursor];
        let class = labels[id];
        let series = &dataset.series()[id];
        let threshold = if config.candidate_pruning {
            store.bound(class)
        } else {
            None
        };

        let series_start = Instant::now();
        let mut evaluator = CandidateEvaluator {
            series: dataset.series(),
            labels,
            distance,
            class_values: &class_values,
            quality: config.quality,
            pruning_start_percentage: config.pruning_start_percentage,
            source: id,
            class,
            threshold,
            evaluated: 0,
            abandoned: 0,
        };
        let target = SeriesRef { id, class, series };
        let mut found = strategy.search_series(&target, &mut |location| evaluator.evaluate(location));
        let series_elapsed = series_start.elapsed();

        stats.candidates_evaluated += evaluator.evaluated;
        stats.early_abandons += evaluator.abandoned;
        stats.series_searched += 1;

        sort_by_rank(&mut found);
        if config.remove_self_similar {
            found = remove_self_similar(found);
        }
        let n_found = found.len();
        store.merge(found, config.prune_near_duplicates);
        cursor += 1;

        debug!(
            series = id,
            pass,
            evaluated = evaluator.evaluated,
            abandoned = evaluator.abandoned,
            found = n_found,
            retained = store.len(),
            "series searched"
        );

        // --- Adaptive quota ---
        let series_left = order.len() - cursor;
        if pass == 0
            && !stats.switched_to_full
            && series_left > 0
            && let Some(timer) = timer.as_mut()
        {
            timer.observe(series_elapsed, evaluator.evaluated);
            if let Some(quota) = timer.quota(used(start), series_left) {
                if !config.search.is_exhaustive() && quota >= space.candidates_per_series() {
                    let mut full = FullSearch::new(1, 1);
                    full.init(&context)?;
                    strategy = Box::new(full);
                    stats.switched_to_full = true;
                    info!(quota, "time allows every candidate, switching to full search");
                } else {
                    strategy.set_candidates_per_series(quota);
                }
            }
        }

        // --- Checkpoint ---
        if let Some(checkpoint) = checkpoint.as_deref_mut() {
            checkpoint.save(&CheckpointState {
                n_series,
                order: order.clone(),
                cursor,
                pass,
                retained: store.lists(),
                series_searched: stats.series_searched,
                candidates_evaluated: stats.candidates_evaluated,
                early_abandons: stats.early_abandons,
                elapsed: used(start),
                time_per_candidate_nanos: timer.as_ref().and_then(AdaptiveTimer::estimate_nanos),
                switched_to_full: stats.switched_to_full,
            })?;
        }

        if let Some(contract) = config.contract
            && used(start) > contract
        {
            stats.contract_exhausted = true;
            if stats.series_searched == 1 {
                warn!(
                    contract_ms = contract.as_millis() as u64,
                    "contract exhausted after a single series"
                );
            }
            break;
        }
    }

    stats.passes = pass + 1;
    stats.elapsed = used(start);
    let shapelets = store.finalize();

    info!(
        series_searched = stats.series_searched,
        candidates_evaluated = stats.candidates_evaluated,
        early_abandons = stats.early_abandons,
        passes = stats.passes,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        n_shapelets = shapelets.len(),
        "shapelet search complete"
    );

    Ok(FittedShapeletTransform::new(shapelets, distance, stats))
}
