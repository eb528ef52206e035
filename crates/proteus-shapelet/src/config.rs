//! Configuration builder for the shapelet transform.

use std::time::Duration;

use proteus_series::{Dataset, Rescaling};

use crate::checkpoint::{Checkpoint, CheckpointState};
use crate::class_value::ClassValueMode;
use crate::distance::DistanceType;
use crate::error::ShapeletError;
use crate::quality::QualityMeasure;
use crate::search::SearchStrategy;
use crate::timing::ContractPlan;
use crate::transform::FittedShapeletTransform;

/// Upper limit on K chosen by [`ShapeletTransformConfig::for_dataset`].
const MAX_DEFAULT_SHAPELETS: usize = 1000;
/// Shortest candidate length chosen by the dataset and contract presets.
const DEFAULT_MIN_LENGTH: usize = 3;

/// Configuration for discovering shapelets.
///
/// Construct via [`ShapeletTransformConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter                     | Default                 |
/// |-------------------------------|-------------------------|
/// | `quality`                     | `InformationGain`       |
/// | `search`                      | `Full { 1, 1 }`         |
/// | `class_value_mode`            | `Normal`                |
/// | `balanced_classes`            | false                   |
/// | `round_robin`                 | false                   |
/// | `remove_self_similar`         | true                    |
/// | `prune_near_duplicates`       | false                   |
/// | `candidate_pruning`           | false                   |
/// | `pruning_start_percentage`    | 10.0                    |
/// | `contract`                    | `None`                  |
/// | `adaptive_timing`             | false                   |
/// | `initial_time_per_candidate`  | `None`                  |
/// | `max_passes`                  | 10                      |
/// | `rescaling`                   | `ZNormalize`            |
/// | `distance_type`               | `Independent`           |
/// | `seed`                        | 42                      |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeletTransformConfig {
    pub(crate) k: usize,
    pub(crate) min_length: usize,
    pub(crate) max_length: usize,
    pub(crate) quality: QualityMeasure,
    pub(crate) search: SearchStrategy,
    pub(crate) class_value_mode: ClassValueMode,
    pub(crate) balanced_classes: bool,
    pub(crate) round_robin: bool,
    pub(crate) remove_self_similar: bool,
    pub(crate) prune_near_duplicates: bool,
    pub(crate) candidate_pruning: bool,
    pub(crate) pruning_start_percentage: f64,
    pub(crate) contract: Option<Duration>,
    pub(crate) adaptive_timing: bool,
    pub(crate) initial_time_per_candidate: Option<Duration>,
    pub(crate) max_passes: usize,
    pub(crate) rescaling: Rescaling,
    pub(crate) distance_type: DistanceType,
    pub(crate) seed: u64,
}

impl ShapeletTransformConfig {
    /// Create a config retaining `k` shapelets of lengths in
    /// `min_length..=max_length`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::InvalidShapeletCount`] | `k` is zero |
    /// | [`ShapeletError::InvalidMinLength`] | `min_length` is zero |
    /// | [`ShapeletError::InvalidLengthRange`] | `min_length > max_length` |
    pub fn new(k: usize, min_length: usize, max_length: usize) -> Result<Self, ShapeletError> {
        if k == 0 {
            return Err(ShapeletError::InvalidShapeletCount { k });
        }
        if min_length == 0 {
            return Err(ShapeletError::InvalidMinLength { min_length });
        }
        if min_length > max_length {
            return Err(ShapeletError::InvalidLengthRange {
                min_length,
                max_length,
            });
        }
        Ok(Self {
            k,
            min_length,
            max_length,
            quality: QualityMeasure::default(),
            search: SearchStrategy::default(),
            class_value_mode: ClassValueMode::default(),
            balanced_classes: false,
            round_robin: false,
            remove_self_similar: true,
            prune_near_duplicates: false,
            candidate_pruning: false,
            pruning_start_percentage: 10.0,
            contract: None,
            adaptive_timing: false,
            initial_time_per_candidate: None,
            max_passes: 10,
            rescaling: Rescaling::default(),
            distance_type: DistanceType::default(),
            seed: 42,
        })
    }

    /// Default transform for `dataset`: K = min(10 N, 1000), every length
    /// from 3 (or the series length, if shorter) to the series length, and
    /// one-vs-rest class values with class balancing when there are more
    /// than two classes.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::MissingLabels`] for an unlabelled dataset.
    pub fn for_dataset(dataset: &Dataset) -> Result<Self, ShapeletError> {
        if dataset.labels().is_none() {
            return Err(ShapeletError::MissingLabels);
        }
        let m = dataset.series_length();
        let k = (10 * dataset.len()).min(MAX_DEFAULT_SHAPELETS);
        let config = Self::new(k, DEFAULT_MIN_LENGTH.min(m), m)?;
        let n_classes = dataset.n_classes();
        if n_classes > 2 && k >= n_classes {
            Ok(config
                .with_class_value_mode(ClassValueMode::Binary)
                .with_balanced_classes(true))
        } else {
            Ok(config)
        }
    }

    /// Transform that fits in `contract`, planned by
    /// [`ContractPlan::for_contract`].
    ///
    /// One-vs-rest class values and candidate pruning are enabled, and
    /// classes are balanced whenever K covers every class.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::MissingLabels`] for an unlabelled dataset.
    pub fn for_contract(dataset: &Dataset, contract: Duration) -> Result<Self, ShapeletError> {
        if dataset.labels().is_none() {
            return Err(ShapeletError::MissingLabels);
        }
        let plan = ContractPlan::for_contract(
            dataset.len(),
            dataset.series_length(),
            dataset.n_channels(),
            contract,
        );
        let n_classes = dataset.n_classes();
        let balanced = n_classes > 1 && plan.k >= n_classes;
        Ok(Self::new(plan.k, plan.min_length, plan.max_length)?
            .with_search(plan.strategy)
            .with_class_value_mode(ClassValueMode::Binary)
            .with_balanced_classes(balanced)
            .with_candidate_pruning(true)
            .with_contract(Some(contract)))
    }

    // --- Setters ---

    /// Set the quality measure.
    #[must_use]
    pub fn with_quality(mut self, quality: QualityMeasure) -> Self {
        self.quality = quality;
        self
    }

    /// Set the search strategy.
    #[must_use]
    pub fn with_search(mut self, search: SearchStrategy) -> Self {
        self.search = search;
        self
    }

    /// Set how classes are presented to the quality measure.
    #[must_use]
    pub fn with_class_value_mode(mut self, mode: ClassValueMode) -> Self {
        self.class_value_mode = mode;
        self
    }

    /// Keep one list per class, each capped at `floor(K / classes)`.
    #[must_use]
    pub fn with_balanced_classes(mut self, balanced: bool) -> Self {
        self.balanced_classes = balanced;
        self
    }

    /// Visit series interleaved by class.
    #[must_use]
    pub fn with_round_robin(mut self, round_robin: bool) -> Self {
        self.round_robin = round_robin;
        self
    }

    /// Drop overlapping shapelets from the same series and channel.
    #[must_use]
    pub fn with_remove_self_similar(mut self, remove: bool) -> Self {
        self.remove_self_similar = remove;
        self
    }

    /// Skip shapelets identical in quality, length and content to a retained one.
    #[must_use]
    pub fn with_prune_near_duplicates(mut self, prune: bool) -> Self {
        self.prune_near_duplicates = prune;
        self
    }

    /// Abandon candidates whose information-gain bound cannot beat the
    /// worst retained shapelet.
    #[must_use]
    pub fn with_candidate_pruning(mut self, pruning: bool) -> Self {
        self.candidate_pruning = pruning;
        self
    }

    /// Share of the dataset, in percent, processed before the bound is checked.
    #[must_use]
    pub fn with_pruning_start_percentage(mut self, percentage: f64) -> Self {
        self.pruning_start_percentage = percentage;
        self
    }

    /// Set the wall-clock contract. `None` means unlimited.
    #[must_use]
    pub fn with_contract(mut self, contract: Option<Duration>) -> Self {
        self.contract = contract;
        self
    }

    /// Re-estimate the per-series quota from observed timings. Needs a contract.
    #[must_use]
    pub fn with_adaptive_timing(mut self, adaptive: bool) -> Self {
        self.adaptive_timing = adaptive;
        self
    }

    /// Seed the adaptive time-per-candidate estimate.
    #[must_use]
    pub fn with_initial_time_per_candidate(mut self, initial: Option<Duration>) -> Self {
        self.initial_time_per_candidate = initial;
        self
    }

    /// Set the maximum number of passes over the data.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the rescaling policy.
    #[must_use]
    pub fn with_rescaling(mut self, rescaling: Rescaling) -> Self {
        self.rescaling = rescaling;
        self
    }

    /// Set the multichannel distance type.
    #[must_use]
    pub fn with_distance_type(mut self, distance_type: DistanceType) -> Self {
        self.distance_type = distance_type;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Number of shapelets to retain.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Shortest candidate length.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Longest candidate length.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The quality measure.
    #[must_use]
    pub fn quality(&self) -> QualityMeasure {
        self.quality
    }

    /// The search strategy.
    #[must_use]
    pub fn search(&self) -> &SearchStrategy {
        &self.search
    }

    /// The class-value mode.
    #[must_use]
    pub fn class_value_mode(&self) -> ClassValueMode {
        self.class_value_mode
    }

    /// Whether classes are balanced.
    #[must_use]
    pub fn balanced_classes(&self) -> bool {
        self.balanced_classes
    }

    /// Whether series are visited round-robin by class.
    #[must_use]
    pub fn round_robin(&self) -> bool {
        self.round_robin
    }

    /// Whether self-similar shapelets are removed.
    #[must_use]
    pub fn remove_self_similar(&self) -> bool {
        self.remove_self_similar
    }

    /// Whether near-duplicates are pruned on merge.
    #[must_use]
    pub fn prune_near_duplicates(&self) -> bool {
        self.prune_near_duplicates
    }

    /// Whether candidate pruning is enabled.
    #[must_use]
    pub fn candidate_pruning(&self) -> bool {
        self.candidate_pruning
    }

    /// Pruning start percentage.
    #[must_use]
    pub fn pruning_start_percentage(&self) -> f64 {
        self.pruning_start_percentage
    }

    /// The contract, if any.
    #[must_use]
    pub fn contract(&self) -> Option<Duration> {
        self.contract
    }

    /// Whether adaptive timing is enabled.
    #[must_use]
    pub fn adaptive_timing(&self) -> bool {
        self.adaptive_timing
    }

    /// Initial time-per-candidate estimate.
    #[must_use]
    pub fn initial_time_per_candidate(&self) -> Option<Duration> {
        self.initial_time_per_candidate
    }

    /// Maximum number of passes.
    #[must_use]
    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Rescaling policy.
    #[must_use]
    pub fn rescaling(&self) -> Rescaling {
        self.rescaling
    }

    /// Multichannel distance type.
    #[must_use]
    pub fn distance_type(&self) -> DistanceType {
        self.distance_type
    }

    /// Random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    // --- Validation ---

    /// Check the settings against the dataset about to be fitted.
    pub(crate) fn validate(&self, dataset: &Dataset) -> Result<(), ShapeletError> {
        if dataset.labels().is_none() {
            return Err(ShapeletError::MissingLabels);
        }
        let series_length = dataset.series_length();
        if self.max_length > series_length {
            return Err(ShapeletError::MaxLengthExceedsSeries {
                max_length: self.max_length,
                series_length,
            });
        }
        self.search
            .validate(self.max_length - self.min_length + 1)?;
        if self.candidate_pruning && !self.quality.supports_bound() {
            return Err(ShapeletError::PruningUnsupported {
                measure: self.quality,
            });
        }
        if !(0.0..=100.0).contains(&self.pruning_start_percentage) {
            return Err(ShapeletError::InvalidPruningPercentage {
                percentage: self.pruning_start_percentage,
            });
        }
        let n_classes = dataset.n_classes();
        if self.balanced_classes && self.k < n_classes {
            return Err(ShapeletError::TooFewShapeletsForBalancing {
                k: self.k,
                n_classes,
            });
        }
        if self.max_passes == 0 {
            return Err(ShapeletError::InvalidMaxPasses {
                max_passes: self.max_passes,
            });
        }
        Ok(())
    }

    // --- Fit ---

    /// Discover shapelets in `dataset`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::MissingLabels`] | dataset is unlabelled |
    /// | [`ShapeletError::MaxLengthExceedsSeries`] | `max_length` above the series length |
    /// | [`ShapeletError::PruningUnsupported`] | pruning with a measure that has no bound |
    /// | [`ShapeletError::TooFewShapeletsForBalancing`] | balanced with K below the class count |
    /// | strategy variants | see [`SearchStrategy::validate`] |
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedShapeletTransform, ShapeletError> {
        crate::engine::fit(self, dataset, None, None)
    }

    /// Discover shapelets, handing a snapshot to `checkpoint` after every series.
    ///
    /// # Errors
    ///
    /// As [`fit`](Self::fit), plus any error returned by `checkpoint`.
    pub fn fit_with_checkpoint(
        &self,
        dataset: &Dataset,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<FittedShapeletTransform, ShapeletError> {
        crate::engine::fit(self, dataset, None, Some(checkpoint))
    }

    /// Continue a fit from a snapshot taken on the same dataset with the
    /// same configuration.
    ///
    /// # Errors
    ///
    /// As [`fit`](Self::fit), plus [`ShapeletError::CheckpointMismatch`] when
    /// the snapshot does not fit the dataset or the class-balancing mode.
    pub fn fit_from_checkpoint(
        &self,
        dataset: &Dataset,
        state: CheckpointState,
        checkpoint: Option<&mut dyn Checkpoint>,
    ) -> Result<FittedShapeletTransform, ShapeletError> {
        crate::engine::fit(self, dataset, Some(state), checkpoint)
    }
}
