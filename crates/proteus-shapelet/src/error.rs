use std::path::PathBuf;

use proteus_series::SeriesError;

use crate::quality::QualityMeasure;

/// Errors from shapelet search configuration, fitting and transforming.
#[derive(Debug, thiserror::Error)]
pub enum ShapeletError {
    /// Returned when the requested number of shapelets is zero.
    #[error("number of shapelets must be at least 1, got {k}")]
    InvalidShapeletCount {
        /// The invalid K provided.
        k: usize,
    },

    /// Returned when the minimum shapelet length is zero.
    #[error("min_length must be at least 1, got {min_length}")]
    InvalidMinLength {
        /// The invalid minimum length provided.
        min_length: usize,
    },

    /// Returned when the minimum shapelet length exceeds the maximum.
    #[error("min_length {min_length} exceeds max_length {max_length}")]
    InvalidLengthRange {
        /// The configured minimum length.
        min_length: usize,
        /// The configured maximum length.
        max_length: usize,
    },

    /// Returned when the maximum shapelet length exceeds the series length.
    #[error("max_length {max_length} exceeds the series length {series_length}")]
    MaxLengthExceedsSeries {
        /// The configured maximum length.
        max_length: usize,
        /// The length of the dataset's series.
        series_length: usize,
    },

    /// Returned when fitting on a dataset without class labels.
    #[error("fitting a shapelet transform requires a labelled dataset")]
    MissingLabels,

    /// Returned when a sampling proportion is not in (0.0, 1.0].
    #[error("proportion must be in (0.0, 1.0], got {proportion}")]
    InvalidProportion {
        /// The invalid proportion provided.
        proportion: f64,
    },

    /// Returned when the refined-random candidate ratio is not in (0.0, 1.0].
    #[error("candidate ratio must be in (0.0, 1.0], got {ratio}")]
    InvalidCandidateRatio {
        /// The invalid ratio provided.
        ratio: f64,
    },

    /// Returned when a search is asked to evaluate zero candidates.
    #[error("candidate count must be at least 1, got {count}")]
    InvalidCandidateCount {
        /// The invalid count provided.
        count: u64,
    },

    /// Returned when the skewed length histogram does not cover [min, max].
    #[error("length weights must have one entry per length ({expected}), got {got}")]
    LengthWeightCountMismatch {
        /// Number of lengths in [min_length, max_length].
        expected: usize,
        /// Number of weights supplied.
        got: usize,
    },

    /// Returned when a length weight is negative or non-finite, or all are zero.
    #[error("length weights must be finite, non-negative and not all zero")]
    InvalidLengthWeights,

    /// Returned when the genetic population is too small to breed.
    #[error("population_size must be at least 2, got {population_size}")]
    InvalidPopulationSize {
        /// The invalid population size provided.
        population_size: usize,
    },

    /// Returned when the tournament size is zero or exceeds the population.
    #[error("tournament_size must be in [1, {population_size}], got {tournament_size}")]
    InvalidTournamentSize {
        /// The invalid tournament size provided.
        tournament_size: usize,
        /// The configured population size.
        population_size: usize,
    },

    /// Returned when a probability parameter is not in [0.0, 1.0].
    #[error("{name} must be in [0.0, 1.0], got {rate}")]
    InvalidRate {
        /// Name of the parameter.
        name: &'static str,
        /// The invalid value provided.
        rate: f64,
    },

    /// Returned when the tabu neighbourhood width or list size is zero.
    #[error("tabu search needs neighbourhood_width >= 1 and tabu_size >= 1, got {neighbourhood_width} and {tabu_size}")]
    InvalidTabuParameters {
        /// The configured neighbourhood width.
        neighbourhood_width: usize,
        /// The configured tabu list size.
        tabu_size: usize,
    },

    /// Returned when the local search step cap is zero.
    #[error("max_steps must be at least 1, got {max_steps}")]
    InvalidMaxSteps {
        /// The invalid step cap provided.
        max_steps: usize,
    },

    /// Returned when a skip or step size is zero.
    #[error("position and length steps must be at least 1, got {position_step} and {length_step}")]
    InvalidStep {
        /// The configured position step.
        position_step: usize,
        /// The configured length step.
        length_step: usize,
    },

    /// Returned when the time-contracted search has neither its own per-series
    /// budget nor a contract to derive one from.
    #[error("time-contracted search needs a per-series budget or an overall contract")]
    TimedSearchWithoutBudget,

    /// Returned when the cost per operation is not a positive finite number.
    #[error("nanoseconds per operation must be positive and finite, got {nanos}")]
    InvalidOperationCost {
        /// The invalid cost provided.
        nanos: f64,
    },

    /// Returned when candidate pruning is requested with a measure that has no bound.
    #[error("candidate pruning is only available for information gain, not {measure:?}")]
    PruningUnsupported {
        /// The configured quality measure.
        measure: QualityMeasure,
    },

    /// Returned when the pruning start percentage is not in [0, 100].
    #[error("pruning start percentage must be in [0, 100], got {percentage}")]
    InvalidPruningPercentage {
        /// The invalid percentage provided.
        percentage: f64,
    },

    /// Returned when balanced mode would give some class a zero quota.
    #[error("class balancing needs at least one shapelet per class: k = {k}, classes = {n_classes}")]
    TooFewShapeletsForBalancing {
        /// The configured K.
        k: usize,
        /// The number of classes in the dataset.
        n_classes: usize,
    },

    /// Returned when the maximum number of passes is zero.
    #[error("max_passes must be at least 1, got {max_passes}")]
    InvalidMaxPasses {
        /// The invalid value provided.
        max_passes: usize,
    },

    /// Returned when transforming before a shapelet set has been fitted.
    #[error("transform called before fit")]
    NotFitted,

    /// Returned for operations the shapelet transform does not provide.
    #[error("{operation} is not supported by the shapelet transform")]
    Unsupported {
        /// Description of the rejected operation.
        operation: &'static str,
    },

    /// Returned when a dataset's series are shorter than a shapelet.
    #[error("series of length {series_length} are shorter than shapelet length {required}")]
    SeriesTooShort {
        /// The dataset's series length.
        series_length: usize,
        /// The longest shapelet length.
        required: usize,
    },

    /// Returned when a dataset has fewer channels than a shapelet needs.
    #[error("dataset has {got} channels, shapelets need {required}")]
    DimensionMismatch {
        /// Channels needed by the shapelet set.
        required: usize,
        /// Channels in the dataset.
        got: usize,
    },

    /// Returned when a shapelet is built with inconsistent content.
    #[error("invalid shapelet: {reason}")]
    InvalidShapelet {
        /// Human-readable description of the inconsistency.
        reason: String,
    },

    /// Returned when a checkpoint was taken on a different dataset.
    #[error("checkpoint covers {found} series, dataset has {expected}")]
    CheckpointMismatch {
        /// Number of series in the dataset being fitted.
        expected: usize,
        /// Number of series recorded in the checkpoint.
        found: usize,
    },

    /// Returned when checkpoint serialization fails.
    #[error("failed to serialize checkpoint")]
    SerializeCheckpoint {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when checkpoint deserialization fails.
    #[error("failed to deserialize checkpoint from {path}")]
    DeserializeCheckpoint {
        /// Path to the checkpoint file.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing a checkpoint file fails.
    #[error("failed to write checkpoint to {path}")]
    WriteCheckpoint {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading a checkpoint file fails.
    #[error("failed to read checkpoint from {path}")]
    ReadCheckpoint {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a checkpoint with an incompatible format version.
    #[error("incompatible checkpoint version in {path}: expected {expected}, found {found}")]
    IncompatibleCheckpointVersion {
        /// The format version this build expects.
        expected: u32,
        /// The format version found in the file.
        found: u32,
        /// Path to the checkpoint file.
        path: PathBuf,
    },

    /// Returned when constructing series or datasets fails.
    #[error("series error: {0}")]
    Series(#[from] SeriesError),
}
