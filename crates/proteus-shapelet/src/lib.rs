//! Shapelet discovery and the shapelet transform.
//!
//! Searches every (or a sampled subset of every) subsequence of a labelled
//! dataset for the K most discriminative shapelets, scoring each candidate
//! by the class separation of its distances to all series. Provides a
//! family of search strategies, quality-bound pruning, class-balanced
//! best-K retention, time contracts with adaptive budgets and
//! checkpointing. A fitted set turns any dataset into an N x K matrix of
//! minimum distances.

mod best_k;
mod bound;
mod candidate;
mod checkpoint;
mod class_value;
mod config;
mod distance;
mod engine;
mod error;
mod feature;
mod order_line;
mod ordering;
mod quality;
pub mod search;
mod shapelet;
mod stats;
pub mod timing;
mod transform;
mod transformer;

pub use best_k::{BestKStore, NEAR_DUPLICATE_TOLERANCE, merge, remove_self_similar, sort_by_rank};
pub use bound::InformationGainBound;
pub use candidate::CandidateLocation;
pub use checkpoint::{Checkpoint, CheckpointState, FileCheckpoint};
pub use class_value::{ClassValueMode, ClassValues};
pub use config::ShapeletTransformConfig;
pub use distance::{DistanceType, PreparedShapelet, ShapeletDistance};
pub use error::ShapeletError;
pub use feature::FeatureMatrix;
pub use order_line::{OrderLine, OrderLineEntry};
pub use ordering::round_robin;
pub use quality::{QualityMeasure, entropy};
pub use search::{SearchStrategy, ShapeletSearch};
pub use shapelet::Shapelet;
pub use stats::FitStats;
pub use timing::{AdaptiveTimer, ContractPlan};
pub use transform::FittedShapeletTransform;
pub use transformer::ShapeletTransformer;
