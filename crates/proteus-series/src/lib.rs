//! Time series containers and subsequence distances for shapelet discovery.
//!
//! Pure math library, zero I/O. Provides validated (optionally multichannel)
//! series, labelled datasets, z-normalization with a defined zero-variance
//! convention, and minimum sliding-window Euclidean distances with early
//! abandon.

mod dataset;
mod distance;
mod error;
mod label;
mod normalize;
mod series;

pub use dataset::Dataset;
pub use distance::{
    SubsequenceDistance, SubsequenceQuery, min_dependent_distance, min_subsequence_distance,
};
pub use error::SeriesError;
pub use label::ClassLabel;
pub use normalize::{CONSTANT_STD_THRESHOLD, Rescaling, mean_std, normalize_window, z_normalize};
pub use series::TimeSeries;
