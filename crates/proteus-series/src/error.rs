/// Errors from series construction, dataset assembly and preprocessing.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    /// Returned when a series has no channels at all.
    #[error("time series must have at least one channel")]
    NoChannels,

    /// Returned when a channel contains zero time steps.
    #[error("channel {channel} of the time series is empty")]
    EmptySeries {
        /// Zero-based index of the empty channel.
        channel: usize,
    },

    /// Returned when a value is NaN or infinite.
    #[error("non-finite value in channel {channel} at index {index}")]
    NonFiniteValue {
        /// Zero-based channel index.
        channel: usize,
        /// Zero-based time index within the channel.
        index: usize,
    },

    /// Returned when the channels of one series differ in length.
    #[error("channel {channel} has {got} time steps, expected {expected}")]
    ChannelLengthMismatch {
        /// Zero-based index of the offending channel.
        channel: usize,
        /// Length of the first channel.
        expected: usize,
        /// Length of the offending channel.
        got: usize,
    },

    /// Returned when a dataset is built from zero series.
    #[error("dataset contains no series")]
    EmptyDataset,

    /// Returned when a series in a dataset differs in length from the first.
    #[error("series {series_index} has {got} time steps, expected {expected}")]
    SeriesLengthMismatch {
        /// Zero-based index of the offending series.
        series_index: usize,
        /// Length of the first series.
        expected: usize,
        /// Length of the offending series.
        got: usize,
    },

    /// Returned when a series in a dataset differs in channel count from the first.
    #[error("series {series_index} has {got} channels, expected {expected}")]
    ChannelCountMismatch {
        /// Zero-based index of the offending series.
        series_index: usize,
        /// Channel count of the first series.
        expected: usize,
        /// Channel count of the offending series.
        got: usize,
    },

    /// Returned when the number of labels differs from the number of series.
    #[error("dataset has {n_series} series but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of series supplied.
        n_series: usize,
        /// Number of labels supplied.
        n_labels: usize,
    },

    /// Returned when z-normalizing a channel whose values are all identical.
    #[error("cannot z-normalize constant channel {channel} (all {n} values equal {value})")]
    ConstantSeries {
        /// Zero-based channel index.
        channel: usize,
        /// Number of values in the channel.
        n: usize,
        /// The repeated value.
        value: f64,
    },
}
