//! Time series type with validation guarantees.

use crate::error::SeriesError;

/// Owned, validated time series with one or more channels.
///
/// Guaranteed to have at least one channel, every channel non-empty and of
/// the same length, and all values finite.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    channels: Vec<Vec<f64>>,
}

impl TimeSeries {
    /// Create a univariate time series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::EmptySeries`] | `values` is empty |
    /// | [`SeriesError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, SeriesError> {
        Self::multivariate(vec![values])
    }

    /// Create a multichannel time series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::NoChannels`] | `channels` is empty |
    /// | [`SeriesError::EmptySeries`] | A channel is empty |
    /// | [`SeriesError::ChannelLengthMismatch`] | Channels differ in length |
    /// | [`SeriesError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn multivariate(channels: Vec<Vec<f64>>) -> Result<Self, SeriesError> {
        let Some(first) = channels.first() else {
            return Err(SeriesError::NoChannels);
        };
        let expected = first.len();
        for (channel, values) in channels.iter().enumerate() {
            if values.is_empty() {
                return Err(SeriesError::EmptySeries { channel });
            }
            if values.len() != expected {
                return Err(SeriesError::ChannelLengthMismatch {
                    channel,
                    expected,
                    got: values.len(),
                });
            }
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(SeriesError::NonFiniteValue { channel, index });
            }
        }
        Ok(Self { channels })
    }

    /// Return the number of time steps (shared by every channel).
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Return true if the series has no time steps.
    ///
    /// A validated [`TimeSeries`] is never empty; provided to satisfy the
    /// `len_without_is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Return the number of channels (dimensions).
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Borrow one channel.
    ///
    /// # Panics
    ///
    /// Panics if `dimension >= self.n_channels()`.
    #[must_use]
    pub fn channel(&self, dimension: usize) -> &[f64] {
        &self.channels[dimension]
    }

    /// Borrow all channels.
    #[must_use]
    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Consume and return the channel vectors.
    #[must_use]
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }
}

impl TryFrom<Vec<f64>> for TimeSeries {
    type Error = SeriesError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}
