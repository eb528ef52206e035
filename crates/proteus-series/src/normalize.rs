//! Z-normalization of whole series and of comparison windows.

use crate::error::SeriesError;
use crate::series::TimeSeries;

/// Standard deviation below which a window is treated as constant.
pub const CONSTANT_STD_THRESHOLD: f64 = 1e-15;

/// How shapelet content and comparison windows are rescaled before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Rescaling {
    /// Zero mean, unit (population) variance per window.
    #[default]
    ZNormalize,
    /// Raw values.
    None,
}

impl Rescaling {
    /// Rescale a window into a new vector.
    ///
    /// Under [`Rescaling::ZNormalize`] a constant window becomes all zeros.
    #[must_use]
    pub fn apply(self, values: &[f64]) -> Vec<f64> {
        match self {
            Rescaling::ZNormalize => {
                let mut out = vec![0.0; values.len()];
                normalize_window(values, &mut out);
                out
            }
            Rescaling::None => values.to_vec(),
        }
    }
}

/// Mean and population standard deviation of a window.
///
/// Returns `(0.0, 0.0)` for an empty slice.
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Z-normalize `values` into `out`, returning `true` if the window is constant.
///
/// A constant window (standard deviation below [`CONSTANT_STD_THRESHOLD`])
/// is written as all zeros.
///
/// # Panics
///
/// Panics if `out.len() != values.len()`.
pub fn normalize_window(values: &[f64], out: &mut [f64]) -> bool {
    assert_eq!(values.len(), out.len(), "output buffer length mismatch");
    let (mean, std) = mean_std(values);
    if std < CONSTANT_STD_THRESHOLD {
        out.fill(0.0);
        return true;
    }
    for (o, &x) in out.iter_mut().zip(values) {
        *o = (x - mean) / std;
    }
    false
}

/// Z-normalize every channel of a series to zero mean and unit variance.
///
/// Uses population standard deviation (divides by n, not n-1). Intended as a
/// whole-series preprocessing step; window-level normalization during the
/// shapelet search uses [`normalize_window`] instead.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SeriesError::ConstantSeries`] | A channel has zero variance |
#[must_use = "returns a new normalized series; the original is unchanged"]
pub fn z_normalize(series: &TimeSeries) -> Result<TimeSeries, SeriesError> {
    let mut channels = Vec::with_capacity(series.n_channels());
    for (channel, values) in series.channels().iter().enumerate() {
        let (mean, std) = mean_std(values);
        if std == 0.0 {
            return Err(SeriesError::ConstantSeries {
                channel,
                n: values.len(),
                value: values[0],
            });
        }
        channels.push(values.iter().map(|&x| (x - mean) / std).collect());
    }
    TimeSeries::multivariate(channels)
}
