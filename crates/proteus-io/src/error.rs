//! I/O error types for proteus-io.

use std::path::PathBuf;

use proteus_series::SeriesError;
use proteus_shapelet::ShapeletError;

/// Errors from file I/O, CSV parsing, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header has no time-step columns.
    #[error("no time-step columns in the header of {path}")]
    NoTimeSteps {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} (series {series_id}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Series ID of the offending row.
        series_id: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, time step {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based time-step index.
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a `dimension` cell is not a non-negative integer.
    #[error("invalid dimension in {path}: row {row_index}, raw value \"{raw}\"")]
    InvalidDimension {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the same (series, dimension) pair appears more than once.
    #[error("duplicate row for series \"{series_id}\" dimension {dimension} in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateRow {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated series ID.
        series_id: String,
        /// The duplicated dimension.
        dimension: usize,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when a multivariate series lacks one of the dataset's channels.
    #[error("series \"{series_id}\" has no row for dimension {dimension} in {path}")]
    MissingChannel {
        /// Path to the CSV file.
        path: PathBuf,
        /// The incomplete series.
        series_id: String,
        /// The missing dimension.
        dimension: usize,
    },

    /// Returned when the rows of one series disagree on its class.
    #[error("series \"{series_id}\" has classes \"{first}\" and \"{second}\" in {path}")]
    InconsistentClass {
        /// Path to the CSV file.
        path: PathBuf,
        /// The series with conflicting rows.
        series_id: String,
        /// Class on the first row.
        first: String,
        /// Conflicting class on a later row.
        second: String,
    },

    /// Returned when the parsed rows do not form a valid dataset.
    #[error("invalid dataset in {path}")]
    InvalidDataset {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying validation error.
        source: SeriesError,
    },

    /// Returned when a shapelet file does not follow the expected layout.
    #[error("malformed shapelet file {path} at line {line}: {reason}")]
    MalformedShapeletFile {
        /// Path to the shapelet file.
        path: PathBuf,
        /// One-based line number.
        line: u64,
        /// Human-readable description.
        reason: String,
    },

    /// Returned when a stored shapelet fails validation.
    #[error("invalid shapelet in {path} at line {line}")]
    InvalidShapelet {
        /// Path to the shapelet file.
        path: PathBuf,
        /// One-based line number of the shapelet's header line.
        line: u64,
        /// Underlying validation error.
        source: ShapeletError,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a CSV output file cannot be written.
    #[error("cannot write CSV file {path}")]
    WriteCsv {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a JSON artifact cannot be serialized.
    #[error("cannot serialize {path} as JSON")]
    SerializeJson {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}
