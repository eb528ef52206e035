//! CSV dataset reader with full input validation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use proteus_series::{ClassLabel, Dataset, TimeSeries};
use tracing::{debug, info, instrument};

use crate::domain::{LoadedDataset, SeriesId};
use crate::IoError;

/// Header name of the optional channel-index column.
const DIMENSION_COLUMN: &str = "dimension";

/// Header name of the optional class column.
const CLASS_COLUMN: &str = "class";

/// Reads a time series dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required; the first column is the series ID
/// - Columns named `dimension` and `class` are metadata, every other column
///   is a positional time step: `series_id,class,t0,t1,...,tn`
/// - Without a `dimension` column there is one row per series
/// - With one, there is one row per (series, dimension) pair and every series
///   must carry every dimension from 0 to the largest one in the file
///
/// Series keep the order in which their IDs first appear. Class names are
/// sorted and mapped to labels `0..C` in that order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoTimeSteps`] | Header has no time-step column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::InvalidDimension`] | `dimension` cell is not a non-negative integer |
/// | [`IoError::DuplicateRow`] | Same (series, dimension) pair appears twice |
/// | [`IoError::MissingChannel`] | A series lacks one of the dimensions |
/// | [`IoError::InconsistentClass`] | Rows of one series disagree on the class |
/// | [`IoError::InvalidDataset`] | Series do not form a valid dataset |
pub struct DatasetReader {
    path: PathBuf,
}

/// Column roles resolved from the header.
struct Layout {
    n_columns: usize,
    dimension: Option<usize>,
    class: Option<usize>,
    time_steps: Vec<usize>,
}

/// Rows collected for one series ID.
struct PendingSeries {
    id: String,
    class: Option<String>,
    channels: BTreeMap<usize, (usize, Vec<f64>)>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`LoadedDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LoadedDataset, IoError> {
        // 1. Open file (FileNotFound on failure)
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // 2. Build CSV reader with headers.
        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        // 3. Resolve column roles from the header
        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let layout = Self::layout(header);
        if layout.time_steps.is_empty() {
            return Err(IoError::NoTimeSteps {
                path: self.path.clone(),
            });
        }
        debug!(
            n_columns = layout.n_columns,
            n_timesteps = layout.time_steps.len(),
            has_dimension = layout.dimension.is_some(),
            has_class = layout.class.is_some(),
            "read CSV header"
        );

        // 4. Iterate rows, grouping them by series ID
        let mut pending: Vec<PendingSeries> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut n_rows = 0;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            n_rows += 1;

            let id = record.get(0).unwrap_or("").to_string();
            if record.len() != layout.n_columns {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    series_id: id,
                    expected: layout.n_columns,
                    got: record.len(),
                });
            }

            let dimension = match layout.dimension {
                Some(col) => self.parse_dimension(record.get(col).unwrap_or(""), row_index)?,
                None => 0,
            };
            let class = layout
                .class
                .map(|col| record.get(col).unwrap_or("").to_string());
            let values = self.parse_values(&record, &layout.time_steps, row_index)?;

            let slot = *index_of.entry(id.clone()).or_insert_with(|| {
                pending.push(PendingSeries {
                    id: id.clone(),
                    class: None,
                    channels: BTreeMap::new(),
                });
                pending.len() - 1
            });
            let entry = &mut pending[slot];

            if let Some(&(first_row, _)) = entry.channels.get(&dimension) {
                return Err(IoError::DuplicateRow {
                    path: self.path.clone(),
                    series_id: id,
                    dimension,
                    first_row,
                    second_row: row_index,
                });
            }
            if let Some(class) = class {
                match &entry.class {
                    Some(first) if *first != class => {
                        return Err(IoError::InconsistentClass {
                            path: self.path.clone(),
                            series_id: id,
                            first: first.clone(),
                            second: class,
                        });
                    }
                    Some(_) => {}
                    None => entry.class = Some(class),
                }
            }
            entry.channels.insert(dimension, (row_index, values));
        }

        // 5. Check for empty dataset
        if pending.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        // 6. Assemble series, requiring every channel for every ID
        let n_channels = pending
            .iter()
            .filter_map(|p| p.channels.keys().next_back())
            .max()
            .map_or(1, |&d| d + 1);

        let class_names: Option<Vec<String>> = layout.class.map(|_| {
            pending
                .iter()
                .filter_map(|p| p.class.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        });

        let mut series_ids = Vec::with_capacity(pending.len());
        let mut series = Vec::with_capacity(pending.len());
        let mut labels = Vec::with_capacity(pending.len());

        for mut entry in pending {
            let mut channels = Vec::with_capacity(n_channels);
            for dimension in 0..n_channels {
                let Some((_, values)) = entry.channels.remove(&dimension) else {
                    return Err(IoError::MissingChannel {
                        path: self.path.clone(),
                        series_id: entry.id,
                        dimension,
                    });
                };
                channels.push(values);
            }
            let ts = TimeSeries::multivariate(channels).map_err(|e| IoError::InvalidDataset {
                path: self.path.clone(),
                source: e,
            })?;

            if let (Some(names), Some(class)) = (&class_names, &entry.class) {
                // Every class seen while reading is in the sorted name list.
                let index = names.binary_search(class).unwrap_or_default();
                labels.push(ClassLabel::new(index));
            }
            series_ids.push(SeriesId::new(entry.id));
            series.push(ts);
        }

        let dataset = match class_names {
            Some(_) => Dataset::labelled(series, labels),
            None => Dataset::unlabelled(series),
        }
        .map_err(|e| IoError::InvalidDataset {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            n_series = dataset.len(),
            n_rows,
            n_timesteps = dataset.series_length(),
            n_channels = dataset.n_channels(),
            n_classes = class_names.as_ref().map_or(0, Vec::len),
            "dataset loaded"
        );

        Ok(LoadedDataset::new(series_ids, class_names, dataset))
    }

    fn layout(header: &csv::StringRecord) -> Layout {
        let mut layout = Layout {
            n_columns: header.len(),
            dimension: None,
            class: None,
            time_steps: Vec::new(),
        };
        for (col, name) in header.iter().enumerate().skip(1) {
            if name.eq_ignore_ascii_case(DIMENSION_COLUMN) && layout.dimension.is_none() {
                layout.dimension = Some(col);
            } else if name.eq_ignore_ascii_case(CLASS_COLUMN) && layout.class.is_none() {
                layout.class = Some(col);
            } else {
                layout.time_steps.push(col);
            }
        }
        layout
    }

    fn parse_dimension(&self, raw: &str, row_index: usize) -> Result<usize, IoError> {
        raw.parse().map_err(|_| IoError::InvalidDimension {
            path: self.path.clone(),
            row_index,
            raw: raw.to_string(),
        })
    }

    fn parse_values(
        &self,
        record: &csv::StringRecord,
        time_steps: &[usize],
        row_index: usize,
    ) -> Result<Vec<f64>, IoError> {
        let mut values = Vec::with_capacity(time_steps.len());
        for (col_index, &col) in time_steps.iter().enumerate() {
            let raw = record.get(col).unwrap_or("");
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => values.push(value),
                _ => {
                    return Err(IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    });
                }
            }
        }
        Ok(values)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
