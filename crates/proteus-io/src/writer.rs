//! Result writer for fitted shapelets, features and fit summaries.

use std::fs;
use std::path::{Path, PathBuf};

use proteus_shapelet::{FeatureMatrix, FittedShapeletTransform};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{ExperimentName, SeriesId};
use crate::shapelet_file;
use crate::IoError;

/// Writes fit and transform outputs into one directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_shapelets.csv`,
/// `{experiment}_features.csv` and `{experiment}_fit.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write the shapelet set to `{experiment}_shapelets.csv`.
    ///
    /// # Errors
    ///
    /// See [`write_shapelets`](crate::write_shapelets).
    pub fn write_shapelets(&self, fitted: &FittedShapeletTransform) -> Result<PathBuf, IoError> {
        let path = self.shapelets_path();
        shapelet_file::write_shapelets(&path, fitted.shapelets())?;
        Ok(path)
    }

    /// Write a feature matrix to `{experiment}_features.csv`.
    ///
    /// Columns are `series_id`, `shapelet_0 .. shapelet_{K-1}` and, when the
    /// matrix is labelled, `class`. The class cell holds the class name when
    /// `class_names` is given, else the label index.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::WriteFile`] | The file cannot be created |
    /// | [`IoError::WriteCsv`] | A record cannot be written |
    #[instrument(skip_all, fields(n_rows = features.n_rows(), n_shapelets = features.n_shapelets()))]
    pub fn write_features(
        &self,
        series_ids: &[SeriesId],
        features: &FeatureMatrix,
        class_names: Option<&[String]>,
    ) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_features.csv", self.experiment.as_str()));

        let file = fs::File::create(&path).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        let mut wtr = csv::Writer::from_writer(file);
        let csv_err = |e: csv::Error| IoError::WriteCsv {
            path: path.clone(),
            source: e,
        };

        let mut header = vec!["series_id".to_string()];
        header.extend(features.column_names());
        wtr.write_record(&header).map_err(csv_err)?;

        for (row_index, row) in features.rows().iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            record.push(
                series_ids
                    .get(row_index)
                    .map_or_else(|| row_index.to_string(), ToString::to_string),
            );
            record.extend(row.iter().map(f64::to_string));
            if let Some(label) = features.labels().and_then(|l| l.get(row_index)) {
                let name = class_names.and_then(|names| names.get(label.index()));
                record.push(name.map_or_else(|| label.index().to_string(), Clone::clone));
            }
            wtr.write_record(&record).map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "features written");
        Ok(path)
    }

    /// Write a fit summary to `{experiment}_fit.json`.
    ///
    /// Records the search counters and, per shapelet, where it came from and
    /// how well it scored. Shapelet content lives in the shapelet file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | The summary cannot be serialized |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_fit_summary(
        &self,
        series_ids: &[SeriesId],
        class_names: Option<&[String]>,
        fitted: &FittedShapeletTransform,
    ) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_fit.json", self.experiment.as_str()));

        let stats = fitted.stats();
        let shapelets: Vec<ShapeletEntry> = fitted
            .shapelets()
            .iter()
            .map(|s| {
                let class = s.class_value().index();
                ShapeletEntry {
                    series_id: series_ids.get(s.series_id()).map(SeriesId::as_str),
                    series_index: s.series_id(),
                    start: s.start(),
                    length: s.length(),
                    dimension: s.dimension(),
                    n_dimensions: s.n_dimensions(),
                    class,
                    class_name: class_names
                        .and_then(|names| names.get(class))
                        .map(String::as_str),
                    quality: s.quality(),
                }
            })
            .collect();

        let artifact = FitArtifact {
            experiment: self.experiment.as_str(),
            strategy: &stats.strategy,
            n_shapelets: shapelets.len(),
            series_searched: stats.series_searched,
            candidates_evaluated: stats.candidates_evaluated,
            early_abandons: stats.early_abandons,
            passes: stats.passes,
            elapsed_secs: stats.elapsed.as_secs_f64(),
            switched_to_full: stats.switched_to_full,
            contract_exhausted: stats.contract_exhausted,
            shapelets,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::SerializeJson {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "fit summary written");
        Ok(path)
    }

    /// Return the path of the shapelet file.
    ///
    /// Does not write anything; just computes `{output_dir}/{experiment}_shapelets.csv`.
    #[must_use]
    pub fn shapelets_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_shapelets.csv", self.experiment.as_str()))
    }

    /// Return the path where search checkpoints should be saved.
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_search.ckpt", self.experiment.as_str()))
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct FitArtifact<'a> {
    experiment: &'a str,
    strategy: &'a str,
    n_shapelets: usize,
    series_searched: usize,
    candidates_evaluated: u64,
    early_abandons: u64,
    passes: usize,
    elapsed_secs: f64,
    switched_to_full: bool,
    contract_exhausted: bool,
    shapelets: Vec<ShapeletEntry<'a>>,
}

#[derive(Serialize)]
struct ShapeletEntry<'a> {
    series_id: Option<&'a str>,
    series_index: usize,
    start: usize,
    length: usize,
    dimension: usize,
    n_dimensions: usize,
    class: usize,
    class_name: Option<&'a str>,
    quality: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proteus_series::{ClassLabel, Dataset, TimeSeries};
    use proteus_shapelet::ShapeletTransformConfig;
    use tempfile::TempDir;

    fn dataset() -> Dataset {
        let series = vec![
            TimeSeries::new(vec![0.0, 1.0, 5.0, 1.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, 0.0, 1.0, 5.0, 1.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, -1.0, -5.0, -1.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, 0.0, -1.0, -5.0, -1.0, 0.0]).unwrap(),
        ];
        let labels = [0, 0, 1, 1].into_iter().map(ClassLabel::new).collect();
        Dataset::labelled(series, labels).unwrap()
    }

    fn ids() -> Vec<SeriesId> {
        ["a", "b", "c", "d"]
            .into_iter()
            .map(|s| SeriesId::new(s.to_string()))
            .collect()
    }

    fn writer(dir: &TempDir) -> ResultWriter {
        ResultWriter::new(dir.path(), ExperimentName::new("exp".to_string()).unwrap()).unwrap()
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ResultWriter::new(&nested, ExperimentName::new("x".to_string()).unwrap()).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn features_csv_has_ids_distances_and_class_names() {
        let dir = TempDir::new().unwrap();
        let ds = dataset();
        let fitted = ShapeletTransformConfig::new(2, 3, 3).unwrap().fit(&ds).unwrap();
        let features = fitted.transform(&ds).unwrap();
        let names = vec!["peak".to_string(), "dip".to_string()];

        let path = writer(&dir)
            .write_features(&ids(), &features, Some(&names))
            .unwrap();
        assert!(path.ends_with("exp_features.csv"));

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, vec!["series_id", "shapelet_0", "shapelet_1", "class"]);

        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][0], "a");
        assert_eq!(&rows[0][3], "peak");
        assert_eq!(&rows[3][3], "dip");
        let d: f64 = rows[2][1].parse().unwrap();
        assert_eq!(d, features.value(2, 0).unwrap());
    }

    #[test]
    fn fit_summary_json_structure() {
        let dir = TempDir::new().unwrap();
        let ds = dataset();
        let fitted = ShapeletTransformConfig::new(2, 3, 3).unwrap().fit(&ds).unwrap();
        let names = vec!["peak".to_string(), "dip".to_string()];

        let path = writer(&dir)
            .write_fit_summary(&ids(), Some(&names), &fitted)
            .unwrap();
        let content = fs::read_to_string(path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(json["experiment"], "exp");
        assert_eq!(json["n_shapelets"], 2);
        assert_eq!(json["strategy"], fitted.stats().strategy.as_str());
        assert_eq!(
            json["candidates_evaluated"],
            fitted.stats().candidates_evaluated
        );
        let first = &json["shapelets"][0];
        let s = &fitted.shapelets()[0];
        assert_eq!(first["series_index"], s.series_id());
        assert_eq!(first["length"], 3);
        assert_eq!(
            first["class_name"],
            names[s.class_value().index()].as_str()
        );
    }

    #[test]
    fn shapelet_file_round_trips_through_writer() {
        let dir = TempDir::new().unwrap();
        let fitted = ShapeletTransformConfig::new(2, 3, 4)
            .unwrap()
            .fit(&dataset())
            .unwrap();
        let w = writer(&dir);
        let path = w.write_shapelets(&fitted).unwrap();
        assert_eq!(path, w.shapelets_path());
        let back = crate::read_shapelets(&path).unwrap();
        assert_eq!(back.as_slice(), fitted.shapelets());
    }

    #[test]
    fn checkpoint_path_format() {
        let dir = TempDir::new().unwrap();
        let w = ResultWriter::new(dir.path(), ExperimentName::new("run1".to_string()).unwrap())
            .unwrap();
        assert_eq!(w.checkpoint_path(), dir.path().join("run1_search.ckpt"));
    }
}
