//! Search snapshots taken after every series, and a file-backed writer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::ShapeletError;
use crate::shapelet::Shapelet;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Everything needed to continue a fit from where it stopped.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CheckpointState {
    /// Number of series in the dataset being fitted.
    pub n_series: usize,
    /// Series visiting order (series ids).
    pub order: Vec<usize>,
    /// Position in `order` of the next series to search.
    pub cursor: usize,
    /// Zero-based pass over the data.
    pub pass: usize,
    /// Retained shapelets: one list, or one per class in balanced mode.
    pub retained: Vec<Vec<Shapelet>>,
    /// Series searched so far.
    pub series_searched: usize,
    /// Candidates evaluated so far.
    pub candidates_evaluated: u64,
    /// Candidates abandoned by the quality bound so far.
    pub early_abandons: u64,
    /// Wall-clock time used so far.
    pub elapsed: Duration,
    /// Adaptive time-per-candidate estimate, if one exists.
    pub time_per_candidate_nanos: Option<f64>,
    /// True once adaptive timing switched to exhaustive search.
    pub switched_to_full: bool,
}

/// Receives a snapshot after every searched series.
pub trait Checkpoint {
    /// Persist or inspect a snapshot.
    ///
    /// # Errors
    ///
    /// Any error aborts the fit.
    fn save(&mut self, state: &CheckpointState) -> Result<(), ShapeletError>;
}

impl<F> Checkpoint for F
where
    F: FnMut(&CheckpointState) -> Result<(), ShapeletError>,
{
    fn save(&mut self, state: &CheckpointState) -> Result<(), ShapeletError> {
        self(state)
    }
}

/// Versioned envelope for the serialized snapshot.
#[derive(serde::Serialize, serde::Deserialize)]
struct CheckpointEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// The snapshot.
    state: CheckpointState,
}

/// Overwrites one file with the latest snapshot.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    /// Write snapshots to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The checkpoint file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a snapshot written by [`FileCheckpoint`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::ReadCheckpoint`] | file read failed |
    /// | [`ShapeletError::DeserializeCheckpoint`] | bincode decoding failed |
    /// | [`ShapeletError::IncompatibleCheckpointVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<CheckpointState, ShapeletError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ShapeletError::ReadCheckpoint {
            path: path.to_path_buf(),
            source: e,
        })?;
        let envelope: CheckpointEnvelope =
            bincode::deserialize(&bytes).map_err(|e| ShapeletError::DeserializeCheckpoint {
                path: path.to_path_buf(),
                source: e,
            })?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(ShapeletError::IncompatibleCheckpointVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }
        debug!(
            cursor = envelope.state.cursor,
            pass = envelope.state.pass,
            "checkpoint loaded"
        );
        Ok(envelope.state)
    }
}

impl Checkpoint for FileCheckpoint {
    fn save(&mut self, state: &CheckpointState) -> Result<(), ShapeletError> {
        let envelope = CheckpointEnvelope {
            format_version: FORMAT_VERSION,
            state: state.clone(),
        };
        let bytes = bincode::serialize(&envelope)
            .map_err(|e| ShapeletError::SerializeCheckpoint { source: e })?;
        std::fs::write(&self.path, &bytes).map_err(|e| ShapeletError::WriteCheckpoint {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proteus_series::ClassLabel;
    use tempfile::TempDir;

    use super::*;
    use crate::candidate::CandidateLocation;

    fn state() -> CheckpointState {
        let shapelet = Shapelet::scored(
            1,
            CandidateLocation::new(2, 3, 0),
            ClassLabel::new(1),
            0.75,
            vec![vec![-1.0, 0.0, 1.0]],
        );
        CheckpointState {
            n_series: 4,
            order: vec![0, 2, 1, 3],
            cursor: 2,
            pass: 0,
            retained: vec![vec![shapelet]],
            series_searched: 2,
            candidates_evaluated: 42,
            early_abandons: 5,
            elapsed: Duration::from_millis(12),
            time_per_candidate_nanos: Some(1_500.0),
            switched_to_full: false,
        }
    }

    #[test]
    fn file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search.ckpt");
        let mut writer = FileCheckpoint::new(&path);
        writer.save(&state()).unwrap();
        assert_eq!(FileCheckpoint::load(&path).unwrap(), state());
    }

    #[test]
    fn closures_are_checkpoints() {
        let mut seen = Vec::new();
        let mut sink = |s: &CheckpointState| -> Result<(), ShapeletError> {
            seen.push(s.cursor);
            Ok(())
        };
        sink.save(&state()).unwrap();
        assert_eq!(seen, vec![2]);
    }

    #[test]
    fn load_missing_file_error() {
        let err = FileCheckpoint::load("/tmp/nonexistent_checkpoint_proteus.ckpt").unwrap_err();
        assert!(matches!(err, ShapeletError::ReadCheckpoint { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.ckpt");
        std::fs::write(&path, b"not a checkpoint").unwrap();
        let err = FileCheckpoint::load(&path).unwrap_err();
        assert!(matches!(err, ShapeletError::DeserializeCheckpoint { .. }));
    }

    #[test]
    fn load_rejects_other_versions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.ckpt");
        let envelope = CheckpointEnvelope {
            format_version: FORMAT_VERSION + 1,
            state: state(),
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = FileCheckpoint::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ShapeletError::IncompatibleCheckpointVersion { found: 2, .. }
        ));
    }
}
