//! Plain-text shapelet files.
//!
//! A shapelet file is a CSV with a fixed header followed by one block per
//! shapelet: a six-field line
//! `quality,series_id,start_position,class_value,num_dimensions,dimension`
//! and then `num_dimensions` lines holding the rescaled content, one channel
//! per line. Values are written in Rust's shortest round-trip notation, so
//! reading a file back reproduces the shapelets bit for bit.

use std::fs::File;
use std::path::Path;

use proteus_series::ClassLabel;
use proteus_shapelet::{CandidateLocation, Shapelet};
use tracing::{debug, info, instrument};

use crate::IoError;

const HEADER: [&str; 6] = [
    "quality",
    "series_id",
    "start_position",
    "class_value",
    "num_dimensions",
    "dimension",
];

/// Write `shapelets` to `path` in file order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::WriteFile`] | The file cannot be created |
/// | [`IoError::WriteCsv`] | A record cannot be written |
#[instrument(skip_all, fields(path = %path.display(), n_shapelets = shapelets.len()))]
pub fn write_shapelets(path: &Path, shapelets: &[Shapelet]) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
    let csv_err = |e: csv::Error| IoError::WriteCsv {
        path: path.to_path_buf(),
        source: e,
    };

    wtr.write_record(HEADER).map_err(csv_err)?;
    for shapelet in shapelets {
        wtr.write_record([
            shapelet.quality().to_string(),
            shapelet.series_id().to_string(),
            shapelet.start().to_string(),
            shapelet.class_value().index().to_string(),
            shapelet.n_dimensions().to_string(),
            shapelet.dimension().to_string(),
        ])
        .map_err(csv_err)?;
        for row in shapelet.content() {
            wtr.write_record(row.iter().map(f64::to_string))
                .map_err(csv_err)?;
        }
    }
    wtr.flush().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("shapelets written");
    Ok(())
}

/// Read shapelets written by [`write_shapelets`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MalformedShapeletFile`] | Wrong header, unparseable field, or a block cut short |
/// | [`IoError::InvalidShapelet`] | A block fails [`Shapelet::new`] validation |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_shapelets(path: &Path) -> Result<Vec<Shapelet>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header = rdr.headers().map_err(|e| csv_parse(path, e))?;
    if header.iter().ne(HEADER) {
        return Err(malformed(path, 1, "unexpected header"));
    }

    let mut records = rdr.records();
    let mut shapelets = Vec::new();

    while let Some(result) = records.next() {
        let record = result.map_err(|e| csv_parse(path, e))?;
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != HEADER.len() {
            return Err(malformed(
                path,
                line,
                &format!("expected {} header fields, found {}", HEADER.len(), record.len()),
            ));
        }

        let quality: f64 = parse_field(path, line, &record, 0)?;
        let series_id: usize = parse_field(path, line, &record, 1)?;
        let start: usize = parse_field(path, line, &record, 2)?;
        let class_value: usize = parse_field(path, line, &record, 3)?;
        let n_dimensions: usize = parse_field(path, line, &record, 4)?;
        let dimension: usize = parse_field(path, line, &record, 5)?;

        let mut content = Vec::with_capacity(n_dimensions);
        for _ in 0..n_dimensions {
            let Some(row) = records.next() else {
                return Err(malformed(path, line, "content ends early"));
            };
            let row = row.map_err(|e| csv_parse(path, e))?;
            let row_line = row.position().map_or(0, |p| p.line());
            let values = row
                .iter()
                .map(|raw| {
                    raw.trim()
                        .parse::<f64>()
                        .map_err(|_| malformed(path, row_line, &format!("bad value \"{raw}\"")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            content.push(values);
        }

        let length = content.first().map_or(0, Vec::len);
        let shapelet = Shapelet::new(
            series_id,
            CandidateLocation::new(start, length, dimension),
            ClassLabel::new(class_value),
            quality,
            content,
        )
        .map_err(|e| IoError::InvalidShapelet {
            path: path.to_path_buf(),
            line,
            source: e,
        })?;
        debug!(line, series_id, start, length, "shapelet read");
        shapelets.push(shapelet);
    }

    info!(n_shapelets = shapelets.len(), "shapelets loaded");
    Ok(shapelets)
}

fn parse_field<T: std::str::FromStr>(
    path: &Path,
    line: u64,
    record: &csv::StringRecord,
    index: usize,
) -> Result<T, IoError> {
    let raw = record.get(index).unwrap_or("").trim();
    raw.parse().map_err(|_| {
        malformed(
            path,
            line,
            &format!("bad {} \"{raw}\"", HEADER[index]),
        )
    })
}

fn malformed(path: &Path, line: u64, reason: &str) -> IoError {
    IoError::MalformedShapeletFile {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    }
}

fn csv_parse(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn shapelet(series_id: usize, start: usize, dimension: usize, content: Vec<Vec<f64>>) -> Shapelet {
        let length = content[0].len();
        Shapelet::new(
            series_id,
            CandidateLocation::new(start, length, dimension),
            ClassLabel::new(series_id % 2),
            0.1 + 0.7 / 3.0,
            content,
        )
        .unwrap()
    }

    fn write_text(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn written_shapelets_read_back_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shapelets.csv");
        let shapelets = vec![
            shapelet(3, 5, 0, vec![vec![-1.224744871391589, 0.0, 1.0 / 3.0]]),
            shapelet(0, 0, 0, vec![vec![0.1, 0.2], vec![-0.3, 1e-300]]),
            shapelet(7, 2, 1, vec![vec![std::f64::consts::PI]]),
        ];

        write_shapelets(&path, &shapelets).unwrap();
        let back = read_shapelets(&path).unwrap();

        assert_eq!(back, shapelets);
        assert_eq!(back[1].n_dimensions(), 2);
        assert_eq!(back[2].dimension(), 1);
    }

    #[test]
    fn file_layout_has_header_then_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shapelets.csv");
        write_shapelets(&path, &[shapelet(1, 4, 0, vec![vec![0.5, -0.5]])]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "quality,series_id,start_position,class_value,num_dimensions,dimension"
        );
        assert!(lines[1].ends_with(",1,4,1,1,0"));
        assert_eq!(lines[2], "0.5,-0.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_set_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("none.csv");
        write_shapelets(&path, &[]).unwrap();
        assert!(read_shapelets(&path).unwrap().is_empty());
    }

    #[test]
    fn error_file_not_found() {
        let result = read_shapelets(Path::new("/nonexistent/shapelets.csv"));
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_wrong_header() {
        let f = write_text("series_id,t0\nA,1.0\n");
        let result = read_shapelets(f.path());
        assert!(matches!(
            result,
            Err(IoError::MalformedShapeletFile { line: 1, .. })
        ));
    }

    #[test]
    fn error_truncated_block() {
        let f = write_text(
            "quality,series_id,start_position,class_value,num_dimensions,dimension\n\
             0.5,0,1,0,2,0\n\
             1.0,2.0\n",
        );
        let result = read_shapelets(f.path());
        assert!(matches!(
            result,
            Err(IoError::MalformedShapeletFile { line: 2, .. })
        ));
    }

    #[test]
    fn error_bad_value() {
        let f = write_text(
            "quality,series_id,start_position,class_value,num_dimensions,dimension\n\
             0.5,0,1,0,1,0\n\
             1.0,oops\n",
        );
        let result = read_shapelets(f.path());
        assert!(matches!(
            result,
            Err(IoError::MalformedShapeletFile { line: 3, .. })
        ));
    }

    #[test]
    fn error_ragged_content_is_invalid_shapelet() {
        let f = write_text(
            "quality,series_id,start_position,class_value,num_dimensions,dimension\n\
             0.5,0,1,0,2,0\n\
             1.0,2.0\n\
             3.0\n",
        );
        let result = read_shapelets(f.path());
        assert!(matches!(result, Err(IoError::InvalidShapelet { .. })));
    }
}
