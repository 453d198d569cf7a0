//! CSV persistence for reference trajectories and session recordings.
//!
//! Trajectories are CSV files with a header naming the `X`, `Y`, `Z` and
//! `Height` columns (case-insensitive, any order, extra columns ignored).
//! Recordings are append-only CSV files with the columns of
//! [`RECORDING_HEADER`].

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::cache::DeltaSource;
use crate::delta::to_matrix;
use crate::error::{Result, ScoringError};
use crate::math::vector::{Channel, Vector4};

/// Header row of a recording file.
pub const RECORDING_HEADER: [&str; 5] = ["X", "Y", "Z", "Height", "Score"];

/// Path of the reference trajectory for `exercise` inside `dir`.
#[must_use]
pub fn reference_path(dir: impl AsRef<Path>, exercise: &str) -> PathBuf {
    dir.as_ref().join(format!("ideal_{exercise}.csv"))
}

/// Load a trajectory from a CSV file.
///
/// # Errors
///
/// - [`ScoringError::Io`] / [`ScoringError::Csv`] if the file cannot be read.
/// - [`ScoringError::MalformedInput`] on a missing column or a non-numeric cell.
pub fn load_trajectory(path: impl AsRef<Path>) -> Result<Vec<Vector4>> {
    let file = File::open(path.as_ref())?;
    let frames = load_trajectory_from_reader(file)?;
    debug!(path = %path.as_ref().display(), frames = frames.len(), "trajectory loaded");
    Ok(frames)
}

/// Load a trajectory from any CSV source.
///
/// # Errors
///
/// See [`load_trajectory`].
pub fn load_trajectory_from_reader<R: Read>(reader: R) -> Result<Vec<Vector4>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut columns = [0_usize; 4];
    for channel in Channel::ALL {
        let matches: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.eq_ignore_ascii_case(channel.name()))
            .map(|(i, _)| i)
            .collect();
        columns[channel.index()] = match matches.as_slice() {
            [i] => *i,
            [] => return Err(ScoringError::malformed(1, format!("missing column `{channel}`"))),
            _ => return Err(ScoringError::malformed(1, format!("duplicate column `{channel}`"))),
        };
    }

    let mut frames = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);

        let mut values = [0.0; 4];
        for (slot, &column) in values.iter_mut().zip(&columns) {
            let cell = record
                .get(column)
                .ok_or_else(|| ScoringError::malformed(line, "row too short"))?;
            *slot = cell
                .parse()
                .map_err(|_| ScoringError::malformed(line, format!("`{cell}` is not a number")))?;
        }
        frames.push(Vector4::from(values));
    }
    Ok(frames)
}

/// Append-only writer for session recordings.
#[derive(Debug)]
pub struct RecordingWriter {
    writer: csv::Writer<File>,
}

impl RecordingWriter {
    /// Open `path` for appending, writing the header if the file is new or empty.
    ///
    /// # Errors
    ///
    /// Returns an I/O or CSV error if the file cannot be opened or written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let needs_header = fs::metadata(path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(RECORDING_HEADER)?;
        }
        Ok(Self { writer })
    }

    /// Append one reading with its score rounded to an integer.
    ///
    /// An undefined (NaN) score is written as an empty cell.
    ///
    /// # Errors
    ///
    /// Returns a CSV error if the row cannot be written.
    pub fn append(&mut self, vector: &Vector4, score: f64) -> Result<()> {
        let score = if score.is_nan() {
            String::new()
        } else {
            format!("{}", score.round())
        };
        self.writer.write_record([
            vector.x.to_string(),
            vector.y.to_string(),
            vector.z.to_string(),
            vector.height.to_string(),
            score,
        ])?;
        Ok(())
    }

    /// Flush buffered rows to disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Re-chunk a recording whose rows were glued together on one line.
///
/// Each line is split into cells and regrouped into rows of five; cells left
/// over at the end of a line are discarded. Header rows are dropped and the
/// file is rewritten with a single header. Returns the number of data rows
/// kept.
///
/// # Errors
///
/// Returns an I/O or CSV error if the file cannot be read or rewritten.
pub fn repair_recording(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let original_rows = content.lines().filter(|l| !l.trim().is_empty()).count();
    let mut rows: Vec<Vec<&str>> = Vec::new();
    for line in content.lines() {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        rows.extend(
            cells
                .chunks_exact(RECORDING_HEADER.len())
                .filter(|row| !is_header(row))
                .map(<[&str]>::to_vec),
        );
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    writer.write_record(RECORDING_HEADER)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    if rows.len() + 1 != original_rows {
        warn!(
            path = %path.display(),
            before = original_rows,
            after = rows.len() + 1,
            "recording repaired"
        );
    }
    Ok(rows.len())
}

fn is_header(row: &[&str]) -> bool {
    row.iter()
        .zip(RECORDING_HEADER)
        .all(|(cell, name)| cell.eq_ignore_ascii_case(name))
}

/// A CSV trajectory file as a cacheable delta source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTrajectory {
    path: PathBuf,
}

impl CsvTrajectory {
    /// Source backed by the CSV file at `path`. The file is read lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeltaSource for CsvTrajectory {
    type Key = PathBuf;

    fn cache_key(&self) -> PathBuf {
        self.path.clone()
    }

    fn last_modified(&self) -> Result<SystemTime> {
        Ok(fs::metadata(&self.path)?.modified()?)
    }

    fn load(&self) -> Result<DMatrix<f64>> {
        Ok(to_matrix(&load_trajectory(&self.path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_any_order_and_case() {
        let data = "time,height,z,Y,x\n0.0,1.5,3,2,1\n0.2,1.6,6,5,4\n";
        let frames = load_trajectory_from_reader(data.as_bytes()).unwrap();
        assert_eq!(
            frames,
            vec![Vector4::new(1.0, 2.0, 3.0, 1.5), Vector4::new(4.0, 5.0, 6.0, 1.6)]
        );
    }

    #[test]
    fn test_missing_column() {
        let err = load_trajectory_from_reader("X,Y,Z\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScoringError::MalformedInput { line: 1, .. }));
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let data = "X,Y,Z,Height\n1,2,3,4\n1,oops,3,4\n";
        let err = load_trajectory_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ScoringError::MalformedInput { line: 3, .. }));
    }

    #[test]
    fn test_reference_path() {
        assert_eq!(
            reference_path("/data", "squat"),
            PathBuf::from("/data/ideal_squat.csv")
        );
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header(&["X", "Y", "Z", "Height", "Score"]));
        assert!(is_header(&["x", "y", "z", "height", "score"]));
        assert!(!is_header(&["1", "2", "3", "4", "5"]));
    }
}
