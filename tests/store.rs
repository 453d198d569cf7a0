//! File-backed tests for CSV trajectories, recordings and the delta cache.

#![cfg(feature = "csv")]

use std::fs;
use std::time::{Duration, SystemTime};

use movement_scoring::store::{
    load_trajectory, reference_path, repair_recording, CsvTrajectory, RecordingWriter,
};
use movement_scoring::{
    DeltaCache, ReferenceTrajectory, RepetitionSession, ScoringConfig, ScoringError, Vector4,
};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// TRAJECTORIES
// =============================================================================

#[test]
fn test_load_reference_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "ideal_squat.csv",
        "X,Y,Z,Height\n0.0,0.0,1.0,0.0\n0.1,0.0,1.1,0.02\n0.2,0.0,1.2,0.04\n",
    );
    assert_eq!(path, reference_path(dir.path(), "squat"));

    let frames = load_trajectory(&path).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2], Vector4::new(0.2, 0.0, 1.2, 0.04));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_trajectory(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, ScoringError::Io(_)));
}

#[test]
fn test_recording_ignores_score_column() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "data.csv", "X,Y,Z,Height,Score\n1,2,3,0.5,88\n4,5,6,0.6,\n");
    let frames = load_trajectory(&path).unwrap();
    assert_eq!(frames[1], Vector4::new(4.0, 5.0, 6.0, 0.6));
}

// =============================================================================
// RECORDINGS
// =============================================================================

#[test]
fn test_writer_appends_with_single_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.csv");

    {
        let mut writer = RecordingWriter::open(&path).unwrap();
        writer.append(&Vector4::new(1.0, 2.0, 3.0, 0.5), 87.6).unwrap();
        writer.flush().unwrap();
    }
    {
        let mut writer = RecordingWriter::open(&path).unwrap();
        writer.append(&Vector4::new(4.0, 5.0, 6.0, 0.5), f64::NAN).unwrap();
        writer.flush().unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "X,Y,Z,Height,Score\n1,2,3,0.5,88\n4,5,6,0.5,\n");
    assert_eq!(load_trajectory(&path).unwrap().len(), 2);
}

#[test]
fn test_repair_splits_glued_rows() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "data.csv",
        "X,Y,Z,Height,Score\n1,2,3,0.5,80,4,5,6,0.5,81\n7,8,9,0.5,82\nX,Y,Z,Height,Score\n1,2\n",
    );

    let kept = repair_recording(&path).unwrap();
    assert_eq!(kept, 3);

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "X,Y,Z,Height,Score\n1,2,3,0.5,80\n4,5,6,0.5,81\n7,8,9,0.5,82\n"
    );
}

#[test]
fn test_repair_clean_file_is_unchanged() {
    let dir = TempDir::new().unwrap();
    let original = "X,Y,Z,Height,Score\n1,2,3,0.5,80\n";
    let path = write(&dir, "data.csv", original);

    assert_eq!(repair_recording(&path).unwrap(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

// =============================================================================
// DELTA CACHE OVER FILES
// =============================================================================

#[test]
fn test_cache_tracks_file_rewrites() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "ref.csv", "X,Y,Z,Height\n0,0,0,0\n1,0,0,0\n");
    let source = CsvTrajectory::new(&path);
    let mut cache = DeltaCache::new();

    let first = cache.get_or_compute(&source).unwrap();
    assert_eq!(first.shape(), (1, 4));
    assert_eq!(first.get(0, 0), Some(1.0));

    cache.get_or_compute(&source).unwrap();
    assert_eq!(cache.stats().hits, 1);

    fs::write(&path, "X,Y,Z,Height\n0,0,0,0\n3,0,0,0\n5,0,0,0\n").unwrap();
    // Push the mtime past the cache write so the rewrite is seen as newer.
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();

    let second = cache.get_or_compute(&source).unwrap();
    assert_eq!(second.shape(), (2, 4));
    assert_eq!(second.get(1, 0), Some(2.0));
    assert_eq!(cache.stats().misses, 2);
}

// =============================================================================
// REPLAY
// =============================================================================

#[test]
fn test_replay_written_recording() {
    let dir = TempDir::new().unwrap();
    let reference_file = write(
        &dir,
        "ideal_curl.csv",
        "X,Y,Z,Height\n0,0,1,0\n0,0.5,1,0.1\n0,1,1,0.2\n0,0.5,1,0.1\n",
    );
    let reference = ReferenceTrajectory::new(load_trajectory(&reference_file).unwrap()).unwrap();

    let recording_file = dir.path().join("data.csv");
    let mut writer = RecordingWriter::open(&recording_file).unwrap();
    let mut session = RepetitionSession::new(ScoringConfig::default());
    session.start(reference.clone()).unwrap();
    for frame in reference.frames() {
        let obs = session.observe(*frame).unwrap();
        writer
            .append(frame, obs.score().map_or(f64::NAN, |s| s.score))
            .unwrap();
    }
    writer.flush().unwrap();
    session.end().unwrap();

    let replayed = load_trajectory(&recording_file).unwrap();
    let mut session = RepetitionSession::new(ScoringConfig::default());
    session.start(reference).unwrap();
    for frame in replayed {
        session.observe(frame).unwrap();
    }
    let summary = session.end().unwrap();
    assert_eq!(summary.frame_count, 4);
    assert!(summary.deviations.is_clean());
}
