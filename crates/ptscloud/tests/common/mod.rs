//! Fixture builders for the end-to-end tests.

#![allow(dead_code)]

use ptscloud::{encode_points, encode_reconstruction, PoseRecord, RawPointSet, ScanPose};
use std::path::PathBuf;

/// Points laid out in contiguous runs, `counts[i]` points for scan `i + 1`.
pub fn runs(counts: &[usize]) -> RawPointSet {
    let mut points = RawPointSet::default();
    for (slot, &count) in counts.iter().enumerate() {
        for j in 0..count {
            points.positions.push([j as f32 * 0.5, slot as f32, -1.25]);
            points.colors.push([200, 100, 50]);
            points.scan_ids.push(slot as i32 + 1);
        }
    }
    points
}

pub fn enabled(pose: ScanPose) -> PoseRecord {
    PoseRecord { mode: 1, pose }
}

pub fn disabled(pose: ScanPose) -> PoseRecord {
    PoseRecord { mode: 0, pose }
}

/// Fresh per-test directory under the system temp dir.
pub fn scratch(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ptscloud-{}-{}", std::process::id(), test));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Write both archives into `dir`, returning their paths.
pub fn write_inputs(
    dir: &std::path::Path,
    points: &RawPointSet,
    records: &[PoseRecord],
) -> (PathBuf, PathBuf) {
    let pts = dir.join("allpoints.bin");
    let rec = dir.join("out.reconstruction");
    std::fs::write(&pts, encode_points(points)).expect("write points");
    std::fs::write(&rec, encode_reconstruction(0.75, 0.125, records)).expect("write reconstruction");
    (pts, rec)
}
