//! ptscloud: scan-tagged point archives, per-scan reconstruction poses, and PLY export.
//!
//! Two inputs describe one registered capture session:
//!
//! - a point archive (`allpoints.bin`): every point with its color and the
//!   1-based id of the scan that captured it, see [`archive`];
//! - a reconstruction archive: one mode flag and one rigid pose (forward and
//!   inverse 4x4) per scan, see [`reconstruction`].
//!
//! [`ScanCloud`] ties them together: the points are stored once and each
//! [`Scan`] holds a `(start, count)` range into them plus its pose. Two exports
//! read an immutable `&ScanCloud`:
//!
//! - [`write_point_cloud`]: all enabled scans moved into the scene frame, one
//!   ramp color per scan;
//! - [`write_camera_trajectory`]: camera centers, the path joining them, and a
//!   short orientation tick per camera.
//!
//! Output is binary little-endian PLY with `float x y z` / `uchar red green blue`
//! vertices.

pub mod archive;
pub mod cloud;
pub mod error;
pub mod export;
pub mod index;
pub mod ply;
pub mod ramp;
pub mod reconstruction;
mod wire;

use std::path::Path;

pub use archive::{encode_points, parse_points_bytes, read_points_file, RawPointSet};
pub use cloud::{LoadOptions, Scan, ScanCloud, ScanEntry, ScanSummary};
pub use error::{PtsError, Result};
pub use export::{
    trajectory_vertex_count, write_camera_trajectory, write_camera_trajectory_file,
    write_point_cloud, write_point_cloud_file, ExportStats, Provenance,
};
pub use index::{build_index, validate_contiguous, ScanRange};
pub use ramp::{ramp, rank_color, Rgb};
pub use reconstruction::{
    encode_reconstruction, parse_reconstruction_bytes, read_reconstruction_file, PoseRecord,
    Reconstruction, ReconstructionHeader, ScanPose,
};

/// Prefer mmap; the archive parsers only need a byte slice.
#[cfg(feature = "mmap")]
pub(crate) fn read_bytes(path: &Path) -> Result<memmap2::Mmap> {
    let file = std::fs::File::open(path)?;
    let map = unsafe { memmap2::MmapOptions::new().map(&file)? };
    Ok(map)
}

#[cfg(not(feature = "mmap"))]
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}
