//! PLY export of the registered point cloud and of the camera trajectory.
//!
//! Both exports cover the enabled scans only, in id order. A scan's position
//! in that list (its rank) picks its color from the ramp, so colors identify
//! scans rather than reproduce captured appearance.

use crate::cloud::{Scan, ScanCloud};
use crate::error::{PtsError, Result};
use crate::ply::{PlyHeader, VertexWriter};
use crate::ramp::rank_color;
use glam::{DVec3, Vec4};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Samples on each segment joining consecutive camera centers.
pub const SEGMENT_SAMPLES: usize = 10;
/// Samples on each camera's orientation marker.
pub const ORIENTATION_SAMPLES: usize = 100;
/// Length of the orientation marker along the camera's local +Z.
pub const ORIENTATION_LENGTH: f64 = 0.05;
pub const SEGMENT_COLOR: [u8; 3] = [0, 0, 255];

/// Source files named in the header comments.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub points_file: &'a Path,
    pub reconstruction_file: &'a Path,
}

impl Provenance<'_> {
    fn header(&self, vertex_count: usize, what: &str) -> PlyHeader {
        PlyHeader::new(vertex_count)
            .comment(format!(
                "Made with {} {} {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                self.points_file.display(),
                self.reconstruction_file.display()
            ))
            .comment(what)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub scans: usize,
    pub vertices: usize,
}

fn selection(cloud: &ScanCloud) -> Vec<&Scan> {
    cloud.enabled_scans().collect()
}

/// Write every enabled scan's points, moved into the scene frame.
pub fn write_point_cloud<W: Write>(
    cloud: &ScanCloud,
    provenance: Provenance<'_>,
    out: &mut W,
) -> Result<ExportStats> {
    let selected = selection(cloud);
    let k = selected.len();
    let total: usize = selected.iter().map(|s| s.range.count).sum();

    provenance
        .header(total, "This is the reconstruction file")
        .write_to(out)?;

    let mut vw = VertexWriter::new(out);
    for (rank, scan) in selected.iter().enumerate() {
        let color = rank_color(rank, k);
        // Points are f32; the product runs in f32 as well.
        let t = scan.forward_matrix().as_mat4();

        for p in cloud.points_of(scan) {
            let q = t * Vec4::new(p[0], p[1], p[2], 1.0);
            vw.vertex([q.x, q.y, q.z], color)?;
        }
        log::debug!("scan {} rank {} color {:?}", scan.name, rank, color);
    }

    debug_assert_eq!(vw.written(), total);
    Ok(ExportStats {
        scans: k,
        vertices: total,
    })
}

/// `K` centers, `K - 1` joining segments and `K` orientation markers.
pub fn trajectory_vertex_count(k: usize) -> usize {
    k + k.saturating_sub(1) * SEGMENT_SAMPLES + k * ORIENTATION_SAMPLES
}

/// `samples` points strictly between `from` and `to`, evenly spaced.
fn write_segment<W: Write>(
    vw: &mut VertexWriter<'_, W>,
    from: DVec3,
    to: DVec3,
    samples: usize,
    color: [u8; 3],
) -> Result<()> {
    // Step is kept in f32 and added to the f64 start, then cast down.
    let step = ((to - from) / (samples + 1) as f64).as_vec3();

    for i in 1..=samples {
        let d = step * i as f32;
        let p = [
            (from.x + d.x as f64) as f32,
            (from.y + d.y as f64) as f32,
            (from.z + d.z as f64) as f32,
        ];
        vw.vertex(p, color)?;
    }

    Ok(())
}

/// Write camera centers, the path joining them and per-camera orientation ticks.
pub fn write_camera_trajectory<W: Write>(
    cloud: &ScanCloud,
    provenance: Provenance<'_>,
    out: &mut W,
) -> Result<ExportStats> {
    let selected = selection(cloud);
    let k = selected.len();
    let total = trajectory_vertex_count(k);

    let poses: Vec<_> = selected.iter().map(|s| s.pose_or_identity()).collect();
    let colors: Vec<[u8; 3]> = (0..k).map(|rank| rank_color(rank, k)).collect();

    provenance
        .header(total, "This is the camera centers file")
        .write_to(out)?;

    let mut vw = VertexWriter::new(out);

    for (pose, &color) in poses.iter().zip(&colors) {
        vw.vertex(pose.camera_center().as_vec3().to_array(), color)?;
    }

    for pair in poses.windows(2) {
        write_segment(
            &mut vw,
            pair[0].camera_center(),
            pair[1].camera_center(),
            SEGMENT_SAMPLES,
            SEGMENT_COLOR,
        )?;
    }

    for (pose, &color) in poses.iter().zip(&colors) {
        let center = pose.camera_center();
        let tip = pose.rotation() * DVec3::new(0.0, 0.0, ORIENTATION_LENGTH) + center;
        write_segment(&mut vw, center, tip, ORIENTATION_SAMPLES, color)?;
    }

    debug_assert_eq!(vw.written(), total);
    Ok(ExportStats {
        scans: k,
        vertices: total,
    })
}

fn write_file<F>(path: &Path, what: &str, write: F) -> Result<ExportStats>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<ExportStats>,
{
    log::info!("Dumping {} to {}", what, path.display());

    let run = || -> Result<ExportStats> {
        let mut out = BufWriter::new(File::create(path)?);
        let stats = write(&mut out)?;
        out.flush()?;
        Ok(stats)
    };

    let stats = run().map_err(|e: PtsError| e.in_file(path))?;
    if stats.scans == 0 {
        log::warn!("No enabled scans; {} declares zero vertices", path.display());
    }
    log::info!(
        "OK {} ({} scans, {} vertices)",
        path.display(),
        stats.scans,
        stats.vertices
    );
    Ok(stats)
}

pub fn write_point_cloud_file<P: AsRef<Path>>(
    cloud: &ScanCloud,
    provenance: Provenance<'_>,
    path: P,
) -> Result<ExportStats> {
    write_file(path.as_ref(), "point cloud", |out| {
        write_point_cloud(cloud, provenance, out)
    })
}

pub fn write_camera_trajectory_file<P: AsRef<Path>>(
    cloud: &ScanCloud,
    provenance: Provenance<'_>,
    path: P,
) -> Result<ExportStats> {
    write_file(path.as_ref(), "camera trajectory", |out| {
        write_camera_trajectory(cloud, provenance, out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::RawPointSet;
    use crate::cloud::LoadOptions;
    use crate::ply::read_vertices;
    use crate::reconstruction::{PoseRecord, Reconstruction, ReconstructionHeader, ScanPose};

    fn prov() -> Provenance<'static> {
        Provenance {
            points_file: Path::new("pts.bin"),
            reconstruction_file: Path::new("pts.reconstruction"),
        }
    }

    /// One scan per entry of `poses`, each with `per_scan` points.
    fn cloud(per_scan: usize, poses: &[(i32, ScanPose)]) -> ScanCloud {
        let mut points = RawPointSet::default();
        for (i, _) in poses.iter().enumerate() {
            for j in 0..per_scan {
                points.positions.push([j as f32, 1.0, 2.0]);
                points.colors.push([7, 7, 7]);
                points.scan_ids.push(i as i32 + 1);
            }
        }

        let mut cloud = ScanCloud::from_points(points, LoadOptions::default()).unwrap();
        cloud
            .apply_reconstruction(&Reconstruction {
                header: ReconstructionHeader {
                    declared_count: poses.len() as i32,
                    score1: 0.0,
                    score2: 0.0,
                },
                records: poses
                    .iter()
                    .map(|&(mode, pose)| PoseRecord { mode, pose })
                    .collect(),
            })
            .unwrap();
        cloud
    }

    #[test]
    fn header_counts_enabled_points_only() {
        let c = cloud(
            3,
            &[
                (1, ScanPose::default()),
                (0, ScanPose::default()),
                (2, ScanPose::default()),
            ],
        );
        let mut out = Vec::new();
        let stats = write_point_cloud(&c, prov(), &mut out).unwrap();
        assert_eq!(stats, ExportStats { scans: 2, vertices: 6 });

        let ply = read_vertices(&out).unwrap();
        assert_eq!(ply.declared, 6);
        assert_eq!(ply.vertices.len(), 6);
        assert_eq!(ply.comments[1], "This is the reconstruction file");
        assert!(ply.comments[0].ends_with("pts.bin pts.reconstruction"));

        // Two scans: first is blue, last is red; stored colors are ignored.
        assert!(ply.vertices[..3].iter().all(|v| v.1 == [0, 0, 255]));
        assert!(ply.vertices[3..].iter().all(|v| v.1 == [255, 0, 0]));
    }

    #[test]
    fn all_disabled_writes_bare_header() {
        let c = cloud(2, &[(0, ScanPose::default()), (0, ScanPose::default())]);
        let mut out = Vec::new();
        write_point_cloud(&c, prov(), &mut out).unwrap();
        let ply = read_vertices(&out).unwrap();
        assert_eq!(ply.declared, 0);
        assert_eq!(ply.body_len, 0);
    }

    #[test]
    fn transform_translates_and_rotates() {
        // 90 degrees about Z, then shift by (10, 0, 0).
        let m = glam::DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0))
            * glam::DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let pose = ScanPose {
            forward: m.to_cols_array(),
            inverse: m.inverse().to_cols_array(),
        };
        let c = cloud(2, &[(1, pose)]);

        let mut out = Vec::new();
        write_point_cloud(&c, prov(), &mut out).unwrap();
        let ply = read_vertices(&out).unwrap();

        // Input points are (0,1,2) and (1,1,2).
        let expect = [[9.0f32, 0.0, 2.0], [9.0, 1.0, 2.0]];
        for (v, e) in ply.vertices.iter().zip(expect) {
            for a in 0..3 {
                assert!((v.0[a] - e[a]).abs() < 1e-5, "{:?} vs {:?}", v.0, e);
            }
        }
    }

    #[test]
    fn identity_leaves_points_alone() {
        let c = cloud(4, &[(1, ScanPose::default())]);
        let mut out = Vec::new();
        write_point_cloud(&c, prov(), &mut out).unwrap();
        let ply = read_vertices(&out).unwrap();
        let original: Vec<[f32; 3]> = c.points().positions.clone();
        let exported: Vec<[f32; 3]> = ply.vertices.iter().map(|v| v.0).collect();
        assert_eq!(exported, original);
    }

    #[test]
    fn trajectory_counts() {
        for (k, expected) in [(0usize, 0usize), (1, 101), (5, 5 + 40 + 500)] {
            assert_eq!(trajectory_vertex_count(k), expected);

            let poses: Vec<(i32, ScanPose)> = (0..k)
                .map(|i| (1, ScanPose::translation([i as f64, 0.0, 0.0])))
                .collect();
            let c = if k == 0 {
                cloud(1, &[(0, ScanPose::default())])
            } else {
                cloud(1, &poses)
            };

            let mut out = Vec::new();
            let stats = write_camera_trajectory(&c, prov(), &mut out).unwrap();
            assert_eq!(stats.vertices, expected);

            let ply = read_vertices(&out).unwrap();
            assert_eq!(ply.declared, expected);
            assert_eq!(ply.vertices.len(), expected);
            assert_eq!(ply.comments[1], "This is the camera centers file");
        }
    }

    #[test]
    fn orientation_marker_follows_rotation() {
        // Rotate +Z onto +X.
        let m = glam::DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0))
            * glam::DMat4::from_rotation_y(std::f64::consts::FRAC_PI_2);
        let pose = ScanPose {
            forward: m.to_cols_array(),
            inverse: m.inverse().to_cols_array(),
        };
        let c = cloud(1, &[(1, pose)]);

        let mut out = Vec::new();
        write_camera_trajectory(&c, prov(), &mut out).unwrap();
        let ply = read_vertices(&out).unwrap();
        assert_eq!(ply.vertices.len(), 101);

        let center = ply.vertices[0].0;
        assert_eq!(center, [1.0, 2.0, 3.0]);

        let last = ply.vertices[100].0;
        let expect_x = 1.0 + 0.05 * 100.0 / 101.0;
        assert!((last[0] - expect_x as f32).abs() < 1e-5);
        assert!((last[1] - 2.0).abs() < 1e-5);
        assert!((last[2] - 3.0).abs() < 1e-5);

        // A single scan's marker uses its own ramp color.
        assert!(ply.vertices[1..].iter().all(|v| v.1 == [0, 0, 255]));
    }
}
