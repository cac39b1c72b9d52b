//! Reconstruction archive: one rigid pose per scan.
//!
//! Layout (little-endian):
//!   i32          declared scan count
//!   f64, f64     quality scores
//!   then, per scan in id order:
//!     i32        mode (0 = disabled, 1 = active candidate, other = enabled)
//!     f64[16]    forward transform (scan frame -> scene frame)
//!     f64[16]    inverse transform
//!
//! Matrices are stored column-major: element (row, col) sits at
//! `col * 4 + row`, so the translation occupies indices 12..=14.

use crate::error::{PtsError, Result};
use crate::wire::{le_f64, le_f64x16, le_i32};
use glam::{DMat3, DMat4, DVec3};
use serde::Serialize;
use std::path::Path;

pub const IDENTITY: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Forward and inverse transform of one scan; always carried together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPose {
    pub forward: [f64; 16],
    pub inverse: [f64; 16],
}

impl Default for ScanPose {
    fn default() -> Self {
        Self {
            forward: IDENTITY,
            inverse: IDENTITY,
        }
    }
}

impl ScanPose {
    /// Pure translation by `t`.
    pub fn translation(t: [f64; 3]) -> Self {
        let t = DVec3::from(t);
        Self {
            forward: DMat4::from_translation(t).to_cols_array(),
            inverse: DMat4::from_translation(-t).to_cols_array(),
        }
    }

    #[inline]
    pub fn forward_matrix(&self) -> DMat4 {
        DMat4::from_cols_array(&self.forward)
    }

    #[inline]
    pub fn inverse_matrix(&self) -> DMat4 {
        DMat4::from_cols_array(&self.inverse)
    }

    /// Translation column of the forward transform: the capture viewpoint.
    #[inline]
    pub fn camera_center(&self) -> DVec3 {
        DVec3::new(self.forward[12], self.forward[13], self.forward[14])
    }

    /// Upper-left 3x3 block of the forward transform.
    #[inline]
    pub fn rotation(&self) -> DMat3 {
        DMat3::from_mat4(self.forward_matrix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconstructionHeader {
    pub declared_count: i32,
    /// Carried for diagnostics only.
    pub score1: f64,
    pub score2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRecord {
    pub mode: i32,
    pub pose: ScanPose,
}

impl PoseRecord {
    #[inline]
    pub fn enabled(&self) -> bool {
        self.mode != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub header: ReconstructionHeader,
    pub records: Vec<PoseRecord>,
}

impl Reconstruction {
    /// Lowest record index with `mode == 1`.
    pub fn active_index(&self) -> Option<usize> {
        self.records.iter().position(|r| r.mode == 1)
    }
}

/// `i32` mode plus two `f64[16]` matrices.
pub const RECORD_BYTES: usize = 4 + 2 * 16 * 8;

#[cold]
fn truncated(what: String) -> PtsError {
    PtsError::Truncated(what)
}

/// Parse a reconstruction archive that must describe exactly `expected_scans` scans.
pub fn parse_reconstruction_bytes(mut p: &[u8], expected_scans: usize) -> Result<Reconstruction> {
    let declared_count =
        le_i32(&mut p).ok_or_else(|| truncated("missing declared scan count".into()))?;
    if usize::try_from(declared_count).ok() != Some(expected_scans) {
        return Err(PtsError::CountMismatch {
            declared: declared_count,
            expected: expected_scans,
        });
    }

    let score1 = le_f64(&mut p).ok_or_else(|| truncated("missing quality scores".into()))?;
    let score2 = le_f64(&mut p).ok_or_else(|| truncated("missing quality scores".into()))?;

    // Size the record block against the buffer before reserving for it.
    let need = expected_scans
        .checked_mul(RECORD_BYTES)
        .ok_or_else(|| truncated(format!("{} records overflow", expected_scans)))?;
    if p.len() < need {
        return Err(truncated(format!(
            "{} records need {} bytes, {} left",
            expected_scans,
            need,
            p.len()
        )));
    }

    let mut records = Vec::with_capacity(expected_scans);
    for i in 0..expected_scans {
        let scan = || format!("record {} of {}", i + 1, expected_scans);

        let mode = le_i32(&mut p).ok_or_else(|| truncated(format!("{}: mode", scan())))?;
        let forward =
            le_f64x16(&mut p).ok_or_else(|| truncated(format!("{}: transform", scan())))?;
        let inverse =
            le_f64x16(&mut p).ok_or_else(|| truncated(format!("{}: inverse", scan())))?;

        records.push(PoseRecord {
            mode,
            pose: ScanPose { forward, inverse },
        });
    }

    if !p.is_empty() {
        log::debug!("{} trailing bytes after reconstruction ignored", p.len());
    }

    Ok(Reconstruction {
        header: ReconstructionHeader {
            declared_count,
            score1,
            score2,
        },
        records,
    })
}

pub fn read_reconstruction_file<P: AsRef<Path>>(
    path: P,
    expected_scans: usize,
) -> Result<Reconstruction> {
    let path = path.as_ref();
    let parse = || -> Result<Reconstruction> {
        let bytes = crate::read_bytes(path)?;
        parse_reconstruction_bytes(&bytes, expected_scans)
    };

    let recon = parse().map_err(|e| e.in_file(path))?;
    log::info!(
        "Loaded {} poses from {} (scores {:.8} {:.8})",
        recon.records.len(),
        path.display(),
        recon.header.score1,
        recon.header.score2
    );
    Ok(recon)
}

/// Serialize in archive layout; `declared_count` is taken from the record count.
pub fn encode_reconstruction(score1: f64, score2: f64, records: &[PoseRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(20 + records.len() * RECORD_BYTES);

    out.extend_from_slice(&(records.len() as i32).to_le_bytes());
    out.extend_from_slice(&score1.to_le_bytes());
    out.extend_from_slice(&score2.to_le_bytes());

    for r in records {
        out.extend_from_slice(&r.mode.to_le_bytes());
        for v in r.pose.forward.iter().chain(r.pose.inverse.iter()) {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    out
}
