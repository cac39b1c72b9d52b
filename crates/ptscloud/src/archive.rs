//! Point archive: every captured point, tagged with the scan it came from.
//!
//! Layout (little-endian):
//!   i32          point count N (> 0)
//!   f32[3N]      positions, interleaved x, y, z
//!   u8[3N]       colors, interleaved r, g, b
//!   i32[N]       scan ids, 1-based

use crate::error::{PtsError, Result};
use crate::wire::{f32x3_block, i32_block, le_i32, take, u8x3_block};
use std::path::Path;

/// Flat, index-aligned point data shared by every scan view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPointSet {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[u8; 3]>,
    pub scan_ids: Vec<i32>,
}

impl RawPointSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cold]
fn short(field: &str, need: usize, have: usize) -> PtsError {
    PtsError::Format(format!(
        "stream ended in {field}: need {need} bytes, {have} left"
    ))
}

fn block<'a>(p: &mut &'a [u8], field: &str, count: usize, width: usize) -> Result<&'a [u8]> {
    let need = count
        .checked_mul(width)
        .ok_or_else(|| PtsError::Format(format!("{field} size overflows")))?;
    let have = p.len();
    take(p, need).ok_or_else(|| short(field, need, have))
}

/// Parse a point archive from a contiguous byte slice.
pub fn parse_points_bytes(mut p: &[u8]) -> Result<RawPointSet> {
    let have = p.len();
    let n = le_i32(&mut p).ok_or_else(|| short("point count", 4, have))?;
    if n <= 0 {
        return Err(PtsError::InvalidCount(n));
    }
    let n = n as usize;

    let positions = f32x3_block(block(&mut p, "positions", n, 12)?);
    let colors = u8x3_block(block(&mut p, "colors", n, 3)?);
    let scan_ids = i32_block(block(&mut p, "scan ids", n, 4)?);

    if !p.is_empty() {
        log::debug!("{} trailing bytes after point archive ignored", p.len());
    }

    Ok(RawPointSet {
        positions,
        colors,
        scan_ids,
    })
}

/// Read and parse a point archive from disk.
pub fn read_points_file<P: AsRef<Path>>(path: P) -> Result<RawPointSet> {
    let path = path.as_ref();
    let parse = || -> Result<RawPointSet> {
        let bytes = crate::read_bytes(path)?;
        parse_points_bytes(&bytes)
    };

    let points = parse().map_err(|e| e.in_file(path))?;
    log::info!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Serialize a point set in archive layout. Used to produce fixtures and
/// to re-emit filtered archives.
pub fn encode_points(points: &RawPointSet) -> Vec<u8> {
    let n = points.len();
    let mut out = Vec::with_capacity(4 + n * 19);

    out.extend_from_slice(&(n as i32).to_le_bytes());
    for p in &points.positions {
        for v in p {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    for c in &points.colors {
        out.extend_from_slice(c);
    }
    for id in &points.scan_ids {
        out.extend_from_slice(&id.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawPointSet {
        RawPointSet {
            positions: vec![[1.0, 2.0, 3.0], [-4.0, 5.5, 6.25], [7.0, 8.0, 9.0]],
            colors: vec![[10, 20, 30], [40, 50, 60], [70, 80, 90]],
            scan_ids: vec![1, 1, 2],
        }
    }

    #[test]
    fn parses_encoded_archive() {
        let bytes = encode_points(&sample());
        assert_eq!(bytes.len(), 4 + 3 * 12 + 3 * 3 + 3 * 4);
        assert_eq!(parse_points_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn rejects_non_positive_count() {
        for n in [0i32, -5] {
            let err = parse_points_bytes(&n.to_le_bytes()).unwrap_err();
            assert!(matches!(err, PtsError::InvalidCount(c) if c == n));
        }
    }

    #[test]
    fn every_truncation_point_is_a_format_error() {
        let bytes = encode_points(&sample());
        for cut in 0..bytes.len() {
            let err = parse_points_bytes(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, PtsError::Format(_)), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn huge_count_fails_without_allocating() {
        let err = parse_points_bytes(&i32::MAX.to_le_bytes()).unwrap_err();
        assert!(matches!(err, PtsError::Format(_)));
    }
}
