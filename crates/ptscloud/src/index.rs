//! Grouping of the flat point arrays into per-scan ranges.
//!
//! Scans are located by first occurrence and size, so the result is only
//! meaningful when every scan's points form one contiguous run. Archives from
//! the capture pipeline are written that way but the format does not enforce
//! it; use [`validate_contiguous`] when the source is untrusted.

use crate::error::{PtsError, Result};
use std::ops::Range;

/// `(start, count)` view into the shared point arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanRange {
    pub start: usize,
    pub count: usize,
}

impl ScanRange {
    #[inline]
    pub fn as_range(self) -> Range<usize> {
        self.start..self.start + self.count
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.count == 0
    }
}

/// Build one range per scan id in `1..=max_id`; entry `i` describes id `i + 1`.
///
/// Ids that never occur get an empty range at offset 0.
pub fn build_index(scan_ids: &[i32]) -> Result<Vec<ScanRange>> {
    let max_id = max_scan_id(scan_ids)?;

    let mut ranges = vec![ScanRange::default(); max_id];
    let mut seen = vec![false; max_id];

    for (index, &id) in scan_ids.iter().enumerate() {
        let slot = id as usize - 1;
        let range = &mut ranges[slot];
        if !seen[slot] {
            seen[slot] = true;
            range.start = index;
        }
        range.count += 1;
    }

    Ok(ranges)
}

/// Largest scan id, after checking that every id is positive.
pub fn max_scan_id(scan_ids: &[i32]) -> Result<usize> {
    if scan_ids.is_empty() {
        return Err(PtsError::EmptyInput);
    }

    let mut max_id = 0i32;
    for (index, &id) in scan_ids.iter().enumerate() {
        if id <= 0 {
            return Err(PtsError::InvalidScanId { index, id });
        }
        max_id = max_id.max(id);
    }

    Ok(max_id as usize)
}

/// Reject archives where some scan's points are split into several runs.
pub fn validate_contiguous(scan_ids: &[i32]) -> Result<()> {
    let max_id = max_scan_id(scan_ids)?;
    let mut closed = vec![false; max_id];
    let mut current: Option<i32> = None;

    for (index, &id) in scan_ids.iter().enumerate() {
        if current == Some(id) {
            continue;
        }
        if closed[id as usize - 1] {
            return Err(PtsError::NonContiguous { id, index });
        }
        if let Some(prev) = current {
            closed[prev as usize - 1] = true;
        }
        current = Some(id);
    }

    Ok(())
}
