//! The scan table: raw points grouped by scan, with poses attached.

use crate::archive::{read_points_file, RawPointSet};
use crate::error::{PtsError, Result};
use crate::index::{build_index, max_scan_id, validate_contiguous, ScanRange};
use crate::reconstruction::{read_reconstruction_file, Reconstruction, ReconstructionHeader, ScanPose};
use glam::DMat4;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// 1-based scan id.
    pub id: u32,
    pub name: String,
    pub range: ScanRange,
    pub pose: Option<ScanPose>,
    pub enabled: bool,
    pub selected: bool,
}

impl Scan {
    fn new(id: u32, range: ScanRange) -> Self {
        Self {
            id,
            name: format!("{:05}", id),
            range,
            pose: None,
            enabled: true,
            selected: false,
        }
    }

    /// Forward transform, or identity for a scan without a pose.
    #[inline]
    pub fn forward_matrix(&self) -> DMat4 {
        self.pose.map_or(DMat4::IDENTITY, |p| p.forward_matrix())
    }

    #[inline]
    pub fn pose_or_identity(&self) -> ScanPose {
        self.pose.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Reject archives whose scans are split into several runs.
    pub require_contiguous: bool,
}

/// Loaded point archive plus per-scan views and poses.
#[derive(Debug, Clone)]
pub struct ScanCloud {
    points: RawPointSet,
    scans: Vec<Scan>,
    header: Option<ReconstructionHeader>,
    active_index: Option<usize>,
}

impl ScanCloud {
    /// Index a point set. Every scan starts enabled and without a pose.
    pub fn from_points(points: RawPointSet, opts: LoadOptions) -> Result<Self> {
        if opts.require_contiguous {
            validate_contiguous(&points.scan_ids)?;
        }

        let ranges = build_index(&points.scan_ids)?;
        log::info!("Maxid is {}", ranges.len());

        let scans: Vec<Scan> = ranges
            .into_iter()
            .enumerate()
            .map(|(slot, range)| Scan::new(slot as u32 + 1, range))
            .collect();

        let absent: Vec<u32> = scans.iter().filter(|s| s.range.is_empty()).map(|s| s.id).collect();
        if !absent.is_empty() {
            log::warn!("{} scan ids have no points: {:?}", absent.len(), absent);
        }

        Ok(Self {
            points,
            scans,
            header: None,
            active_index: None,
        })
    }

    /// Attach poses and enabled flags. Nothing is modified on error.
    pub fn apply_reconstruction(&mut self, recon: &Reconstruction) -> Result<()> {
        if recon.records.len() != self.scans.len() {
            return Err(PtsError::CountMismatch {
                declared: recon.header.declared_count,
                expected: self.scans.len(),
            });
        }

        for (scan, record) in self.scans.iter_mut().zip(&recon.records) {
            scan.pose = Some(record.pose);
            scan.enabled = record.enabled();
            log::debug!("scan {} mode {} ({} pts)", scan.name, record.mode, scan.range.count);
        }

        self.header = Some(recon.header);
        self.active_index = recon.active_index();

        match self.active_index {
            Some(i) => log::info!("Active scan is {}", self.scans[i].name),
            None => log::info!("No scan has mode 1"),
        }

        Ok(())
    }

    /// Read both archives and build the scan table.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        points_path: P,
        reconstruction_path: Q,
        opts: LoadOptions,
    ) -> Result<Self> {
        let points_path = points_path.as_ref();
        let points = read_points_file(points_path)?;
        let max_id = max_scan_id(&points.scan_ids).map_err(|e| e.in_file(points_path))?;

        // The reconstruction holds one record per id, so its size bounds
        // `max_id` before the index is allocated from it.
        let reconstruction_path = reconstruction_path.as_ref();
        let recon = read_reconstruction_file(reconstruction_path, max_id)?;

        let mut cloud = Self::from_points(points, opts).map_err(|e| e.in_file(points_path))?;
        cloud
            .apply_reconstruction(&recon)
            .map_err(|e| e.in_file(reconstruction_path))?;

        Ok(cloud)
    }

    #[inline]
    pub fn points(&self) -> &RawPointSet {
        &self.points
    }

    #[inline]
    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    #[inline]
    pub fn header(&self) -> Option<&ReconstructionHeader> {
        self.header.as_ref()
    }

    /// Index of the first scan whose reconstruction mode was 1.
    #[inline]
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn scan(&self, id: u32) -> Option<&Scan> {
        let slot = (id as usize).checked_sub(1)?;
        self.scans.get(slot)
    }

    fn scan_mut(&mut self, id: u32) -> Option<&mut Scan> {
        let slot = (id as usize).checked_sub(1)?;
        self.scans.get_mut(slot)
    }

    pub fn points_of(&self, scan: &Scan) -> &[[f32; 3]] {
        &self.points.positions[scan.range.as_range()]
    }

    pub fn colors_of(&self, scan: &Scan) -> &[[u8; 3]] {
        &self.points.colors[scan.range.as_range()]
    }

    /// Enabled scans in id order.
    pub fn enabled_scans(&self) -> impl Iterator<Item = &Scan> + '_ {
        self.scans.iter().filter(|s| s.enabled)
    }

    /// Returns the previous value, or `None` for an unknown id.
    pub fn set_enabled(&mut self, id: u32, enabled: bool) -> Option<bool> {
        let scan = self.scan_mut(id)?;
        Some(std::mem::replace(&mut scan.enabled, enabled))
    }

    /// Returns the previous value, or `None` for an unknown id.
    pub fn set_selected(&mut self, id: u32, selected: bool) -> Option<bool> {
        let scan = self.scan_mut(id)?;
        Some(std::mem::replace(&mut scan.selected, selected))
    }

    /// Next enabled scan index after `current`, wrapping to the first enabled one.
    pub fn next_enabled_after(&self, current: Option<usize>) -> Option<usize> {
        let first = self.scans.iter().position(|s| s.enabled)?;
        let Some(current) = current else {
            return Some(first);
        };

        self.scans
            .iter()
            .enumerate()
            .skip(current.saturating_add(1))
            .find(|(_, s)| s.enabled)
            .map(|(i, _)| i)
            .or(Some(first))
    }

    pub fn summary(&self, points_file: &Path, reconstruction_file: &Path) -> ScanSummary {
        ScanSummary {
            points_file: points_file.to_path_buf(),
            reconstruction_file: reconstruction_file.to_path_buf(),
            point_count: self.points.len(),
            scan_count: self.scans.len(),
            header: self.header,
            active_index: self.active_index,
            scans: self
                .scans
                .iter()
                .map(|s| ScanEntry {
                    id: s.id,
                    name: s.name.clone(),
                    start: s.range.start,
                    count: s.range.count,
                    enabled: s.enabled,
                    camera_center: s.pose.map(|p| p.camera_center().to_array()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub points_file: PathBuf,
    pub reconstruction_file: PathBuf,
    pub point_count: usize,
    pub scan_count: usize,
    pub header: Option<ReconstructionHeader>,
    pub active_index: Option<usize>,
    pub scans: Vec<ScanEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    pub id: u32,
    pub name: String,
    pub start: usize,
    pub count: usize,
    pub enabled: bool,
    pub camera_center: Option<[f64; 3]>,
}
