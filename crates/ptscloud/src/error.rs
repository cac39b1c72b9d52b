//! Error types for ptscloud

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can go wrong while loading archives or writing PLY output.
#[derive(Error, Debug)]
pub enum PtsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The point archive ended before a required field was complete.
    #[error("malformed point archive: {0}")]
    Format(String),

    #[error("invalid point count {0} (must be > 0)")]
    InvalidCount(i32),

    #[error("no scan ids to index")]
    EmptyInput,

    /// Scan ids are 1-based; zero and negative ids cannot be indexed.
    #[error("scan id {id} at point {index} is not positive")]
    InvalidScanId { index: usize, id: i32 },

    /// A scan's points resume after another scan's run started.
    #[error("scan {id} is not contiguous: point {index} reopens a run that already ended")]
    NonContiguous { id: i32, index: usize },

    #[error("reconstruction declares {declared} scans but the point archive has {expected}")]
    CountMismatch { declared: i32, expected: usize },

    /// The reconstruction archive ended in the middle of a record.
    #[error("reconstruction truncated: {0}")]
    Truncated(String),

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<PtsError>,
    },
}

impl PtsError {
    /// Attach the path of the file being read or written.
    pub fn in_file(self, path: &Path) -> Self {
        PtsError::InFile {
            path: path.to_path_buf(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any file context peeled off.
    pub fn root(&self) -> &PtsError {
        match self {
            PtsError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PtsError>;
