use clap::Parser;
use std::path::PathBuf;

/// `pts2ply` - Export a scan-tagged point archive and its reconstruction as PLY.
///
/// Writes the registered point cloud to OUTPUT, colored by scan, and the
/// camera trajectory (centers, connecting path, orientation ticks) next to it.
#[derive(Parser, Debug, Clone)]
#[command(name = "pts2ply", version, about, long_about = None)]
pub struct Config {
    /// Point archive (`allpoints.bin`).
    #[arg(env = "PTS2PLY_POINTS")]
    pub points_file: PathBuf,

    /// Reconstruction archive with one pose per scan.
    #[arg(env = "PTS2PLY_RECONSTRUCTION")]
    pub reconstruction_file: PathBuf,

    /// Destination of the merged point cloud.
    #[arg(env = "PTS2PLY_OUTPUT")]
    pub output: PathBuf,

    /// Destination of the camera trajectory. Defaults to `<OUTPUT>.camera.ply`.
    #[arg(long, env = "PTS2PLY_CAMERA_OUTPUT")]
    pub camera_output: Option<PathBuf>,

    /// Skip the camera trajectory export.
    #[arg(long, default_value_t = false)]
    pub no_camera: bool,

    /// Fail if any scan's points are not stored as one contiguous run.
    #[arg(long, env = "PTS2PLY_REQUIRE_CONTIGUOUS", default_value_t = false)]
    pub require_contiguous: bool,

    /// Also write a JSON summary of the scan table to this path.
    #[arg(long, env = "PTS2PLY_SUMMARY")]
    pub summary: Option<PathBuf>,

    /// Replace output files that already exist.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

impl Config {
    pub fn camera_path(&self) -> Option<PathBuf> {
        if self.no_camera {
            return None;
        }

        Some(self.camera_output.clone().unwrap_or_else(|| {
            let mut name = self.output.clone().into_os_string();
            name.push(".camera.ply");
            PathBuf::from(name)
        }))
    }
}
