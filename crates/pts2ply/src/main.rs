mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::Config;
use log::info;
use ptscloud::{LoadOptions, Provenance, ScanCloud};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

fn check_writable(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} exists; pass --overwrite to replace it", path.display());
    }
    Ok(())
}

fn write_summary(cloud: &ScanCloud, config: &Config, path: &Path) -> Result<()> {
    let summary = cloud.summary(&config.points_file, &config.reconstruction_file);
    let file = File::create(path)
        .with_context(|| format!("creating summary {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &summary)
        .with_context(|| format!("writing summary {}", path.display()))?;
    out.flush()
        .with_context(|| format!("flushing summary {}", path.display()))?;
    info!("Wrote scan summary to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let camera_path = config.camera_path();

    // Refuse to clobber anything before doing the expensive load.
    check_writable(&config.output, config.overwrite)?;
    if let Some(path) = &camera_path {
        check_writable(path, config.overwrite)?;
    }

    let opts = LoadOptions {
        require_contiguous: config.require_contiguous,
    };
    let cloud = ScanCloud::load(&config.points_file, &config.reconstruction_file, opts)
        .context("loading scan archives")?;

    info!(
        "{} points in {} scans, {} enabled",
        cloud.points().len(),
        cloud.scans().len(),
        cloud.enabled_scans().count()
    );

    let provenance = Provenance {
        points_file: &config.points_file,
        reconstruction_file: &config.reconstruction_file,
    };

    ptscloud::write_point_cloud_file(&cloud, provenance, &config.output)
        .context("exporting point cloud")?;

    if let Some(path) = &camera_path {
        ptscloud::write_camera_trajectory_file(&cloud, provenance, path)
            .context("exporting camera trajectory")?;
    }

    if let Some(path) = &config.summary {
        write_summary(&cloud, &config, path)?;
    }

    Ok(())
}
