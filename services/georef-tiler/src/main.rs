//! Georeference a IIIF canvas into an XYZ tile pyramid.
//!
//! Steps:
//! - Fetch the IIIF Canvas and save it as `source.json`
//! - Download the image scaled by `--scale` through the IIIF Image API
//! - Fit the declared polynomial transform to the control points
//! - Resample the image into a north-up geographic grid
//! - Write `{z}/{x}/{y}.png` tiles, `tilemapresource.xml` and a MapLibre viewer

use anyhow::Result;
use clap::Parser;
use georef_common::GeorefError;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use georef_tiler::{pipeline, Args};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!(url = %args.url, "Starting georef-tiler");

    let job = args.job()?;
    match pipeline::run(job).await {
        Ok(summary) => {
            info!(
                label = %summary.label,
                tiles = summary.tiles,
                control_points = summary.control_points,
                rms_residual_deg = summary.rms_residual_deg,
                min_lon = summary.bbox.min_lon,
                min_lat = summary.bbox.min_lat,
                max_lon = summary.bbox.max_lon,
                max_lat = summary.bbox.max_lat,
                tiles_dir = %summary.tiles_dir.display(),
                viewer = %summary.html_path.display(),
                "Done"
            );
            Ok(())
        }
        Err(e) => {
            if let Some(georef) = e.downcast_ref::<GeorefError>() {
                if georef.is_input_error() {
                    error!(
                        code = georef.code(),
                        "Check the IIIF description and the command line options"
                    );
                }
            }
            Err(e)
        }
    }
}
