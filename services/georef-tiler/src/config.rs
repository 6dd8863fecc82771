//! Command line arguments and the configuration derived from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use georef_common::{parse_lon_lat, GeorefResult, PipelineConfig, ZoomRange, TILE_SIZE};

use crate::fetch::Source;

#[derive(Parser, Debug, Clone)]
#[command(name = "georef-tiler")]
#[command(about = "Georeference a IIIF canvas into XYZ map tiles with a MapLibre viewer")]
pub struct Args {
    /// IIIF Canvas with a georeference annotation (http(s) URL or local file)
    pub url: String,

    /// Downsample factor applied to the image before georeferencing
    #[arg(long, env = "GEOREF_SCALE", default_value = "0.25")]
    pub scale: f64,

    /// Zoom levels to generate ("14-18" or "16")
    #[arg(long, env = "GEOREF_ZOOM", default_value = "14-18")]
    pub zoom: String,

    /// Polynomial order overriding the one declared in the description (1-3)
    #[arg(long, env = "GEOREF_ORDER")]
    pub order: Option<u32>,

    /// Use a local image instead of downloading it from the image service
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Directory receiving source.json, the tiles folder and the viewer
    #[arg(long, default_value = "docs")]
    pub output_dir: PathBuf,

    /// Name of the tiles folder inside the output directory
    #[arg(long, default_value = "tiles")]
    pub name: String,

    /// Directory for intermediate files
    #[arg(long, default_value = "work")]
    pub work_dir: PathBuf,

    /// Keep the work directory after the run
    #[arg(long)]
    pub keep_work: bool,

    /// Worker threads for resampling and tiling (0 = one per core)
    #[arg(long, env = "GEOREF_WORKERS", default_value = "0")]
    pub workers: usize,

    /// Viewer centre used when the tile extent is unknown ("lon,lat")
    #[arg(long, default_value = "139.762,35.713", allow_hyphen_values = true)]
    pub default_center: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "GEOREF_HTTP_TIMEOUT", default_value = "120")]
    pub http_timeout: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// Where the run writes its results.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub name: String,
    pub work_dir: PathBuf,
    pub keep_work: bool,
}

impl OutputConfig {
    pub fn tiles_dir(&self) -> PathBuf {
        self.output_dir.join(&self.name)
    }
}

/// Everything one run needs, validated.
#[derive(Debug, Clone)]
pub struct Job {
    pub source: Source,
    pub image: Option<PathBuf>,
    pub config: PipelineConfig,
    pub output: OutputConfig,
    pub http_timeout: Duration,
}

impl Args {
    pub fn pipeline_config(&self) -> GeorefResult<PipelineConfig> {
        let config = PipelineConfig {
            scale: self.scale,
            zoom_range: self.zoom.parse::<ZoomRange>()?,
            polynomial_order_override: self.order,
            tile_size: TILE_SIZE,
            workers: self.workers,
            default_center: parse_lon_lat(&self.default_center)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            output_dir: self.output_dir.clone(),
            name: self.name.clone(),
            work_dir: self.work_dir.clone(),
            keep_work: self.keep_work,
        }
    }

    pub fn job(&self) -> GeorefResult<Job> {
        Ok(Job {
            source: Source::parse(&self.url),
            image: self.image.clone(),
            config: self.pipeline_config()?,
            output: self.output_config(),
            http_timeout: Duration::from_secs(self.http_timeout),
        })
    }
}
