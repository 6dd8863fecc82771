//! Pipeline orchestration: description → control points → fitted transform →
//! resampled raster → tiles → viewer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use georef_common::{BoundingBox, ControlPoint, GeorefError, GeorefResult, PipelineConfig, TransformModel};
use iiif_parser::{extract_control_points, transform_model, validate_pixel_bounds, CanvasDescription};
use projection::fit_transform;
use renderer::{decode_image, warp, RasterBuffer, WarpedRaster};
use tracing::{info, instrument, warn};

use crate::config::Job;
use crate::fetch::{Fetcher, Source};
use crate::output;
use crate::workdir::WorkDir;

/// Result of georeferencing a source image.
#[derive(Debug)]
pub struct Georeferenced {
    pub warped: WarpedRaster,
    pub model: TransformModel,
    pub control_points: usize,
    /// Root mean square forward residual over the control points, in degrees
    pub rms_residual_deg: f64,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub label: String,
    pub bbox: BoundingBox,
    pub tiles: usize,
    pub control_points: usize,
    pub rms_residual_deg: f64,
    pub tiles_dir: PathBuf,
    pub html_path: PathBuf,
}

/// Fit the description's transform to `image` and resample it into a
/// north-up geographic grid.
///
/// `image` is expected at the description's size scaled by `config.scale`.
/// If the image service returned a different size the control points are
/// rescaled to match.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn georeference(
    desc: &CanvasDescription,
    image: &RasterBuffer,
    config: &PipelineConfig,
) -> GeorefResult<Georeferenced> {
    let mut points = extract_control_points(desc, config.scale)?;

    let (expected_w, expected_h) = desc.scaled_size(config.scale);
    if (image.width(), image.height()) != (expected_w, expected_h) {
        warn!(
            expected_width = expected_w,
            expected_height = expected_h,
            "Image size differs from the requested size, rescaling control points"
        );
        rescale_points(
            &mut points,
            image.width() as f64 / expected_w as f64,
            image.height() as f64 / expected_h as f64,
        );
    }

    let outside = validate_pixel_bounds(&points, image.width(), image.height());
    if !outside.is_empty() {
        warn!(
            count = outside.len(),
            indices = ?outside,
            "Control points fall outside the image"
        );
    }

    let model = transform_model(desc).with_order_override(config.polynomial_order_override);
    let fitted = fit_transform(&model, &points)?;
    info!(
        order = model.order,
        control_points = points.len(),
        rms_residual_deg = fitted.rms_residual(),
        rms_residual_px = fitted.rms_pixel_residual(),
        "Fitted transform"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("warp-worker-{}", i))
        .build()
        .map_err(|e| GeorefError::invalid_config("workers", e.to_string()))?;
    let warped = pool.install(|| warp(image, &fitted))?;

    Ok(Georeferenced {
        warped,
        model,
        control_points: points.len(),
        rms_residual_deg: fitted.rms_residual(),
    })
}

fn rescale_points(points: &mut [ControlPoint], sx: f64, sy: f64) {
    for point in points {
        point.pixel = (point.pixel.0 * sx, point.pixel.1 * sy);
    }
}

/// Run a whole job: fetch, georeference, tile and write the viewer.
#[instrument(skip_all, fields(source = %job.source))]
pub async fn run(job: Job) -> Result<RunSummary> {
    let Job {
        source,
        image,
        config,
        output: output_config,
        http_timeout,
    } = job;
    config.validate()?;

    let fetcher = Fetcher::new(http_timeout)?;

    // Step 1: description
    let bytes = fetcher
        .fetch(&source)
        .await
        .context("Failed to fetch the IIIF description")?;
    let desc = CanvasDescription::from_json(&bytes)?;
    let label = desc.label();
    info!(
        label = %label,
        width = desc.width(),
        height = desc.height(),
        "Loaded description"
    );

    tokio::fs::create_dir_all(&output_config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_config.output_dir.display()))?;
    output::write_source_json(&output_config.output_dir, &desc)?;

    // Step 2: image
    let work = WorkDir::create(&output_config.work_dir, output_config.keep_work)
        .with_context(|| format!("Failed to create {}", output_config.work_dir.display()))?;
    let image_source = match image {
        Some(path) => Source::Path(path),
        None => {
            let (w, h) = desc.scaled_size(config.scale);
            Source::Url(desc.image_url(w, h)?)
        }
    };
    let image_bytes = fetcher
        .fetch(&image_source)
        .await
        .context("Failed to fetch the source image")?;
    let image_path = work.file("source.jpg");
    tokio::fs::write(&image_path, &image_bytes)
        .await
        .context("Failed to save the source image")?;
    drop(image_bytes);

    // Steps 3-4: georeference and tile off the async runtime
    let tiles_dir = output_config.tiles_dir();
    let (bbox, tiles, georef_stats) = {
        let config = config.clone();
        let tiles_dir = tiles_dir.clone();
        let label = label.clone();
        tokio::task::spawn_blocking(move || -> GeorefResult<_> {
            let image = decode_image(&std::fs::read(&image_path)?)?;
            let georef = georeference(&desc, &image, &config)?;
            let tiles = output::write_tiles(&georef.warped, &config, &tiles_dir)?;
            output::write_tilemap(&tiles_dir, &georef.warped.bbox, &config, &label)?;
            Ok((
                georef.warped.bbox,
                tiles,
                (georef.control_points, georef.rms_residual_deg),
            ))
        })
        .await
        .context("Pipeline task failed")??
    };

    // Step 5: viewer
    let html_path = output::write_viewer(&output_config, &config, &label)?;
    drop(work);

    Ok(RunSummary {
        label,
        bbox,
        tiles,
        control_points: georef_stats.0,
        rms_residual_deg: georef_stats.1,
        tiles_dir,
        html_path,
    })
}
