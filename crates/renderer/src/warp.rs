//! Resampling a source image into a north-up geographic grid.
//!
//! Each output pixel centre is mapped back into the source image through the
//! inverse transform and sampled bilinearly. Output pixels that land outside
//! the source image are transparent.

use georef_common::{BoundingBox, GeorefError, GeorefResult};
use projection::GeoTransform;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::raster::{bilinear_rgba, RasterBuffer, RasterFrame};

/// Samples taken along each edge of the source image when tracing its footprint.
pub const EDGE_SAMPLES: usize = 21;

/// Output grid chosen for a warp: extent, size and (square) pixel size in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoGrid {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
    pub pixel_size: f64,
}

/// A warped raster and the geographic extent of its pixel grid.
#[derive(Debug, Clone)]
pub struct WarpedRaster {
    pub raster: RasterBuffer,
    pub bbox: BoundingBox,
}

/// Pick an output grid for warping a `src_w`×`src_h` image.
///
/// The source boundary is traced through `forward`; the extreme lon/lat give
/// the extent. Pixels are square and sized so the output diagonal has as many
/// pixels as the source diagonal.
pub fn suggest_output_grid<T: GeoTransform + ?Sized>(
    transform: &T,
    src_w: u32,
    src_h: u32,
) -> GeorefResult<GeoGrid> {
    if src_w == 0 || src_h == 0 {
        return Err(GeorefError::EmptyRaster(format!(
            "source image is {}x{}",
            src_w, src_h
        )));
    }

    let (w, h) = (src_w as f64, src_h as f64);
    let steps = (EDGE_SAMPLES - 1) as f64;
    let boundary = (0..EDGE_SAMPLES).flat_map(|i| {
        let t = i as f64 / steps;
        [(t * w, 0.0), (t * w, h), (0.0, t * h), (w, t * h)]
    });

    let extent = BoundingBox::from_points(boundary.map(|(px, py)| transform.forward(px, py)))
        .filter(BoundingBox::has_area)
        .ok_or_else(|| {
            GeorefError::EmptyRaster("transformed image footprint has no area".to_string())
        })?;

    let source_diagonal = w.hypot(h);
    let pixel_size = extent.width().hypot(extent.height()) / source_diagonal;
    if !pixel_size.is_finite() || pixel_size <= 0.0 {
        return Err(GeorefError::EmptyRaster(
            "could not derive an output pixel size".to_string(),
        ));
    }

    let width = cell_count(extent.width(), pixel_size);
    let height = cell_count(extent.height(), pixel_size);

    // Grow east and south so the grid is a whole number of square pixels
    let bbox = BoundingBox::new(
        extent.min_lon,
        extent.max_lat - height as f64 * pixel_size,
        extent.min_lon + width as f64 * pixel_size,
        extent.max_lat,
    );

    debug!(
        width,
        height,
        pixel_size,
        min_lon = bbox.min_lon,
        min_lat = bbox.min_lat,
        max_lon = bbox.max_lon,
        max_lat = bbox.max_lat,
        "Suggested output grid"
    );

    Ok(GeoGrid {
        bbox,
        width,
        height,
        pixel_size,
    })
}

/// Whole pixels needed to span `extent`, ignoring floating-point overshoot.
fn cell_count(extent: f64, pixel_size: f64) -> u32 {
    ((extent / pixel_size - 1e-6).ceil() as u32).max(1)
}

/// Warp `source` into the grid picked by [`suggest_output_grid`].
///
/// # Errors
/// `EmptyRaster` if the grid has no area or no output pixel maps into the source.
pub fn warp<T: GeoTransform + ?Sized>(
    source: &RasterBuffer,
    transform: &T,
) -> GeorefResult<WarpedRaster> {
    let grid = suggest_output_grid(transform, source.width(), source.height())?;
    warp_to_grid(source, transform, &grid)
}

/// Warp `source` into an explicit output grid.
///
/// # Errors
/// `EmptyRaster` if the grid has no pixels, its pixel size is not a positive
/// number, or no output pixel maps into the source.
pub fn warp_to_grid<T: GeoTransform + ?Sized>(
    source: &RasterBuffer,
    transform: &T,
    grid: &GeoGrid,
) -> GeorefResult<WarpedRaster> {
    if grid.width == 0 || grid.height == 0 {
        return Err(GeorefError::EmptyRaster(format!(
            "output grid is {}x{}",
            grid.width, grid.height
        )));
    }
    if !grid.pixel_size.is_finite() || grid.pixel_size <= 0.0 {
        return Err(GeorefError::EmptyRaster(format!(
            "output pixel size {} is not positive",
            grid.pixel_size
        )));
    }

    let (out_w, out_h) = (grid.width as usize, grid.height as usize);
    let (src_w, src_h) = (source.width() as f64, source.height() as f64);
    let mut pixels = vec![0u8; out_w * out_h * 4];

    pixels
        .par_chunks_mut(out_w * 4)
        .enumerate()
        .for_each(|(row, out)| {
            let lat = grid.bbox.max_lat - (row as f64 + 0.5) * grid.pixel_size;
            for col in 0..out_w {
                let lon = grid.bbox.min_lon + (col as f64 + 0.5) * grid.pixel_size;
                let (sx, sy) = transform.inverse(lon, lat);

                if !(sx >= 0.0 && sx <= src_w && sy >= 0.0 && sy <= src_h) {
                    continue;
                }

                let px = bilinear_rgba(source, sx - 0.5, sy - 0.5);
                out[col * 4..col * 4 + 4].copy_from_slice(&px);
            }
        });

    let raster = RasterBuffer::new(
        grid.width,
        grid.height,
        pixels,
        RasterFrame::Geographic { bbox: grid.bbox },
    )?;

    if raster.is_fully_transparent() {
        return Err(GeorefError::EmptyRaster(
            "no output pixel maps into the source image".to_string(),
        ));
    }

    info!(
        width = grid.width,
        height = grid.height,
        coverage = raster.opaque_count() as f64 / (out_w * out_h) as f64,
        "Warped source into geographic grid"
    );

    Ok(WarpedRaster {
        raster,
        bbox: grid.bbox,
    })
}
