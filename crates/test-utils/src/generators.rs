//! Test data generators for synthetic rasters and control point sets.
//!
//! These generators create predictable, verifiable data so tests can check
//! resampled pixel values and fitted transforms against closed-form answers.

use georef_common::{BoundingBox, ControlPoint};

/// Creates an RGBA raster whose colour encodes its own pixel position.
///
/// Each pixel is `[x, y, 128, 255]` (x and y truncated to u8), so for rasters
/// up to 256×256 a bilinear sample at a fractional position returns that
/// position in the red/green channels.
///
/// # Example
///
/// ```
/// use test_utils::create_coordinate_raster;
///
/// let pixels = create_coordinate_raster(4, 3);
/// assert_eq!(pixels.len(), 4 * 3 * 4);
/// assert_eq!(&pixels[0..4], &[0, 0, 128, 255]);
/// assert_eq!(&pixels[(1 * 4 + 2) * 4..(1 * 4 + 3) * 4], &[2, 1, 128, 255]);
/// ```
pub fn create_coordinate_raster(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, 128, 255]);
        }
    }
    pixels
}

/// Creates an opaque RGBA checkerboard with `cell`-pixel squares.
pub fn create_checkerboard_raster(width: usize, height: usize, cell: usize) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            let v = if on { 230 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    pixels
}

/// Creates an RGBA raster filled with a single colour.
pub fn create_constant_raster(width: usize, height: usize, rgba: [u8; 4]) -> Vec<u8> {
    rgba.iter()
        .copied()
        .cycle()
        .take(width * height * 4)
        .collect()
}

/// Control points for a north-up image stretched linearly over `bbox`.
///
/// Pixel (0, 0) maps to the north-west corner and (width, height) to the
/// south-east corner. `per_side` points are placed along each axis.
pub fn linear_control_points(
    width: f64,
    height: f64,
    bbox: &BoundingBox,
    per_side: usize,
) -> Vec<ControlPoint> {
    let per_side = per_side.max(2);
    let mut points = Vec::with_capacity(per_side * per_side);
    for j in 0..per_side {
        for i in 0..per_side {
            let fx = i as f64 / (per_side - 1) as f64;
            let fy = j as f64 / (per_side - 1) as f64;
            points.push(ControlPoint::new(
                fx * width,
                fy * height,
                bbox.min_lon + fx * bbox.width(),
                bbox.max_lat - fy * bbox.height(),
            ));
        }
    }
    points
}

/// A smooth non-linear pixel → geo warp of the given polynomial degree.
///
/// Used to generate control points that a polynomial of `order` reproduces exactly.
pub fn polynomial_warp(order: u32, px: f64, py: f64) -> (f64, f64) {
    let (u, v) = (px / 1000.0, py / 1000.0);
    let mut lon = 139.0 + 0.1 * u + 0.01 * v;
    let mut lat = 35.1 - 0.002 * u - 0.1 * v;
    if order >= 2 {
        lon += 0.004 * u * u - 0.003 * u * v + 0.002 * v * v;
        lat += -0.001 * u * u + 0.002 * u * v + 0.005 * v * v;
    }
    if order >= 3 {
        lon += 0.0005 * u * u * u - 0.0004 * u * v * v;
        lat += 0.0003 * v * v * v + 0.0002 * u * u * v;
    }
    (lon, lat)
}

/// Control points on a `per_side`×`per_side` grid over a 1000×1000 image,
/// mapped through [`polynomial_warp`].
pub fn polynomial_control_points(order: u32, per_side: usize) -> Vec<ControlPoint> {
    let per_side = per_side.max(2);
    let mut points = Vec::with_capacity(per_side * per_side);
    for j in 0..per_side {
        for i in 0..per_side {
            let px = 1000.0 * i as f64 / (per_side - 1) as f64;
            let py = 1000.0 * j as f64 / (per_side - 1) as f64;
            let (lon, lat) = polynomial_warp(order, px, py);
            points.push(ControlPoint::new(px, py, lon, lat));
        }
    }
    points
}
