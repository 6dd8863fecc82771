//! XYZ tile pyramid generation from a warped raster.
//!
//! Tiles are addressed in Web Mercator with a top-left origin. Every tile
//! whose footprint overlaps the raster extent is rendered; pixels outside the
//! raster are transparent.

use georef_common::{
    latlon_to_tile, BoundingBox, GeorefError, GeorefResult, TileCoord, ZoomRange, TILE_SIZE,
    WEB_MERCATOR_MAX_LAT,
};
use projection::mercator;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::raster::{accumulate, bilinear_rgba, resolve, RasterBuffer, RasterFrame};

/// Upper bound on box-filter sub-samples per axis when a tile downscales the raster.
pub const MAX_SUPERSAMPLE: usize = 8;

/// A rendered tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub coord: TileCoord,
    pub pixels: RasterBuffer,
}

/// Tiles at `zoom` whose footprint overlaps `bbox`, in row-major order.
///
/// Tiles that only touch the bbox along an edge are excluded. Latitudes are
/// clamped to the Web Mercator limits first.
pub fn tiles_for_bbox(bbox: &BoundingBox, zoom: u32) -> Vec<TileCoord> {
    let clamped = bbox.clamp_lat(WEB_MERCATOR_MAX_LAT);
    if !clamped.has_area() {
        return Vec::new();
    }

    let north_west = latlon_to_tile(clamped.max_lat, clamped.min_lon, zoom);
    let south_east = latlon_to_tile(clamped.min_lat, clamped.max_lon, zoom);

    let mut tiles = Vec::new();
    for y in north_west.y..=south_east.y {
        for x in north_west.x..=south_east.x {
            let coord = TileCoord::new(zoom, x, y);
            if coord.bounds().intersects(&clamped) {
                tiles.push(coord);
            }
        }
    }
    tiles
}

/// All tiles for every zoom in `zoom_range`, ordered by zoom, row, column.
pub fn plan(bbox: &BoundingBox, zoom_range: &ZoomRange) -> Vec<TileCoord> {
    zoom_range
        .levels()
        .flat_map(|z| tiles_for_bbox(bbox, z))
        .collect()
}

/// Render one tile from a raster covering `bbox`.
///
/// When a tile pixel spans more than one raster pixel the result is an
/// alpha-weighted box average of up to 8×8 point samples; otherwise it is an
/// alpha-weighted bilinear sample at the pixel centre.
///
/// # Errors
/// `InvalidConfig` if `tile_size` is zero.
pub fn render_tile(
    raster: &RasterBuffer,
    bbox: &BoundingBox,
    coord: TileCoord,
    tile_size: u32,
) -> GeorefResult<Tile> {
    if tile_size == 0 {
        return Err(GeorefError::invalid_config("tile_size", "must be positive"));
    }
    let size = tile_size as usize;
    let frame = RasterFrame::Geographic {
        bbox: coord.bounds(),
    };
    if raster.width() == 0 || raster.height() == 0 || !bbox.has_area() {
        return Ok(Tile {
            coord,
            pixels: RasterBuffer::transparent(tile_size, tile_size, frame),
        });
    }

    let lon_res = bbox.width() / raster.width() as f64;
    let lat_res = bbox.height() / raster.height() as f64;
    let (raster_w, raster_h) = (raster.width() as f64, raster.height() as f64);

    let samples = supersample_factor(&coord, tile_size, lon_res, lat_res);

    // Lon depends only on the column and lat only on the row, so both are
    // tabulated once per sub-sample position.
    let sub_offsets: Vec<f64> = (0..samples)
        .map(|s| (s as f64 + 0.5) / samples as f64)
        .collect();
    let raster_x: Vec<f64> = (0..size)
        .flat_map(|i| sub_offsets.iter().map(move |o| i as f64 + o))
        .map(|col| {
            let (lon, _) = mercator::tile_pixel_to_lonlat(&coord, tile_size, col, 0.0);
            (lon - bbox.min_lon) / lon_res
        })
        .collect();
    let raster_y: Vec<f64> = (0..size)
        .flat_map(|j| sub_offsets.iter().map(move |o| j as f64 + o))
        .map(|row| {
            let (_, lat) = mercator::tile_pixel_to_lonlat(&coord, tile_size, 0.0, row);
            (bbox.max_lat - lat) / lat_res
        })
        .collect();

    let inside = |x: f64, y: f64| x >= 0.0 && x <= raster_w && y >= 0.0 && y <= raster_h;

    let mut pixels = vec![0u8; size * size * 4];
    for (j, out_row) in pixels.chunks_exact_mut(size * 4).enumerate() {
        for i in 0..size {
            let px = if samples == 1 {
                let (x, y) = (raster_x[i], raster_y[j]);
                if !inside(x, y) {
                    continue;
                }
                bilinear_rgba(raster, x - 0.5, y - 0.5)
            } else {
                let mut acc = [0.0f64; 4];
                for sy in &raster_y[j * samples..(j + 1) * samples] {
                    for sx in &raster_x[i * samples..(i + 1) * samples] {
                        if !inside(*sx, *sy) {
                            continue;
                        }
                        let nx = (sx.floor() as u32).min(raster.width() - 1);
                        let ny = (sy.floor() as u32).min(raster.height() - 1);
                        accumulate(&mut acc, raster.pixel(nx, ny), 1.0);
                    }
                }
                resolve(acc, (samples * samples) as f64)
            };
            out_row[i * 4..i * 4 + 4].copy_from_slice(&px);
        }
    }

    Ok(Tile {
        coord,
        pixels: RasterBuffer::from_raw(tile_size, tile_size, pixels, frame),
    })
}

/// Sub-samples per axis: raster pixels per tile pixel, rounded up and capped.
fn supersample_factor(coord: &TileCoord, tile_size: u32, lon_res: f64, lat_res: f64) -> usize {
    let bounds = coord.bounds();
    let per_lon = bounds.width() / tile_size as f64 / lon_res;
    let per_lat = bounds.height() / tile_size as f64 / lat_res;
    let ratio = per_lon.max(per_lat);
    if ratio.is_finite() && ratio > 1.0 {
        (ratio.ceil() as usize).min(MAX_SUPERSAMPLE)
    } else {
        1
    }
}

/// Builds the tile pyramid for a warped raster on a dedicated worker pool.
///
/// ```ignore
/// let tiles = TilePyramidBuilder::new(&warped.raster, warped.bbox)
///     .zoom_range(ZoomRange::new(14, 18)?)
///     .workers(4)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct TilePyramidBuilder<'a> {
    raster: &'a RasterBuffer,
    bbox: BoundingBox,
    zoom_range: ZoomRange,
    tile_size: u32,
    workers: usize,
}

impl<'a> TilePyramidBuilder<'a> {
    pub fn new(raster: &'a RasterBuffer, bbox: BoundingBox) -> Self {
        Self {
            raster,
            bbox,
            zoom_range: ZoomRange::default(),
            tile_size: TILE_SIZE,
            workers: 0,
        }
    }

    pub fn zoom_range(mut self, zoom_range: ZoomRange) -> Self {
        self.zoom_range = zoom_range;
        self
    }

    pub fn tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Worker threads; 0 uses rayon's default (one per core).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Tiles that will be rendered, in output order.
    pub fn plan(&self) -> Vec<TileCoord> {
        plan(&self.bbox, &self.zoom_range)
    }

    /// Render every planned tile and return them in plan order.
    pub fn build(&self) -> GeorefResult<Vec<Tile>> {
        self.validate()?;
        let coords = self.plan();
        let pool = self.thread_pool()?;

        let tiles: Vec<Tile> = pool.install(|| {
            coords
                .par_iter()
                .map(|coord| render_tile(self.raster, &self.bbox, *coord, self.tile_size))
                .collect::<GeorefResult<_>>()
        })?;

        info!(tiles = tiles.len(), zoom = %self.zoom_range, "Built tile pyramid");
        Ok(tiles)
    }

    /// Render every planned tile and hand each to `sink` as soon as it is ready.
    ///
    /// Tiles arrive in no particular order. The first sink error stops the
    /// remaining work and is returned. Returns the number of tiles delivered.
    pub fn for_each_tile<F>(&self, sink: F) -> GeorefResult<usize>
    where
        F: Fn(Tile) -> GeorefResult<()> + Sync + Send,
    {
        self.validate()?;
        let coords = self.plan();
        let pool = self.thread_pool()?;

        debug!(
            tiles = coords.len(),
            workers = pool.current_num_threads(),
            "Rendering tile pyramid"
        );

        pool.install(|| {
            coords.par_iter().try_for_each(|coord| {
                let tile = render_tile(self.raster, &self.bbox, *coord, self.tile_size)?;
                sink(tile)
            })
        })?;

        info!(tiles = coords.len(), zoom = %self.zoom_range, "Wrote tile pyramid");
        Ok(coords.len())
    }

    fn validate(&self) -> GeorefResult<()> {
        if !self.bbox.has_area() {
            return Err(GeorefError::EmptyRaster(format!(
                "raster extent {:?} has no area",
                self.bbox
            )));
        }
        if self.tile_size == 0 {
            return Err(GeorefError::invalid_config("tile_size", "must be positive"));
        }
        Ok(())
    }

    fn thread_pool(&self) -> GeorefResult<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("tile-worker-{}", i))
            .build()
            .map_err(|e| GeorefError::invalid_config("workers", e.to_string()))
    }
}
