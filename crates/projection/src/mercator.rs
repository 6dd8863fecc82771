//! Spherical Web Mercator (EPSG:3857).
//!
//! XYZ tiles are square in Mercator metres. These helpers convert Mercator
//! metres and positions inside a tile back to lon/lat degrees.

use georef_common::TileCoord;
use std::f64::consts::PI;

/// WGS84 semi-major axis used by Web Mercator (metres)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the Mercator world becomes square
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the width of the Mercator world (metres)
pub const ORIGIN_SHIFT: f64 = PI * EARTH_RADIUS;

pub fn mercator_x_to_lon(x: f64) -> f64 {
    (x / EARTH_RADIUS).to_degrees()
}

pub fn mercator_y_to_lat(y: f64) -> f64 {
    (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees()
}

/// Width of one tile at zoom `z`, in Mercator metres.
pub fn tile_span(z: u32) -> f64 {
    2.0 * ORIGIN_SHIFT / TileCoord::matrix_size(z) as f64
}

/// Lon/lat of a position inside a tile.
///
/// `col` and `row` are in tile pixels from the tile's top-left corner, so the
/// centre of pixel `(i, j)` is `(i + 0.5, j + 0.5)`.
pub fn tile_pixel_to_lonlat(coord: &TileCoord, tile_size: u32, col: f64, row: f64) -> (f64, f64) {
    let span = tile_span(coord.z);
    let size = tile_size as f64;
    let mx = -ORIGIN_SHIFT + (coord.x as f64 + col / size) * span;
    let my = ORIGIN_SHIFT - (coord.y as f64 + row / size) * span;
    (mercator_x_to_lon(mx), mercator_y_to_lat(my))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        assert_eq!(mercator_x_to_lon(0.0), 0.0);
        assert!(mercator_y_to_lat(0.0).abs() < 1e-12);
    }

    #[test]
    fn test_world_edges() {
        assert!((mercator_x_to_lon(ORIGIN_SHIFT) - 180.0).abs() < 1e-9);
        assert!((mercator_y_to_lat(ORIGIN_SHIFT) - MAX_LATITUDE).abs() < 1e-9);
        assert!((mercator_y_to_lat(-ORIGIN_SHIFT) + MAX_LATITUDE).abs() < 1e-9);
    }

    #[test]
    fn test_tile_corners_match_tile_bounds() {
        let coord = TileCoord::new(14, 14520, 6486);
        let bounds = coord.bounds();
        let (west, north) = tile_pixel_to_lonlat(&coord, 256, 0.0, 0.0);
        let (east, south) = tile_pixel_to_lonlat(&coord, 256, 256.0, 256.0);
        assert!((west - bounds.min_lon).abs() < 1e-9);
        assert!((east - bounds.max_lon).abs() < 1e-9);
        assert!((north - bounds.max_lat).abs() < 1e-9);
        assert!((south - bounds.min_lat).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_zero_covers_world() {
        let coord = TileCoord::new(0, 0, 0);
        let (lon, lat) = tile_pixel_to_lonlat(&coord, 256, 128.0, 128.0);
        assert!(lon.abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }
}
