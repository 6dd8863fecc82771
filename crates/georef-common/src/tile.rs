//! XYZ tile addressing (Web Mercator, top-left origin).

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Edge length of every emitted tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude limit of the square Web Mercator world (atan(sinh(π))).
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    pub fn matrix_size(z: u32) -> u32 {
        1u32 << z
    }

    /// Relative output path, e.g. `14/14552/6451.png`.
    pub fn path(&self, extension: &str) -> String {
        format!("{}/{}/{}.{}", self.z, self.x, self.y, extension)
    }

    /// Geographic footprint of this tile in lon/lat degrees.
    pub fn bounds(&self) -> BoundingBox {
        tile_to_latlon_bounds(self)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Convert lat/lon to the Web Mercator tile containing it.
///
/// Latitude is clamped to the Mercator limits and indices to `[0, 2^z)`, so
/// points on the east or south edge of the world land in the last tile.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let n = TileCoord::matrix_size(zoom) as f64;
    let max_index = n - 1.0;

    let lat = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index) as u32;
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index) as u32;

    TileCoord { z: zoom, x, y }
}

/// Convert Web Mercator tile coordinates to lat/lon bounds.
pub fn tile_to_latlon_bounds(coord: &TileCoord) -> BoundingBox {
    let n = TileCoord::matrix_size(coord.z) as f64;

    let lon_min = coord.x as f64 / n * 360.0 - 180.0;
    let lon_max = (coord.x + 1) as f64 / n * 360.0 - 180.0;

    let lat_max = (PI * (1.0 - 2.0 * coord.y as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    let lat_min = (PI * (1.0 - 2.0 * (coord.y + 1) as f64 / n))
        .sinh()
        .atan()
        .to_degrees();

    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlon_to_tile() {
        let coord = latlon_to_tile(0.0, 0.0, 0);
        assert_eq!(coord, TileCoord { z: 0, x: 0, y: 0 });

        // Tokyo at zoom 14
        let coord = latlon_to_tile(35.05, 139.05, 14);
        assert_eq!(coord.x, 14520);
        assert!(coord.y > 6480 && coord.y < 6495);
    }

    #[test]
    fn test_latlon_to_tile_world_edges() {
        let east = latlon_to_tile(0.0, 180.0, 3);
        assert_eq!(east.x, 7);
        let south = latlon_to_tile(-90.0, 0.0, 3);
        assert_eq!(south.y, 7);
        let north = latlon_to_tile(90.0, 0.0, 3);
        assert_eq!(north.y, 0);
    }

    #[test]
    fn test_tile_bounds_contain_source_point() {
        let coord = latlon_to_tile(35.713, 139.762, 16);
        let bounds = coord.bounds();
        assert!(bounds.contains_point(139.762, 35.713));
    }

    #[test]
    fn test_world_tile_bounds() {
        let bbox = TileCoord::new(0, 0, 0).bounds();
        assert!((bbox.min_lon + 180.0).abs() < 1e-9);
        assert!((bbox.max_lon - 180.0).abs() < 1e-9);
        assert!((bbox.max_lat - WEB_MERCATOR_MAX_LAT).abs() < 1e-9);
        assert!((bbox.min_lat + WEB_MERCATOR_MAX_LAT).abs() < 1e-9);
    }

    #[test]
    fn test_path() {
        assert_eq!(TileCoord::new(14, 14552, 6451).path("png"), "14/14552/6451.png");
        assert_eq!(TileCoord::new(3, 1, 2).to_string(), "3/1/2");
    }
}
