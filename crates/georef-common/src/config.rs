//! Pipeline configuration shared by the library crates and the CLI.

use crate::error::{GeorefError, GeorefResult};
use crate::tile::TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest zoom level accepted for tile generation.
pub const MAX_ZOOM: u32 = 30;

/// Default image downsample factor applied before georeferencing.
pub const DEFAULT_SCALE: f64 = 0.25;

/// Map center used when the raster's bounding box is unavailable.
pub const DEFAULT_CENTER: (f64, f64) = (139.762, 35.713);

/// Inclusive range of zoom levels to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: u32,
    pub max: u32,
}

impl ZoomRange {
    pub fn new(min: u32, max: u32) -> GeorefResult<Self> {
        if min > max {
            return Err(GeorefError::invalid_config(
                "zoom",
                format!("minimum zoom {} exceeds maximum zoom {}", min, max),
            ));
        }
        if max > MAX_ZOOM {
            return Err(GeorefError::invalid_config(
                "zoom",
                format!("maximum zoom {} exceeds supported limit {}", max, MAX_ZOOM),
            ));
        }
        Ok(Self { min, max })
    }

    /// Iterate the zoom levels from coarsest to finest.
    pub fn levels(&self) -> impl Iterator<Item = u32> {
        self.min..=self.max
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 14, max: 18 }
    }
}

impl FromStr for ZoomRange {
    type Err = GeorefError;

    /// Accepts `"14-18"` or a single level such as `"16"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |p: &str| {
            p.trim().parse::<u32>().map_err(|_| {
                GeorefError::invalid_config("zoom", format!("'{}' is not a zoom level", p.trim()))
            })
        };

        match s.split_once('-') {
            Some((min, max)) => ZoomRange::new(parse(min)?, parse(max)?),
            None => {
                let z = parse(s)?;
                ZoomRange::new(z, z)
            }
        }
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Parse a `"lon,lat"` pair.
pub fn parse_lon_lat(s: &str) -> GeorefResult<(f64, f64)> {
    let (lon, lat) = s.split_once(',').ok_or_else(|| {
        GeorefError::invalid_config("center", format!("expected 'lon,lat', got '{}'", s))
    })?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| GeorefError::invalid_config("center", format!("invalid longitude '{}'", lon)))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| GeorefError::invalid_config("center", format!("invalid latitude '{}'", lat)))?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(GeorefError::invalid_config(
            "center",
            format!("({}, {}) is outside the valid lon/lat range", lon, lat),
        ));
    }
    Ok((lon, lat))
}

/// Configuration threaded explicitly through every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fraction by which the source image is downsampled before georeferencing
    pub scale: f64,

    /// Zoom levels to generate
    pub zoom_range: ZoomRange,

    /// Replaces the polynomial order declared in the description
    pub polynomial_order_override: Option<u32>,

    /// Tile edge length in pixels
    pub tile_size: u32,

    /// Worker threads for resampling and tiling (0 = one per core)
    pub workers: usize,

    /// Viewer center used when no bounding box is available
    pub default_center: (f64, f64),
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            zoom_range: ZoomRange::default(),
            polynomial_order_override: None,
            tile_size: TILE_SIZE,
            workers: 0,
            default_center: DEFAULT_CENTER,
        }
    }
}

impl PipelineConfig {
    /// Check value ranges that the type system cannot express.
    pub fn validate(&self) -> GeorefResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 1.0 {
            return Err(GeorefError::invalid_config(
                "scale",
                format!("{} is not in (0, 1]", self.scale),
            ));
        }
        if let Some(order) = self.polynomial_order_override {
            if order == 0 || order > 3 {
                return Err(GeorefError::invalid_config(
                    "order",
                    format!("polynomial order {} is not in 1..=3", order),
                ));
            }
        }
        if self.tile_size == 0 {
            return Err(GeorefError::invalid_config("tile_size", "must be positive"));
        }
        ZoomRange::new(self.zoom_range.min, self.zoom_range.max)?;
        Ok(())
    }
}
