//! Common types and utilities shared across the georeference tiling crates.

pub mod bbox;
pub mod config;
pub mod error;
pub mod gcp;
pub mod tile;

pub use bbox::BoundingBox;
pub use config::{parse_lon_lat, PipelineConfig, ZoomRange, DEFAULT_CENTER, DEFAULT_SCALE, MAX_ZOOM};
pub use error::{GeorefError, GeorefResult};
pub use gcp::{ControlPoint, TransformKind, TransformModel};
pub use tile::{latlon_to_tile, tile_to_latlon_bounds, TileCoord, TILE_SIZE, WEB_MERCATOR_MAX_LAT};
