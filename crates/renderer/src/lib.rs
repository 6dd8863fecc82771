//! Raster processing for georeferenced images.
//!
//! - [`raster`]: RGBA buffers tagged with their coordinate frame, plus the
//!   shared bilinear kernel
//! - [`warp`]: resampling a source image into a north-up EPSG:4326 grid
//! - [`pyramid`]: cutting the warped raster into 256×256 XYZ tiles
//! - [`png`]: PNG encoding (indexed when the tile fits a palette)

pub mod png;
pub mod pyramid;
pub mod raster;
pub mod warp;

pub use pyramid::{plan, render_tile, tiles_for_bbox, Tile, TilePyramidBuilder};
pub use raster::{bilinear_rgba, decode_image, RasterBuffer, RasterFrame};
pub use warp::{suggest_output_grid, warp, warp_to_grid, GeoGrid, WarpedRaster};
