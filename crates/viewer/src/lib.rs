//! Viewer outputs for a generated tile pyramid.
//!
//! - [`ViewerDescriptor`]: map centre, zoom bounds and tile template, serialized as `viewer.json`
//! - [`render_html`]: a self-contained MapLibre GL page over an OSM base layer
//! - [`tilemap`]: TMS `tilemapresource.xml` writing and reading

pub mod descriptor;
pub mod html;
pub mod tilemap;

pub use descriptor::{ViewerDescriptor, DEFAULT_INITIAL_ZOOM, DEFAULT_OPACITY};
pub use html::render_html;
pub use tilemap::{read_bounding_box, render_tilemap_xml};
