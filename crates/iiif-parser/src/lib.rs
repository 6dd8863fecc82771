//! IIIF Canvas parser for the IIIF Georeference Extension.
//!
//! Reads the pieces of a Canvas the tiling pipeline needs:
//! - canvas size and the IIIF Image API service of its painting annotation
//! - ground control points from the georeference annotation's feature collection
//! - the declared transformation (polynomial order), with a fallback to order 1

pub mod canvas;
pub mod control_points;
pub mod transformation;

pub use canvas::CanvasDescription;
pub use control_points::{extract_control_points, validate_pixel_bounds};
pub use transformation::transform_model;
