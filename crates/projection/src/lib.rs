//! Coordinate transformations for georeferencing.
//!
//! - [`polynomial`]: bivariate polynomials fitted by least squares
//! - [`fit`]: pixel ↔ geographic transforms fitted from control points
//! - [`mercator`]: Web Mercator (EPSG:3857) helpers used for XYZ tiles

pub mod fit;
pub mod mercator;
pub mod polynomial;

pub use fit::{fit_transform, FittedTransform, GeoTransform, Residual};
pub use polynomial::{min_control_points, PolynomialTransform};
