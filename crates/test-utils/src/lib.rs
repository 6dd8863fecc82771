//! Test support for the georeference tiling workspace.
//!
//! - [`generators`]: synthetic RGBA rasters and control point layouts
//! - [`fixtures`]: bounding boxes, corner control points and IIIF canvas builders
//! - [`paths`]: locating files under `testdata/`
//!
//! Used as a `[dev-dependencies]` entry by every crate:
//!
//! ```toml
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a test data file, or return early from the test when it is absent.
///
/// ```ignore
/// #[test]
/// fn test_bundled_canvas() {
///     let path = require_test_file!("canvas.json");
///     let bytes = std::fs::read(path).unwrap();
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        let name = $name;
        let Some(path) = $crate::find_test_file(name) else {
            eprintln!("skipping: test data '{}' not found (set TEST_DATA_DIR)", name);
            return;
        };
        path
    }};
}

/// Assert `|left - right| <= epsilon` for anything castable to `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "approximate equality failed: {} vs {} (diff {:e}, epsilon {:e})",
            left,
            right,
            (left - right).abs(),
            epsilon
        );
    }};
}

/// Assert two `(x, y)` / `(lon, lat)` pairs agree component-wise within `epsilon`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (l, r): ((f64, f64), (f64, f64)) = ($left, $right);
        $crate::assert_approx_eq!(l.0, r.0, $epsilon);
        $crate::assert_approx_eq!(l.1, r.1, $epsilon);
    }};
}
