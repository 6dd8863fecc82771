//! Common test fixtures for georeferencing tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios: small Tokyo extents, corner control points and IIIF canvases.

/// Common bounding box definitions for testing, as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// 0.1° square in central Tokyo
    pub const TOKYO_SMALL: (f64, f64, f64, f64) = (139.0, 35.0, 139.1, 35.1);

    /// Hongo campus area
    pub const HONGO: (f64, f64, f64, f64) = (139.755, 35.708, 139.769, 35.718);

    /// Whole world in Web Mercator limits
    pub const WEB_MERCATOR_WORLD: (f64, f64, f64, f64) =
        (-180.0, -85.051_128_779_806_59, 180.0, 85.051_128_779_806_59);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// Control point sets for testing.
pub mod gcps {
    use georef_common::ControlPoint;

    /// Four corners of a 100×100 image stretched over [`super::bbox::TOKYO_SMALL`],
    /// north-up (pixel y grows southwards).
    pub fn corners_100() -> Vec<ControlPoint> {
        vec![
            ControlPoint::new(0.0, 0.0, 139.0, 35.1),
            ControlPoint::new(100.0, 0.0, 139.1, 35.1),
            ControlPoint::new(0.0, 100.0, 139.0, 35.0),
            ControlPoint::new(100.0, 100.0, 139.1, 35.0),
        ]
    }

    /// Same as [`corners_100`] as (px, py, lon, lat) tuples for JSON fixtures.
    pub fn corners_100_tuples() -> Vec<(f64, f64, f64, f64)> {
        corners_100()
            .into_iter()
            .map(|p| (p.pixel.0, p.pixel.1, p.geo.0, p.geo.1))
            .collect()
    }
}

/// IIIF canvas JSON builders.
pub mod canvas {
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};

    /// Image service id used by [`canvas_json`].
    pub const SERVICE_ID: &str = "https://example.org/iiif/campus";

    /// Builds a Presentation 3 Canvas with a georeference annotation.
    ///
    /// `points` are (px, py, lon, lat) in full-resolution canvas pixels.
    /// `transformation` is placed verbatim in the annotation body when given.
    pub fn canvas_json(
        width: u32,
        height: u32,
        points: &[(f64, f64, f64, f64)],
        transformation: Option<Value>,
    ) -> Value {
        let features: Vec<Value> = points
            .iter()
            .map(|(px, py, lon, lat)| {
                json!({
                    "type": "Feature",
                    "properties": { "resourceCoords": [px, py] },
                    "geometry": { "type": "Point", "coordinates": [lon, lat] }
                })
            })
            .collect();

        let mut body = json!({
            "type": "FeatureCollection",
            "features": features
        });
        if let Some(transformation) = transformation {
            body["transformation"] = transformation;
        }

        json!({
            "@context": "http://iiif.io/api/presentation/3/context.json",
            "id": "https://example.org/canvas/campus",
            "type": "Canvas",
            "label": { "ja": ["東京帝國大學本部構内及農學部建物配置圖"] },
            "width": width,
            "height": height,
            "items": [{
                "type": "AnnotationPage",
                "items": [{
                    "type": "Annotation",
                    "motivation": "painting",
                    "body": {
                        "type": "Image",
                        "width": width,
                        "height": height,
                        "service": [{ "id": SERVICE_ID, "type": "ImageService3" }]
                    }
                }]
            }],
            "annotations": [{
                "type": "AnnotationPage",
                "items": [{
                    "type": "Annotation",
                    "motivation": "georeferencing",
                    "body": body
                }]
            }]
        })
    }

    /// Polynomial transformation object as it appears in the annotation body.
    pub fn polynomial(order: Value) -> Value {
        json!({ "type": "polynomial", "options": { "order": order } })
    }

    /// Writes `value` as `canvas.json` into `dir` and returns its path.
    pub fn write_canvas(dir: &Path, value: &Value) -> std::io::Result<PathBuf> {
        let path = dir.join("canvas.json");
        std::fs::write(&path, serde_json::to_vec_pretty(value)?)?;
        Ok(path)
    }
}
