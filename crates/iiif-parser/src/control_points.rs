//! Ground control point extraction from the georeference annotation.
//!
//! The annotation body is a GeoJSON FeatureCollection. Each feature pairs a
//! pixel position on the full-resolution canvas (`properties.resourceCoords`)
//! with a WGS84 position (`geometry.coordinates`).

use georef_common::{ControlPoint, GeorefError, GeorefResult};
use serde_json::Value;
use tracing::debug;

use crate::CanvasDescription;

/// Extract control points, scaling pixel positions by `scale`.
///
/// The raster that gets georeferenced is the canvas downsampled by `scale`,
/// so its pixel coordinates are the canvas coordinates multiplied by it.
pub fn extract_control_points(
    desc: &CanvasDescription,
    scale: f64,
) -> GeorefResult<Vec<ControlPoint>> {
    let body = desc
        .georeference_body()
        .ok_or_else(|| GeorefError::malformed("description has no georeference annotation"))?;

    let features = body
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| GeorefError::malformed("georeference annotation has no feature list"))?;

    if features.is_empty() {
        return Err(GeorefError::malformed(
            "georeference annotation contains no control points",
        ));
    }

    let points = features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let (px, py) = number_pair(feature.pointer("/properties/resourceCoords"))
                .ok_or_else(|| {
                    GeorefError::malformed(format!(
                        "feature {} has a missing or non-numeric resourceCoords pair",
                        index
                    ))
                })?;
            let (lon, lat) = number_pair(feature.pointer("/geometry/coordinates")).ok_or_else(
                || {
                    GeorefError::malformed(format!(
                        "feature {} has a missing or non-numeric coordinates pair",
                        index
                    ))
                },
            )?;
            Ok(ControlPoint::new(px * scale, py * scale, lon, lat))
        })
        .collect::<GeorefResult<Vec<_>>>()?;

    debug!(count = points.len(), scale, "Extracted control points");
    Ok(points)
}

/// Indices of points whose pixel position falls outside a `width`×`height` raster.
pub fn validate_pixel_bounds(points: &[ControlPoint], width: u32, height: u32) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.within_raster(width as f64, height as f64))
        .map(|(i, _)| i)
        .collect()
}

/// Read the first two entries of a JSON array as finite numbers.
fn number_pair(value: Option<&Value>) -> Option<(f64, f64)> {
    let items = value?.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let a = items[0].as_f64()?;
    let b = items[1].as_f64()?;
    (a.is_finite() && b.is_finite()).then_some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canvas_with_features(features: Value) -> CanvasDescription {
        CanvasDescription::from_value(json!({
            "width": 400,
            "height": 400,
            "annotations": [{
                "items": [{
                    "body": { "type": "FeatureCollection", "features": features }
                }]
            }]
        }))
        .unwrap()
    }

    fn feature(px: Value, py: Value, lon: Value, lat: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": { "resourceCoords": [px, py] },
            "geometry": { "type": "Point", "coordinates": [lon, lat] }
        })
    }

    #[test]
    fn test_extract_scales_pixels_only() {
        let desc = canvas_with_features(json!([
            feature(json!(400), json!(0), json!(139.1), json!(35.0)),
            feature(json!(0), json!(400), json!(139.0), json!(35.1)),
        ]));

        let points = extract_control_points(&desc, 0.25).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], ControlPoint::new(100.0, 0.0, 139.1, 35.0));
        assert_eq!(points[1], ControlPoint::new(0.0, 100.0, 139.0, 35.1));
    }

    #[test]
    fn test_empty_feature_list_is_malformed() {
        let desc = canvas_with_features(json!([]));
        let err = extract_control_points(&desc, 0.25).unwrap_err();
        assert!(matches!(err, GeorefError::MalformedInput(_)));
    }

    #[test]
    fn test_non_numeric_coordinate_is_malformed() {
        let desc = canvas_with_features(json!([
            feature(json!(10), json!(10), json!("139.0"), json!(35.0)),
        ]));
        let err = extract_control_points(&desc, 1.0).unwrap_err();
        assert!(err.to_string().contains("feature 0"));
    }

    #[test]
    fn test_missing_resource_coords_is_malformed() {
        let desc = canvas_with_features(json!([{
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [139.0, 35.0] }
        }]));
        assert!(extract_control_points(&desc, 1.0).is_err());
    }

    #[test]
    fn test_missing_annotation_is_malformed() {
        let desc = CanvasDescription::from_value(json!({ "width": 10, "height": 10 })).unwrap();
        assert!(matches!(
            extract_control_points(&desc, 1.0),
            Err(GeorefError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_validate_pixel_bounds() {
        let points = vec![
            ControlPoint::new(10.0, 10.0, 0.0, 0.0),
            ControlPoint::new(120.0, 10.0, 0.0, 0.0),
            ControlPoint::new(-1.0, 10.0, 0.0, 0.0),
        ];
        assert_eq!(validate_pixel_bounds(&points, 100, 100), vec![1, 2]);
    }
}
