//! Integration tests for parsing IIIF canvases with georeference annotations.

use georef_common::{GeorefError, TransformModel};
use iiif_parser::{extract_control_points, validate_pixel_bounds, transform_model, CanvasDescription};
use serde_json::json;
use std::fs;
use test_utils::{assert_coords_approx_eq, canvas, gcps, require_test_file};

#[test]
fn test_parse_canvas_testdata() {
    let path = require_test_file!("canvas.json");
    let bytes = fs::read(&path).expect("Failed to read test file");

    let desc = CanvasDescription::from_json(&bytes).expect("canvas should parse");
    assert_eq!((desc.width(), desc.height()), (8000, 6000));
    assert_eq!(desc.label(), "東京帝國大學本部構内及農學部建物配置圖");
    assert_eq!(
        desc.image_url(2000, 1500).unwrap(),
        "https://example.org/iiif/campus/full/2000,1500/0/default.jpg"
    );

    let points = extract_control_points(&desc, 0.25).unwrap();
    assert_eq!(points.len(), 8);
    let (w, h) = desc.scaled_size(0.25);
    assert!(validate_pixel_bounds(&points, w, h).is_empty());

    // South-east corner of the canvas
    let (px, py) = points[3].pixel;
    let (lon, lat) = points[3].geo;
    assert_coords_approx_eq!((px, py), (2000.0, 1500.0), 1e-9);
    assert_coords_approx_eq!((lon, lat), (139.769, 35.708), 1e-9);

    assert_eq!(transform_model(&desc), TransformModel::polynomial(1));
}

#[test]
fn test_builder_canvas_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let value = canvas::canvas_json(
        400,
        400,
        &gcps::corners_100_tuples(),
        Some(canvas::polynomial(json!(2))),
    );
    let path = canvas::write_canvas(dir.path(), &value).unwrap();

    let desc = CanvasDescription::from_json(&fs::read(path).unwrap()).unwrap();
    assert_eq!(desc.raw(), &value);
    assert_eq!(transform_model(&desc).order, 2);

    let points = extract_control_points(&desc, 0.5).unwrap();
    assert_eq!(points[3].pixel, (50.0, 50.0));
    assert_eq!(points[3].geo, (139.1, 35.0));
}

#[test]
fn test_declared_order_above_supported_falls_back() {
    let value = canvas::canvas_json(
        100,
        100,
        &gcps::corners_100_tuples(),
        Some(canvas::polynomial(json!(5))),
    );
    let desc = CanvasDescription::from_value(value).unwrap();
    assert_eq!(transform_model(&desc).order, 1);
}

#[test]
fn test_points_outside_scaled_raster_are_reported() {
    let mut points = gcps::corners_100_tuples();
    points.push((180.0, 50.0, 139.2, 35.05));
    let value = canvas::canvas_json(100, 100, &points, None);
    let desc = CanvasDescription::from_value(value).unwrap();

    let extracted = extract_control_points(&desc, 1.0).unwrap();
    assert_eq!(validate_pixel_bounds(&extracted, 100, 100), vec![4]);
}

#[test]
fn test_canvas_without_features_is_rejected() {
    let value = canvas::canvas_json(100, 100, &[], None);
    let desc = CanvasDescription::from_value(value).unwrap();
    let err = extract_control_points(&desc, 1.0).unwrap_err();
    assert!(matches!(err, GeorefError::MalformedInput(_)));
    assert!(err.is_input_error());
}
