//! Integration tests for warping and tiling a georeferenced raster.

use georef_common::{latlon_to_tile, BoundingBox, TileCoord, TransformModel, ZoomRange};
use projection::fit_transform;
use renderer::png::encode_tile;
use renderer::{plan, tiles_for_bbox, warp, RasterBuffer, RasterFrame, TilePyramidBuilder};
use test_utils::{bbox, create_checkerboard_raster, gcps, linear_control_points};

fn tokyo() -> BoundingBox {
    let (a, b, c, d) = bbox::TOKYO_SMALL;
    BoundingBox::new(a, b, c, d)
}

fn checkerboard(w: u32, h: u32) -> RasterBuffer {
    RasterBuffer::new(
        w,
        h,
        create_checkerboard_raster(w as usize, h as usize, 8),
        RasterFrame::Pixel,
    )
    .unwrap()
}

// ============================================================================
// Tile coverage
// ============================================================================

#[test]
fn test_zoom_14_tiles_are_exactly_the_intersecting_ones() {
    let bbox = tokyo();
    let tiles = tiles_for_bbox(&bbox, 14);

    // Brute force over a generous neighbourhood
    let nw = latlon_to_tile(bbox.max_lat, bbox.min_lon, 14);
    let se = latlon_to_tile(bbox.min_lat, bbox.max_lon, 14);
    let mut expected = Vec::new();
    for y in nw.y.saturating_sub(2)..=se.y + 2 {
        for x in nw.x.saturating_sub(2)..=se.x + 2 {
            let coord = TileCoord::new(14, x, y);
            if coord.bounds().intersects(&bbox) {
                expected.push(coord);
            }
        }
    }

    assert_eq!(tiles, expected);
    // 0.1° is a little over 4.5 tiles wide at zoom 14
    assert!(tiles.len() >= 25 && tiles.len() <= 42, "{} tiles", tiles.len());
}

#[test]
fn test_tile_union_covers_bbox() {
    let bbox = tokyo();
    for zoom in [10, 13, 15] {
        let tiles = tiles_for_bbox(&bbox, zoom);
        for i in 0..=10 {
            for j in 0..=10 {
                let lon = bbox.min_lon + bbox.width() * (0.01 + 0.98 * i as f64 / 10.0);
                let lat = bbox.min_lat + bbox.height() * (0.01 + 0.98 * j as f64 / 10.0);
                assert!(
                    tiles.iter().any(|t| t.bounds().contains_point(lon, lat)),
                    "zoom {}: ({}, {}) not covered",
                    zoom,
                    lon,
                    lat
                );
            }
        }
    }
}

#[test]
fn test_plan_spans_every_zoom() {
    let range = ZoomRange::new(14, 16).unwrap();
    let planned = plan(&tokyo(), &range);
    for z in 14..=16 {
        assert!(planned.iter().any(|t| t.z == z));
    }
    assert!(planned.iter().all(|t| t.bounds().intersects(&tokyo())));
}

// ============================================================================
// End to end: fit → warp → tiles
// ============================================================================

#[test]
fn test_corner_scenario_tiles() {
    let fitted = fit_transform(&TransformModel::polynomial(1), &gcps::corners_100()).unwrap();
    let warped = warp(&checkerboard(100, 100), &fitted).unwrap();

    let builder = TilePyramidBuilder::new(&warped.raster, warped.bbox)
        .zoom_range(ZoomRange::new(14, 14).unwrap())
        .workers(2);
    let tiles = builder.build().unwrap();

    assert_eq!(
        tiles.iter().map(|t| t.coord).collect::<Vec<_>>(),
        tiles_for_bbox(&warped.bbox, 14)
    );
    for tile in &tiles {
        assert_eq!(tile.pixels.width(), 256);
        assert_eq!(tile.pixels.height(), 256);
    }

    // Tiles on the edge of the coverage are partly transparent, interior tiles are not
    let centre = latlon_to_tile(35.05, 139.05, 14);
    let centre_tile = tiles.iter().find(|t| t.coord == centre).unwrap();
    assert!(centre_tile.pixels.pixels().chunks_exact(4).all(|p| p[3] == 255));

    let corner = tiles.first().unwrap();
    let pixels = corner.pixels.pixels();
    assert!(pixels.chunks_exact(4).any(|p| p[3] == 0));
    assert!(pixels.chunks_exact(4).any(|p| p[3] == 255));

    // Pixels outside the warped extent are transparent
    let top_left_lonlat = corner.coord.bounds();
    assert!(top_left_lonlat.min_lon < warped.bbox.min_lon);
    assert_eq!(corner.pixels.pixel(0, 0)[3], 0);
}

#[test]
fn test_pipeline_is_idempotent() {
    let bbox = tokyo();
    let points = linear_control_points(120.0, 90.0, &bbox, 3);
    let range = ZoomRange::new(13, 14).unwrap();

    let run = || {
        let fitted = fit_transform(&TransformModel::polynomial(1), &points).unwrap();
        let warped = warp(&checkerboard(120, 90), &fitted).unwrap();
        let tiles = TilePyramidBuilder::new(&warped.raster, warped.bbox)
            .zoom_range(range)
            .build()
            .unwrap();
        let encoded: Vec<Vec<u8>> = tiles.iter().map(|t| encode_tile(t).unwrap()).collect();
        (warped.bbox, encoded)
    };

    let (bbox_a, tiles_a) = run();
    let (bbox_b, tiles_b) = run();
    assert_eq!(bbox_a, bbox_b);
    assert_eq!(tiles_a, tiles_b);
}

#[test]
fn test_encoded_tile_decodes_to_same_pixels() {
    let fitted = fit_transform(&TransformModel::polynomial(1), &gcps::corners_100()).unwrap();
    let warped = warp(&checkerboard(100, 100), &fitted).unwrap();
    let tiles = TilePyramidBuilder::new(&warped.raster, warped.bbox)
        .zoom_range(ZoomRange::new(13, 13).unwrap())
        .build()
        .unwrap();

    for tile in &tiles {
        let bytes = encode_tile(tile).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (256, 256));
        for (a, b) in decoded.as_raw().chunks_exact(4).zip(tile.pixels.pixels().chunks_exact(4)) {
            assert_eq!(a[3], b[3]);
            if a[3] > 0 {
                assert_eq!(a, b);
            }
        }
    }
}
