//! Writing run results to disk.
//!
//! Layout under the output directory:
//! - `source.json`: the description, pretty-printed
//! - `{name}/{z}/{x}/{y}.png` and `{name}/tilemapresource.xml`
//! - `index.html` and `viewer.json`

use std::fs;
use std::path::{Path, PathBuf};

use georef_common::{BoundingBox, GeorefResult, PipelineConfig};
use iiif_parser::CanvasDescription;
use renderer::png::encode_tile;
use renderer::{TilePyramidBuilder, WarpedRaster};
use tracing::{debug, info, instrument};
use viewer::{read_bounding_box, render_html, render_tilemap_xml, ViewerDescriptor};

use crate::config::OutputConfig;

pub const SOURCE_JSON: &str = "source.json";
pub const TILEMAP_XML: &str = "tilemapresource.xml";
pub const INDEX_HTML: &str = "index.html";
pub const VIEWER_JSON: &str = "viewer.json";

pub fn write_source_json(output_dir: &Path, desc: &CanvasDescription) -> GeorefResult<PathBuf> {
    let path = output_dir.join(SOURCE_JSON);
    fs::write(&path, serde_json::to_vec_pretty(desc.raw())?)?;
    info!(path = %path.display(), "Saved description");
    Ok(path)
}

/// Render the pyramid and write each tile as it completes. Returns the tile count.
///
/// An existing `tiles_dir` is removed first so tiles from an earlier run with
/// another zoom range or extent do not survive.
#[instrument(skip_all, fields(dir = %tiles_dir.display(), zoom = %config.zoom_range))]
pub fn write_tiles(
    warped: &WarpedRaster,
    config: &PipelineConfig,
    tiles_dir: &Path,
) -> GeorefResult<usize> {
    if tiles_dir.exists() {
        info!("Removing previous tiles");
        fs::remove_dir_all(tiles_dir)?;
    }
    fs::create_dir_all(tiles_dir)?;

    TilePyramidBuilder::new(&warped.raster, warped.bbox)
        .zoom_range(config.zoom_range)
        .tile_size(config.tile_size)
        .workers(config.workers)
        .for_each_tile(|tile| {
            let dir = tiles_dir
                .join(tile.coord.z.to_string())
                .join(tile.coord.x.to_string());
            fs::create_dir_all(&dir)?;
            let path = dir.join(format!("{}.png", tile.coord.y));
            fs::write(&path, encode_tile(&tile)?)?;
            debug!(tile = %tile.coord, "Wrote tile");
            Ok(())
        })
}

pub fn write_tilemap(
    tiles_dir: &Path,
    bbox: &BoundingBox,
    config: &PipelineConfig,
    label: &str,
) -> GeorefResult<PathBuf> {
    let path = tiles_dir.join(TILEMAP_XML);
    fs::write(
        &path,
        render_tilemap_xml(bbox, &config.zoom_range, label, config.tile_size),
    )?;
    Ok(path)
}

/// Write `index.html` and `viewer.json`, centred on the extent recorded in the
/// tiles folder's tilemap. Returns the HTML path.
pub fn write_viewer(
    output: &OutputConfig,
    config: &PipelineConfig,
    label: &str,
) -> GeorefResult<PathBuf> {
    let tilemap = output.tiles_dir().join(TILEMAP_XML);
    let bbox = match fs::read_to_string(&tilemap) {
        Ok(xml) => read_bounding_box(&xml),
        Err(e) => {
            debug!(path = %tilemap.display(), error = %e, "No tilemap to read extent from");
            None
        }
    };

    let descriptor = ViewerDescriptor::new(
        bbox.as_ref(),
        config.zoom_range,
        ViewerDescriptor::tile_template_for(&output.name),
        config.default_center,
    )
    .with_title(label);

    let html_path = output.output_dir.join(INDEX_HTML);
    fs::write(&html_path, render_html(&descriptor, label))?;
    fs::write(output.output_dir.join(VIEWER_JSON), descriptor.to_json()?)?;

    info!(
        path = %html_path.display(),
        lon = descriptor.center.0,
        lat = descriptor.center.1,
        "Wrote viewer"
    );
    Ok(html_path)
}
