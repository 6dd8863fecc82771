//! TMS `tilemapresource.xml` for a tile folder.
//!
//! The bounding box is written in EPSG:4326 with `minx`/`maxx` as longitude
//! and `miny`/`maxy` as latitude. Reading it back is how a viewer can be
//! regenerated from an existing tile folder.

use georef_common::{BoundingBox, ZoomRange};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

/// Web Mercator circumference at the equator in metres.
const MERCATOR_CIRCUMFERENCE: f64 = 2.0 * std::f64::consts::PI * 6_378_137.0;

/// Render a tilemap resource describing `bbox` at every zoom in `zoom_range`.
pub fn render_tilemap_xml(
    bbox: &BoundingBox,
    zoom_range: &ZoomRange,
    label: &str,
    tile_size: u32,
) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<TileMap version=\"1.0.0\" tilemapservice=\"http://tms.osgeo.org/1.0.0\">\n");
    xml.push_str(&format!("  <Title>{}</Title>\n", escape(label)));
    xml.push_str("  <Abstract></Abstract>\n");
    xml.push_str("  <SRS>EPSG:4326</SRS>\n");
    xml.push_str(&format!(
        "  <BoundingBox minx=\"{}\" miny=\"{}\" maxx=\"{}\" maxy=\"{}\"/>\n",
        bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
    ));
    xml.push_str(&format!(
        "  <Origin x=\"{}\" y=\"{}\"/>\n",
        bbox.min_lon, bbox.min_lat
    ));
    xml.push_str(&format!(
        "  <TileFormat width=\"{0}\" height=\"{0}\" mime-type=\"image/png\" extension=\"png\"/>\n",
        tile_size
    ));
    xml.push_str("  <TileSets profile=\"mercator\">\n");
    for z in zoom_range.levels() {
        let units_per_pixel = MERCATOR_CIRCUMFERENCE / (tile_size as f64 * 2f64.powi(z as i32));
        xml.push_str(&format!(
            "    <TileSet href=\"{z}\" units-per-pixel=\"{:.8}\" order=\"{z}\"/>\n",
            units_per_pixel,
            z = z
        ));
    }
    xml.push_str("  </TileSets>\n");
    xml.push_str("</TileMap>\n");
    xml
}

/// Extract the `<BoundingBox>` element. `None` if it is missing, incomplete
/// or the document is not well formed.
pub fn read_bounding_box(xml: &str) -> Option<BoundingBox> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"BoundingBox" => {
                return bbox_from_attributes(&e);
            }
            Ok(Event::Eof) => {
                debug!("Tilemap has no BoundingBox element");
                return None;
            }
            Err(e) => {
                warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    "Failed to parse tilemap XML"
                );
                return None;
            }
            _ => {}
        }
    }
}

fn bbox_from_attributes(element: &BytesStart<'_>) -> Option<BoundingBox> {
    let (mut minx, mut miny, mut maxx, mut maxy) = (None, None, None, None);

    for attr in element.attributes().flatten() {
        let value: f64 = match attr.unescape_value().ok().and_then(|v| v.trim().parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        match attr.key.as_ref() {
            b"minx" => minx = Some(value),
            b"miny" => miny = Some(value),
            b"maxx" => maxx = Some(value),
            b"maxy" => maxy = Some(value),
            _ => {}
        }
    }

    let bbox = BoundingBox::new(minx?, miny?, maxx?, maxy?);
    if bbox.is_valid() {
        Some(bbox)
    } else {
        warn!(?bbox, "Tilemap BoundingBox is inverted");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_self_closing_element() {
        let xml = r#"<TileMap><BoundingBox minx="139.0" miny="35.0" maxx="139.1" maxy="35.1"/></TileMap>"#;
        let bbox = read_bounding_box(xml).unwrap();
        assert_eq!(bbox, BoundingBox::new(139.0, 35.0, 139.1, 35.1));
    }

    #[test]
    fn test_read_open_element() {
        let xml = r#"<TileMap>
            <BoundingBox maxy="2" maxx="4" miny="1" minx="3"></BoundingBox>
        </TileMap>"#;
        assert_eq!(read_bounding_box(xml), Some(BoundingBox::new(3.0, 1.0, 4.0, 2.0)));
    }

    #[test]
    fn test_missing_or_partial_bbox() {
        assert_eq!(read_bounding_box("<TileMap><SRS>EPSG:4326</SRS></TileMap>"), None);
        assert_eq!(
            read_bounding_box(r#"<TileMap><BoundingBox minx="1" miny="2" maxx="3"/></TileMap>"#),
            None
        );
        assert_eq!(
            read_bounding_box(r#"<TileMap><BoundingBox minx="a" miny="2" maxx="3" maxy="4"/></TileMap>"#),
            None
        );
    }

    #[test]
    fn test_malformed_xml() {
        assert_eq!(read_bounding_box("<TileMap><Title>x</Other></TileMap>"), None);
    }

    #[test]
    fn test_tilesets_cover_zoom_range() {
        let bbox = BoundingBox::new(139.0, 35.0, 139.1, 35.1);
        let xml = render_tilemap_xml(&bbox, &ZoomRange::new(14, 16).unwrap(), "t", 256);
        for z in 14..=16 {
            assert!(xml.contains(&format!("href=\"{}\"", z)));
        }
        assert!(!xml.contains("href=\"17\""));
        // 156543.03392804 m/px at zoom 0, halved per level
        assert!(xml.contains("units-per-pixel=\"9.55462854\""));
    }
}
