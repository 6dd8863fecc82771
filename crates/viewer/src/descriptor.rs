//! Map view parameters shared by the HTML page and `viewer.json`.

use georef_common::{BoundingBox, GeorefResult, ZoomRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Zoom the viewer opens at, clamped into the generated range.
pub const DEFAULT_INITIAL_ZOOM: u32 = 16;

/// Initial overlay opacity.
pub const DEFAULT_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerDescriptor {
    /// Map centre as (lon, lat)
    pub center: (f64, f64),
    pub zoom_min: u32,
    pub zoom_max: u32,
    /// Overlay tile URL relative to the page, e.g. `tiles/{z}/{x}/{y}.png`
    pub tile_url_template: String,
    pub initial_zoom: u32,
    pub opacity: f64,
    pub title: String,
}

impl ViewerDescriptor {
    /// Build a descriptor centred on `bbox`, or on `default_center` when no
    /// bounding box is available.
    pub fn new(
        bbox: Option<&BoundingBox>,
        zoom_range: ZoomRange,
        tile_url_template: impl Into<String>,
        default_center: (f64, f64),
    ) -> Self {
        let center = match bbox {
            Some(bbox) => bbox.center(),
            None => {
                warn!(
                    lon = default_center.0,
                    lat = default_center.1,
                    "No bounding box for viewer, using default center"
                );
                default_center
            }
        };

        let initial_zoom = DEFAULT_INITIAL_ZOOM.clamp(zoom_range.min, zoom_range.max);
        debug!(
            lon = center.0,
            lat = center.1,
            initial_zoom,
            zoom = %zoom_range,
            "Built viewer descriptor"
        );

        Self {
            center,
            zoom_min: zoom_range.min,
            zoom_max: zoom_range.max,
            tile_url_template: tile_url_template.into(),
            initial_zoom,
            opacity: DEFAULT_OPACITY,
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Template for a tiles folder named `name`.
    pub fn tile_template_for(name: &str) -> String {
        format!("{}/{{z}}/{{x}}/{{y}}.png", name.trim_end_matches('/'))
    }

    pub fn to_json(&self) -> GeorefResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use georef_common::DEFAULT_CENTER;

    #[test]
    fn test_center_from_bbox() {
        let bbox = BoundingBox::new(139.0, 35.0, 139.1, 35.1);
        let desc = ViewerDescriptor::new(
            Some(&bbox),
            ZoomRange::default(),
            "tiles/{z}/{x}/{y}.png",
            DEFAULT_CENTER,
        );
        assert!((desc.center.0 - 139.05).abs() < 1e-12);
        assert!((desc.center.1 - 35.05).abs() < 1e-12);
        assert_eq!((desc.zoom_min, desc.zoom_max), (14, 18));
        assert_eq!(desc.initial_zoom, 16);
        assert_eq!(desc.opacity, 0.8);
    }

    #[test]
    fn test_missing_bbox_uses_default_center() {
        let desc = ViewerDescriptor::new(None, ZoomRange::default(), "t", (139.762, 35.713));
        assert_eq!(desc.center, (139.762, 35.713));
    }

    #[test]
    fn test_initial_zoom_is_clamped() {
        let low = ViewerDescriptor::new(None, ZoomRange::new(10, 12).unwrap(), "t", DEFAULT_CENTER);
        assert_eq!(low.initial_zoom, 12);
        let high = ViewerDescriptor::new(None, ZoomRange::new(18, 20).unwrap(), "t", DEFAULT_CENTER);
        assert_eq!(high.initial_zoom, 18);
    }

    #[test]
    fn test_tile_template() {
        assert_eq!(ViewerDescriptor::tile_template_for("tiles"), "tiles/{z}/{x}/{y}.png");
        assert_eq!(ViewerDescriptor::tile_template_for("maps/"), "maps/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_json_round_trip() {
        let desc = ViewerDescriptor::new(None, ZoomRange::default(), "tiles/{z}/{x}/{y}.png", DEFAULT_CENTER)
            .with_title("Campus");
        let json = desc.to_json().unwrap();
        assert!(json.contains("\"tile_url_template\": \"tiles/{z}/{x}/{y}.png\""));
        let back: ViewerDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
