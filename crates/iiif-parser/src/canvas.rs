//! IIIF Presentation 3 Canvas access.

use georef_common::{GeorefError, GeorefResult};
use serde_json::Value;

/// A parsed Canvas carrying a georeference annotation.
///
/// The raw JSON is kept so it can be written back out unchanged as `source.json`.
#[derive(Debug, Clone)]
pub struct CanvasDescription {
    raw: Value,
    width: u32,
    height: u32,
}

impl CanvasDescription {
    /// Parse a Canvas from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> GeorefResult<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| GeorefError::malformed(format!("description is not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed Canvas, checking the fields every stage relies on.
    pub fn from_value(raw: Value) -> GeorefResult<Self> {
        let width = dimension(&raw, "width")?;
        let height = dimension(&raw, "height")?;
        Ok(Self { raw, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Canvas size after applying the downsample factor (truncated, at least 1 pixel).
    pub fn scaled_size(&self, scale: f64) -> (u32, u32) {
        let w = ((self.width as f64 * scale).floor() as u32).max(1);
        let h = ((self.height as f64 * scale).floor() as u32).max(1);
        (w, h)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Identifier of the IIIF Image API service painting this canvas.
    ///
    /// Follows `items[0].items[0].body.service[0].id`; `@id` is accepted for
    /// Image API 2 services, and a single service object in place of an array.
    pub fn image_service_id(&self) -> GeorefResult<String> {
        let body = self
            .raw
            .pointer("/items/0/items/0/body")
            .ok_or_else(|| GeorefError::malformed("canvas has no painting annotation body"))?;

        let service = match body.get("service") {
            Some(Value::Array(services)) => services.first(),
            Some(obj @ Value::Object(_)) => Some(obj),
            _ => None,
        }
        .ok_or_else(|| GeorefError::malformed("painting annotation body has no image service"))?;

        service
            .get("id")
            .or_else(|| service.get("@id"))
            .and_then(Value::as_str)
            .map(|id| id.trim_end_matches('/').to_string())
            .ok_or_else(|| GeorefError::malformed("image service has no id"))
    }

    /// Human-readable label: the first Japanese value, else the first value of any language.
    pub fn label(&self) -> String {
        match self.raw.get("label") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(map)) => map
                .get("ja")
                .and_then(first_string)
                .or_else(|| map.values().find_map(first_string))
                .unwrap_or_else(|| "Unknown".to_string()),
            _ => "Unknown".to_string(),
        }
    }

    /// Body of the georeference annotation (`annotations[0].items[0].body`).
    pub fn georeference_body(&self) -> Option<&Value> {
        self.raw.pointer("/annotations/0/items/0/body")
    }

    /// IIIF Image API URL for the full region scaled to `width`×`height`.
    pub fn image_url(&self, width: u32, height: u32) -> GeorefResult<String> {
        Ok(format!(
            "{}/full/{},{}/0/default.jpg",
            self.image_service_id()?,
            width,
            height
        ))
    }
}

fn dimension(raw: &Value, field: &str) -> GeorefResult<u32> {
    let value = raw
        .get(field)
        .ok_or_else(|| GeorefError::malformed(format!("canvas is missing '{}'", field)))?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u64))
        .filter(|v| *v > 0 && *v <= u32::MAX as u64)
        .map(|v| v as u32)
        .ok_or_else(|| {
            GeorefError::malformed(format!("canvas '{}' is not a positive integer: {}", field, value))
        })
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(|v| v.as_str()).map(str::to_string),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
