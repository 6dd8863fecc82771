//! MapLibre GL viewer page.

use quick_xml::escape::escape;

use crate::descriptor::ViewerDescriptor;

const MAPLIBRE_VERSION: &str = "4.5.0";

/// Render a standalone HTML page showing the overlay tiles over OpenStreetMap,
/// with an opacity slider and navigation control.
pub fn render_html(descriptor: &ViewerDescriptor, label: &str) -> String {
    let label = escape(label);
    let template = js_string(&descriptor.tile_url_template);
    let opacity_percent = (descriptor.opacity * 100.0).round() as u32;
    let (lon, lat) = descriptor.center;

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\">\n");
    html.push_str(&format!("  <title>{}</title>\n", label));
    html.push_str(&format!(
        "  <script src=\"https://unpkg.com/maplibre-gl@{v}/dist/maplibre-gl.js\"></script>\n  \
         <link href=\"https://unpkg.com/maplibre-gl@{v}/dist/maplibre-gl.css\" rel=\"stylesheet\">\n",
        v = MAPLIBRE_VERSION
    ));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n  <div id=\"map\"></div>\n  <div class=\"info\">\n");
    html.push_str(&format!("    <h3>{}</h3>\n", label));
    html.push_str("    <p>IIIF Georeference Extension + MapLibre GL JS</p>\n");
    html.push_str("    <div class=\"slider-container\">\n");
    html.push_str(&format!(
        "      <label>Opacity: <span id=\"opacity-value\">{p}</span>%</label>\n      \
         <input type=\"range\" id=\"opacity\" min=\"0\" max=\"100\" value=\"{p}\" style=\"width: 150px;\">\n",
        p = opacity_percent
    ));
    html.push_str("    </div>\n  </div>\n  <script>\n");
    html.push_str(&format!(
        r#"    const map = new maplibregl.Map({{
      container: 'map',
      style: {{
        version: 8,
        sources: {{
          osm: {{
            type: 'raster',
            tiles: ['https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png'],
            tileSize: 256,
            attribution: '&copy; OpenStreetMap contributors'
          }},
          overlay: {{
            type: 'raster',
            tiles: [{template}],
            tileSize: 256,
            minzoom: {zoom_min},
            maxzoom: {zoom_max}
          }}
        }},
        layers: [
          {{ id: 'osm-layer', type: 'raster', source: 'osm' }},
          {{ id: 'overlay-layer', type: 'raster', source: 'overlay', paint: {{ 'raster-opacity': {opacity} }} }}
        ]
      }},
      center: [{lon}, {lat}],
      zoom: {zoom}
    }});
    map.addControl(new maplibregl.NavigationControl());

    const slider = document.getElementById('opacity');
    const opacityValue = document.getElementById('opacity-value');
    slider.addEventListener('input', (e) => {{
      const opacity = e.target.value / 100;
      opacityValue.textContent = e.target.value;
      map.setPaintProperty('overlay-layer', 'raster-opacity', opacity);
    }});
"#,
        template = template,
        zoom_min = descriptor.zoom_min,
        zoom_max = descriptor.zoom_max,
        opacity = descriptor.opacity,
        lon = lon,
        lat = lat,
        zoom = descriptor.initial_zoom,
    ));
    html.push_str("  </script>\n</body>\n</html>\n");
    html
}

/// Quote `value` as a JavaScript string literal safe to place inside `<script>`.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace("</", "<\\/")
}

const STYLE: &str = "  <style>
    body { margin: 0; padding: 0; }
    #map { position: absolute; top: 0; bottom: 0; width: 100%; }
    .info {
      position: absolute;
      top: 10px;
      left: 10px;
      background: rgba(255,255,255,0.9);
      padding: 10px 15px;
      border-radius: 4px;
      font-family: sans-serif;
      font-size: 14px;
      z-index: 1;
      max-width: 300px;
    }
    .info h3 { margin: 0 0 5px 0; font-size: 14px; }
    .slider-container { margin-top: 10px; }
    .slider-container label { display: block; margin-bottom: 5px; }
  </style>
";
