//! RGBA raster buffers.

use georef_common::{BoundingBox, GeorefError, GeorefResult};

/// Coordinate frame of a raster's pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterFrame {
    /// Source image pixels (x right, y down), no geographic meaning
    Pixel,
    /// North-up EPSG:4326 grid with square pixels covering `bbox`
    Geographic { bbox: BoundingBox },
}

/// An RGBA8 raster. Alpha 0 marks pixels without data.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    frame: RasterFrame,
}

impl RasterBuffer {
    /// Wrap row-major RGBA bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, frame: RasterFrame) -> GeorefResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(GeorefError::Image(format!(
                "{}x{} RGBA raster needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            frame,
        })
    }

    /// Assemble a raster from a buffer already sized `width * height * 4`.
    pub(crate) fn from_raw(width: u32, height: u32, pixels: Vec<u8>, frame: RasterFrame) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels,
            frame,
        }
    }

    /// A fully transparent raster.
    pub fn transparent(width: u32, height: u32, frame: RasterFrame) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            frame,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn frame(&self) -> &RasterFrame {
        &self.frame
    }

    /// Geographic extent, if the raster is in a geographic frame.
    pub fn bbox(&self) -> Option<&BoundingBox> {
        match &self.frame {
            RasterFrame::Geographic { bbox } => Some(bbox),
            RasterFrame::Pixel => None,
        }
    }

    /// RGBA value at integer pixel `(x, y)`. Panics if out of range.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Number of pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|p| p[3] == 0)
    }
}

/// Decode an encoded image (JPEG or PNG) into a pixel-frame raster.
pub fn decode_image(bytes: &[u8]) -> GeorefResult<RasterBuffer> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| GeorefError::Image(e.to_string()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    RasterBuffer::new(width, height, img.into_raw(), RasterFrame::Pixel)
}

/// Alpha-weighted bilinear sample.
///
/// `x` and `y` are in pixel-centre units: `(0.0, 0.0)` is the centre of the
/// top-left pixel. Positions beyond the outermost centres are clamped to the
/// edge. Colour is weighted by alpha so transparent neighbours do not darken
/// the result; on fully opaque input this is plain bilinear interpolation.
pub fn bilinear_rgba(raster: &RasterBuffer, x: f64, y: f64) -> [u8; 4] {
    if raster.width == 0 || raster.height == 0 {
        return [0, 0, 0, 0];
    }
    let max_x = (raster.width.saturating_sub(1)) as f64;
    let max_y = (raster.height.saturating_sub(1)) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(raster.width - 1);
    let y2 = (y1 + 1).min(raster.height - 1);
    let dx = x - x1 as f64;
    let dy = y - y1 as f64;

    let corners = [
        (raster.pixel(x1, y1), (1.0 - dx) * (1.0 - dy)),
        (raster.pixel(x2, y1), dx * (1.0 - dy)),
        (raster.pixel(x1, y2), (1.0 - dx) * dy),
        (raster.pixel(x2, y2), dx * dy),
    ];

    let mut acc = [0.0f64; 4];
    for (px, w) in corners {
        accumulate(&mut acc, px, w);
    }
    resolve(acc, 1.0)
}

/// Add `weight` of a premultiplied pixel to `acc` (`[r·a, g·a, b·a, a]`).
#[inline]
pub(crate) fn accumulate(acc: &mut [f64; 4], px: [u8; 4], weight: f64) {
    let wa = weight * px[3] as f64;
    acc[0] += wa * px[0] as f64;
    acc[1] += wa * px[1] as f64;
    acc[2] += wa * px[2] as f64;
    acc[3] += wa;
}

/// Un-premultiply an accumulator whose weights sum to `total_weight`.
#[inline]
pub(crate) fn resolve(acc: [f64; 4], total_weight: f64) -> [u8; 4] {
    if acc[3] <= 0.0 || total_weight <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        to_u8(acc[0] / acc[3]),
        to_u8(acc[1] / acc[3]),
        to_u8(acc[2] / acc[3]),
        to_u8(acc[3] / total_weight),
    ]
}

#[inline]
fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
