//! PNG encoding for RGBA tiles.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when the image has ≤256 unique colors.
//!   Map tiles of line drawings and partially covered tiles usually qualify.
//! - **RGBA PNG (color type 6)**: Fallback for images with >256 colors.
//!
//! Use [`encode_tile`] or [`create_png_auto`] for automatic mode selection.
//! Output is deterministic: the same pixels always produce the same bytes.

use georef_common::{GeorefError, GeorefResult};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::pyramid::Tile;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode a rendered tile.
pub fn encode_tile(tile: &Tile) -> GeorefResult<Vec<u8>> {
    create_png_auto(
        tile.pixels.pixels(),
        tile.pixels.width() as usize,
        tile.pixels.height() as usize,
    )
}

/// Create a PNG image with automatic format selection.
///
/// Fully transparent pixels are normalized to `[0, 0, 0, 0]` first, so
/// leftover colour under alpha 0 never costs a palette slot.
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> GeorefResult<Vec<u8>> {
    check_len(pixels, width, height)?;

    let normalized: Vec<u8>;
    let pixels = if pixels.chunks_exact(4).any(|p| p[3] == 0 && p[..3] != [0, 0, 0]) {
        normalized = pixels
            .chunks_exact(4)
            .flat_map(|p| if p[3] == 0 { [0, 0, 0, 0] } else { [p[0], p[1], p[2], p[3]] })
            .collect();
        &normalized[..]
    } else {
        pixels
    };

    let num_pixels = pixels.len() / 4;
    let palette_result = if num_pixels >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette_result {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(pixels, width, height),
    }
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Unpack u32 back to RGBA tuple
#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8, u8) {
    (
        packed as u8,
        (packed >> 8) as u8,
        (packed >> 16) as u8,
        (packed >> 24) as u8,
    )
}

/// Sequential palette extraction for small images. Palette order is first appearance.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8, u8)>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images. Palette order is ascending packed colour.
///
/// 1. Collect unique colors per chunk in parallel
/// 2. Merge, sort and check the count
/// 3. Map each pixel to its palette index in parallel
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8, u8)>, Vec<u8>)> {
    let chunk_size = (pixels.len() / 4 / rayon::current_num_threads()).max(256) * 4;

    let mut unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_size)
        .flat_map_iter(|chunk| {
            let mut local_colors: HashSet<u32> = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for pixel in chunk.chunks_exact(4) {
                local_colors.insert(pack_color(pixel[0], pixel[1], pixel[2], pixel[3]));
                // Early exit if we definitely have too many colors
                if local_colors.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local_colors.into_iter()
        })
        .collect();

    unique_colors.sort_unstable();
    unique_colors.dedup();
    if unique_colors.len() > MAX_PALETTE_SIZE {
        return None;
    }

    let global_colors: HashMap<u32, u8> = unique_colors
        .iter()
        .enumerate()
        .map(|(i, &packed)| (packed, i as u8))
        .collect();
    let palette: Vec<(u8, u8, u8, u8)> = unique_colors.iter().map(|&c| unpack_color(c)).collect();

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|p| {
            global_colors
                .get(&pack_color(p[0], p[1], p[2], p[3]))
                .copied()
                .unwrap_or(0)
        })
        .collect();

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> GeorefResult<Vec<u8>> {
    if indices.len() != width * height {
        return Err(GeorefError::Encode(format!(
            "{}x{} indexed image needs {} indices, got {}",
            width,
            height,
            width * height,
            indices.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    // PLTE chunk (palette)
    let mut plte_data = Vec::with_capacity(palette.len() * 3);
    for (r, g, b, _) in palette {
        plte_data.extend_from_slice(&[*r, *g, *b]);
    }
    write_chunk(&mut png, b"PLTE", &plte_data);

    // tRNS chunk (transparency) - only if any color has alpha < 255
    if palette.iter().any(|(_, _, _, a)| *a < 255) {
        let trns_data: Vec<u8> = palette.iter().map(|(_, _, _, a)| *a).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    let idat_data = deflate_scanlines(indices, width, height, 1)?;
    write_chunk(&mut png, b"IDAT", &idat_data);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a PNG image from RGBA pixel data (color type 6).
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> GeorefResult<Vec<u8>> {
    check_len(pixels, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat_data = deflate_scanlines(pixels, width, height, 4)?;
    write_chunk(&mut png, b"IDAT", &idat_data);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn check_len(pixels: &[u8], width: usize, height: usize) -> GeorefResult<()> {
    if pixels.len() != width * height * 4 {
        return Err(GeorefError::Encode(format!(
            "{}x{} RGBA image needs {} bytes, got {}",
            width,
            height,
            width * height * 4,
            pixels.len()
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every scanline with filter byte 0 (none) and zlib-compress.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> GeorefResult<Vec<u8>> {
    let stride = width * bytes_per_pixel;
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in data.chunks_exact(stride.max(1)).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| GeorefError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| GeorefError::Encode(format!("IDAT compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_palette_simple() {
        // 4 pixels: red, green, blue, red (3 unique colors)
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red again
        ];

        let (palette, indices) = extract_palette_sequential(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_extract_palette_parallel_is_sorted() {
        // 128x128 = 16384 pixels, above PARALLEL_THRESHOLD
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let idx = ((x / 8) + (y / 8)) % 40;
                pixels.extend_from_slice(&[(idx * 5) as u8, 100, 200, 255]);
            }
        }

        let (palette, indices) = extract_palette_parallel(&pixels).unwrap();
        assert_eq!(palette.len(), 31);
        assert_eq!(indices.len(), 128 * 128);
        let packed: Vec<u32> = palette
            .iter()
            .map(|&(r, g, b, a)| pack_color(r, g, b, a))
            .collect();
        assert!(packed.windows(2).all(|w| w[0] < w[1]));

        // Every index points back at the pixel's colour
        for (i, p) in pixels.chunks_exact(4).enumerate().step_by(97) {
            let (r, g, b, a) = palette[indices[i] as usize];
            assert_eq!([r, g, b, a], [p[0], p[1], p[2], p[3]]);
        }
    }

    #[test]
    fn test_too_many_colors_has_no_palette() {
        let pixels: Vec<u8> = (0..300u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255])
            .collect();
        assert!(extract_palette_sequential(&pixels).is_none());
    }

    #[test]
    fn test_transparent_pixels_share_one_entry() {
        let pixels = [
            10, 20, 30, 0, //
            40, 50, 60, 0, //
            1, 2, 3, 255, //
            0, 0, 0, 0,
        ];
        let png = create_png_auto(&pixels, 2, 2).unwrap();
        // PLTE length field precedes the chunk type: two entries, 6 bytes
        let plte = png.windows(4).position(|w| w == b"PLTE").unwrap();
        assert_eq!(&png[plte - 4..plte], &6u32.to_be_bytes());
    }

    #[test]
    fn test_signature_and_chunks() {
        let pixels = [255u8, 0, 0, 255].repeat(4);
        let png = create_png(&pixels, 2, 2).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_wrong_length_is_encode_error() {
        let err = create_png(&[0u8; 7], 1, 2).unwrap_err();
        assert!(matches!(err, GeorefError::Encode(_)));
    }
}
