use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use tracing::debug;

use crate::error::{CursorError, Result};
use crate::model::CursorFrame;

const MAGIC: &[u8] = b"Xcur";
const VERSION: u32 = 0x0001_0000;
const FILE_HEADER_SIZE: u32 = 16;
const TOC_ENTRY_SIZE: u32 = 12;
const IMAGE_HEADER_SIZE: u32 = 36;
const IMAGE_VERSION: u32 = 1;

pub const CHUNK_IMAGE: u32 = 0xFFFD_0002;

struct ImageChunk {
    nominal: u32,
    width: u32,
    height: u32,
    hotspot_x: u32,
    hotspot_y: u32,
    delay: u32,
    pixels: Vec<u8>,
}

impl ImageChunk {
    fn len(&self) -> u32 {
        IMAGE_HEADER_SIZE + self.pixels.len() as u32
    }
}

/// Serialize frames as an Xcursor file.
///
/// Images are emitted frame by frame in stored order; the table of
/// contents follows the same order.
pub fn to_x11(frames: &[CursorFrame]) -> Result<Vec<u8>> {
    let chunks: Vec<ImageChunk> = frames
        .iter()
        .flat_map(|frame| {
            frame.images.iter().map(move |cursor| ImageChunk {
                nominal: cursor.nominal,
                width: cursor.image.width(),
                height: cursor.image.height(),
                hotspot_x: cursor.hotspot.0,
                hotspot_y: cursor.hotspot.1,
                delay: frame.delay,
                pixels: premultiply_alpha(&cursor.image),
            })
        })
        .collect();

    if chunks.is_empty() {
        return Err(CursorError::EmptyInput("an Xcursor file needs images"));
    }

    let total: usize = chunks.iter().map(|c| c.len() as usize).sum();
    let mut output = Vec::with_capacity(
        (FILE_HEADER_SIZE + TOC_ENTRY_SIZE * chunks.len() as u32) as usize + total,
    );

    output.write_all(MAGIC)?;
    output.write_u32::<LittleEndian>(FILE_HEADER_SIZE)?;
    output.write_u32::<LittleEndian>(VERSION)?;
    output.write_u32::<LittleEndian>(chunks.len() as u32)?;

    let mut offset = FILE_HEADER_SIZE + TOC_ENTRY_SIZE * chunks.len() as u32;
    for chunk in &chunks {
        output.write_u32::<LittleEndian>(CHUNK_IMAGE)?;
        output.write_u32::<LittleEndian>(chunk.nominal)?;
        output.write_u32::<LittleEndian>(offset)?;
        offset += chunk.len();
    }

    for chunk in &chunks {
        output.write_u32::<LittleEndian>(IMAGE_HEADER_SIZE)?;
        output.write_u32::<LittleEndian>(CHUNK_IMAGE)?;
        output.write_u32::<LittleEndian>(chunk.nominal)?;
        output.write_u32::<LittleEndian>(IMAGE_VERSION)?;
        output.write_u32::<LittleEndian>(chunk.width)?;
        output.write_u32::<LittleEndian>(chunk.height)?;
        output.write_u32::<LittleEndian>(chunk.hotspot_x)?;
        output.write_u32::<LittleEndian>(chunk.hotspot_y)?;
        output.write_u32::<LittleEndian>(chunk.delay)?;
        output.write_all(&chunk.pixels)?;
    }

    debug!(images = chunks.len(), bytes = output.len(), "encoded xcursor");
    Ok(output)
}

/// BGRA bytes with colour channels premultiplied by alpha.
fn premultiply_alpha(image: &image::RgbaImage) -> Vec<u8> {
    let mut result = Vec::with_capacity((image.width() * image.height() * 4) as usize);

    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha_factor = a as f64 / 255.0;

        result.push((b as f64 * alpha_factor) as u8);
        result.push((g as f64 * alpha_factor) as u8);
        result.push((r as f64 * alpha_factor) as u8);
        result.push(a);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CursorImage;
    use image::{Rgba, RgbaImage};

    fn u32_at(data: &[u8], pos: usize) -> u32 {
        u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
    }

    fn frame(sizes: &[u32], delay: u32) -> CursorFrame {
        let images = sizes
            .iter()
            .map(|&size| {
                let img = RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255]));
                CursorImage::new(img, (size / 2, size / 2), size).unwrap()
            })
            .collect();
        CursorFrame::new(images, delay).unwrap()
    }

    #[test]
    fn test_premultiply_alpha() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 128]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 255]));

        let result = premultiply_alpha(&img);

        assert!(result[0] >= 127 && result[0] <= 128);
        assert!(result[1] >= 127 && result[1] <= 128);
        assert!(result[2] >= 127 && result[2] <= 128);
        assert_eq!(result[3], 128);

        assert_eq!(&result[4..8], &[0, 0, 255, 255]);
        assert_eq!(result.len(), 16);
    }

    #[test]
    fn test_toc_matches_images() {
        let frames = vec![frame(&[10, 20], 5), frame(&[10, 20], 5)];
        let data = to_x11(&frames).unwrap();

        assert_eq!(&data[0..4], b"Xcur");
        assert_eq!(u32_at(&data, 4), 16);
        assert_eq!(u32_at(&data, 8), 0x0001_0000);
        assert_eq!(u32_at(&data, 12), 4);

        let mut subtypes = Vec::new();
        for i in 0..4 {
            let toc = 16 + i * 12;
            assert_eq!(u32_at(&data, toc), CHUNK_IMAGE);
            let subtype = u32_at(&data, toc + 4);
            let position = u32_at(&data, toc + 8) as usize;
            subtypes.push(subtype);

            assert_eq!(u32_at(&data, position), 36);
            assert_eq!(u32_at(&data, position + 4), CHUNK_IMAGE);
            assert_eq!(u32_at(&data, position + 8), subtype);
            assert_eq!(u32_at(&data, position + 16), subtype);
            assert_eq!(u32_at(&data, position + 32), 5);
        }
        assert_eq!(subtypes, vec![10, 20, 10, 20]);

        let pixels: usize = 2 * (10 * 10 + 20 * 20) * 4;
        assert_eq!(data.len(), 16 + 4 * 12 + 4 * 36 + pixels);
    }

    #[test]
    fn test_parses_with_xcursor_crate() {
        let frames = vec![frame(&[24], 30), frame(&[24], 30), frame(&[24], 30)];
        let data = to_x11(&frames).unwrap();

        let images = xcursor::parser::parse_xcursor(&data).unwrap();
        assert_eq!(images.len(), 3);
        for image in images {
            assert_eq!(image.size, 24);
            assert_eq!((image.width, image.height), (24, 24));
            assert_eq!((image.xhot, image.yhot), (12, 12));
            assert_eq!(image.delay, 30);
        }
    }

    #[test]
    fn test_stored_order_kept() {
        let frames = vec![frame(&[48, 16, 32], 0)];
        let data = to_x11(&frames).unwrap();
        let subtypes: Vec<u32> = (0..3).map(|i| u32_at(&data, 16 + i * 12 + 4)).collect();
        assert_eq!(subtypes, vec![48, 16, 32]);
    }
}
