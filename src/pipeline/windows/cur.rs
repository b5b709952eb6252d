use byteorder::{LittleEndian, WriteBytesExt};
use image::{ImageFormat, RgbaImage, imageops};
use std::io::{Cursor, Write};
use tracing::debug;

use crate::error::{CursorError, Result};
use crate::model::{CursorFrame, CursorImage};

const ICO_TYPE_CUR: u16 = 2;
const ICON_DIR_SIZE: usize = 6;
const ICON_DIR_ENTRY_SIZE: usize = 16;

/// Largest edge a CUR directory entry can describe.
pub const MAX_CUR_SIZE: u32 = 256;
/// Bitmaps at or below this edge are padded onto a canvas of this size.
pub const MIN_CANVAS: u32 = 32;

#[derive(Debug)]
struct IconDirEntry {
    width: u8,
    height: u8,
    color_count: u8,
    reserved: u8,
    hotspot_x: u16,
    hotspot_y: u16,
    size_bytes: u32,
    offset: u32,
}

impl IconDirEntry {
    fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u8(self.width)?;
        out.write_u8(self.height)?;
        out.write_u8(self.color_count)?;
        out.write_u8(self.reserved)?;
        out.write_u16::<LittleEndian>(self.hotspot_x)?;
        out.write_u16::<LittleEndian>(self.hotspot_y)?;
        out.write_u32::<LittleEndian>(self.size_bytes)?;
        out.write_u32::<LittleEndian>(self.offset)?;
        Ok(())
    }
}

/// Serialize one frame as a `.cur` file with PNG-compressed entries.
///
/// Entries are ordered largest first. Nothing is written when any image
/// exceeds 256 pixels on either edge.
pub fn to_cur(frame: &CursorFrame) -> Result<Vec<u8>> {
    let mut images: Vec<&CursorImage> = frame.images.iter().collect();
    images.sort_by(|a, b| b.width().cmp(&a.width()));

    if let Some(big) = images
        .iter()
        .find(|img| img.width() > MAX_CUR_SIZE || img.height() > MAX_CUR_SIZE)
    {
        return Err(CursorError::ImageTooLarge {
            width: big.width(),
            height: big.height(),
        });
    }

    let blobs = images
        .iter()
        .map(|img| encode_png(&img.image))
        .collect::<Result<Vec<_>>>()?;

    let mut output = Vec::new();
    output.write_u16::<LittleEndian>(0)?;
    output.write_u16::<LittleEndian>(ICO_TYPE_CUR)?;
    output.write_u16::<LittleEndian>(images.len() as u16)?;

    let mut offset = ICON_DIR_SIZE + images.len() * ICON_DIR_ENTRY_SIZE;
    for (img, blob) in images.iter().zip(&blobs) {
        // 256 wraps to 0, which the format reads back as 256
        let size_byte = (img.height() & 0xFF) as u8;
        IconDirEntry {
            width: size_byte,
            height: size_byte,
            color_count: 0,
            reserved: 0,
            hotspot_x: img.hotspot.0 as u16,
            hotspot_y: img.hotspot.1 as u16,
            size_bytes: blob.len() as u32,
            offset: offset as u32,
        }
        .write_to(&mut output)?;

        debug!(
            nominal = img.nominal,
            width = img.width(),
            bytes = blob.len(),
            offset,
            "cur directory entry"
        );
        offset += blob.len();
    }

    for blob in &blobs {
        output.write_all(blob)?;
    }

    Ok(output)
}

/// PNG-encode a cursor bitmap. Glyphs up to 32px go top-left on a 32x32 canvas.
fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut blob = Cursor::new(Vec::new());

    if image.width().max(image.height()) <= MIN_CANVAS {
        let mut canvas = RgbaImage::new(MIN_CANVAS, MIN_CANVAS);
        imageops::replace(&mut canvas, image, 0, 0);
        canvas.write_to(&mut blob, ImageFormat::Png)?;
    } else {
        image.write_to(&mut blob, ImageFormat::Png)?;
    }

    Ok(blob.into_inner())
}
