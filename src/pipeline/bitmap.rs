// Bitmap ingestion: raw artwork bytes -> cursor frames at every requested size

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::error::{CursorError, Result};
use crate::model::{Cursor, CursorFrame, CursorImage, SizeSpec};

/// Default Xcursor sizes used when a configuration does not name any.
pub const DEFAULT_SIZES: &[u32] = &[22, 24, 28, 32, 40, 48, 56, 64, 72, 80, 88, 96];

/// Decode every buffer and render it at each size spec.
///
/// One frame is produced per buffer, each holding one image per spec in
/// ascending size order. All frames share `delay`.
pub fn ingest<B: AsRef<[u8]>>(
    frames: &[B],
    hotspot: (u32, u32),
    sizes: &[SizeSpec],
    delay: u32,
) -> Result<Cursor> {
    if frames.is_empty() {
        return Err(CursorError::EmptyInput("no bitmap frames were given"));
    }

    let images = frames
        .iter()
        .map(|blob| {
            image::load_from_memory(blob.as_ref())
                .map(|img| img.to_rgba8())
                .map_err(CursorError::UnsupportedFormat)
        })
        .collect::<Result<Vec<_>>>()?;

    ingest_images(&images, hotspot, sizes, delay)
}

/// Same as [`ingest`] for bitmaps that are already decoded.
pub fn ingest_images(
    images: &[RgbaImage],
    hotspot: (u32, u32),
    sizes: &[SizeSpec],
    delay: u32,
) -> Result<Cursor> {
    if images.is_empty() {
        return Err(CursorError::EmptyInput("no bitmap frames were given"));
    }
    if sizes.is_empty() {
        return Err(CursorError::EmptyInput("no cursor sizes were requested"));
    }

    let mut specs = sizes.to_vec();
    specs.sort_by_key(|spec| (spec.size(), spec.canvas()));
    specs.dedup();

    let frames = images
        .iter()
        .map(|source| render_frame(source, hotspot, &specs, delay))
        .collect::<Result<Vec<_>>>()?;

    Cursor::new(frames)
}

fn render_frame(
    source: &RgbaImage,
    hotspot: (u32, u32),
    specs: &[SizeSpec],
    delay: u32,
) -> Result<CursorFrame> {
    let (width, height) = source.dimensions();
    if hotspot.0 > width || hotspot.1 > height {
        return Err(CursorError::OutOfRange {
            x: hotspot.0,
            y: hotspot.1,
            width,
            height,
        });
    }

    let mut images = Vec::with_capacity(specs.len());
    for spec in specs {
        let size = spec.size();
        let rendered = imageops::resize(source, size, size, FilterType::Lanczos3);
        let hot = scale_hotspot(hotspot, (width, height), (size, size));

        let image = match spec.canvas() {
            canvas if canvas == size => rendered,
            canvas => {
                let mut padded = RgbaImage::new(canvas, canvas);
                imageops::replace(&mut padded, &rendered, 0, 0);
                padded
            }
        };

        debug!(
            size,
            canvas = spec.canvas(),
            xhot = hot.0,
            yhot = hot.1,
            "rendered cursor image"
        );
        images.push(CursorImage::new(image, hot, size)?);
    }

    CursorFrame::new(images, delay)
}

/// Rescale a hotspot from the source dimensions to the rendered ones, per axis.
pub fn scale_hotspot(
    hotspot: (u32, u32),
    original: (u32, u32),
    rendered: (u32, u32),
) -> (u32, u32) {
    let axis = |hot: u32, from: u32, to: u32| -> u32 {
        if from == 0 {
            return 0;
        }
        (hot as f64 * to as f64 / from as f64).round() as u32
    };

    (
        axis(hotspot.0, original.0, rendered.0),
        axis(hotspot.1, original.1, rendered.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor as IoCursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]);
        }
        let mut out = IoCursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_plain_size_dimensions() {
        let blob = png_bytes(50, 50);
        let cursor = ingest(&[blob], (10, 10), &[SizeSpec::Size(24)], 0).unwrap();

        let image = &cursor.frames()[0].images[0];
        assert_eq!(image.image.dimensions(), (24, 24));
        assert_eq!(image.nominal, 24);
    }

    #[test]
    fn test_canvas_dimensions_and_hotspot() {
        let blob = png_bytes(50, 50);
        let spec = SizeSpec::Canvas {
            size: 20,
            canvas: 32,
        };
        let cursor = ingest(&[blob], (25, 10), &[spec], 0).unwrap();

        let image = &cursor.frames()[0].images[0];
        assert_eq!(image.image.dimensions(), (32, 32));
        assert_eq!(image.nominal, 20);
        // scaled against the 20px render, not the 32px canvas
        assert_eq!(image.hotspot, (10, 4));
        // padding is transparent
        assert_eq!(image.image.get_pixel(31, 31)[3], 0);
    }

    #[test]
    fn test_hotspot_rounding_per_axis() {
        assert_eq!(scale_hotspot((3, 7), (40, 20), (10, 10)), (1, 4));
        assert_eq!(scale_hotspot((20, 20), (40, 40), (24, 24)), (12, 12));
        assert_eq!(scale_hotspot((5, 5), (10, 10), (3, 3)), (2, 2));
    }

    #[test]
    fn test_one_frame_per_buffer_sorted_sizes() {
        let blobs = vec![png_bytes(32, 32), png_bytes(32, 32), png_bytes(32, 32)];
        let sizes = [SizeSpec::Size(32), SizeSpec::Size(16), SizeSpec::Size(24)];
        let cursor = ingest(&blobs, (0, 0), &sizes, 7).unwrap();

        assert_eq!(cursor.frames().len(), 3);
        for frame in cursor.frames() {
            assert_eq!(frame.delay, 7);
            let nominals: Vec<u32> = frame.iter().map(|img| img.nominal).collect();
            assert_eq!(nominals, vec![16, 24, 32]);
        }
    }

    #[test]
    fn test_duplicate_sizes_collapse() {
        let blob = png_bytes(16, 16);
        let sizes = [SizeSpec::Size(16), SizeSpec::Size(16)];
        let cursor = ingest(&[blob], (0, 0), &sizes, 0).unwrap();
        assert_eq!(cursor.frames()[0].len(), 1);
    }

    #[test]
    fn test_hotspot_out_of_range() {
        let blob = png_bytes(20, 20);
        let err = ingest(&[blob], (21, 0), &[SizeSpec::Size(10)], 0).unwrap_err();
        assert!(matches!(err, CursorError::OutOfRange { x: 21, .. }));
    }

    #[test]
    fn test_undecodable_buffer() {
        let err = ingest(&[b"not an image".to_vec()], (0, 0), &[SizeSpec::Size(10)], 0)
            .unwrap_err();
        assert!(matches!(err, CursorError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_empty_inputs() {
        let none: Vec<Vec<u8>> = Vec::new();
        assert!(matches!(
            ingest(&none, (0, 0), &[SizeSpec::Size(10)], 0),
            Err(CursorError::EmptyInput(_))
        ));
        assert!(matches!(
            ingest(&[png_bytes(10, 10)], (0, 0), &[], 0),
            Err(CursorError::EmptyInput(_))
        ));
    }
}
