use image::{Rgba, RgbaImage, imageops};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

use crate::model::Cursor;

/// Drop shadow drawn under Windows cursors. Distances are percentages of
/// the canvas edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub color: [u8; 4],
    pub blur: f32,
    pub down_shift: f32,
    pub right_shift: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 64],
            blur: 3.125,
            down_shift: 3.125,
            right_shift: 9.375,
        }
    }
}

pub fn apply_shadows(cursor: &mut Cursor, config: &ShadowConfig) {
    for frame in cursor.frames_mut() {
        for image in &mut frame.images {
            image.image = apply_shadow_to_image(&image.image, config);
        }
    }
}

/// Composite `image` over a tinted, blurred and shifted copy of itself.
/// The result keeps the input dimensions.
pub fn apply_shadow_to_image(image: &RgbaImage, config: &ShadowConfig) -> RgbaImage {
    let (width, height) = image.dimensions();

    let blur_px = width as f32 / 100.0 * config.blur;
    let mut right_px = (width as f32 / 100.0 * config.right_shift) as i64;
    let mut down_px = (height as f32 / 100.0 * config.down_shift) as i64;

    let mut shadow = tint(image, config.color);

    if blur_px > 0.0 {
        // grow the layer so the blur has room to spread past the glyph edge
        let pad = blur_px.ceil() as u32;
        let mut grown = RgbaImage::new(width + 2 * pad, height + 2 * pad);
        imageops::replace(&mut grown, &shadow, pad as i64, pad as i64);
        shadow = gaussian_blur_f32(&grown, blur_px);
        right_px -= pad as i64;
        down_px -= pad as i64;
    }

    let mut result = RgbaImage::new(width, height);
    imageops::replace(&mut result, &shadow, right_px, down_px);
    imageops::overlay(&mut result, image, 0, 0);
    result
}

/// Silhouette of `image` in `color`, alpha scaled by the source coverage.
fn tint(image: &RgbaImage, color: [u8; 4]) -> RgbaImage {
    let mut shadow = RgbaImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = pixel[3];
        if alpha > 0 {
            let a = (color[3] as f32 * (alpha as f32 / 255.0)) as u8;
            shadow.put_pixel(x, y, Rgba([color[0], color[1], color[2], a]));
        }
    }
    shadow
}
