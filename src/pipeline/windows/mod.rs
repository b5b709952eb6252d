pub mod ani;
pub mod cur;
pub mod shadow;

pub use ani::to_ani;
pub use cur::to_cur;
pub use shadow::{ShadowConfig, apply_shadows};

use crate::error::Result;
use crate::model::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorFormat {
    Cur,
    Ani,
}

impl CursorFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CursorFormat::Cur => ".cur",
            CursorFormat::Ani => ".ani",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WinOptions {
    pub shadow: Option<ShadowConfig>,
}

impl WinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow(mut self) -> Self {
        self.shadow = Some(ShadowConfig::default());
        self
    }

    pub fn with_shadow_config(mut self, config: ShadowConfig) -> Self {
        self.shadow = Some(config);
        self
    }
}

/// Encode a cursor for Windows: `.cur` when static, `.ani` when animated.
pub fn to_win(cursor: &Cursor) -> Result<(&'static str, Vec<u8>)> {
    match cursor.frames() {
        [frame] => Ok((CursorFormat::Cur.extension(), to_cur(frame)?)),
        frames => Ok((CursorFormat::Ani.extension(), to_ani(frames)?)),
    }
}

/// [`to_win`] after the optional image-space post-processing.
pub fn to_win_with(mut cursor: Cursor, options: &WinOptions) -> Result<(&'static str, Vec<u8>)> {
    if let Some(ref shadow) = options.shadow {
        apply_shadows(&mut cursor, shadow);
    }
    to_win(&cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CursorFrame, CursorImage};
    use image::{Rgba, RgbaImage};

    fn cursor(frames: usize) -> Cursor {
        let frames = (0..frames)
            .map(|i| {
                let img = RgbaImage::from_pixel(32, 32, Rgba([i as u8, 0, 0, 255]));
                CursorFrame::new(vec![CursorImage::new(img, (0, 0), 32).unwrap()], 4).unwrap()
            })
            .collect();
        Cursor::new(frames).unwrap()
    }

    #[test]
    fn test_static_cursor_is_cur() {
        let (ext, data) = to_win(&cursor(1)).unwrap();
        assert_eq!(ext, ".cur");
        assert_eq!(&data[0..4], &[0x00, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn test_animated_cursor_is_ani() {
        let (ext, data) = to_win(&cursor(4)).unwrap();
        assert_eq!(ext, ".ani");
        assert_eq!((&data[0..4], &data[8..12]), (&b"RIFF"[..], &b"ACON"[..]));

        // anih payload starts after RIFF header (12) and chunk header (8)
        let frame_count = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
        assert_eq!(frame_count, 4);
    }

    #[test]
    fn test_shadow_option_changes_pixels_only() {
        let plain = to_win(&cursor(1)).unwrap();
        let shadowed = to_win_with(cursor(1), &WinOptions::new().with_shadow()).unwrap();
        assert_eq!(plain.0, shadowed.0);
        assert_eq!(&plain.1[0..6], &shadowed.1[0..6]);
    }
}
