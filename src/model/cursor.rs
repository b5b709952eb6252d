use image::RgbaImage;
use std::fmt;
use std::str::FromStr;

use crate::error::{CursorError, Result};

/// One bitmap registered under a nominal cursor size.
///
/// `nominal` is the size name used by Xcursor lookups. It can be smaller
/// than the physical bitmap when the render was padded onto a larger canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorImage {
    pub image: RgbaImage,
    pub hotspot: (u32, u32),
    pub nominal: u32,
}

impl CursorImage {
    pub fn new(image: RgbaImage, hotspot: (u32, u32), nominal: u32) -> Result<Self> {
        let (width, height) = image.dimensions();
        if hotspot.0 > width || hotspot.1 > height {
            return Err(CursorError::OutOfRange {
                x: hotspot.0,
                y: hotspot.1,
                width,
                height,
            });
        }
        Ok(Self {
            image,
            hotspot,
            nominal,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// One animation instant: the same picture at every requested resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorFrame {
    pub images: Vec<CursorImage>,
    pub delay: u32,
}

impl CursorFrame {
    pub fn new(images: Vec<CursorImage>, delay: u32) -> Result<Self> {
        if images.is_empty() {
            return Err(CursorError::EmptyInput("a cursor frame needs at least one image"));
        }
        Ok(Self { images, delay })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CursorImage> {
        self.images.iter()
    }
}

impl<'a> IntoIterator for &'a CursorFrame {
    type Item = &'a CursorImage;
    type IntoIter = std::slice::Iter<'a, CursorImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}

/// An ordered run of frames. A single frame is a static cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    frames: Vec<CursorFrame>,
}

impl Cursor {
    pub fn new(frames: Vec<CursorFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(CursorError::EmptyInput("a cursor needs at least one frame"));
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[CursorFrame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [CursorFrame] {
        &mut self.frames
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

/// Requested output resolution for ingestion.
///
/// `Canvas` renders the artwork at `size` and pastes it at the origin of a
/// transparent `canvas`x`canvas` bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeSpec {
    Size(u32),
    Canvas { size: u32, canvas: u32 },
}

impl SizeSpec {
    pub fn size(&self) -> u32 {
        match *self {
            SizeSpec::Size(size) | SizeSpec::Canvas { size, .. } => size,
        }
    }

    pub fn canvas(&self) -> u32 {
        match *self {
            SizeSpec::Size(size) => size,
            SizeSpec::Canvas { canvas, .. } => canvas,
        }
    }
}

impl From<u32> for SizeSpec {
    fn from(size: u32) -> Self {
        SizeSpec::Size(size)
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSpec::Size(size) => write!(f, "{}", size),
            SizeSpec::Canvas { size, canvas } => write!(f, "{}:{}", size, canvas),
        }
    }
}

impl FromStr for SizeSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid size '{}': {}", v.trim(), e))
        };

        match s.split_once(':') {
            Some((size, canvas)) => {
                let size = parse(size)?;
                let canvas = parse(canvas)?;
                if size == canvas {
                    Ok(SizeSpec::Size(size))
                } else {
                    Ok(SizeSpec::Canvas { size, canvas })
                }
            }
            None => Ok(SizeSpec::Size(parse(s)?)),
        }
    }
}
