use thiserror::Error;

/// Errors produced while turning bitmaps into cursor files.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("hotspot ({x}, {y}) lies outside the {width}x{height} image")]
    OutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(#[source] image::ImageError),

    #[error("nothing to build: {0}")]
    EmptyInput(&'static str),

    #[error("frames are not sorted: entry {index} has size {size}, which was already seen")]
    NotSorted { index: usize, size: u32 },

    #[error("frameset {frameset_index} has {got} entries, expected {expected}")]
    SizeMismatch {
        frameset_index: usize,
        got: usize,
        expected: usize,
    },

    #[error(
        "frameset {frameset_index} has duration {got} for size {size}, \
         but {expected} for the previous size"
    )]
    DurationMismatch {
        frameset_index: usize,
        got: u32,
        expected: u32,
        size: u32,
    },

    #[error("image too big for CUR format: {width}x{height}")]
    ImageTooLarge { width: u32, height: u32 },

    #[error("manifest line {line}: {reason}")]
    Manifest { line: usize, reason: String },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CursorError> = std::result::Result<T, E>;
