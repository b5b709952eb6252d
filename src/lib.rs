// Library exports for clickgen

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;

pub use error::{CursorError, Result};
pub use model::{Cursor, CursorFrame, CursorImage, SizeSpec};
pub use pipeline::{ingest, to_win, to_x11};
