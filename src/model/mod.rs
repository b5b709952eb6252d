pub mod cursor;

pub use cursor::{Cursor, CursorFrame, CursorImage, SizeSpec};
