pub mod bitmap;
pub mod builder;
pub mod frameset;
pub mod fs_ops;
pub mod windows;
pub mod xcursor_writer;

pub use bitmap::{DEFAULT_SIZES, ingest, ingest_images};
pub use builder::{BuildReport, ThemeBuilder};
pub use frameset::{FrameSetEntry, assemble, load_framesets};
pub use windows::{ShadowConfig, WinOptions, to_ani, to_cur, to_win, to_win_with};
pub use xcursor_writer::to_x11;
