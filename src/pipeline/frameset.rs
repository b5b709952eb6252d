// Frame-set assembly for size-grouped animation manifests

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CursorError, Result};
use crate::model::{Cursor, CursorFrame, CursorImage};

/// One manifest line: a bitmap at one size for one animation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSetEntry {
    pub size: u32,
    pub xhot: u32,
    pub yhot: u32,
    pub path: PathBuf,
    /// 0 means no explicit timing.
    pub duration: u32,
}

impl FrameSetEntry {
    pub fn new(size: u32, xhot: u32, yhot: u32, path: impl Into<PathBuf>, duration: u32) -> Self {
        Self {
            size,
            xhot,
            yhot,
            path: path.into(),
            duration,
        }
    }
}

/// Group size runs into columns, one column per animation step.
///
/// Entries must arrive grouped by size. Every run must have as many
/// entries as the others and every column must agree on its duration.
/// Columns come back ordered by descending size of their first entry.
pub fn assemble(entries: Vec<FrameSetEntry>) -> Result<Vec<Vec<FrameSetEntry>>> {
    if entries.is_empty() {
        return Err(CursorError::EmptyInput("frame-set manifest has no entries"));
    }

    let mut framesets: Vec<Vec<FrameSetEntry>> = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<u32> = None;
    let mut counter = 0usize;

    for (index, entry) in entries.into_iter().enumerate() {
        if current != Some(entry.size) {
            if !seen.insert(entry.size) {
                return Err(CursorError::NotSorted {
                    index,
                    size: entry.size,
                });
            }
            current = Some(entry.size);
            counter = 0;
        }

        if counter >= framesets.len() {
            framesets.push(Vec::new());
        }
        framesets[counter].push(entry);
        counter += 1;
    }

    for (frameset_index, pair) in framesets.windows(2).enumerate() {
        if pair[0].len() != pair[1].len() {
            return Err(CursorError::SizeMismatch {
                frameset_index: frameset_index + 1,
                got: pair[1].len(),
                expected: pair[0].len(),
            });
        }
    }

    for (frameset_index, frameset) in framesets.iter().enumerate() {
        for pair in frameset.windows(2) {
            if pair[0].duration != pair[1].duration {
                return Err(CursorError::DurationMismatch {
                    frameset_index,
                    got: pair[1].duration,
                    expected: pair[0].duration,
                    size: pair[1].size,
                });
            }
        }
    }

    // stable: columns with the same leading size keep their step order
    framesets.sort_by(|a, b| b[0].size.cmp(&a[0].size));

    debug!(
        columns = framesets.len(),
        sizes = framesets[0].len(),
        "assembled framesets"
    );
    Ok(framesets)
}

/// True when some size with explicit timing shows up more than once.
pub fn frames_have_animation(entries: &[FrameSetEntry]) -> bool {
    let mut sizes = HashSet::new();
    entries
        .iter()
        .filter(|entry| entry.duration != 0)
        .any(|entry| !sizes.insert(entry.size))
}

/// Decode the bitmaps of assembled columns into a cursor, one frame per column.
pub fn load_framesets(framesets: &[Vec<FrameSetEntry>]) -> Result<Cursor> {
    let frames = framesets
        .iter()
        .map(|frameset| {
            let images = frameset
                .iter()
                .map(|entry| {
                    let blob = fs::read(&entry.path)?;
                    let image = image::load_from_memory(&blob)
                        .map_err(CursorError::UnsupportedFormat)?
                        .to_rgba8();
                    CursorImage::new(image, (entry.xhot, entry.yhot), entry.size)
                })
                .collect::<Result<Vec<_>>>()?;

            let delay = frameset.first().map(|entry| entry.duration).unwrap_or(0);
            CursorFrame::new(images, delay)
        })
        .collect::<Result<Vec<_>>>()?;

    Cursor::new(frames)
}

/// Parse `<size> <xhot> <yhot> <path> [<duration>]` lines.
///
/// Hotspots in manifests are 1-based. Relative paths resolve against `base_dir`.
pub fn parse_manifest(text: &str, base_dir: &Path) -> Result<Vec<FrameSetEntry>> {
    let mut entries = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(CursorError::Manifest {
                line: line_no,
                reason: format!("expected at least 4 fields, found {}", parts.len()),
            });
        }

        let number = |field: &str, value: &str| {
            value.parse::<u32>().map_err(|e| CursorError::Manifest {
                line: line_no,
                reason: format!("invalid {} '{}': {}", field, value, e),
            })
        };

        let size = number("size", parts[0])?;
        let xhot = number("xhot", parts[1])?.saturating_sub(1);
        let yhot = number("yhot", parts[2])?.saturating_sub(1);

        let (file_name, duration) = match parts.last().map(|last| last.parse::<u32>()) {
            Some(Ok(duration)) if parts.len() > 4 => {
                (parts[3..parts.len() - 1].join(" "), duration)
            }
            _ => (parts[3..].join(" "), 0),
        };

        let path = if Path::new(&file_name).is_absolute() {
            PathBuf::from(file_name)
        } else {
            base_dir.join(file_name)
        };

        entries.push(FrameSetEntry {
            size,
            xhot,
            yhot,
            path,
            duration,
        });
    }

    Ok(entries)
}

/// Read a manifest file, resolving bitmaps next to it.
pub fn load_manifest(path: &Path) -> Result<Vec<FrameSetEntry>> {
    let text = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest(&text, base_dir)
}
