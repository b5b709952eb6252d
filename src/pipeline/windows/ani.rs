use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Seek, SeekFrom, Write};
use tracing::debug;

use super::cur::to_cur;
use crate::error::{CursorError, Result};
use crate::model::CursorFrame;

const SIGNATURE: &[u8] = b"RIFF";
const ANI_TYPE: &[u8] = b"ACON";
const HEADER_CHUNK: &[u8] = b"anih";
const LIST_CHUNK: &[u8] = b"LIST";
const RATE_CHUNK: &[u8] = b"rate";
const FRAME_TYPE: &[u8] = b"fram";
const ICON_CHUNK: &[u8] = b"icon";

const ANIH_SIZE: u32 = 36;
const ICON_FLAG: u32 = 0x1;

/// Multiplier from a frame's delay to the jiffy count stored in `rate`.
pub const ANI_RATE_FACTOR: u32 = 2;

#[derive(Debug)]
struct AnihHeader {
    size: u32,
    frame_count: u32,
    step_count: u32,
    width: u32,
    height: u32,
    bit_count: u32,
    planes: u32,
    display_rate: u32,
    flags: u32,
}

impl AnihHeader {
    fn for_frames(count: u32) -> Self {
        Self {
            size: ANIH_SIZE,
            frame_count: count,
            step_count: count,
            width: 0,
            height: 0,
            bit_count: 32,
            planes: 1,
            display_rate: 1,
            flags: ICON_FLAG,
        }
    }

    fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(HEADER_CHUNK)?;
        out.write_u32::<LittleEndian>(self.size)?;
        for field in [
            self.size,
            self.frame_count,
            self.step_count,
            self.width,
            self.height,
            self.bit_count,
            self.planes,
            self.display_rate,
            self.flags,
        ] {
            out.write_u32::<LittleEndian>(field)?;
        }
        Ok(())
    }
}

/// Serialize frames as a RIFF `ACON` animated cursor.
///
/// Every frame becomes an embedded `.cur` in the `fram` list. Chunk
/// lengths are patched once the body is in memory.
pub fn to_ani(frames: &[CursorFrame]) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(CursorError::EmptyInput("an animated cursor needs frames"));
    }
    let count = frames.len() as u32;

    let mut buf = Cursor::new(Vec::new());

    buf.write_all(SIGNATURE)?;
    let riff_len_pos = buf.position();
    buf.write_u32::<LittleEndian>(0)?;
    let riff_len_start = buf.position();
    buf.write_all(ANI_TYPE)?;

    AnihHeader::for_frames(count).write_to(&mut buf)?;

    buf.write_all(LIST_CHUNK)?;
    let list_len_pos = buf.position();
    buf.write_u32::<LittleEndian>(0)?;
    let list_len_start = buf.position();
    buf.write_all(FRAME_TYPE)?;

    for (idx, frame) in frames.iter().enumerate() {
        let cur = to_cur(frame)?;
        buf.write_all(ICON_CHUNK)?;
        buf.write_u32::<LittleEndian>(cur.len() as u32)?;
        buf.write_all(&cur)?;
        // RIFF chunks are word aligned
        if cur.len() & 1 != 0 {
            buf.write_u8(0)?;
        }
        debug!(frame = idx, bytes = cur.len(), "ani icon chunk");
    }
    let list_end = buf.position();

    buf.write_all(RATE_CHUNK)?;
    buf.write_u32::<LittleEndian>(4 * count)?;
    for frame in frames {
        buf.write_u32::<LittleEndian>(frame.delay.saturating_mul(ANI_RATE_FACTOR))?;
    }
    let end = buf.position();

    buf.seek(SeekFrom::Start(list_len_pos))?;
    buf.write_u32::<LittleEndian>((list_end - list_len_start) as u32)?;
    buf.seek(SeekFrom::Start(riff_len_pos))?;
    buf.write_u32::<LittleEndian>((end - riff_len_start) as u32)?;

    Ok(buf.into_inner())
}
