use nom::{
    combinator::map,
    multi::fill,
    number::complete::u8 as byte,
    sequence::tuple,
    IResult,
};

use crate::command::response_code::{RETURN_ARROW, RETURN_BLOCK};
use crate::error::{Error, Result};

/// Amount of 2 byte fields in a single object record
const RECORD_FIELDS: usize = 5;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum RecordKind {
    Block,
    Arrow,
}

impl RecordKind {
    /// Anything that is not tagged as a block is assumed to be an arrow
    pub fn from_code(code: u8) -> Self {
        match code {
            RETURN_BLOCK => RecordKind::Block,
            RETURN_ARROW => RecordKind::Arrow,
            other => {
                log::warn!("Unexpected record code {:#04x}, decoding it as an arrow", other);
                RecordKind::Arrow
            }
        }
    }
}

/// Rectangular detection, `x` and `y` point to the center of the box
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct BoundingBox {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub id: u16,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct DirectionalMarker {
    pub x_tail: u16,
    pub y_tail: u16,
    pub x_head: u16,
    pub y_head: u16,
    pub id: u16,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum DetectedObject {
    Block(BoundingBox),
    Arrow(DirectionalMarker),
}

impl DetectedObject {
    /// Learned id, 0 for objects the camera was not taught
    pub fn id(&self) -> u16 {
        match self {
            DetectedObject::Block(b) => b.id,
            DetectedObject::Arrow(a) => a.id,
        }
    }

    pub fn is_learned(&self) -> bool {
        self.id() > 0
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            DetectedObject::Block(_) => RecordKind::Block,
            DetectedObject::Arrow(_) => RecordKind::Arrow,
        }
    }
}

/// Reassembles a field from its two wire bytes.
///
/// A non-zero high byte adds `255 + high` instead of `high * 256`. Both agree while the high byte
/// is 0 or 1, which covers the 320x240 screen, but they diverge above that.
// FIXME: Verify against a capture with a high byte of 2 or more before switching to u16::from_le_bytes
pub const fn decode_field(low: u8, high: u8) -> u16 {
    if high == 0 {
        low as u16
    } else {
        low as u16 + 255 + high as u16
    }
}

fn field(input: &[u8]) -> IResult<&[u8], u16> {
    map(tuple((byte, byte)), |(low, high)| decode_field(low, high))(input)
}

fn record_fields(input: &[u8]) -> IResult<&[u8], [u16; RECORD_FIELDS]> {
    let mut fields = [0u16; RECORD_FIELDS];
    let (input, ()) = fill(field, &mut fields)(input)?;
    Ok((input, fields))
}

/// Decodes the payload of a single object record
pub fn decode_record(kind: RecordKind, payload: &[u8]) -> Result<DetectedObject> {
    let (_, [a, b, c, d, id]) =
        record_fields(payload).map_err(|_| Error::InvalidData("object record is too short"))?;
    Ok(match kind {
        RecordKind::Block => DetectedObject::Block(BoundingBox {
            x: a,
            y: b,
            width: c,
            height: d,
            id,
        }),
        RecordKind::Arrow => DetectedObject::Arrow(DirectionalMarker {
            x_tail: a,
            y_tail: b,
            x_head: c,
            y_head: d,
            id,
        }),
    })
}
