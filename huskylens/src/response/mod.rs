pub mod interpreter;
pub(crate) mod reader;

use nom::{
    number::complete::le_u16,
    sequence::tuple,
    IResult,
};

use crate::error::{Error, Result};
use crate::object::DetectedObject;

pub use interpreter::{Interpreter, Step};

/// Result of a single request
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ResponseBatch {
    Acknowledge,
    Detections(Detections),
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Detections {
    pub objects: Vec<DetectedObject>,
    /// Amount of ids the camera has learned so far
    pub learned_count: u16,
    pub frame_number: u16,
}

/// Payload of an info frame, announces how many object records follow it
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Info {
    pub object_count: u16,
    pub learned_count: u16,
    pub frame_number: u16,
}

/// Info payload is at least 3 little endian u16 counters, any trailing bytes are reserved
pub fn parse_info(payload: &[u8]) -> IResult<&[u8], Info> {
    let (rest, (object_count, learned_count, frame_number)) =
        tuple((le_u16, le_u16, le_u16))(payload)?;
    Ok((
        rest,
        Info {
            object_count,
            learned_count,
            frame_number,
        },
    ))
}

impl ResponseBatch {
    pub fn is_acknowledge(&self) -> bool {
        matches!(self, ResponseBatch::Acknowledge)
    }

    pub fn into_detections(self) -> Result<Detections> {
        match self {
            ResponseBatch::Detections(d) => Ok(d),
            ResponseBatch::Acknowledge => Err(Error::UnexpectedResponse),
        }
    }

    /// Falls back to an empty detection list when the request failed. The error is only logged.
    pub fn or_empty(result: Result<ResponseBatch>) -> ResponseBatch {
        result.unwrap_or_else(|e| {
            log::warn!("Request failed, using empty detection list: {}", e);
            ResponseBatch::Detections(Detections::default())
        })
    }
}

/// Objects carried by a batch, an acknowledge carries none
pub fn decode_objects(batch: ResponseBatch) -> Vec<DetectedObject> {
    match batch {
        ResponseBatch::Detections(d) => d.objects,
        ResponseBatch::Acknowledge => Vec::new(),
    }
}
