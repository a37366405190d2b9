use core::fmt::{self, Display};

use nom::{
    bytes::streaming::{tag, take},
    combinator::{peek, verify},
    error::{Error as NomError, ErrorKind},
    number::streaming::u8 as byte,
    sequence::tuple,
    IResult, Needed,
};

use crate::error::{Error, Result};

/// Sync bytes every frame starts with, in both directions
pub const HEADER: &[u8] = &[0x55, 0xAA];
/// Fixed address of the camera
pub const ADDRESS: u8 = 0x11;
/// Sync header + address + payload length + command
pub const HEAD_SIZE: usize = 5;
/// Payload length is a single byte on the wire
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct FrameHeader {
    pub address: u8,
    pub length: u8,
    pub command: u8,
}

/// Frame which already passed checksum validation
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Frame {
    pub command: u8,
    pub payload: Vec<u8>,
}

impl Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command {:#04x}, {} bytes:", self.command, self.payload.len())?;
        for b in &self.payload {
            write!(f, " {:02X}", b)?;
        }
        Ok(())
    }
}

/// Low byte of the sum of all bytes
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |accum, b| accum.wrapping_add(*b))
}

pub fn verify_checksum(body: &[u8], received: u8) -> bool {
    checksum(body) == received
}

/// Builds a complete request frame ready to be written to the camera
pub fn encode(opcode: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let length = u8::try_from(payload.len()).map_err(|_| Error::Encoding(payload.len()))?;
    let mut msg = Vec::with_capacity(HEAD_SIZE + payload.len() + 1);
    msg.extend_from_slice(HEADER);
    msg.extend_from_slice(&[ADDRESS, length, opcode]);
    msg.extend_from_slice(payload);
    msg.push(checksum(&msg));
    Ok(msg)
}

pub fn parse_header(input: &[u8]) -> IResult<&[u8], FrameHeader> {
    let (input, (_, address, length, command)) = tuple((
        tag(HEADER),
        verify(byte, |a: &u8| *a == ADDRESS),
        byte,
        byte,
    ))(input)?;
    Ok((
        input,
        FrameHeader {
            address,
            length,
            command,
        },
    ))
}

pub fn decode_header(head: &[u8; HEAD_SIZE]) -> Result<FrameHeader> {
    match parse_header(head) {
        Ok((_, header)) => Ok(header),
        Err(_) => Err(Error::MalformedHeader(head.to_vec())),
    }
}

/// Parses a single frame, failing with `ErrorKind::Verify` on checksum mismatch
pub fn parse_frame(input: &[u8]) -> IResult<&[u8], Frame> {
    let start = input;
    let (input, header) = parse_header(input)?;
    let (input, payload) = take(header.length)(input)?;
    let (input, received) = byte(input)?;

    if !verify_checksum(&start[..HEAD_SIZE + payload.len()], received) {
        return Err(nom::Err::Error(NomError::new(start, ErrorKind::Verify)));
    }
    Ok((
        input,
        Frame {
            command: header.command,
            payload: payload.to_vec(),
        },
    ))
}

/// Takes a byte slice and drops bytes until the first recognized frame header
pub fn align_frame(input: &[u8]) -> IResult<&[u8], ()> {
    for i in 0..input.len() {
        if peek(parse_header)(&input[i..]).is_ok() {
            return Ok((&input[i..], ()));
        }
    }
    Err(nom::Err::Incomplete(Needed::Unknown))
}
