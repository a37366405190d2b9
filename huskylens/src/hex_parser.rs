use crate::{
    error::Error,
    frame::{align_frame, parse_frame, Frame},
};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::multispace0,
    combinator::{all_consuming, map_res},
    multi::many1,
    sequence::delimited,
    IResult,
};

/// Decodes a pair of chars formatted as hex into a byte. For example "FF" -> 255
fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |hex| u8::from_str_radix(hex, 16),
    )(input)
}

/// Parses a whitespace separated hex dump, as printed by most serial sniffers
pub fn parse_hex_str(input: &str) -> IResult<&str, Vec<u8>> {
    all_consuming(many1(delimited(multispace0, hex_byte, multispace0)))(input)
}

/// Decodes a hex dump of camera output into frames. Leading garbage is skipped, a trailing
/// partial frame is ignored.
pub fn decode_from_string(input: &str) -> Result<Vec<Frame>, Error> {
    let (_, data) =
        parse_hex_str(input).map_err(|_| Error::InvalidData("Could not parse hex file"))?;
    let (mut data, _) = align_frame(&data)
        .map_err(|_| Error::InvalidData("Could not find a start of a valid frame"))?;
    let mut frames = Vec::new();
    loop {
        match parse_frame(data) {
            Ok((rest, frame)) => {
                data = rest;
                frames.push(frame);
            }
            Err(nom::Err::Incomplete(_)) => break,
            Err(_) => return Err(Error::InvalidData("Could not parse frame correctly")),
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::{
        error::{make_error, ErrorKind},
        Err::Error,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn hex_byte_parser() {
        assert_eq!(hex_byte("FF"), Ok(("", 255)));
        assert_eq!(hex_byte("ff"), Ok(("", 255)));
        assert!(hex_byte("NH").is_err());
    }

    #[test]
    fn hex_str_parser() {
        assert_eq!(parse_hex_str("DEADBEEF"), Ok(("", vec![0xDE, 0xAD, 0xBE, 0xEF])));
        assert_eq!(
            parse_hex_str(" DE   AD\nBE EF  \n"),
            Ok(("", vec![0xDE, 0xAD, 0xBE, 0xEF]))
        );
        assert_eq!(
            parse_hex_str("NOT HEX"),
            Err(Error(make_error("NOT HEX", ErrorKind::TakeWhileMN)))
        );
        assert_eq!(
            parse_hex_str("DE AD BE EF NO TH EX"),
            Err(Error(make_error("NO TH EX", ErrorKind::Eof)))
        );
    }

    #[test]
    fn corrupted_frame_in_dump() {
        assert!(decode_from_string("55 AA 11 00 2E 3F").is_err());
    }

    #[test]
    fn trailing_partial_frame() {
        let frames = decode_from_string("55 AA 11 00 2E 3E 55 AA 11 0A").unwrap();
        assert_eq!(frames.len(), 1);
    }
}
