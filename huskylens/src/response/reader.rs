use crate::error::{Error, Result};
use crate::frame::{checksum, decode_header, Frame, FrameHeader, HEAD_SIZE};
use crate::io_adapter::IoAdapter;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum ReadState {
    AwaitHeader,
    AwaitPayload(FrameHeader),
    AwaitChecksum(FrameHeader),
}

/// Reads exactly `n` bytes, spinning at most `polls` times on the adapter
fn read_exact<IO: IoAdapter>(io: &mut IO, n: usize, polls: u32) -> Result<Vec<u8>> {
    let data = io.read_exact_or_partial(n, polls)?;
    if data.len() < n {
        return Err(Error::ShortRead {
            expected: n,
            received: data.len(),
        });
    }
    Ok(data)
}

/// Reads one complete frame off the wire and validates its checksum
pub(crate) fn read_frame<IO: IoAdapter>(io: &mut IO, polls: u32) -> Result<Frame> {
    let mut raw = Vec::with_capacity(HEAD_SIZE);
    let mut state = ReadState::AwaitHeader;
    loop {
        state = match state {
            ReadState::AwaitHeader => {
                raw.extend(read_exact(io, HEAD_SIZE, polls)?);
                let mut head = [0u8; HEAD_SIZE];
                head.copy_from_slice(&raw[..HEAD_SIZE]);
                let header = decode_header(&head)?;
                if header.length == 0 {
                    ReadState::AwaitChecksum(header)
                } else {
                    ReadState::AwaitPayload(header)
                }
            }
            ReadState::AwaitPayload(header) => {
                raw.extend(read_exact(io, header.length.into(), polls)?);
                ReadState::AwaitChecksum(header)
            }
            ReadState::AwaitChecksum(header) => {
                let received = read_exact(io, 1, polls)?[0];
                let expected = checksum(&raw);
                log::trace!("Received {:02X?} {:02X}", raw, received);
                if expected != received {
                    log::warn!("Checksum error on frame {:02X?}", raw);
                    return Err(Error::Checksum { expected, received });
                }
                return Ok(Frame {
                    command: header.command,
                    payload: raw.split_off(HEAD_SIZE),
                });
            }
        }
    }
}
