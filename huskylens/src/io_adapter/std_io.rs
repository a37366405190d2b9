use super::{is_empty_read, IoAdapter};
use crate::error::Result;
use std::io::{Read, Write};

/// Adapter over anything implementing `std::io::{Read, Write}`, e.g. a serial port with a short
/// read timeout
pub struct StdIoAdapter<IO: Read + Write> {
    io: IO,
    // Byte consumed by `available` which was not handed out yet
    peeked: Option<u8>,
}

impl<IO: Read + Write> IoAdapter for StdIoAdapter<IO> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.io.write_all(buf)?;
        self.io.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut count = 0;
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            count = 1;
        }
        match self.io.read(&mut buf[count..]) {
            Ok(n) => Ok(count + n),
            // Nothing arrived during the port timeout
            Err(e) if is_empty_read(e.kind()) => Ok(count),
            // Hand out the peeked byte, the error shows up again on the next read
            Err(_) if count > 0 => Ok(count),
            Err(e) => Err(e.into()),
        }
    }

    fn available(&mut self) -> Result<usize> {
        if self.peeked.is_none() {
            let mut b = [0u8; 1];
            match self.io.read(&mut b) {
                Ok(1) => self.peeked = Some(b[0]),
                Ok(_) => {}
                Err(e) if is_empty_read(e.kind()) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.peeked.map_or(0, |_| 1))
    }
}

impl<IO: Read + Write> StdIoAdapter<IO> {
    pub fn new(io: IO) -> Self {
        StdIoAdapter { io, peeked: None }
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}
