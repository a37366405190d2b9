use super::IoAdapter;
use crate::error::{Error, Result};
use embedded_hal_nb::serial::{Read, Write};
use nb::block;

/// Adapter for `embedded-hal-nb` UART peripherals, every `WouldBlock` counts as an empty poll
pub struct EmbeddedHalNbAdapter<IO: Read + Write> {
    io: IO,
    peeked: Option<u8>,
}

impl<IO: Read + Write> EmbeddedHalNbAdapter<IO> {
    pub fn new(io: IO) -> Self {
        EmbeddedHalNbAdapter { io, peeked: None }
    }

    pub fn into_inner(self) -> IO {
        self.io
    }
}

impl<IO: Read + Write> IoAdapter for EmbeddedHalNbAdapter<IO> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        for b in buf {
            block!(self.io.write(*b)).map_err(|_| Error::EmbeddedHalNb)?;
        }
        block!(self.io.flush()).map_err(|_| Error::EmbeddedHalNb)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut count = 0;
        for b in buf.iter_mut() {
            if let Some(peeked) = self.peeked.take() {
                *b = peeked;
                count += 1;
                continue;
            }
            match self.io.read() {
                Ok(val) => {
                    *b = val;
                    count += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => return Err(Error::EmbeddedHalNb),
            }
        }
        Ok(count)
    }

    fn available(&mut self) -> Result<usize> {
        if self.peeked.is_none() {
            match self.io.read() {
                Ok(val) => self.peeked = Some(val),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(Error::EmbeddedHalNb),
            }
        }
        Ok(self.peeked.map_or(0, |_| 1))
    }
}
