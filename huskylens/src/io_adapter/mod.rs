mod std_io;
#[cfg(feature = "embedded-hal-nb")]
mod embedded_hal;

#[cfg(feature = "embedded-hal-nb")]
pub use embedded_hal::EmbeddedHalNbAdapter;
pub use std_io::StdIoAdapter;

use crate::error::Result;
use std::io::ErrorKind;

/// Upper bound on bytes dropped by a single `flush_input`, a chatty device must not stall it
const MAX_FLUSH_BYTES: usize = 4096;

/// Read errors which only mean that nothing arrived during this poll
pub fn is_empty_read(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// Duplex byte channel the camera is connected through.
///
/// Opening and configuring the underlying port is left to the caller.
#[cfg_attr(test, mockall::automock)]
pub trait IoAdapter {
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Reads whatever is available right now, returning 0 is not an end of stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Amount of bytes that can be read without waiting, may underestimate
    fn available(&mut self) -> Result<usize>;

    /// Spins on `read` at most `polls` times, the result is shorter than `n` if data stopped
    /// arriving
    fn read_exact_or_partial(&mut self, n: usize, polls: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        for _ in 0..polls {
            if filled == n {
                break;
            }
            filled += self.read(&mut buf[filled..])?;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Drops stale input so that the next read starts on a frame boundary
    fn flush_input(&mut self) -> Result<()> {
        let mut scratch = [0u8; 64];
        let mut dropped = 0;
        while dropped < MAX_FLUSH_BYTES && self.available()? > 0 {
            let count = self.read(&mut scratch)?;
            if count == 0 {
                break;
            }
            dropped += count;
        }
        log::debug!("Flushed {} bytes of input", dropped);
        Ok(())
    }
}
