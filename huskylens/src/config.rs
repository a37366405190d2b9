use core::time::Duration;

/// Timing and flow control knobs of a `HuskyLens` session
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Config {
    /// How many times a read spins on the adapter before giving up on missing bytes
    pub read_polls: u32,
    /// Poll budget while the camera is busy writing to its SD card
    pub storage_read_polls: u32,
    /// Requests longer than this are split, the camera has a small receive buffer. 0 is read as 1.
    pub chunk_size: usize,
    pub chunk_pause: Duration,
    /// Extra read attempts after a corrupted or incomplete response
    pub retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            read_polls: 500,
            storage_read_polls: 5000,
            chunk_size: 32,
            chunk_pause: Duration::from_millis(5),
            retries: 1,
        }
    }
}

impl Config {
    pub fn with_read_polls(mut self, polls: u32) -> Self {
        self.read_polls = polls;
        self
    }

    pub fn with_storage_read_polls(mut self, polls: u32) -> Self {
        self.storage_read_polls = polls;
        self
    }

    pub fn with_chunking(mut self, size: usize, pause: Duration) -> Self {
        self.chunk_size = size;
        self.chunk_pause = pause;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }
}
