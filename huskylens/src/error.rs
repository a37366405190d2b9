use core::result::Result as CoreResult;
use thiserror::Error;

pub type Result<T> = CoreResult<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Payload of {0} bytes does not fit into a single frame")]
    Encoding(usize),
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Frame checksum mismatch, expected {expected:#04x} but received {received:#04x}")]
    Checksum { expected: u8, received: u8 },
    #[error("Timed out after receiving {received} of {expected} bytes")]
    ShortRead { expected: usize, received: usize },
    #[error("Malformed frame header: {0:02X?}")]
    MalformedHeader(Vec<u8>),
    #[error("Could not parse recieved data correctly: {0}")]
    InvalidData(&'static str),
    #[error("Recieved an unexpected type of response")]
    UnexpectedResponse,
    #[error("No valid response after {attempts} attempts")]
    CommunicationFailure { attempts: usize },

    #[cfg(feature = "embedded-hal-nb")]
    #[error("Serial peripheral reported an error")]
    EmbeddedHalNb,

    #[error("{0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Errors caused by a corrupted or incomplete response, which may go away on a second read
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Checksum { .. }
                | Error::ShortRead { .. }
                | Error::MalformedHeader(_)
                | Error::InvalidData(_)
        )
    }
}
