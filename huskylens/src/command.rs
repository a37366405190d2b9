use core::time::Duration;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{Error, Result};
use crate::object::RecordKind;

/// Response codes sent back by the camera
pub mod response_code {
    pub const RETURN_INFO: u8 = 0x29;
    pub const RETURN_BLOCK: u8 = 0x2A;
    /// Not confirmed against device documentation, anything but a block is read as an arrow
    pub const RETURN_ARROW: u8 = 0x2B;
    pub const RETURN_OK: u8 = 0x2E;
}

/// Recognition modes the camera can be switched between
#[derive(
    Display, EnumString, EnumIter, FromPrimitive, Debug, PartialEq, Eq, Clone, Copy, Hash,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Algorithm {
    FaceRecognition = 0x0000,
    ObjectTracking = 0x0001,
    ObjectRecognition = 0x0002,
    LineTracking = 0x0003,
    ColorRecognition = 0x0004,
    TagRecognition = 0x0005,
    ObjectClassification = 0x0006,
    QrCode = 0x0007,
    Barcode = 0x0008,
}

impl Algorithm {
    /// Accepts either a kebab-case name or the numeric algorithm id
    pub fn from_name(name: &str) -> Result<Self> {
        let by_id = name.parse::<u16>().ok().and_then(Algorithm::from_u16);
        by_id
            .or_else(|| name.parse().ok())
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_owned()))
    }

    /// Comma separated list of every algorithm name
    pub fn names() -> String {
        Algorithm::iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Request that can be sent to the camera
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Command {
    Knock,
    RequestAll,
    RequestBlocks,
    RequestArrows,
    RequestLearned,
    RequestLearnedBlocks,
    RequestLearnedArrows,
    RequestById(u16),
    RequestBlocksById(u16),
    RequestArrowsById(u16),
    SetAlgorithm(Algorithm),
    Learn(u16),
    Forget,
    SetCustomName { id: u8, name: String },
    SetCustomText { x: u16, y: u8, text: String },
    ClearCustomText,
    SaveModel(u16),
    LoadModel(u16),
    SavePicture,
    SaveScreenshot,
}

impl Command {
    /// Convert command enum into byte code for encoding
    pub fn code(&self) -> u8 {
        use Command::*;
        match *self {
            RequestAll => 0x20,
            RequestBlocks => 0x21,
            RequestArrows => 0x22,
            RequestLearned => 0x23,
            RequestLearnedBlocks => 0x24,
            RequestLearnedArrows => 0x25,
            RequestById(_) => 0x26,
            RequestBlocksById(_) => 0x27,
            RequestArrowsById(_) => 0x28,
            Knock => 0x2C,
            SetAlgorithm(_) => 0x2D,
            SetCustomName { .. } => 0x2F,
            SavePicture => 0x30,
            SaveModel(_) => 0x32,
            LoadModel(_) => 0x33,
            SetCustomText { .. } => 0x34,
            ClearCustomText => 0x35,
            Learn(_) => 0x36,
            Forget => 0x37,
            SaveScreenshot => 0x39,
        }
    }

    pub fn payload(&self) -> Result<Vec<u8>> {
        use Command::*;
        let payload = match self {
            RequestById(id) | RequestBlocksById(id) | RequestArrowsById(id) | Learn(id) => {
                id.to_le_bytes().to_vec()
            }
            SaveModel(slot) | LoadModel(slot) => slot.to_le_bytes().to_vec(),
            SetAlgorithm(alg) => (*alg as u16).to_le_bytes().to_vec(),
            SetCustomName { id, name } => {
                let name = name.as_bytes();
                // Name is sent null-terminated and the terminator counts towards its length
                let name_len = u8::try_from(name.len() + 1).map_err(|_| Error::Encoding(name.len() + 3))?;
                let mut payload = Vec::with_capacity(name.len() + 3);
                payload.extend_from_slice(&[*id, name_len]);
                payload.extend_from_slice(name);
                payload.push(0x00);
                payload
            }
            SetCustomText { x, y, text } => {
                let text = text.as_bytes();
                let text_len = u8::try_from(text.len()).map_err(|_| Error::Encoding(text.len() + 4))?;
                let mut payload = Vec::with_capacity(text.len() + 4);
                payload.push(text_len);
                payload.extend_from_slice(&encode_x_coordinate(*x));
                payload.push(*y);
                payload.extend_from_slice(text);
                payload
            }
            _ => Vec::new(),
        };
        Ok(payload)
    }

    /// Requests for a single learned id, the camera may answer them with a bare record
    pub fn is_by_id(&self) -> bool {
        matches!(
            self,
            Command::RequestById(_) | Command::RequestBlocksById(_) | Command::RequestArrowsById(_)
        )
    }

    /// Kind of object a single record reply to this request carries, if it is known upfront
    pub fn record_kind(&self) -> Option<RecordKind> {
        use Command::*;
        match self {
            RequestBlocks | RequestLearnedBlocks | RequestBlocksById(_) => Some(RecordKind::Block),
            RequestArrows | RequestLearnedArrows | RequestArrowsById(_) => Some(RecordKind::Arrow),
            _ => None,
        }
    }

    /// How long the camera needs after receiving this command before it starts answering
    pub fn settle_time(&self) -> Duration {
        match self {
            Command::Knock => Duration::from_millis(5),
            Command::SetAlgorithm(_) => Duration::from_millis(200),
            _ => Duration::ZERO,
        }
    }
}

/// Screen x coordinate is wider than a byte, values above 255 are sent as a 0xFF marker followed
/// by `x % 255`. This is not a regular little endian u16.
fn encode_x_coordinate(x: u16) -> [u8; 2] {
    if x > 255 {
        [0xFF, (x % 255) as u8]
    } else {
        [0x00, x as u8]
    }
}
