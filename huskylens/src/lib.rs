//! Driver for the HuskyLens vision sensor, talking its framed binary protocol over a UART.
//!
//! ```no_run
//! use huskylens::{Algorithm, HuskyLens, StdIoAdapter};
//! # fn open_port() -> std::fs::File { unimplemented!() }
//!
//! let mut camera = HuskyLens::new(StdIoAdapter::new(open_port()));
//! camera.knock()?;
//! camera.set_algorithm(Algorithm::ObjectTracking)?;
//! for object in camera.blocks_by_id(1)?.objects {
//!     println!("{:?}", object);
//! }
//! # Ok::<(), huskylens::error::Error>(())
//! ```

pub mod camera;
pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod hex_parser;
pub mod io_adapter;
pub mod object;
pub mod response;

#[cfg(test)]
mod tests;

pub use camera::HuskyLens;
pub use command::{Algorithm, Command};
pub use config::Config;
#[cfg(feature = "embedded-hal-nb")]
pub use io_adapter::EmbeddedHalNbAdapter;
pub use io_adapter::{IoAdapter, StdIoAdapter};
pub use object::{BoundingBox, DetectedObject, DirectionalMarker, RecordKind};
pub use response::{decode_objects, Detections, ResponseBatch};
