use crate::{output::Output, serial::SerialConf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use huskylens::RecordKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lists connected serial devices
    List,
    /// Check that the camera answers
    Knock(SerialConf),
    /// Switch recognition algorithm
    Algorithm(SetAlgorithmConf),
    /// Learn the object currently in the center of the frame
    Learn(IdConf),
    /// Forget every learned object of the current algorithm
    Forget(SerialConf),
    /// Give a learned id a name shown on screen
    Name(SetNameConf),
    /// Custom text overlay
    Text(TextCommand),
    /// Get objects the camera currently sees
    Objects(ObjectsConf),
    /// Save or load learned models on the SD card
    Model(ModelCommand),
    /// Save a camera picture to the SD card
    Picture(SerialConf),
    /// Save a screenshot of the camera UI to the SD card
    Screenshot(SerialConf),
    /// Decode a hex dump of camera output, no device needed
    Decode(DecodeConf),
}

#[derive(Args)]
pub struct SetAlgorithmConf {
    /// Algorithm name like "object-tracking", or its numeric id
    pub algorithm: String,

    #[command(flatten)]
    pub serial: SerialConf,
}

#[derive(Args)]
pub struct IdConf {
    /// Id to assign, starting from 1
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub id: u16,

    #[command(flatten)]
    pub serial: SerialConf,
}

#[derive(Args)]
pub struct SetNameConf {
    #[arg(value_parser = clap::value_parser!(u8).range(1..))]
    pub id: u8,

    pub name: String,

    #[command(flatten)]
    pub serial: SerialConf,
}

#[derive(Args)]
pub struct TextCommand {
    #[command(subcommand)]
    pub command: TextCommands,
}

#[derive(Subcommand)]
pub enum TextCommands {
    /// Draw text at the given screen position
    Set(SetTextConf),
    /// Remove all custom text
    Clear(SerialConf),
}

#[derive(Args)]
pub struct SetTextConf {
    /// Horizontal position, 0..=320
    #[arg(value_parser = clap::value_parser!(u16).range(0..=320))]
    pub x: u16,

    /// Vertical position, 0..=240
    #[arg(value_parser = clap::value_parser!(u8).range(0..=240))]
    pub y: u8,

    pub text: String,

    #[command(flatten)]
    pub serial: SerialConf,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ObjectFilter {
    #[default]
    All,
    Blocks,
    Arrows,
    Learned,
    LearnedBlocks,
    LearnedArrows,
}

#[derive(Args)]
pub struct ObjectsConf {
    /// Which objects to request
    #[arg(long, value_enum, default_value_t)]
    pub filter: ObjectFilter,

    /// Only request objects with this learned id. Learned filters are redundant with it
    #[arg(long)]
    pub id: Option<u16>,

    #[command(flatten)]
    pub serial: SerialConf,

    #[command(flatten)]
    pub output: Output,
}

#[derive(Args)]
pub struct ModelCommand {
    #[command(subcommand)]
    pub command: ModelCommands,
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Store the current algorithm's model into a slot
    Save(ModelConf),
    /// Restore the current algorithm's model from a slot
    Load(ModelConf),
}

#[derive(Args)]
pub struct ModelConf {
    /// SD card slot number
    pub slot: u16,

    #[command(flatten)]
    pub serial: SerialConf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordHint {
    Block,
    Arrow,
}

impl From<RecordHint> for RecordKind {
    fn from(hint: RecordHint) -> Self {
        match hint {
            RecordHint::Block => RecordKind::Block,
            RecordHint::Arrow => RecordKind::Arrow,
        }
    }
}

#[derive(Args)]
pub struct DecodeConf {
    /// File with whitespace separated hex bytes
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Record kind to assume for a record sent without an info frame
    #[arg(long, value_enum)]
    pub kind: Option<RecordHint>,

    #[command(flatten)]
    pub output: Output,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_objects_by_id() {
        let cli = Cli::try_parse_from([
            "huskylens", "objects", "--serial", "/dev/ttyUSB0", "--filter", "blocks", "--id", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Objects(conf) => {
                assert_eq!(conf.filter, ObjectFilter::Blocks);
                assert_eq!(conf.id, Some(2));
                assert_eq!(conf.serial.baud_rate, 9600);
            }
            _ => panic!("Parsed into a wrong subcommand"),
        }
    }

    #[test]
    fn learn_rejects_zero_id() {
        assert!(Cli::try_parse_from(["huskylens", "learn", "0", "--serial", "/dev/ttyUSB0"]).is_err());
    }

    #[test]
    fn text_position_is_bounded() {
        let args = ["huskylens", "text", "set", "321", "10", "hi", "--serial", "/dev/ttyUSB0"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["huskylens", "text", "set", "10", "241", "hi", "--serial", "/dev/ttyUSB0"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["huskylens", "text", "set", "320", "240", "hi", "--serial", "/dev/ttyUSB0"];
        assert!(Cli::try_parse_from(args).is_ok());
    }
}
