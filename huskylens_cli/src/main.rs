mod cli;
mod output;
mod serial;

use clap::Parser;
use simple_eyre::{eyre::eyre, Result};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use cli::*;
use huskylens::{
    error::Error,
    frame::Frame,
    hex_parser,
    response::Interpreter,
    Algorithm, Detections, ResponseBatch,
};
use serial::{SerialConf, SerialHuskyLens};

fn main() -> Result<()> {
    simple_eyre::install()?;
    let cli = Cli::parse();
    env_logger::init();

    match &cli.command {
        Commands::List => list_serial(),
        Commands::Knock(conf) => knock(conf),
        Commands::Algorithm(conf) => set_algorithm(conf),
        Commands::Learn(conf) => with_camera(&conf.serial, |c| c.learn(conf.id)),
        Commands::Forget(conf) => with_camera(conf, |c| c.forget()),
        Commands::Name(conf) => {
            with_camera(&conf.serial, |c| c.set_custom_name(conf.id, &conf.name))
        }
        Commands::Text(subcomm) => match &subcomm.command {
            TextCommands::Set(conf) => with_camera(&conf.serial, |c| {
                c.set_custom_text(conf.x, conf.y, &conf.text)
            }),
            TextCommands::Clear(conf) => with_camera(conf, |c| c.clear_custom_text()),
        },
        Commands::Objects(conf) => get_objects(conf),
        Commands::Model(subcomm) => match &subcomm.command {
            ModelCommands::Save(conf) => with_camera(&conf.serial, |c| c.save_model(conf.slot)),
            ModelCommands::Load(conf) => with_camera(&conf.serial, |c| c.load_model(conf.slot)),
        },
        Commands::Picture(conf) => with_camera(conf, |c| c.save_picture()),
        Commands::Screenshot(conf) => with_camera(conf, |c| c.save_screenshot()),
        Commands::Decode(conf) => decode_capture(conf),
    }
}

/// Returns std::io::Write stream with coloring enabled if program is run interactively
fn get_stdout() -> StandardStream {
    StandardStream::stdout(if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    })
}

fn list_serial() -> Result<()> {
    let mut stdout = get_stdout();
    let paths = serialport::available_ports()?;
    if paths.is_empty() {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(&mut stdout, "No connected serial ports found.")?;
    } else {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(&mut stdout, "Connected serial ports:")?;
    }
    stdout.reset()?;
    paths.iter().for_each(|p| println!("{}", p.port_name));

    Ok(())
}

/// Opens the camera and runs a single acknowledged command on it
fn with_camera<F>(conf: &SerialConf, op: F) -> Result<()>
where
    F: FnOnce(&mut SerialHuskyLens) -> huskylens::error::Result<()>,
{
    let mut camera = conf.open_camera()?;
    op(&mut camera)?;
    Ok(())
}

fn knock(conf: &SerialConf) -> Result<()> {
    let mut camera = conf.open_camera()?;
    let mut stdout = get_stdout();
    match camera.knock() {
        Ok(()) => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(&mut stdout, "HuskyLens answered on {}", conf.serial)?;
            stdout.reset()?;
            Ok(())
        }
        Err(e) => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(&mut stdout, "No answer on {}", conf.serial)?;
            stdout.reset()?;
            Err(e.into())
        }
    }
}

fn set_algorithm(conf: &SetAlgorithmConf) -> Result<()> {
    let algorithm = Algorithm::from_name(&conf.algorithm).map_err(|_| {
        eyre!(
            "Unknown algorithm {:?}, expected one of: {}",
            conf.algorithm,
            Algorithm::names()
        )
    })?;
    with_camera(&conf.serial, |c| c.set_algorithm(algorithm))
}

fn get_objects(conf: &ObjectsConf) -> Result<()> {
    let mut camera = conf.serial.open_camera()?;
    let detections = match (conf.id, conf.filter) {
        (Some(id), ObjectFilter::All | ObjectFilter::Learned) => camera.object_by_id(id),
        (Some(id), ObjectFilter::Blocks | ObjectFilter::LearnedBlocks) => camera.blocks_by_id(id),
        (Some(id), ObjectFilter::Arrows | ObjectFilter::LearnedArrows) => camera.arrows_by_id(id),
        (None, ObjectFilter::All) => camera.request_all(),
        (None, ObjectFilter::Blocks) => camera.blocks(),
        (None, ObjectFilter::Arrows) => camera.arrows(),
        (None, ObjectFilter::Learned) => camera.learned(),
        (None, ObjectFilter::LearnedBlocks) => camera.learned_blocks(),
        (None, ObjectFilter::LearnedArrows) => camera.learned_arrows(),
    }?;
    log::debug!("Got {} objects", detections.objects.len());
    conf.output.write_detections(&detections)
}

/// Splits decoded frames into responses, a trailing incomplete response is dropped. The request
/// is unknown offline, so a bare record is read as a by-id answer.
fn interpret_frames(frames: Vec<Frame>, conf: &DecodeConf) -> Vec<ResponseBatch> {
    let mut frames = frames.into_iter().peekable();
    let mut batches = Vec::new();
    while frames.peek().is_some() {
        let interpreter = Interpreter::with_bare_records(conf.kind.map(Into::into));
        match interpreter.drive(|| frames.next().ok_or(Error::InvalidData("capture ends mid-response"))) {
            Ok(batch) => batches.push(batch),
            Err(e) => log::warn!("Skipped frames: {}", e),
        }
    }
    batches
}

fn decode_capture(conf: &DecodeConf) -> Result<()> {
    let capture = std::fs::read_to_string(&conf.input)?;
    let frames = hex_parser::decode_from_string(&capture)?;
    log::debug!("Decoded {} frames from {:?}", frames.len(), conf.input);
    for frame in &frames {
        log::trace!("{}", frame);
    }

    let batches = interpret_frames(frames, conf);
    let acks = batches.iter().filter(|b| b.is_acknowledge()).count();
    if acks > 0 {
        log::info!("Capture holds {} acknowledgements", acks);
    }
    let detections: Vec<&Detections> = batches
        .iter()
        .filter_map(|b| match b {
            ResponseBatch::Detections(d) => Some(d),
            ResponseBatch::Acknowledge => None,
        })
        .collect();
    if detections.is_empty() {
        return Err(eyre!("No detections found in {:?}", conf.input));
    }
    conf.output.write_all(&detections)
}
