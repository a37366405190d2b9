use clap::{Args, ValueEnum};
use huskylens::{DetectedObject, Detections};
use simple_eyre::{eyre::eyre, Result};
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

#[derive(Args)]
pub struct Output {
    /// Path to a file where detections should be stored, stdout if omitted
    #[arg(short, long, value_parser = unique_path_parser, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Format for detections output
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

fn unique_path_parser(p: &str) -> Result<PathBuf> {
    let p = Path::new(p);
    if p.try_exists()? {
        Err(eyre!("Path {p:?} already exists"))
    } else {
        Ok(p.to_path_buf())
    }
}

#[derive(ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
}

const CSV_HEADER: &str = "kind,id,x1,y1,x2,y2";

fn object_to_text(object: &DetectedObject) -> String {
    match object {
        DetectedObject::Block(b) => format!(
            "block  id={:<3} center=({}, {}) size={}x{}",
            b.id, b.x, b.y, b.width, b.height
        ),
        DetectedObject::Arrow(a) => format!(
            "arrow  id={:<3} tail=({}, {}) head=({}, {})",
            a.id, a.x_tail, a.y_tail, a.x_head, a.y_head
        ),
    }
}

fn object_to_csv(object: &DetectedObject) -> String {
    match object {
        DetectedObject::Block(b) => {
            format!("block,{},{},{},{},{}", b.id, b.x, b.y, b.width, b.height)
        }
        DetectedObject::Arrow(a) => format!(
            "arrow,{},{},{},{},{}",
            a.id, a.x_tail, a.y_tail, a.x_head, a.y_head
        ),
    }
}

fn detections_to_text(detections: &Detections) -> String {
    log::trace!("Formatting detections as text");
    let mut lines = vec![format!(
        "Frame {}: {} objects, {} learned ids",
        detections.frame_number,
        detections.objects.len(),
        detections.learned_count
    )];
    lines.extend(detections.objects.iter().map(object_to_text));
    lines.join("\n")
}

fn detections_to_csv(detections: &Detections) -> String {
    log::trace!("Formatting detections as CSV");
    std::iter::once(CSV_HEADER.to_owned())
        .chain(detections.objects.iter().map(object_to_csv))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Output {
    pub fn format_detections(&self, detections: &Detections) -> String {
        match self.format {
            OutputFormat::Text => detections_to_text(detections),
            OutputFormat::Csv => detections_to_csv(detections),
        }
    }

    pub fn write_detections(&self, detections: &Detections) -> Result<()> {
        self.write_all(&[detections])
    }

    /// Writes batches one after another, separated by an empty line
    pub fn write_all(&self, batches: &[&Detections]) -> Result<()> {
        let data = batches
            .iter()
            .map(|d| self.format_detections(d))
            .collect::<Vec<_>>()
            .join("\n\n");
        match &self.output {
            Some(path) => {
                log::debug!("Saving detections to {:?}", path);
                let mut out = File::create(path)?;
                writeln!(out, "{}", data)?;
            }
            None => writeln!(io::stdout().lock(), "{}", data)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huskylens::{BoundingBox, DirectionalMarker};

    fn detections() -> Detections {
        Detections {
            objects: vec![
                DetectedObject::Block(BoundingBox {
                    x: 50,
                    y: 60,
                    width: 20,
                    height: 30,
                    id: 1,
                }),
                DetectedObject::Arrow(DirectionalMarker {
                    x_tail: 10,
                    y_tail: 200,
                    x_head: 12,
                    y_head: 20,
                    id: 0,
                }),
            ],
            learned_count: 3,
            frame_number: 77,
        }
    }

    #[test]
    fn convert_detections_to_csv() {
        let csv = detections_to_csv(&detections());
        let lines: Vec<_> = csv.split('\n').collect();
        assert_eq!(lines, [CSV_HEADER, "block,1,50,60,20,30", "arrow,0,10,200,12,20"]);
    }

    #[test]
    fn convert_detections_to_text() {
        let text = detections_to_text(&detections());
        let lines: Vec<_> = text.split('\n').collect();
        assert_eq!(lines[0], "Frame 77: 2 objects, 3 learned ids");
        assert_eq!(lines[1], "block  id=1   center=(50, 60) size=20x30");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn existing_path_is_rejected() {
        assert!(unique_path_parser(env!("CARGO_MANIFEST_DIR")).is_err());
    }
}
