use crate::command::{
    response_code::{RETURN_ARROW, RETURN_BLOCK, RETURN_INFO, RETURN_OK},
    Command,
};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::object::{decode_record, DetectedObject, RecordKind};

use super::{parse_info, Detections, Info, ResponseBatch};

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
enum State {
    #[default]
    Classify,
    AwaitRecords { remaining: u16, info: Info },
    Done,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Step {
    /// Another frame belonging to the same response is expected
    NeedFrame,
    Done(ResponseBatch),
}

/// Turns the frames of a single response into a `ResponseBatch`
#[derive(Debug, Default)]
pub struct Interpreter {
    state: State,
    /// Whether a record may arrive without an info frame announcing it
    bare_records: bool,
    /// Record kind to assume for a bare record with an unknown code
    implied: Option<RecordKind>,
    objects: Vec<DetectedObject>,
}

impl Interpreter {
    /// Every record has to be announced by an info frame
    pub fn new() -> Self {
        Default::default()
    }

    /// Also accepts a single record sent on its own, as by-id requests may be answered
    pub fn with_bare_records(implied: Option<RecordKind>) -> Self {
        Interpreter {
            bare_records: true,
            implied,
            ..Default::default()
        }
    }

    pub fn for_command(cmd: &Command) -> Self {
        if cmd.is_by_id() {
            Self::with_bare_records(cmd.record_kind())
        } else {
            Self::new()
        }
    }

    /// Object records still expected before the response is complete
    pub fn remaining(&self) -> u16 {
        match self.state {
            State::AwaitRecords { remaining, .. } => remaining,
            _ => 0,
        }
    }

    pub fn feed(&mut self, frame: &Frame) -> Result<Step> {
        match self.state {
            State::Classify => self.classify(frame),
            State::AwaitRecords { remaining, info } => {
                let kind = RecordKind::from_code(frame.command);
                self.objects.push(decode_record(kind, &frame.payload)?);
                if remaining > 1 {
                    self.state = State::AwaitRecords {
                        remaining: remaining - 1,
                        info,
                    };
                    Ok(Step::NeedFrame)
                } else {
                    Ok(self.finish(info.learned_count, info.frame_number))
                }
            }
            State::Done => Err(Error::UnexpectedResponse),
        }
    }

    fn classify(&mut self, frame: &Frame) -> Result<Step> {
        match frame.command {
            RETURN_OK => {
                log::debug!("Got COMMAND_RETURN_OK");
                self.state = State::Done;
                Ok(Step::Done(ResponseBatch::Acknowledge))
            }
            RETURN_INFO => {
                let (_, info) = parse_info(&frame.payload)
                    .map_err(|_| Error::InvalidData("info payload is too short"))?;
                log::debug!(
                    "Got COMMAND_RETURN_INFO: {} objects, {} learned ids, frame {}",
                    info.object_count,
                    info.learned_count,
                    info.frame_number
                );
                if info.object_count == 0 {
                    Ok(self.finish(info.learned_count, info.frame_number))
                } else {
                    self.state = State::AwaitRecords {
                        remaining: info.object_count,
                        info,
                    };
                    Ok(Step::NeedFrame)
                }
            }
            // Leftover of a response whose info frame was lost
            RETURN_BLOCK | RETURN_ARROW if !self.bare_records => {
                log::warn!("Got a record frame {:#04x} without an info frame", frame.command);
                Err(Error::InvalidData("record without info frame"))
            }
            // By-id requests may be answered with a bare record
            code => {
                let kind = match (code, self.implied) {
                    (RETURN_BLOCK, _) => RecordKind::Block,
                    (RETURN_ARROW, _) => RecordKind::Arrow,
                    (_, Some(kind)) if self.bare_records => kind,
                    _ => return Err(Error::UnexpectedResponse),
                };
                self.objects.push(decode_record(kind, &frame.payload)?);
                Ok(self.finish(0, 0))
            }
        }
    }

    fn finish(&mut self, learned_count: u16, frame_number: u16) -> Step {
        self.state = State::Done;
        Step::Done(ResponseBatch::Detections(Detections {
            objects: core::mem::take(&mut self.objects),
            learned_count,
            frame_number,
        }))
    }

    /// Pulls frames from `next_frame` until the response is complete
    pub fn drive<F>(mut self, mut next_frame: F) -> Result<ResponseBatch>
    where
        F: FnMut() -> Result<Frame>,
    {
        loop {
            let frame = next_frame()?;
            if let Step::Done(batch) = self.feed(&frame)? {
                return Ok(batch);
            }
        }
    }
}
