use crate::{
    command::{Algorithm, Command},
    config::Config,
    error::{Error, Result},
    frame,
    io_adapter::IoAdapter,
    response::{reader::read_frame, Detections, Interpreter, ResponseBatch},
};
use scopeguard::guard;
use std::thread::sleep;

/// Runs `op` at most `retries + 1` times, only recoverable errors are retried
pub(crate) fn retry<T, F>(retries: usize, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = retries + 1;
    for attempt in 1..=attempts {
        match op() {
            Ok(val) => return Ok(val),
            Err(e) if e.is_recoverable() => {
                log::warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(Error::CommunicationFailure { attempts })
}

/// Session with a single camera. Requests are strictly sequential, each one is written and its
/// response fully read before `&mut self` is released.
pub struct HuskyLens<IO: IoAdapter> {
    io: IO,
    config: Config,
}

impl<IO: IoAdapter> HuskyLens<IO> {
    pub fn new(io: IO) -> Self {
        Self::with_config(io, Config::default())
    }

    pub fn with_config(io: IO, config: Config) -> Self {
        HuskyLens { io, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_inner(self) -> IO {
        self.io
    }

    fn send_package(&mut self, cmd: &Command) -> Result<()> {
        let msg = frame::encode(cmd.code(), &cmd.payload()?)?;
        log::debug!("Sending {:?}", cmd);
        log::trace!("Writing {:02X?}", msg);

        let mut chunks = msg.chunks(self.config.chunk_size.max(1)).peekable();
        while let Some(chunk) = chunks.next() {
            self.io.write_all(chunk)?;
            if chunks.peek().is_some() {
                sleep(self.config.chunk_pause);
            }
        }

        let settle = cmd.settle_time();
        if !settle.is_zero() {
            sleep(settle);
        }
        Ok(())
    }

    fn receive_response(&mut self, cmd: &Command) -> Result<ResponseBatch> {
        let polls = self.config.read_polls;
        let io = &mut self.io;
        Interpreter::for_command(cmd).drive(|| read_frame(io, polls))
    }

    /// Sends a command and reads back its response. A broken response is read once more before
    /// giving up with `CommunicationFailure`.
    pub fn send(&mut self, cmd: Command) -> Result<ResponseBatch> {
        self.send_package(&cmd)?;
        match retry(self.config.retries, || self.receive_response(&cmd)) {
            Ok(batch) => {
                if batch.is_acknowledge() {
                    self.io.flush_input()?;
                }
                Ok(batch)
            }
            Err(e @ (Error::CommunicationFailure { .. } | Error::UnexpectedResponse)) => {
                log::warn!("Read response error: {}", e);
                // Resynchronize, otherwise the next request reads leftovers of this one
                self.io.flush_input()?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn expect_ack(&mut self, cmd: Command) -> Result<()> {
        match self.send(cmd)? {
            ResponseBatch::Acknowledge => Ok(()),
            _ => Err(Error::UnexpectedResponse),
        }
    }

    fn expect_detections(&mut self, cmd: Command) -> Result<Detections> {
        self.send(cmd)?.into_detections()
    }

    /// Checks that the camera is connected and answering
    pub fn knock(&mut self) -> Result<()> {
        self.expect_ack(Command::Knock)
    }

    pub fn set_algorithm(&mut self, alg: Algorithm) -> Result<()> {
        self.expect_ack(Command::SetAlgorithm(alg))
    }

    /// Nothing is sent if `name` is not a known algorithm
    pub fn set_algorithm_by_name(&mut self, name: &str) -> Result<()> {
        let alg = Algorithm::from_name(name)?;
        self.set_algorithm(alg)
    }

    /// Learns whatever is currently in the frame center under `id`
    pub fn learn(&mut self, id: u16) -> Result<()> {
        self.expect_ack(Command::Learn(id))
    }

    /// Forgets every learned object of the current algorithm
    pub fn forget(&mut self) -> Result<()> {
        self.expect_ack(Command::Forget)
    }

    pub fn set_custom_name(&mut self, id: u8, name: &str) -> Result<()> {
        self.expect_ack(Command::SetCustomName {
            id,
            name: name.to_owned(),
        })
    }

    /// Shows `text` on the camera screen, `x` may exceed a byte
    pub fn set_custom_text(&mut self, x: u16, y: u8, text: &str) -> Result<()> {
        self.expect_ack(Command::SetCustomText {
            x,
            y,
            text: text.to_owned(),
        })
    }

    pub fn clear_custom_text(&mut self) -> Result<()> {
        self.expect_ack(Command::ClearCustomText)
    }

    pub fn save_model(&mut self, slot: u16) -> Result<()> {
        self.expect_ack(Command::SaveModel(slot))
    }

    pub fn load_model(&mut self, slot: u16) -> Result<()> {
        self.expect_ack(Command::LoadModel(slot))
    }

    /// Saves a camera picture to the SD card, the camera needs a while before it answers
    pub fn save_picture(&mut self) -> Result<()> {
        let regular = self.config.read_polls;
        self.config.read_polls = self.config.storage_read_polls;
        let mut s = guard(self, move |s| {
            s.config.read_polls = regular;
        });
        s.expect_ack(Command::SavePicture)
    }

    pub fn save_screenshot(&mut self) -> Result<()> {
        self.expect_ack(Command::SaveScreenshot)
    }

    pub fn request_all(&mut self) -> Result<Detections> {
        self.expect_detections(Command::RequestAll)
    }

    pub fn blocks(&mut self) -> Result<Detections> {
        self.expect_detections(Command::RequestBlocks)
    }

    pub fn arrows(&mut self) -> Result<Detections> {
        self.expect_detections(Command::RequestArrows)
    }

    pub fn learned(&mut self) -> Result<Detections> {
        self.expect_detections(Command::RequestLearned)
    }

    pub fn learned_blocks(&mut self) -> Result<Detections> {
        self.expect_detections(Command::RequestLearnedBlocks)
    }

    pub fn learned_arrows(&mut self) -> Result<Detections> {
        self.expect_detections(Command::RequestLearnedArrows)
    }

    pub fn object_by_id(&mut self, id: u16) -> Result<Detections> {
        self.expect_detections(Command::RequestById(id))
    }

    pub fn blocks_by_id(&mut self, id: u16) -> Result<Detections> {
        self.expect_detections(Command::RequestBlocksById(id))
    }

    pub fn arrows_by_id(&mut self, id: u16) -> Result<Detections> {
        self.expect_detections(Command::RequestArrowsById(id))
    }

    /// Amount of objects in the current frame
    pub fn count(&mut self) -> Result<usize> {
        Ok(self.request_all()?.objects.len())
    }

    pub fn learned_object_count(&mut self) -> Result<u16> {
        Ok(self.request_all()?.learned_count)
    }

    pub fn frame_number(&mut self) -> Result<u16> {
        Ok(self.request_all()?.frame_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::response_code::{RETURN_BLOCK, RETURN_INFO, RETURN_OK};
    use crate::io_adapter::MockIoAdapter;
    use crate::object::{BoundingBox, DetectedObject};
    use claims::*;
    use pretty_assertions::assert_eq;
    use std::{
        io::{self, Cursor, Read},
        sync::{Arc, Mutex},
        time::Duration,
    };

    const BLOCK: [u8; 10] = [0x32, 0x00, 0x3C, 0x00, 0x14, 0x00, 0x1E, 0x00, 0x01, 0x00];

    fn response(opcode: u8, payload: &[u8]) -> Vec<u8> {
        frame::encode(opcode, payload).unwrap()
    }

    fn info(count: u16, learned: u16, frame_number: u16) -> Vec<u8> {
        let mut payload = Vec::new();
        for v in [count, learned, frame_number, 0, 0] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        response(RETURN_INFO, &payload)
    }

    fn corrupted(mut bytes: Vec<u8>) -> Vec<u8> {
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        bytes
    }

    /// Mock which accepts any write and replays `wire` on reads
    fn device(wire: Vec<u8>) -> MockIoAdapter {
        let mut wire = Cursor::new(wire);
        let mut io = MockIoAdapter::new();
        io.expect_write_all().returning(|_| Ok(()));
        io.expect_read_exact_or_partial().returning(move |n, _| {
            let mut buf = vec![0; n];
            let count = wire.read(&mut buf)?;
            buf.truncate(count);
            Ok(buf)
        });
        io
    }

    fn camera(io: MockIoAdapter) -> HuskyLens<MockIoAdapter> {
        HuskyLens::with_config(io, Config::default().with_chunking(32, Duration::ZERO))
    }

    #[test]
    fn retry_once_after_checksum_error() {
        let mut wire = corrupted(info(1, 5, 100));
        wire.extend(info(1, 5, 100));
        wire.extend(response(RETURN_BLOCK, &BLOCK));
        let mut io = device(wire);
        io.expect_flush_input().never();

        let detections = camera(io).blocks_by_id(1).unwrap();
        assert_eq!(
            detections,
            Detections {
                objects: vec![DetectedObject::Block(BoundingBox {
                    x: 50,
                    y: 60,
                    width: 20,
                    height: 30,
                    id: 1
                })],
                learned_count: 5,
                frame_number: 100
            }
        );
    }

    #[test]
    fn second_failure_flushes_input() {
        let mut wire = corrupted(info(1, 5, 100));
        wire.extend(corrupted(info(1, 5, 100)));
        let mut io = device(wire);
        io.expect_flush_input().times(1).returning(|| Ok(()));

        assert_matches!(
            camera(io).blocks_by_id(1),
            Err(Error::CommunicationFailure { attempts: 2 })
        );
    }

    #[test]
    fn lost_info_frame_is_not_a_partial_result() {
        let mut wire = corrupted(info(2, 5, 100));
        wire.extend(response(RETURN_BLOCK, &BLOCK));
        wire.extend(response(RETURN_BLOCK, &BLOCK));
        let mut io = device(wire);
        io.expect_flush_input().times(1).returning(|| Ok(()));

        assert_matches!(
            camera(io).request_all(),
            Err(Error::CommunicationFailure { attempts: 2 })
        );
    }

    #[test]
    fn unexpected_frame_flushes_input() {
        let mut wire = response(0x31, &BLOCK);
        wire.extend(response(RETURN_OK, &[]));
        let mut io = device(wire);
        io.expect_flush_input().times(1).returning(|| Ok(()));

        assert_matches!(camera(io).learned(), Err(Error::UnexpectedResponse));
    }

    #[test]
    fn zero_chunk_size_writes_single_bytes() {
        let mut io = MockIoAdapter::new();
        io.expect_write_all()
            .times(6)
            .withf(|chunk| chunk.len() == 1)
            .returning(|_| Ok(()));
        let mut wire = Cursor::new(response(RETURN_OK, &[]));
        io.expect_read_exact_or_partial().returning(move |n, _| {
            let mut buf = vec![0; n];
            let count = wire.read(&mut buf)?;
            buf.truncate(count);
            Ok(buf)
        });
        io.expect_flush_input().returning(|| Ok(()));

        let config = Config {
            chunk_size: 0,
            chunk_pause: Duration::ZERO,
            ..Default::default()
        };
        assert_ok!(HuskyLens::with_config(io, config).forget());
    }

    #[test]
    fn silent_device_is_a_communication_failure() {
        let mut io = device(Vec::new());
        io.expect_flush_input().times(1).returning(|| Ok(()));
        assert_matches!(camera(io).request_all(), Err(Error::CommunicationFailure { .. }));
    }

    #[test]
    fn io_errors_are_not_retried() {
        let mut io = MockIoAdapter::new();
        io.expect_write_all().returning(|_| Ok(()));
        io.expect_read_exact_or_partial()
            .times(1)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged").into()));
        io.expect_flush_input().never();
        assert_matches!(camera(io).request_all(), Err(Error::IOError(_)));
    }

    #[test]
    fn acknowledge_flushes_input() {
        let mut io = device(response(RETURN_OK, &[]));
        io.expect_flush_input().times(1).returning(|| Ok(()));
        assert_ok!(camera(io).forget());
    }

    #[test]
    fn unexpected_acknowledge() {
        let mut io = device(response(RETURN_OK, &[]));
        io.expect_flush_input().times(1).returning(|| Ok(()));
        assert_matches!(camera(io).blocks(), Err(Error::UnexpectedResponse));
    }

    #[test]
    fn unknown_algorithm_sends_nothing() {
        let mut io = MockIoAdapter::new();
        io.expect_write_all().never();
        io.expect_read_exact_or_partial().never();
        assert_matches!(
            camera(io).set_algorithm_by_name("x-ray"),
            Err(Error::UnknownAlgorithm(_))
        );
    }

    #[test]
    fn long_requests_are_chunked() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let mut wire = Cursor::new(response(RETURN_OK, &[]));
        let mut io = MockIoAdapter::new();
        let sink = writes.clone();
        io.expect_write_all().returning(move |chunk| {
            sink.lock().unwrap().push(chunk.to_vec());
            Ok(())
        });
        io.expect_read_exact_or_partial().returning(move |n, _| {
            let mut buf = vec![0; n];
            let count = wire.read(&mut buf)?;
            buf.truncate(count);
            Ok(buf)
        });
        io.expect_flush_input().returning(|| Ok(()));

        let text = "a".repeat(40);
        assert_ok!(camera(io).set_custom_text(300, 10, &text));

        let writes = writes.lock().unwrap();
        let sizes: Vec<_> = writes.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![32, 18]);

        let cmd = Command::SetCustomText { x: 300, y: 10, text };
        let unchunked = frame::encode(cmd.code(), &cmd.payload().unwrap()).unwrap();
        assert_eq!(writes.concat(), unchunked);
    }

    #[test]
    fn save_picture_restores_poll_budget() {
        let polls = Arc::new(Mutex::new(Vec::new()));
        let seen = polls.clone();
        let mut io = MockIoAdapter::new();
        io.expect_write_all().returning(|_| Ok(()));
        io.expect_read_exact_or_partial().returning(move |_, p| {
            seen.lock().unwrap().push(p);
            Ok(Vec::new())
        });
        io.expect_flush_input().returning(|| Ok(()));

        let mut camera = camera(io);
        assert_err!(camera.save_picture());
        assert_eq!(camera.config().read_polls, 500);
        assert!(polls.lock().unwrap().iter().all(|p| *p == 5000));
    }

    #[test]
    fn retry_bound() {
        let mut calls = 0;
        let res: Result<()> = retry(1, || {
            calls += 1;
            Err(Error::InvalidData("broken"))
        });
        assert_matches!(res, Err(Error::CommunicationFailure { attempts: 2 }));
        assert_eq!(calls, 2);

        let mut calls = 0;
        let res: Result<()> = retry(3, || {
            calls += 1;
            Err(Error::UnexpectedResponse)
        });
        assert_matches!(res, Err(Error::UnexpectedResponse));
        assert_eq!(calls, 1);
    }
}
