use huskylens::hex_parser::parse_hex_str;
use lazy_static::lazy_static;
use manifest_dir_macros::exist_relative_path;
use mockall::mock;
use std::{
    io::{Cursor, Read, Write},
    sync::{Arc, Mutex},
};

fn load_capture(hex_str: &str) -> Vec<u8> {
    let (_, data) = parse_hex_str(hex_str).expect("Failed to parse capture file");
    data
}

lazy_static! {
    pub static ref ACK_RESPONSE: Vec<u8> = load_capture(include_str!(exist_relative_path!(
        "../resources/test/ack_response.txt"
    )));
    pub static ref BLOCKS_BY_ID_RESPONSE: Vec<u8> = load_capture(include_str!(
        exist_relative_path!("../resources/test/blocks_by_id_response.txt")
    ));
    pub static ref REQUEST_ALL_RESPONSE: Vec<u8> = load_capture(include_str!(
        exist_relative_path!("../resources/test/request_all_response.txt")
    ));
    pub static ref ARROWS_RESPONSE: Vec<u8> = load_capture(include_str!(exist_relative_path!(
        "../resources/test/arrows_response.txt"
    )));
}

mock! {
    pub IO {}
    impl Read for IO {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    }
    impl Write for IO {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
        fn flush(&mut self) -> std::io::Result<()>;
    }
}

/// Serial port mock which replays `wire` and records everything written to it
pub fn scripted_io(wire: Vec<u8>) -> (MockIO, Arc<Mutex<Vec<Vec<u8>>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let sink = written.clone();
    let mut wire = Cursor::new(wire);

    let mut mock_io = MockIO::new();
    mock_io.expect_write().returning(move |msg| {
        sink.lock().unwrap().push(msg.to_vec());
        Ok(msg.len())
    });
    mock_io.expect_flush().returning(|| Ok(()));
    mock_io.expect_read().returning(move |buf| wire.read(buf));
    (mock_io, written)
}
