use crate::{
    hex_parser::decode_from_string,
    object::{BoundingBox, DetectedObject, DirectionalMarker},
    response::{Detections, Interpreter, ResponseBatch},
    error::Error,
};

use claims::*;
use manifest_dir_macros::exist_relative_path;
use pretty_assertions::assert_eq;

const ACK: &str = include_str!(exist_relative_path!("resources/test/ack_response.txt"));
const BLOCKS_BY_ID: &str = include_str!(exist_relative_path!("resources/test/blocks_by_id_response.txt"));
const REQUEST_ALL: &str = include_str!(exist_relative_path!("resources/test/request_all_response.txt"));
const ARROWS: &str = include_str!(exist_relative_path!("resources/test/arrows_response.txt"));

fn interpret(capture: &str) -> Result<ResponseBatch, Error> {
    let mut frames = decode_from_string(capture)?.into_iter();
    Interpreter::new().drive(|| frames.next().ok_or(Error::InvalidData("capture ended early")))
}

#[test]
fn decode_ack() {
    assert_ok_eq!(interpret(ACK), ResponseBatch::Acknowledge);
}

#[test]
fn decode_blocks_by_id() {
    assert_ok_eq!(
        interpret(BLOCKS_BY_ID),
        ResponseBatch::Detections(Detections {
            objects: vec![DetectedObject::Block(BoundingBox {
                x: 50,
                y: 60,
                width: 20,
                height: 30,
                id: 1
            })],
            learned_count: 5,
            frame_number: 100
        })
    );
}

#[test]
fn decode_capture_with_leading_garbage() {
    let frames = decode_from_string(REQUEST_ALL).unwrap();
    assert_eq!(frames.len(), 3);

    let detections = interpret(REQUEST_ALL).unwrap().into_detections().unwrap();
    assert_eq!(detections.objects.len(), 2);
    let learned: Vec<_> = detections.objects.iter().map(|o| o.is_learned()).collect();
    assert_eq!(learned, vec![true, false]);
}

#[test]
fn decode_arrow_with_wide_coordinate() {
    let detections = interpret(ARROWS).unwrap().into_detections().unwrap();
    assert_eq!(
        detections.objects,
        vec![DetectedObject::Arrow(DirectionalMarker {
            x_tail: 266,
            y_tail: 200,
            x_head: 12,
            y_head: 20,
            id: 2
        })]
    );
}
