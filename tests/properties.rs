//! Property-based coverage of the parser's fragmentation tolerance
//! ("for every partition P of bytes(M), feeding the parser with P
//! in order yields done=true exactly once, and the assembled body equals
//! the body of M") and of the WebSocket frame header codec's round-trip.

use protoweb::http::RequestParser;
use protoweb::ws::{Header, OpCode};
use quickcheck_macros::quickcheck;

/// Split `bytes` into `cuts.len() + 1` non-empty-preferring pieces at
/// positions derived from `cuts`, clamped into range and sorted.
fn partition(bytes: &[u8], cuts: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return vec![];
    }
    let mut points: Vec<usize> =
        cuts.iter().map(|&c| 1 + (c as usize) % bytes.len()).collect();
    points.sort_unstable();
    points.dedup();

    let mut parts = Vec::new();
    let mut start = 0;
    for p in points {
        if p > start && p < bytes.len() {
            parts.push(bytes[start..p].to_vec());
            start = p;
        }
    }
    parts.push(bytes[start..].to_vec());
    parts
}

#[quickcheck]
fn arbitrary_fragmentation_still_parses_fixed_length_body(body: Vec<u8>, cuts: Vec<u8>) -> bool {
    let mut message = format!("POST /p HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len())
        .into_bytes();
    message.extend_from_slice(&body);

    let mut parser = RequestParser::new();
    let mut assembled = Vec::new();
    for part in partition(&message, &cuts) {
        if parser.is_done() {
            break;
        }
        parser.feed(&part, |chunk| assembled.extend_from_slice(chunk)).unwrap();
    }
    parser.is_done() && assembled == body
}

#[quickcheck]
fn single_byte_fragmentation_still_parses(body: Vec<u8>) -> bool {
    let mut message = format!("POST /p HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len())
        .into_bytes();
    message.extend_from_slice(&body);

    let mut parser = RequestParser::new();
    let mut assembled = Vec::new();
    for byte in &message {
        if parser.is_done() {
            break;
        }
        parser.feed(std::slice::from_ref(byte), |chunk| assembled.extend_from_slice(chunk)).unwrap();
    }
    parser.is_done() && assembled == body
}

fn opcode_from_selector(selector: u8) -> OpCode {
    match selector % 6 {
        0 => OpCode::Continuation,
        1 => OpCode::Text,
        2 => OpCode::Binary,
        3 => OpCode::Close,
        4 => OpCode::Ping,
        _ => OpCode::Pong,
    }
}

#[quickcheck]
fn frame_header_round_trips(
    opcode_selector: u8,
    fin: bool,
    masked: bool,
    mask_key: (u8, u8, u8, u8),
    payload_len: u64,
) -> bool {
    let opcode = opcode_from_selector(opcode_selector);
    let payload_len = if opcode.is_control() { payload_len % 126 } else { payload_len };
    let mask = if masked { Some([mask_key.0, mask_key.1, mask_key.2, mask_key.3]) } else { None };

    let header = Header { fin, rsv1: false, rsv2: false, rsv3: false, opcode, mask, payload_len };
    let bytes = header.serialize();
    matches!(Header::parse(&bytes), Ok(Some((parsed, consumed))) if parsed == header && consumed == bytes.len())
}
