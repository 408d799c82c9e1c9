// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::Response;

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Ok;
    let encoded = encode(&response).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {json_str}");
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original).await.expect("write failed");
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data).await.expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_rejects_oversized_frame() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());

    let mut cursor = std::io::Cursor::new(buffer);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

#[tokio::test]
async fn request_response_roundtrip_through_framing() {
    use crate::Request;

    let request = Request::Ping;
    let mut buffer = Vec::new();
    write_message(&mut buffer, &encode(&request).unwrap()).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let decoded: Request = read_request(&mut cursor).await.unwrap();
    assert_eq!(decoded, request);
}

#[tokio::test]
async fn client_side_write_request_read_response_roundtrip() {
    use crate::Request;

    let mut buffer = Vec::new();
    write_request(&mut buffer, &Request::Status).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let decoded = read_request(&mut cursor).await.unwrap();
    assert_eq!(decoded, Request::Status);

    let mut buffer = Vec::new();
    let response = Response::Status { uptime_secs: 42, jobs_active: 3 };
    write_response(&mut buffer, &response).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let decoded = read_response(&mut cursor).await.unwrap();
    assert_eq!(decoded, response);
}

#[tokio::test]
async fn read_sse_event_decodes_framed_event() {
    use crate::SseEvent;

    let mut buffer = Vec::new();
    write_message(&mut buffer, &encode(&SseEvent::Ping).unwrap()).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let decoded = read_sse_event(&mut cursor).await.unwrap();
    assert_eq!(decoded, SseEvent::Ping);
}
