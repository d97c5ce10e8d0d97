//! Protocol Tests
//!
//! Tests for request and reply encoding/decoding.

use std::io::Cursor;

use tagframe::protocol::{
    decode_request, encode_reply, encode_request, read_handshake, read_reply, read_request,
    write_handshake, write_reply, write_request, HandlerKind, Reply, ReplyShape, Request, Status,
    STORAGE_SET,
};
use tagframe::TagFrameError;

const MAX_PAYLOAD: u64 = 1024 * 1024;

// =============================================================================
// Request Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_request_roundtrip() {
    let requests = vec![
        Request::Ping,
        Request::SetContent {
            data: b"content".to_vec(),
        },
        Request::GetContent,
        Request::DeleteRange { start: 3, end: 9 },
        Request::Append { data: vec![] },
        Request::SubArray {
            start: 0,
            end: u64::MAX,
        },
        Request::GetSize,
        Request::Set {
            start: 42,
            data: vec![0xFF; 300],
        },
    ];

    for request in requests {
        let encoded = encode_request(&request);
        let decoded = decode_request(&encoded, MAX_PAYLOAD).unwrap();
        assert_eq!(decoded, request);
    }
}

#[test]
fn test_set_request_layout() {
    let encoded = encode_request(&Request::Set {
        start: 258,
        data: b"ab".to_vec(),
    });

    let mut expected = vec![HandlerKind::Storage as u8, STORAGE_SET];
    expected.extend_from_slice(&258u64.to_be_bytes());
    expected.extend_from_slice(&2u64.to_be_bytes());
    expected.extend_from_slice(b"ab");
    assert_eq!(encoded, expected);
}

#[test]
fn test_ping_is_control() {
    assert_eq!(encode_request(&Request::Ping), vec![0x00, 0x01]);
}

#[test]
fn test_unknown_cause_rejected() {
    match decode_request(&[0x01, 0x7F], MAX_PAYLOAD) {
        Err(TagFrameError::Protocol(_)) => {}
        other => panic!("Expected Protocol error, got {:?}", other),
    }
    match decode_request(&[0x09, 0x01], MAX_PAYLOAD) {
        Err(TagFrameError::Protocol(_)) => {}
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[test]
fn test_truncated_request_is_io_error() {
    let encoded = encode_request(&Request::DeleteRange { start: 1, end: 2 });
    match decode_request(&encoded[..encoded.len() - 1], MAX_PAYLOAD) {
        Err(e) => assert!(e.is_storage_io()),
        Ok(r) => panic!("Expected error, got {:?}", r),
    }
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut encoded = encode_request(&Request::GetSize);
    encoded.push(0);
    assert!(decode_request(&encoded, MAX_PAYLOAD).is_err());
}

#[test]
fn test_oversized_payload_rejected() {
    let encoded = encode_request(&Request::Append {
        data: vec![1; 100],
    });
    match decode_request(&encoded, 99) {
        Err(TagFrameError::Protocol(_)) => {}
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[test]
fn test_stream_multiple_requests() {
    let mut buffer = Vec::new();
    write_request(&mut buffer, &Request::Append { data: b"x".to_vec() }).unwrap();
    write_request(&mut buffer, &Request::GetSize).unwrap();

    let mut reader = Cursor::new(buffer);
    assert_eq!(
        read_request(&mut reader, MAX_PAYLOAD).unwrap(),
        Request::Append { data: b"x".to_vec() }
    );
    assert_eq!(read_request(&mut reader, MAX_PAYLOAD).unwrap(), Request::GetSize);
}

#[test]
fn test_reply_shapes() {
    assert_eq!(Request::GetContent.reply_shape(), ReplyShape::Bytes);
    assert_eq!(
        Request::SubArray { start: 0, end: 1 }.reply_shape(),
        ReplyShape::Bytes
    );
    assert_eq!(Request::GetSize.reply_shape(), ReplyShape::Size);
    assert_eq!(Request::Ping.reply_shape(), ReplyShape::Done);
    assert_eq!(
        Request::Append { data: vec![] }.reply_shape(),
        ReplyShape::Done
    );
}

// =============================================================================
// Reply Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_reply_layout() {
    assert_eq!(encode_reply(&Reply::Done), vec![Status::Ok as u8]);

    let mut size = vec![0x00];
    size.extend_from_slice(&7u64.to_be_bytes());
    assert_eq!(encode_reply(&Reply::Size(7)), size);

    let mut error = vec![0x01];
    error.extend_from_slice(&4u64.to_be_bytes());
    error.extend_from_slice(b"boom");
    assert_eq!(encode_reply(&Reply::error("boom")), error);
}

#[test]
fn test_reply_roundtrip() {
    let cases = vec![
        (Reply::Done, ReplyShape::Done),
        (Reply::Bytes(b"payload".to_vec()), ReplyShape::Bytes),
        (Reply::Bytes(vec![]), ReplyShape::Bytes),
        (Reply::Size(u64::MAX), ReplyShape::Size),
        (Reply::error("out of range"), ReplyShape::Bytes),
        (Reply::error("bad"), ReplyShape::Size),
    ];

    for (reply, shape) in cases {
        let mut buffer = Vec::new();
        write_reply(&mut buffer, &reply).unwrap();
        let decoded = read_reply(&mut Cursor::new(buffer), shape, MAX_PAYLOAD).unwrap();
        assert_eq!(decoded, reply);
    }
}

#[test]
fn test_unknown_status_rejected() {
    match read_reply(&mut Cursor::new(vec![0x05]), ReplyShape::Done, MAX_PAYLOAD) {
        Err(TagFrameError::Protocol(_)) => {}
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

// =============================================================================
// Handshake Tests
// =============================================================================

#[test]
fn test_handshake() {
    let mut buffer = Vec::new();
    write_handshake(&mut buffer, HandlerKind::Storage).unwrap();
    assert_eq!(buffer, vec![0x01]);
    assert_eq!(
        read_handshake(&mut Cursor::new(buffer)).unwrap(),
        HandlerKind::Storage
    );

    assert!(read_handshake(&mut Cursor::new(vec![0x02])).is_err());
}
