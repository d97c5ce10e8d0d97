//! Codec Tests
//!
//! These tests verify:
//! - Length recovery for the byte, reverse and text schemes at every width
//! - Cursor semantics at and past the end of storage
//! - Record deletion and insertion leave other records untouched
//! - Rejection of bytes that are not a valid indicator
//! - The numeral-content regression of the text scheme

use tagframe::codec::{ByteCodec, Cursor, IndicatorCodec, ReverseByteCodec, TextCodec};
use tagframe::storage::{MemoryStorage, Storage};
use tagframe::TagFrameError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Lengths on both sides of every 256^k threshold the tests can afford
fn boundary_lengths() -> Vec<usize> {
    let mut lengths = vec![0, 1, 2, 255, 256, 65535, 65536];
    lengths.extend([
        3, 7, 100, 127, 128, 200, 253, 254, 257, 300, 511, 512, 1000, 1023, 1024, 4096, 9999,
        32767, 32768, 65534, 65537, 70000, 100_000, 131_072, 16_777_215, 16_777_216,
    ]);
    lengths
}

/// Content of `len` bytes that also exercises digit bytes
fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| b"0123456789abcdef"[i % 16]).collect()
}

fn assert_malformed<T: std::fmt::Debug>(result: tagframe::Result<T>) {
    match result {
        Err(TagFrameError::MalformedIndicator { .. }) => {}
        other => panic!("Expected MalformedIndicator, got {:?}", other),
    }
}

/// Every length survives encode then `bounds_at` with the given codec
fn check_boundaries<C: IndicatorCodec>(codec: &C) {
    for len in boundary_lengths() {
        let value = content(len);
        let mut storage = MemoryStorage::from_bytes(codec.encode(&value));

        let bounds = codec.bounds_at(&storage, 0).unwrap().unwrap();
        assert_eq!(bounds.record_start, 0);
        assert_eq!(bounds.content_len(), len as u64, "length {}", len);
        assert_eq!(bounds.content_end, storage.size().unwrap());

        // The same record behind another one
        storage.set_all(&[]).unwrap();
        codec.append(&mut storage, b"lead").unwrap();
        let appended = codec.append(&mut storage, &value).unwrap();
        let found = codec.bounds_at(&storage, appended.record_start).unwrap().unwrap();
        assert_eq!(found, appended);
    }
}

// =============================================================================
// Byte Scheme Tests
// =============================================================================

#[test]
fn test_byte_boundaries() {
    check_boundaries(&ByteCodec::new());
}

#[test]
fn test_byte_indicator_lengths() {
    let codec = ByteCodec::new();
    let cases = [
        (0usize, 1u64),
        (1, 1),
        (254, 1),
        (255, 3),
        (256, 4),
        (65535, 4),
        (65536, 5),
        (16_777_216, 6),
    ];
    for (len, indicator_len) in cases {
        let storage = MemoryStorage::from_bytes(codec.encode(&vec![0u8; len]));
        let bounds = codec.bounds_at(&storage, 0).unwrap().unwrap();
        assert_eq!(bounds.indicator_len(), indicator_len, "length {}", len);
        assert_eq!(bounds.record_len(), indicator_len + len as u64);
    }
}

#[test]
fn test_byte_empty_and_single() {
    let codec = ByteCodec::new();

    let storage = MemoryStorage::from_bytes(codec.encode(&[]));
    assert_eq!(storage.as_bytes(), &[0]);
    let mut cursor = Cursor::new();
    assert_eq!(codec.decode(&storage, &mut cursor).unwrap(), Some(vec![]));

    let storage = MemoryStorage::from_bytes(codec.encode(&[0x42]));
    assert_eq!(storage.as_bytes(), &[1, 0x42]);
    let mut cursor = Cursor::new();
    assert_eq!(codec.decode(&storage, &mut cursor).unwrap(), Some(vec![0x42]));
}

#[test]
fn test_byte_sequence_roundtrip() {
    let codec = ByteCodec::new();
    let values: Vec<Vec<u8>> = [0usize, 5, 254, 255, 256, 1000, 70_000, 0, 1]
        .iter()
        .map(|len| content(*len))
        .collect();

    let mut storage = MemoryStorage::new();
    for value in &values {
        codec.append(&mut storage, value).unwrap();
    }

    let mut cursor = Cursor::new();
    let decoded = codec.decode_many(&storage, &mut cursor, -1).unwrap();
    assert_eq!(decoded, values);
    assert_eq!(cursor.offset(), storage.size().unwrap());
}

#[test]
fn test_decode_past_end_leaves_cursor() {
    let codec = ByteCodec::new();
    let mut storage = MemoryStorage::new();
    codec.append(&mut storage, b"only").unwrap();

    let mut cursor = Cursor::new();
    codec.decode(&storage, &mut cursor).unwrap();
    let end = cursor.offset();

    assert_eq!(codec.decode(&storage, &mut cursor).unwrap(), None);
    assert_eq!(codec.skip(&storage, &mut cursor).unwrap(), None);
    assert_eq!(codec.delete(&mut storage, &mut cursor).unwrap(), None);
    assert_eq!(cursor.offset(), end);

    // New data appended past the cursor becomes visible
    codec.append(&mut storage, b"more").unwrap();
    assert_eq!(
        codec.decode(&storage, &mut cursor).unwrap(),
        Some(b"more".to_vec())
    );
}

#[test]
fn test_decode_many_respects_max() {
    let codec = ByteCodec::new();
    let mut storage = MemoryStorage::new();
    for value in [b"a", b"b", b"c", b"d"] {
        codec.append(&mut storage, value).unwrap();
    }

    let mut cursor = Cursor::new();
    assert_eq!(
        codec.decode_many(&storage, &mut cursor, 2).unwrap(),
        vec![b"a".to_vec(), b"b".to_vec()]
    );
    assert_eq!(codec.decode_many(&storage, &mut cursor, 0).unwrap().len(), 0);
    assert_eq!(
        codec.decode_many(&storage, &mut cursor, 10).unwrap(),
        vec![b"c".to_vec(), b"d".to_vec()]
    );
}

#[test]
fn test_skip_matches_decode() {
    let codec = ByteCodec::new();
    let mut storage = MemoryStorage::new();
    codec.append(&mut storage, &content(300)).unwrap();
    codec.append(&mut storage, b"next").unwrap();

    let mut skipping = Cursor::new();
    let mut decoding = Cursor::new();
    let bounds = codec.skip(&storage, &mut skipping).unwrap().unwrap();
    codec.decode(&storage, &mut decoding).unwrap();

    assert_eq!(skipping, decoding);
    assert_eq!(bounds.content_end, skipping.offset());
    assert_eq!(bounds.content_len(), 300);
}

// =============================================================================
// Deletion / Insertion Tests
// =============================================================================

#[test]
fn test_delete_removes_exactly_one_record() {
    let codec = ByteCodec::new();
    let values: Vec<Vec<u8>> = vec![content(10), content(400), content(3), content(70_000)];

    for victim in 0..values.len() {
        let mut storage = MemoryStorage::new();
        for value in &values {
            codec.append(&mut storage, value).unwrap();
        }
        let size_before = storage.size().unwrap();

        let mut cursor = Cursor::new();
        for _ in 0..victim {
            codec.skip(&storage, &mut cursor).unwrap();
        }
        let position = cursor.offset();
        let removed = codec.delete(&mut storage, &mut cursor).unwrap().unwrap();

        // Cursor stays put and now points at the following record
        assert_eq!(cursor.offset(), position);
        assert_eq!(size_before - storage.size().unwrap(), removed.record_len());

        let mut expected = values.clone();
        expected.remove(victim);
        let mut rescan = Cursor::new();
        assert_eq!(codec.decode_many(&storage, &mut rescan, -1).unwrap(), expected);
    }
}

#[test]
fn test_delete_many() {
    let codec = ByteCodec::new();
    let mut storage = MemoryStorage::new();
    for value in [b"a", b"b", b"c", b"d", b"e"] {
        codec.append(&mut storage, value).unwrap();
    }

    let mut cursor = Cursor::new();
    codec.skip(&storage, &mut cursor).unwrap();
    assert_eq!(codec.delete_many(&mut storage, &mut cursor, 2).unwrap(), 2);

    let mut rescan = Cursor::new();
    assert_eq!(
        codec.decode_many(&storage, &mut rescan, -1).unwrap(),
        vec![b"a".to_vec(), b"d".to_vec(), b"e".to_vec()]
    );

    assert_eq!(codec.delete_many(&mut storage, &mut cursor, -1).unwrap(), 2);
    assert_eq!(storage.as_bytes(), &[1, b'a']);
}

#[test]
fn test_insert_at_cursor() {
    let codec = ByteCodec::new();
    let mut storage = MemoryStorage::new();
    codec.append(&mut storage, b"first").unwrap();
    codec.append(&mut storage, b"third").unwrap();

    let mut cursor = Cursor::new();
    codec.skip(&storage, &mut cursor).unwrap();
    let bounds = codec.insert(&mut storage, &mut cursor, b"second").unwrap();
    assert_eq!(bounds.content_len(), 6);
    assert_eq!(cursor.offset(), bounds.content_end);

    // The cursor sits on the record that used to be at its position
    assert_eq!(
        codec.decode(&storage, &mut cursor).unwrap(),
        Some(b"third".to_vec())
    );

    let mut rescan = Cursor::new();
    assert_eq!(
        codec.decode_many(&storage, &mut rescan, -1).unwrap(),
        vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]
    );
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_record_past_end_is_malformed() {
    let codec = ByteCodec::new();
    let storage = MemoryStorage::from_bytes(vec![5, b'a', b'b']);
    assert_malformed(codec.bounds_at(&storage, 0));

    let mut cursor = Cursor::new();
    assert_malformed(codec.decode(&storage, &mut cursor));
    assert_eq!(cursor.offset(), 0);
}

#[test]
fn test_truncated_nested_indicator_is_malformed() {
    let codec = ByteCodec::new();
    let storage = MemoryStorage::from_bytes(vec![0xFF, 2, 1]);
    assert_malformed(codec.bounds_at(&storage, 0));
}

#[test]
fn test_split_first() {
    let codec = ByteCodec::new();
    let mut bytes = codec.encode(b"one");
    bytes.extend(codec.encode(b"two"));

    let (first, rest) = codec.split_first(&bytes).unwrap().unwrap();
    assert_eq!(first, b"one");
    let (second, rest) = codec.split_first(rest).unwrap().unwrap();
    assert_eq!(second, b"two");
    assert!(codec.split_first(rest).unwrap().is_none());

    assert_malformed(codec.split_first(&[9, 1, 2]));
}

// =============================================================================
// Reverse Scheme Tests
// =============================================================================

#[test]
fn test_reverse_boundaries() {
    let codec = ReverseByteCodec::new();
    for len in boundary_lengths() {
        let value = content(len);
        let mut storage = MemoryStorage::new();
        codec.append(&mut storage, b"lead").unwrap();
        let appended = codec.append(&mut storage, &value).unwrap();

        let tail = storage.size().unwrap();
        let bounds = codec.bounds_before(&storage, tail).unwrap().unwrap();
        assert_eq!(bounds, appended);
        assert_eq!(bounds.content_len(), len as u64, "length {}", len);
    }
}

#[test]
fn test_reverse_trailer_layout() {
    let codec = ReverseByteCodec::new();
    assert_eq!(codec.encode_trailer(0), vec![0]);
    assert_eq!(codec.encode_trailer(254), vec![254]);
    assert_eq!(codec.encode_trailer(255), vec![255, 1, 0xFF]);
    assert_eq!(codec.encode_trailer(256), vec![1, 0, 2, 0xFF]);
}

#[test]
fn test_reverse_walks_back() {
    let codec = ReverseByteCodec::new();
    let values: Vec<Vec<u8>> = [3usize, 0, 300, 65536, 1]
        .iter()
        .map(|len| content(*len))
        .collect();

    let mut storage = MemoryStorage::new();
    for value in &values {
        codec.append(&mut storage, value).unwrap();
    }

    let mut cursor = Cursor::at(storage.size().unwrap());
    let mut decoded = codec.decode_many_back(&storage, &mut cursor, -1).unwrap();
    decoded.reverse();
    assert_eq!(decoded, values);
    assert_eq!(cursor.offset(), 0);

    // At the front there is nothing more
    assert_eq!(codec.decode_back(&storage, &mut cursor).unwrap(), None);
    assert_eq!(cursor.offset(), 0);
}

#[test]
fn test_reverse_skip_back() {
    let codec = ReverseByteCodec::new();
    let mut storage = MemoryStorage::new();
    let first = codec.append(&mut storage, b"front").unwrap();
    codec.append(&mut storage, &content(500)).unwrap();

    let mut cursor = Cursor::at(storage.size().unwrap());
    let bounds = codec.skip_back(&storage, &mut cursor).unwrap().unwrap();
    assert_eq!(bounds.content_len(), 500);
    assert_eq!(cursor.offset(), first.record_end);
}

#[test]
fn test_reverse_tail_past_end() {
    let codec = ReverseByteCodec::new();
    let storage = MemoryStorage::from_bytes(codec.encode(b"x"));
    match codec.bounds_before(&storage, 10) {
        Err(TagFrameError::OutOfRange { .. }) => {}
        other => panic!("Expected OutOfRange, got {:?}", other),
    }
}

#[test]
fn test_reverse_split_last() {
    let codec = ReverseByteCodec::new();
    let mut bytes = codec.encode(b"one");
    bytes.extend(codec.encode(b"two"));

    let (rest, last) = codec.split_last(&bytes).unwrap().unwrap();
    assert_eq!(last, b"two");
    let (rest, last) = codec.split_last(rest).unwrap().unwrap();
    assert_eq!(last, b"one");
    assert!(codec.split_last(rest).unwrap().is_none());
}

// =============================================================================
// Text Scheme Tests
// =============================================================================

#[test]
fn test_text_boundaries() {
    check_boundaries(&TextCodec::new());
}

#[test]
fn test_text_layout() {
    let codec = TextCodec::new();
    assert_eq!(codec.encode_str(""), "0a");
    assert_eq!(codec.encode_str("hello"), "5fhello");
    assert_eq!(codec.encode_str("10"), "2Z10");
}

#[test]
fn test_text_numeral_content_regression() {
    let codec = TextCodec::new();
    let mut storage = MemoryStorage::new();
    codec.append(&mut storage, b"10").unwrap();
    codec.append(&mut storage, b"12345678901234567890").unwrap();
    codec.append(&mut storage, b"7").unwrap();

    let mut cursor = Cursor::new();
    assert_eq!(codec.decode_string(&storage, &mut cursor).unwrap().unwrap(), "10");
    assert_eq!(
        codec.decode_string(&storage, &mut cursor).unwrap().unwrap(),
        "12345678901234567890"
    );
    assert_eq!(codec.decode_string(&storage, &mut cursor).unwrap().unwrap(), "7");
    assert_eq!(codec.decode_string(&storage, &mut cursor).unwrap(), None);
}

#[test]
fn test_text_wrong_guard_is_malformed() {
    let codec = TextCodec::new();
    // "10" framed with the guard that belongs to a different first character
    let storage = MemoryStorage::from_bytes(b"2a10".to_vec());
    assert_malformed(codec.bounds_at(&storage, 0));
}

#[test]
fn test_text_invalid_utf8_restores_cursor() {
    let codec = TextCodec::new();
    let mut storage = MemoryStorage::new();
    codec.append(&mut storage, &[0xC3, 0x28]).unwrap();

    let mut cursor = Cursor::new();
    match codec.decode_string(&storage, &mut cursor) {
        Err(TagFrameError::InvalidUtf8(_)) => {}
        other => panic!("Expected InvalidUtf8, got {:?}", other),
    }
    assert_eq!(cursor.offset(), 0);

    // Raw decode still works
    assert_eq!(
        codec.decode(&storage, &mut cursor).unwrap(),
        Some(vec![0xC3, 0x28])
    );
}

#[test]
fn test_text_split_str() {
    let codec = TextCodec::new();
    let joined = format!("{}{}", codec.encode_str("héllo"), codec.encode_str("42"));

    let (first, rest) = codec.split_str(&joined).unwrap().unwrap();
    assert_eq!(first, "héllo");
    let (second, rest) = codec.split_str(rest).unwrap().unwrap();
    assert_eq!(second, "42");
    assert!(codec.split_str(rest).unwrap().is_none());
}

#[test]
fn test_text_delete() {
    let codec = TextCodec::new();
    let mut storage = MemoryStorage::new();
    for value in ["alpha", "22", "gamma"] {
        codec.append(&mut storage, value.as_bytes()).unwrap();
    }

    let mut cursor = Cursor::new();
    codec.skip(&storage, &mut cursor).unwrap();
    codec.delete(&mut storage, &mut cursor).unwrap().unwrap();

    let mut rescan = Cursor::new();
    assert_eq!(
        codec.decode_many(&storage, &mut rescan, -1).unwrap(),
        vec![b"alpha".to_vec(), b"gamma".to_vec()]
    );
}
