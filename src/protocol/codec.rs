//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬───────────┬─────────────────────────────┐
//! │ Kind (1) │ Cause (1) │  Fields (cause-specific)    │
//! └──────────┴───────────┴─────────────────────────────┘
//! ```
//!
//! ### Fields by Cause
//! - DELETE_RANGE / SUB_ARRAY: start (8) + end (8)
//! - SET_CONTENT / APPEND:     len (8) + data
//! - SET:                      start (8) + len (8) + data
//! - GET_CONTENT / GET_SIZE / PING: empty
//!
//! ### Reply Format
//! ```text
//! ┌───────────┬──────────────────────────────────────────┐
//! │Status (1) │ nothing | len (8) + data | size (8)      │
//! └───────────┴──────────────────────────────────────────┘
//! ```
//! An ERROR status is always followed by len (8) + UTF-8 message.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, TagFrameError};

use super::command::*;
use super::{Reply, ReplyShape, Status};

/// Kind (1) + Cause (1)
pub const REQUEST_HEADER_SIZE: usize = 2;

// =============================================================================
// Field helpers
// =============================================================================

/// Read one byte
pub fn read_u8<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read a big-endian u64
pub fn read_u64<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok((&bytes[..]).get_u64())
}

/// Read a length-prefixed payload of at most `max_len` bytes
pub fn read_payload<R: Read + ?Sized>(reader: &mut R, max_len: u64) -> Result<Vec<u8>> {
    let len = read_u64(reader)?;
    if len > max_len {
        return Err(TagFrameError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, max_len
        )));
    }

    let mut payload = vec![0u8; len as usize];
    if len > 0 {
        reader.read_exact(&mut payload)?;
    }
    Ok(payload)
}

fn put_payload(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u64(data.len() as u64);
    buf.put_slice(data);
}

// =============================================================================
// Handshake
// =============================================================================

/// Send the opening handler-kind byte
pub fn write_handshake<W: Write + ?Sized>(writer: &mut W, kind: HandlerKind) -> Result<()> {
    writer.write_all(&[kind as u8])?;
    writer.flush()?;
    Ok(())
}

/// Read the opening handler-kind byte
pub fn read_handshake<R: Read + ?Sized>(reader: &mut R) -> Result<HandlerKind> {
    HandlerKind::try_from(read_u8(reader)?)
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> Vec<u8> {
    let payload_len = match request {
        Request::SetContent { data } | Request::Append { data } | Request::Set { data, .. } => {
            data.len()
        }
        _ => 0,
    };

    let mut buf = BytesMut::with_capacity(REQUEST_HEADER_SIZE + 16 + payload_len);
    buf.put_u8(request.kind() as u8);
    buf.put_u8(request.cause());

    match request {
        Request::Ping | Request::GetContent | Request::GetSize => {}
        Request::SetContent { data } | Request::Append { data } => put_payload(&mut buf, data),
        Request::DeleteRange { start, end } | Request::SubArray { start, end } => {
            buf.put_u64(*start);
            buf.put_u64(*end);
        }
        Request::Set { start, data } => {
            buf.put_u64(*start);
            put_payload(&mut buf, data);
        }
    }

    buf.to_vec()
}

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read + ?Sized>(reader: &mut R, max_payload: u64) -> Result<Request> {
    let kind = HandlerKind::try_from(read_u8(reader)?)?;
    let cause = read_u8(reader)?;

    match (kind, cause) {
        (HandlerKind::Control, CONTROL_PING) => Ok(Request::Ping),
        (HandlerKind::Storage, STORAGE_SET_CONTENT) => Ok(Request::SetContent {
            data: read_payload(reader, max_payload)?,
        }),
        (HandlerKind::Storage, STORAGE_GET_CONTENT) => Ok(Request::GetContent),
        (HandlerKind::Storage, STORAGE_DELETE_RANGE) => Ok(Request::DeleteRange {
            start: read_u64(reader)?,
            end: read_u64(reader)?,
        }),
        (HandlerKind::Storage, STORAGE_APPEND) => Ok(Request::Append {
            data: read_payload(reader, max_payload)?,
        }),
        (HandlerKind::Storage, STORAGE_SUB_ARRAY) => Ok(Request::SubArray {
            start: read_u64(reader)?,
            end: read_u64(reader)?,
        }),
        (HandlerKind::Storage, STORAGE_GET_SIZE) => Ok(Request::GetSize),
        (HandlerKind::Storage, STORAGE_SET) => Ok(Request::Set {
            start: read_u64(reader)?,
            data: read_payload(reader, max_payload)?,
        }),
        _ => Err(TagFrameError::Protocol(format!(
            "Unknown cause 0x{:02x} for {:?}",
            cause, kind
        ))),
    }
}

/// Decode a request from bytes, rejecting trailing data
pub fn decode_request(bytes: &[u8], max_payload: u64) -> Result<Request> {
    let mut reader = bytes;
    let request = read_request(&mut reader, max_payload)?;
    if !reader.is_empty() {
        return Err(TagFrameError::Protocol(format!(
            "{} trailing bytes after request",
            reader.len()
        )));
    }
    Ok(request)
}

/// Write a request to a stream
pub fn write_request<W: Write + ?Sized>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&encode_request(request))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Encode a reply to bytes
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(16);
    buf.put_u8(reply.status() as u8);

    match reply {
        Reply::Done => {}
        Reply::Bytes(data) => put_payload(&mut buf, data),
        Reply::Size(size) => buf.put_u64(*size),
        Reply::Error(message) => put_payload(&mut buf, message.as_bytes()),
    }

    buf.to_vec()
}

/// Write a reply to a stream
pub fn write_reply<W: Write + ?Sized>(writer: &mut W, reply: &Reply) -> Result<()> {
    writer.write_all(&encode_reply(reply))?;
    writer.flush()?;
    Ok(())
}

/// Read a reply whose OK form has the given shape
pub fn read_reply<R: Read + ?Sized>(
    reader: &mut R,
    shape: ReplyShape,
    max_payload: u64,
) -> Result<Reply> {
    let status = read_u8(reader)?;

    if status == Status::Error as u8 {
        let message = read_payload(reader, max_payload)?;
        return Ok(Reply::Error(String::from_utf8_lossy(&message).into_owned()));
    }
    if status != Status::Ok as u8 {
        return Err(TagFrameError::Protocol(format!(
            "Unknown reply status: 0x{:02x}",
            status
        )));
    }

    match shape {
        ReplyShape::Done => Ok(Reply::Done),
        ReplyShape::Bytes => Ok(Reply::Bytes(read_payload(reader, max_payload)?)),
        ReplyShape::Size => Ok(Reply::Size(read_u64(reader)?)),
    }
}
