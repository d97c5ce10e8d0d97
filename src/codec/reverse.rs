//! Tail-anchored byte indicator scheme
//!
//! The forward nesting mirrored behind the content, so a reader that starts at
//! the end of a storage can walk records back toward the front.
//!
//! ```text
//! L < 255:   │ content (L) │ L (1) │
//! L >= 255:  │ content (L) │ L big-endian (k) │ k (1) │ 0xFF (1) │
//! ```
//!
//! Only appending and reading are supported; records are never deleted
//! through this scheme.

use crate::error::{Result, TagFrameError};
use crate::storage::Storage;

use super::byte::{check_width, length_digits, read_nested_length, NEST_MARKER};
use super::Cursor;

/// Longest trailing indicator
const MAX_TRAILER_LEN: u64 = 10;

/// Where one tail-anchored record sits: content first, indicator after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailBounds {
    pub content_start: u64,
    pub content_end: u64,
    pub record_end: u64,
}

impl TailBounds {
    /// The record starts with its content
    pub fn record_start(&self) -> u64 {
        self.content_start
    }

    pub fn content_len(&self) -> u64 {
        self.content_end - self.content_start
    }

    /// Total on-wire length, trailer included
    pub fn record_len(&self) -> u64 {
        self.record_end - self.content_start
    }
}

/// Reverse variant of [`super::ByteCodec`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseByteCodec;

fn write_trailer(len: u64, out: &mut Vec<u8>) {
    if len < NEST_MARKER as u64 {
        out.push(len as u8);
        return;
    }
    let digits = length_digits(len);
    out.extend_from_slice(&digits);
    write_trailer(digits.len() as u64, out);
    out.push(NEST_MARKER);
}

/// Parse backwards from `end`, returning (index of first trailer byte, value)
fn parse_back(window: &[u8], end: usize, position: u64) -> Result<(usize, u64)> {
    if end == 0 {
        return Err(TagFrameError::malformed(position, "truncated trailer"));
    }
    let head = window[end - 1];
    if head != NEST_MARKER {
        return Ok((end - 1, head as u64));
    }

    let (before, width) = parse_back(window, end - 1, position)?;
    let width = check_width(width, position)?;
    if before < width {
        return Err(TagFrameError::malformed(position, "truncated nested length"));
    }
    let value = read_nested_length(&window[before - width..before], position)?;
    Ok((before - width, value))
}

impl ReverseByteCodec {
    pub fn new() -> Self {
        Self
    }

    /// Trailer bytes for a content of `len` bytes
    pub fn encode_trailer(&self, len: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(MAX_TRAILER_LEN as usize);
        write_trailer(len, &mut out);
        out
    }

    /// `value ‖ trailer`
    pub fn encode(&self, value: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(value.len() + MAX_TRAILER_LEN as usize);
        out.extend_from_slice(value);
        write_trailer(value.len() as u64, &mut out);
        out
    }

    /// Encode and append, returning where the record landed
    pub fn append<S: Storage + ?Sized>(&self, storage: &mut S, value: &[u8]) -> Result<TailBounds> {
        let content_start = storage.size()?;
        let record = self.encode(value);
        storage.append(&record)?;
        Ok(TailBounds {
            content_start,
            content_end: content_start + value.len() as u64,
            record_end: content_start + record.len() as u64,
        })
    }

    /// Bounds of the record that ends at `tail`; `None` when `tail` is 0
    pub fn bounds_before<S: Storage + ?Sized>(
        &self,
        storage: &S,
        tail: u64,
    ) -> Result<Option<TailBounds>> {
        if tail == 0 {
            return Ok(None);
        }
        let size = storage.size()?;
        if tail > size {
            return Err(TagFrameError::OutOfRange {
                start: tail,
                end: tail,
                size,
            });
        }

        let window_start = tail.saturating_sub(MAX_TRAILER_LEN);
        let window = storage.slice(window_start, tail)?;
        let (trailer_idx, content_len) = parse_back(&window, window.len(), tail)?;

        let content_end = window_start + trailer_idx as u64;
        let content_start = content_end.checked_sub(content_len).ok_or_else(|| {
            TagFrameError::malformed(
                tail,
                format!(
                    "record of {} bytes runs past start of storage",
                    content_len
                ),
            )
        })?;

        Ok(Some(TailBounds {
            content_start,
            content_end,
            record_end: tail,
        }))
    }

    /// Decode the record ending at the cursor and move the cursor to its start
    pub fn decode_back<S: Storage + ?Sized>(
        &self,
        storage: &S,
        cursor: &mut Cursor,
    ) -> Result<Option<Vec<u8>>> {
        let Some(bounds) = self.bounds_before(storage, cursor.offset())? else {
            return Ok(None);
        };
        let content = storage.slice(bounds.content_start, bounds.content_end)?;
        cursor.seek(bounds.content_start);
        Ok(Some(content))
    }

    /// Move the cursor to the start of the record ending at it, without
    /// reading the content
    pub fn skip_back<S: Storage + ?Sized>(
        &self,
        storage: &S,
        cursor: &mut Cursor,
    ) -> Result<Option<TailBounds>> {
        let Some(bounds) = self.bounds_before(storage, cursor.offset())? else {
            return Ok(None);
        };
        cursor.seek(bounds.content_start);
        Ok(Some(bounds))
    }

    /// Decode up to `max` records walking backwards (`max < 0` means all)
    pub fn decode_many_back<S: Storage + ?Sized>(
        &self,
        storage: &S,
        cursor: &mut Cursor,
        max: i64,
    ) -> Result<Vec<Vec<u8>>> {
        let mut values = Vec::new();
        while max < 0 || (values.len() as i64) < max {
            match self.decode_back(storage, cursor)? {
                Some(value) => values.push(value),
                None => break,
            }
        }
        Ok(values)
    }

    /// Split one record off the end of an in-memory slice: `(rest, content)`
    pub fn split_last<'b>(&self, bytes: &'b [u8]) -> Result<Option<(&'b [u8], &'b [u8])>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let window_start = bytes.len().saturating_sub(MAX_TRAILER_LEN as usize);
        let window = &bytes[window_start..];
        let (trailer_idx, content_len) = parse_back(window, window.len(), bytes.len() as u64)?;
        let content_end = window_start + trailer_idx;
        if content_len > content_end as u64 {
            return Err(TagFrameError::malformed(
                bytes.len() as u64,
                format!("record of {} bytes runs past start of input", content_len),
            ));
        }
        let content_start = content_end - content_len as usize;
        Ok(Some((&bytes[..content_start], &bytes[content_start..content_end])))
    }
}
