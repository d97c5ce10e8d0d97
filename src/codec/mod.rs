//! Indicator Codec Module
//!
//! Frames records inside a storage so their boundaries can be rediscovered by
//! scanning from a known offset, without any external index.
//!
//! ## Record Layout
//! ```text
//! ┌──────────────────────┬─────────────────────────────┐
//! │ Indicator (1..N)     │ Content (indicator length)  │
//! └──────────────────────┴─────────────────────────────┘
//! record_start           content_start                 content_end
//! ```
//!
//! ## Schemes
//! - [`ByteCodec`]: one length byte, nested "indicator of an indicator" for
//!   longer lengths
//! - [`ReverseByteCodec`]: the same nesting mirrored behind the content, read
//!   from the tail toward the front
//! - [`TextCodec`]: decimal length, one guard character, then the content
//!
//! Every cursor operation that starts at or past the end of the storage
//! returns `None`. That is the end-of-sequence signal, never an error.

mod byte;
mod cursor;
mod reverse;
mod text;

pub use byte::ByteCodec;
pub use cursor::Cursor;
pub use reverse::{ReverseByteCodec, TailBounds};
pub use text::TextCodec;

use crate::error::{Result, TagFrameError};
use crate::storage::Storage;

/// Where one record sits inside a storage
///
/// Invariant: `record_start <= content_start <= content_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub record_start: u64,
    pub content_start: u64,
    pub content_end: u64,
}

impl Bounds {
    /// Length of the content alone
    pub fn content_len(&self) -> u64 {
        self.content_end - self.content_start
    }

    /// Length of the indicator alone
    pub fn indicator_len(&self) -> u64 {
        self.content_start - self.record_start
    }

    /// Total on-wire length, indicator included
    pub fn record_len(&self) -> u64 {
        self.content_end - self.record_start
    }
}

/// A parsed indicator: how long it is and how long its content is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub header_len: u64,
    pub content_len: u64,
}

/// A self-delimiting length scheme plus the cursor operations built on it
///
/// Implementors supply `encode_indicator` and `parse_indicator`; everything
/// else is provided.
pub trait IndicatorCodec {
    /// Longest indicator this scheme produces
    const MAX_INDICATOR_LEN: usize;

    /// Indicator bytes for `content`
    fn encode_indicator(&self, content: &[u8]) -> Vec<u8>;

    /// Parse the indicator at the front of `window`.
    ///
    /// `window` starts at the record and holds at most `MAX_INDICATOR_LEN`
    /// bytes (fewer near the end of storage). `position` is only used in error
    /// messages.
    fn parse_indicator(&self, window: &[u8], position: u64) -> Result<Indicator>;

    /// Cross-check a parsed indicator against the first content byte
    fn check_content(
        &self,
        _window: &[u8],
        _indicator: &Indicator,
        _first_byte: Option<u8>,
        _position: u64,
    ) -> Result<()> {
        Ok(())
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// `indicator ‖ value`
    fn encode(&self, value: &[u8]) -> Vec<u8> {
        let mut out = self.encode_indicator(value);
        out.reserve(value.len());
        out.extend_from_slice(value);
        out
    }

    /// Encode `value` and append it, returning where it landed
    fn append<S: Storage + ?Sized>(&self, storage: &mut S, value: &[u8]) -> Result<Bounds> {
        let record_start = storage.size()?;
        let indicator = self.encode_indicator(value);
        let mut record = indicator;
        let content_start = record_start + record.len() as u64;
        record.extend_from_slice(value);
        storage.append(&record)?;
        Ok(Bounds {
            record_start,
            content_start,
            content_end: content_start + value.len() as u64,
        })
    }

    /// Encode `value` and place it at the cursor, in front of the record that
    /// starts there. Other records' content is untouched; the cursor ends up
    /// on the record that used to be at its position.
    fn insert<S: Storage + ?Sized>(
        &self,
        storage: &mut S,
        cursor: &mut Cursor,
        value: &[u8],
    ) -> Result<Bounds> {
        let record_start = cursor.offset();
        let record = self.encode(value);
        storage.insert(record_start, &record)?;
        let content_end = record_start + record.len() as u64;
        cursor.seek(content_end);
        Ok(Bounds {
            record_start,
            content_start: content_end - value.len() as u64,
            content_end,
        })
    }

    // =========================================================================
    // Boundary discovery
    // =========================================================================

    /// Bounds of the record starting at `position`, `None` at or past the end
    fn bounds_at<S: Storage + ?Sized>(&self, storage: &S, position: u64) -> Result<Option<Bounds>> {
        let size = storage.size()?;
        if position >= size {
            return Ok(None);
        }

        let window_end = size.min(position + Self::MAX_INDICATOR_LEN as u64);
        let window = storage.slice(position, window_end)?;
        let indicator = self.parse_indicator(&window, position)?;

        let content_start = position + indicator.header_len;
        let content_end = content_start
            .checked_add(indicator.content_len)
            .filter(|end| *end <= size)
            .ok_or_else(|| {
                TagFrameError::malformed(
                    position,
                    format!(
                        "record of {} bytes runs past end of storage ({} bytes)",
                        indicator.content_len, size
                    ),
                )
            })?;

        let first_byte = if indicator.content_len == 0 {
            None
        } else if (indicator.header_len as usize) < window.len() {
            Some(window[indicator.header_len as usize])
        } else {
            storage
                .slice(content_start, content_start + 1)?
                .first()
                .copied()
        };
        self.check_content(&window, &indicator, first_byte, position)?;

        Ok(Some(Bounds {
            record_start: position,
            content_start,
            content_end,
        }))
    }

    /// Split one record off the front of an in-memory byte slice
    ///
    /// Returns `(content, rest)`, or `None` for an empty slice.
    fn split_first<'b>(&self, bytes: &'b [u8]) -> Result<Option<(&'b [u8], &'b [u8])>> {
        if bytes.is_empty() {
            return Ok(None);
        }

        let window = &bytes[..bytes.len().min(Self::MAX_INDICATOR_LEN)];
        let indicator = self.parse_indicator(window, 0)?;
        let total = indicator.header_len.checked_add(indicator.content_len);
        if total.map_or(true, |t| t > bytes.len() as u64) {
            return Err(TagFrameError::malformed(
                0,
                format!(
                    "record of {} bytes runs past end of input ({} bytes)",
                    indicator.content_len,
                    bytes.len()
                ),
            ));
        }

        let start = indicator.header_len as usize;
        let end = start + indicator.content_len as usize;
        let first_byte = bytes[start..end].first().copied();
        self.check_content(window, &indicator, first_byte, 0)?;
        Ok(Some((&bytes[start..end], &bytes[end..])))
    }

    // =========================================================================
    // Cursor operations
    // =========================================================================

    /// Decode the record at the cursor and advance past it
    fn decode<S: Storage + ?Sized>(&self, storage: &S, cursor: &mut Cursor) -> Result<Option<Vec<u8>>> {
        let Some(bounds) = self.bounds_at(storage, cursor.offset())? else {
            return Ok(None);
        };
        let content = storage.slice(bounds.content_start, bounds.content_end)?;
        cursor.seek(bounds.content_end);
        Ok(Some(content))
    }

    /// Advance past the record at the cursor without reading its content
    fn skip<S: Storage + ?Sized>(&self, storage: &S, cursor: &mut Cursor) -> Result<Option<Bounds>> {
        let Some(bounds) = self.bounds_at(storage, cursor.offset())? else {
            return Ok(None);
        };
        cursor.seek(bounds.content_end);
        Ok(Some(bounds))
    }

    /// Remove the record at the cursor. The cursor stays put, which now makes
    /// it point at the record that followed.
    fn delete<S: Storage + ?Sized>(&self, storage: &mut S, cursor: &mut Cursor) -> Result<Option<Bounds>> {
        let Some(bounds) = self.bounds_at(&*storage, cursor.offset())? else {
            return Ok(None);
        };
        storage.delete(bounds.record_start, bounds.content_end)?;
        Ok(Some(bounds))
    }

    /// Decode up to `max` records (`max < 0` means all remaining)
    fn decode_many<S: Storage + ?Sized>(
        &self,
        storage: &S,
        cursor: &mut Cursor,
        max: i64,
    ) -> Result<Vec<Vec<u8>>> {
        let mut values = Vec::new();
        while max < 0 || (values.len() as i64) < max {
            match self.decode(storage, cursor)? {
                Some(value) => values.push(value),
                None => break,
            }
        }
        Ok(values)
    }

    /// Delete up to `max` records (`max < 0` means all remaining); returns
    /// how many were removed
    fn delete_many<S: Storage + ?Sized>(
        &self,
        storage: &mut S,
        cursor: &mut Cursor,
        max: i64,
    ) -> Result<usize> {
        let mut removed = 0usize;
        while max < 0 || (removed as i64) < max {
            match self.delete(storage, cursor)? {
                Some(_) => removed += 1,
                None => break,
            }
        }
        Ok(removed)
    }
}
