//! Byte indicator scheme
//!
//! ## Indicator Format
//! ```text
//! L < 255:   ┌───────┐
//!            │ L (1) │
//!            └───────┘
//! L >= 255:  ┌──────────┬────────────────────┬──────────────────────┐
//!            │ 0xFF (1) │ indicator(k)       │ L big-endian (k)     │
//!            └──────────┴────────────────────┴──────────────────────┘
//! ```
//! `k` is the minimal number of bytes needed for `L`, and is itself written as
//! an indicator. Since `k <= 8` the nested indicator is always one byte, so the
//! longest indicator is 10 bytes. `L = 0` is a single zero byte.

use crate::error::{Result, TagFrameError};

use super::{Indicator, IndicatorCodec};

/// Byte value that announces a nested indicator
pub(crate) const NEST_MARKER: u8 = 0xFF;

/// Widest big-endian length a nested indicator may carry
const MAX_LENGTH_WIDTH: u64 = 8;

/// Forward byte-oriented nested-length scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCodec;

impl ByteCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Minimal big-endian bytes of `len` (empty for zero)
pub(crate) fn length_digits(len: u64) -> Vec<u8> {
    let be = len.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    be[skip..].to_vec()
}

/// Append the indicator for `len` to `out`
pub(crate) fn write_indicator(len: u64, out: &mut Vec<u8>) {
    if len < NEST_MARKER as u64 {
        out.push(len as u8);
        return;
    }
    let digits = length_digits(len);
    out.push(NEST_MARKER);
    write_indicator(digits.len() as u64, out);
    out.extend_from_slice(&digits);
}

/// Read a big-endian nested length, rejecting anything but the canonical form
pub(crate) fn read_nested_length(digits: &[u8], position: u64) -> Result<u64> {
    if digits.first() == Some(&0) {
        return Err(TagFrameError::malformed(
            position,
            "nested length has a leading zero byte",
        ));
    }
    let value = digits.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
    if value < NEST_MARKER as u64 {
        return Err(TagFrameError::malformed(
            position,
            format!("nested length {} should have been a single byte", value),
        ));
    }
    Ok(value)
}

/// Validate the width carried by a nested indicator
pub(crate) fn check_width(width: u64, position: u64) -> Result<usize> {
    if width == 0 || width > MAX_LENGTH_WIDTH {
        return Err(TagFrameError::malformed(
            position,
            format!("nested length width {} not in 1..={}", width, MAX_LENGTH_WIDTH),
        ));
    }
    Ok(width as usize)
}

/// Parse starting at `idx`, returning (index after indicator, value)
fn parse_from(window: &[u8], idx: usize, position: u64) -> Result<(usize, u64)> {
    let head = *window
        .get(idx)
        .ok_or_else(|| TagFrameError::malformed(position, "truncated indicator"))?;
    if head != NEST_MARKER {
        return Ok((idx + 1, head as u64));
    }

    let (after, width) = parse_from(window, idx + 1, position)?;
    let width = check_width(width, position)?;
    let digits = window
        .get(after..after + width)
        .ok_or_else(|| TagFrameError::malformed(position, "truncated nested length"))?;
    Ok((after + width, read_nested_length(digits, position)?))
}

impl IndicatorCodec for ByteCodec {
    const MAX_INDICATOR_LEN: usize = 10;

    fn encode_indicator(&self, content: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::MAX_INDICATOR_LEN);
        write_indicator(content.len() as u64, &mut out);
        out
    }

    fn parse_indicator(&self, window: &[u8], position: u64) -> Result<Indicator> {
        let (header_len, content_len) = parse_from(window, 0, position)?;
        Ok(Indicator {
            header_len: header_len as u64,
            content_len,
        })
    }
}
