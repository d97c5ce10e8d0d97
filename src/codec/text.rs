//! Text indicator scheme
//!
//! ## Indicator Format
//! ```text
//! ┌──────────────────────┬───────────┬──────────────────┐
//! │ decimal length (1..) │ guard (1) │ content          │
//! └──────────────────────┴───────────┴──────────────────┘
//! "5k" "hello"   "2x" "10"   "0a"
//! ```
//!
//! The guard is a letter chosen from the content length and the content's
//! first byte. A decoder reads digits until the first non-digit; that byte must
//! be the expected guard. Without it, a record whose content is itself a
//! numeral (`"10"`) would be read as part of a longer length.
//!
//! Lengths count bytes of the UTF-8 content.

use crate::error::{Result, TagFrameError};
use crate::storage::Storage;

use super::{Cursor, Indicator, IndicatorCodec};

/// Letters a guard may be drawn from
const GUARD_ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Digits in `u64::MAX`
const MAX_LENGTH_DIGITS: usize = 20;

/// Decimal-length-plus-guard scheme for text payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

/// Guard character for a content of `len` bytes starting with `first`
pub fn guard_for(len: u64, first: Option<u8>) -> u8 {
    let alphabet = GUARD_ALPHABET.len() as u64;
    let index = (len % alphabet + first.unwrap_or(0) as u64) % alphabet;
    GUARD_ALPHABET[index as usize]
}

impl TextCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode a string record as a string
    pub fn encode_str(&self, value: &str) -> String {
        let guard = guard_for(value.len() as u64, value.bytes().next());
        format!("{}{}{}", value.len(), guard as char, value)
    }

    /// Decode the record at the cursor as UTF-8 text
    pub fn decode_string<S: Storage + ?Sized>(
        &self,
        storage: &S,
        cursor: &mut Cursor,
    ) -> Result<Option<String>> {
        let start = *cursor;
        match self.decode(storage, cursor)? {
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(Some(text)),
                Err(e) => {
                    *cursor = start;
                    Err(e.into())
                }
            },
            None => Ok(None),
        }
    }

    /// Split one text record off the front of `text`: `(content, rest)`
    pub fn split_str<'t>(&self, text: &'t str) -> Result<Option<(&'t str, &'t str)>> {
        let Some((content, rest)) = self.split_first(text.as_bytes())? else {
            return Ok(None);
        };
        let content_len = content.len();
        let rest_start = text.len() - rest.len();
        let content_start = rest_start - content_len;
        match (
            text.get(content_start..rest_start),
            text.get(rest_start..),
        ) {
            (Some(content), Some(rest)) => Ok(Some((content, rest))),
            _ => Err(TagFrameError::malformed(
                0,
                "record boundary splits a UTF-8 character",
            )),
        }
    }
}

impl IndicatorCodec for TextCodec {
    const MAX_INDICATOR_LEN: usize = MAX_LENGTH_DIGITS + 1;

    fn encode_indicator(&self, content: &[u8]) -> Vec<u8> {
        let len = content.len() as u64;
        let mut out = len.to_string().into_bytes();
        out.push(guard_for(len, content.first().copied()));
        out
    }

    fn parse_indicator(&self, window: &[u8], position: u64) -> Result<Indicator> {
        let digits = window.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(TagFrameError::malformed(position, "expected a decimal length"));
        }
        if digits > MAX_LENGTH_DIGITS {
            return Err(TagFrameError::malformed(position, "decimal length too long"));
        }
        if digits > 1 && window[0] == b'0' {
            return Err(TagFrameError::malformed(
                position,
                "decimal length has a leading zero",
            ));
        }

        let guard = *window
            .get(digits)
            .ok_or_else(|| TagFrameError::malformed(position, "missing guard character"))?;
        if !GUARD_ALPHABET.contains(&guard) {
            return Err(TagFrameError::malformed(
                position,
                format!("byte 0x{:02x} is not a guard character", guard),
            ));
        }

        let content_len = window[..digits].iter().try_fold(0u64, |acc, d| {
            acc.checked_mul(10)?.checked_add((d - b'0') as u64)
        });
        let content_len = content_len
            .ok_or_else(|| TagFrameError::malformed(position, "decimal length overflows"))?;

        Ok(Indicator {
            header_len: digits as u64 + 1,
            content_len,
        })
    }

    fn check_content(
        &self,
        window: &[u8],
        indicator: &Indicator,
        first_byte: Option<u8>,
        position: u64,
    ) -> Result<()> {
        let guard = window[indicator.header_len as usize - 1];
        let expected = guard_for(indicator.content_len, first_byte);
        if guard != expected {
            return Err(TagFrameError::malformed(
                position,
                format!(
                    "guard '{}' does not match expected '{}'",
                    guard as char, expected as char
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_never_a_digit() {
        for len in 0..200u64 {
            for first in [None, Some(b'0'), Some(b'9'), Some(0xFF)] {
                assert!(!guard_for(len, first).is_ascii_digit());
            }
        }
    }

    #[test]
    fn test_parse_numeral_content() {
        let codec = TextCodec::new();
        let encoded = codec.encode(b"10");
        let indicator = codec.parse_indicator(&encoded, 0).unwrap();
        assert_eq!(indicator.header_len, 2);
        assert_eq!(indicator.content_len, 2);
    }

    #[test]
    fn test_parse_rejects_missing_guard() {
        let codec = TextCodec::new();
        assert!(codec.parse_indicator(b"12", 0).is_err());
        assert!(codec.parse_indicator(b"1-x", 0).is_err());
        assert!(codec.parse_indicator(b"01a", 0).is_err());
        assert!(codec.parse_indicator(b"abc", 0).is_err());
    }
}
