//! Request definitions
//!
//! Represents storage calls sent by a remote client.

use crate::error::{Result, TagFrameError};

use super::ReplyShape;

// Control causes
pub const CONTROL_PING: u8 = 0x01;

// Storage causes
pub const STORAGE_SET_CONTENT: u8 = 0x01;
pub const STORAGE_GET_CONTENT: u8 = 0x02;
pub const STORAGE_DELETE_RANGE: u8 = 0x03;
pub const STORAGE_APPEND: u8 = 0x04;
pub const STORAGE_SUB_ARRAY: u8 = 0x05;
pub const STORAGE_GET_SIZE: u8 = 0x06;
pub const STORAGE_SET: u8 = 0x07;

/// Handler set a message is addressed to (the first byte of every request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandlerKind {
    Control = 0x00,
    Storage = 0x01,
}

impl TryFrom<u8> for HandlerKind {
    type Error = TagFrameError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(HandlerKind::Control),
            0x01 => Ok(HandlerKind::Storage),
            _ => Err(TagFrameError::Protocol(format!(
                "Unknown handler kind: 0x{:02x}",
                byte
            ))),
        }
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Health check
    Ping,

    /// Replace the whole content
    SetContent { data: Vec<u8> },

    /// Fetch the whole content
    GetContent,

    /// Remove `[start, end)`
    DeleteRange { start: u64, end: u64 },

    /// Append bytes
    Append { data: Vec<u8> },

    /// Fetch `[start, end)`
    SubArray { start: u64, end: u64 },

    /// Fetch the current size
    GetSize,

    /// Overwrite or extend at `start`
    Set { start: u64, data: Vec<u8> },
}

impl Request {
    /// Handler set this request belongs to
    pub fn kind(&self) -> HandlerKind {
        match self {
            Request::Ping => HandlerKind::Control,
            _ => HandlerKind::Storage,
        }
    }

    /// Cause byte within the handler set
    pub fn cause(&self) -> u8 {
        match self {
            Request::Ping => CONTROL_PING,
            Request::SetContent { .. } => STORAGE_SET_CONTENT,
            Request::GetContent => STORAGE_GET_CONTENT,
            Request::DeleteRange { .. } => STORAGE_DELETE_RANGE,
            Request::Append { .. } => STORAGE_APPEND,
            Request::SubArray { .. } => STORAGE_SUB_ARRAY,
            Request::GetSize => STORAGE_GET_SIZE,
            Request::Set { .. } => STORAGE_SET,
        }
    }

    /// What a successful reply carries after the status byte
    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Request::GetContent | Request::SubArray { .. } => ReplyShape::Bytes,
            Request::GetSize => ReplyShape::Size,
            _ => ReplyShape::Done,
        }
    }
}
