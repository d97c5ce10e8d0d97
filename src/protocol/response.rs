//! Reply definitions
//!
//! Represents replies sent back to a remote client.

/// Reply status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

/// What follows an OK status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Nothing (mutating calls)
    Done,
    /// A length-prefixed payload
    Bytes,
    /// One u64
    Size,
}

/// A reply to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Mutation succeeded
    Done,

    /// Content requested by GET_CONTENT or SUB_ARRAY
    Bytes(Vec<u8>),

    /// Size requested by GET_SIZE
    Size(u64),

    /// The call failed; the connection stays usable
    Error(String),
}

impl Reply {
    pub fn status(&self) -> Status {
        match self {
            Reply::Error(_) => Status::Error,
            _ => Status::Ok,
        }
    }

    /// Create an ERROR reply
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }
}
