//! Protocol Module
//!
//! Defines the wire protocol that exposes the storage contract remotely.
//!
//! ## Session
//! ```text
//! client ──► │ Kind (1) │                        handshake, selects handler set
//! client ◄── │ Status (1) │
//! client ──► │ Kind (1) │ Cause (1) │ Fields │   one request
//! client ◄── │ Status (1) │ Result │            one reply
//! ```
//! One request is in flight per connection; there are no sequence numbers.
//!
//! ### Fields
//! - Integers (offsets, lengths, sizes): u64, big-endian, 8 bytes
//! - Payloads: u64 big-endian length (8) + raw bytes
//!
//! ### Storage Causes (Kind 0x01)
//! - 0x01: SET_CONTENT  - payload                → status
//! - 0x02: GET_CONTENT  - empty                  → status + payload
//! - 0x03: DELETE_RANGE - start + end            → status
//! - 0x04: APPEND       - payload                → status
//! - 0x05: SUB_ARRAY    - start + end            → status + payload
//! - 0x06: GET_SIZE     - empty                  → status + u64
//! - 0x07: SET          - start + payload        → status
//!
//! ### Control Causes (Kind 0x00)
//! - 0x01: PING         - empty                  → status
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: ERROR (followed by a payload holding a UTF-8 message)

mod codec;
mod command;
mod response;

pub use codec::{
    decode_request, encode_reply, encode_request, read_handshake, read_payload, read_reply,
    read_request, read_u64, read_u8, write_handshake, write_reply, write_request,
};
pub use command::{HandlerKind, Request, CONTROL_PING, STORAGE_APPEND, STORAGE_DELETE_RANGE,
    STORAGE_GET_CONTENT, STORAGE_GET_SIZE, STORAGE_SET, STORAGE_SET_CONTENT, STORAGE_SUB_ARRAY};
pub use response::{Reply, ReplyShape, Status};
