//! Request handlers
//!
//! Each handler reads its own fields from the connection and performs one
//! storage call. A handler returns `Err` only when the connection itself is
//! unusable (short read, oversized payload); a failed storage call becomes an
//! ERROR reply and the session continues.

use std::collections::HashMap;
use std::io::Read;

use crate::error::Result;
use crate::protocol::*;
use crate::storage::Storage;

use super::SharedStorage;

/// Handler signature: session state plus the stream positioned at the fields
pub(crate) type HandlerFn = fn(&mut Session, &mut dyn Read) -> Result<Reply>;

/// Handler table keyed by `(kind, cause)`
pub(crate) type HandlerTable = HashMap<(u8, u8), HandlerFn>;

/// Per-connection state chosen by the handshake
pub(crate) struct Session {
    pub kind: HandlerKind,
    pub storage: SharedStorage,
    pub max_payload: u64,
}

impl Session {
    pub fn new(kind: HandlerKind, storage: SharedStorage, max_payload: u64) -> Self {
        Self {
            kind,
            storage,
            max_payload,
        }
    }
}

/// Handlers available to a session of the given kind. Control handlers are
/// always present; storage handlers only after a storage handshake.
pub(crate) fn handler_table(kind: HandlerKind) -> HandlerTable {
    let mut table: HandlerTable = HashMap::new();
    let control = HandlerKind::Control as u8;
    table.insert((control, CONTROL_PING), ping);

    if kind == HandlerKind::Storage {
        let storage = HandlerKind::Storage as u8;
        table.insert((storage, STORAGE_SET_CONTENT), set_content);
        table.insert((storage, STORAGE_GET_CONTENT), get_content);
        table.insert((storage, STORAGE_DELETE_RANGE), delete_range);
        table.insert((storage, STORAGE_APPEND), append);
        table.insert((storage, STORAGE_SUB_ARRAY), sub_array);
        table.insert((storage, STORAGE_GET_SIZE), get_size);
        table.insert((storage, STORAGE_SET), set);
    }

    table
}

/// Turn the outcome of a storage call into a reply
fn respond(result: Result<Reply>) -> Reply {
    match result {
        Ok(reply) => reply,
        Err(e) => {
            tracing::debug!("Storage call failed: {}", e);
            Reply::Error(e.to_string())
        }
    }
}

// =============================================================================
// Control
// =============================================================================

fn ping(_session: &mut Session, _fields: &mut dyn Read) -> Result<Reply> {
    Ok(Reply::Done)
}

// =============================================================================
// Storage
// =============================================================================

fn set_content(session: &mut Session, fields: &mut dyn Read) -> Result<Reply> {
    let data = read_payload(fields, session.max_payload)?;
    let mut storage = session.storage.lock();
    Ok(respond(storage.set_all(&data).map(|_| Reply::Done)))
}

fn get_content(session: &mut Session, _fields: &mut dyn Read) -> Result<Reply> {
    let storage = session.storage.lock();
    Ok(respond(storage.get_all().map(Reply::Bytes)))
}

fn delete_range(session: &mut Session, fields: &mut dyn Read) -> Result<Reply> {
    let start = read_u64(fields)?;
    let end = read_u64(fields)?;
    let mut storage = session.storage.lock();
    Ok(respond(storage.delete(start, end).map(|_| Reply::Done)))
}

fn append(session: &mut Session, fields: &mut dyn Read) -> Result<Reply> {
    let data = read_payload(fields, session.max_payload)?;
    let mut storage = session.storage.lock();
    Ok(respond(storage.append(&data).map(|_| Reply::Done)))
}

fn sub_array(session: &mut Session, fields: &mut dyn Read) -> Result<Reply> {
    let start = read_u64(fields)?;
    let end = read_u64(fields)?;
    let storage = session.storage.lock();
    Ok(respond(storage.slice(start, end).map(Reply::Bytes)))
}

fn get_size(session: &mut Session, _fields: &mut dyn Read) -> Result<Reply> {
    let storage = session.storage.lock();
    Ok(respond(storage.size().map(Reply::Size)))
}

fn set(session: &mut Session, fields: &mut dyn Read) -> Result<Reply> {
    let start = read_u64(fields)?;
    let data = read_payload(fields, session.max_payload)?;
    let mut storage = session.storage.lock();
    Ok(respond(storage.set(start, &data).map(|_| Reply::Done)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn session() -> Session {
        let storage: Box<dyn Storage> = Box::new(MemoryStorage::from_bytes(b"hello".to_vec()));
        Session::new(HandlerKind::Storage, Arc::new(Mutex::new(storage)), 1024)
    }

    #[test]
    fn test_control_session_has_no_storage_handlers() {
        let table = handler_table(HandlerKind::Control);
        assert_eq!(table.len(), 1);
        assert!(table.contains_key(&(0x00, CONTROL_PING)));
        assert!(!table.contains_key(&(0x01, STORAGE_GET_SIZE)));
    }

    #[test]
    fn test_storage_error_becomes_reply() {
        let mut session = session();
        let table = handler_table(HandlerKind::Storage);
        let handler = table[&(0x01, STORAGE_SUB_ARRAY)];

        let mut fields: &[u8] = &[0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 99];
        let reply = handler(&mut session, &mut fields).unwrap();
        assert_eq!(reply.status(), Status::Error);
    }

    #[test]
    fn test_short_fields_fail_the_connection() {
        let mut session = session();
        let table = handler_table(HandlerKind::Storage);
        let handler = table[&(0x01, STORAGE_DELETE_RANGE)];

        let mut fields: &[u8] = &[0, 0, 0];
        assert!(handler(&mut session, &mut fields).is_err());
    }
}
