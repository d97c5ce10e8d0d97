//! Storage Module
//!
//! A mutable, growable byte sequence that the indicator codec reads and edits.
//!
//! ## Responsibilities
//! - Report the current length and hand out slices of it
//! - Append, overwrite-or-extend, insert and delete ranges in place
//! - Stream a range without materialising it
//!
//! ## Backends
//! ```text
//! ┌────────────────┐   ┌────────────────┐   ┌────────────────────────┐
//! │ MemoryStorage  │   │  FileStorage   │   │ RemoteStorage (client) │
//! │   Vec<u8>      │   │ positioned I/O │   │  one request per call  │
//! └────────────────┘   └────────────────┘   └────────────────────────┘
//! ```
//!
//! Every offset is a byte offset in `[0, size()]`. Reads take `&self` so a
//! shared lock is enough for lookups; mutations take `&mut self`.

mod file;
mod memory;
mod stream;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use stream::StorageStream;

use crate::error::{Result, TagFrameError};

/// The storage contract shared by every backend
pub trait Storage: Send {
    /// Current length in bytes
    fn size(&self) -> Result<u64>;

    /// Copy of `[start, end)`
    ///
    /// Fails with `OutOfRange` if `end > size()` or `start > end`.
    fn slice(&self, start: u64, end: u64) -> Result<Vec<u8>>;

    /// Replace the whole content
    fn set_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Grow by `bytes.len()`
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Overwrite at `start`, growing the storage if the write runs past the end
    fn set(&mut self, start: u64, bytes: &[u8]) -> Result<()>;

    /// Remove `[start, end)`, shifting everything after it left
    fn delete(&mut self, start: u64, end: u64) -> Result<()>;

    /// Snapshot of the whole content
    fn get_all(&self) -> Result<Vec<u8>> {
        let size = self.size()?;
        self.slice(0, size)
    }

    /// Insert `bytes` at `at`, shifting the tail right.
    ///
    /// The default reads the tail and rewrites it behind the new bytes. That is
    /// two calls, so a remote backend may observe other clients in between.
    fn insert(&mut self, at: u64, bytes: &[u8]) -> Result<()> {
        let size = self.size()?;
        check_range(at, size, size)?;
        let tail = self.slice(at, size)?;
        let mut joined = Vec::with_capacity(bytes.len() + tail.len());
        joined.extend_from_slice(bytes);
        joined.extend_from_slice(&tail);
        self.set(at, &joined)
    }

    /// Reader over `[start, end)` that fetches in chunks
    fn stream(&self, start: u64, end: u64) -> Result<StorageStream<'_, Self>>
    where
        Self: Sized,
    {
        check_range(start, end, self.size()?)?;
        Ok(StorageStream::new(self, start, end))
    }

    /// Remove everything
    fn clear(&mut self) -> Result<()> {
        self.set_all(&[])
    }

    /// Push buffered data to durable media
    fn sync(&self) -> Result<()> {
        Ok(())
    }

    /// Release the file handle or socket
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn size(&self) -> Result<u64> {
        (**self).size()
    }

    fn slice(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        (**self).slice(start, end)
    }

    fn set_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).set_all(bytes)
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).append(bytes)
    }

    fn set(&mut self, start: u64, bytes: &[u8]) -> Result<()> {
        (**self).set(start, bytes)
    }

    fn delete(&mut self, start: u64, end: u64) -> Result<()> {
        (**self).delete(start, end)
    }

    fn get_all(&self) -> Result<Vec<u8>> {
        (**self).get_all()
    }

    fn insert(&mut self, at: u64, bytes: &[u8]) -> Result<()> {
        (**self).insert(at, bytes)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn sync(&self) -> Result<()> {
        (**self).sync()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Validate `start <= end <= size`
pub(crate) fn check_range(start: u64, end: u64, size: u64) -> Result<()> {
    if start > end || end > size {
        return Err(TagFrameError::OutOfRange { start, end, size });
    }
    Ok(())
}
