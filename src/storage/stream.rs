//! Range streaming
//!
//! Reads a storage range in fixed-size chunks so a single large record never
//! has to be materialised in one allocation.

use std::io::{self, Read};

use super::Storage;

/// Chunk size used when refilling the stream buffer
pub const STREAM_CHUNK_SIZE: u64 = 64 * 1024;

/// `io::Read` over `[start, end)` of a storage
pub struct StorageStream<'a, S: Storage + ?Sized> {
    storage: &'a S,
    /// Next offset to fetch from storage
    position: u64,
    /// Exclusive end of the range
    end: u64,
    /// Fetched but not yet consumed bytes
    buffer: Vec<u8>,
    /// Read position inside `buffer`
    buffer_pos: usize,
}

impl<'a, S: Storage + ?Sized> StorageStream<'a, S> {
    pub(crate) fn new(storage: &'a S, start: u64, end: u64) -> Self {
        Self {
            storage,
            position: start,
            end,
            buffer: Vec::new(),
            buffer_pos: 0,
        }
    }

    /// Bytes not yet returned by `read`
    pub fn remaining(&self) -> u64 {
        (self.end - self.position) + (self.buffer.len() - self.buffer_pos) as u64
    }

    fn refill(&mut self) -> io::Result<()> {
        let chunk_end = self.end.min(self.position + STREAM_CHUNK_SIZE);
        self.buffer = self
            .storage
            .slice(self.position, chunk_end)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.buffer_pos = 0;
        self.position = chunk_end;
        Ok(())
    }
}

impl<S: Storage + ?Sized> Read for StorageStream<'_, S> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.buffer_pos == self.buffer.len() {
            if self.position >= self.end {
                return Ok(0);
            }
            self.refill()?;
        }

        let available = &self.buffer[self.buffer_pos..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.buffer_pos += n;
        Ok(n)
    }
}
