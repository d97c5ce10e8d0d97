//! In-memory storage
//!
//! A growable buffer; every operation is synchronous and in-process.

use crate::error::Result;

use super::{check_range, Storage};

/// Storage backed by a `Vec<u8>`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStorage {
    data: Vec<u8>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously persisted bytes
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Borrow the raw content
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the raw content
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

impl Storage for MemoryStorage {
    fn size(&self) -> Result<u64> {
        Ok(self.len())
    }

    fn slice(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.len())?;
        Ok(self.data[start as usize..end as usize].to_vec())
    }

    fn set_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.data.clear();
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn set(&mut self, start: u64, bytes: &[u8]) -> Result<()> {
        check_range(start, start, self.len())?;
        let start = start as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn delete(&mut self, start: u64, end: u64) -> Result<()> {
        check_range(start, end, self.len())?;
        self.data.drain(start as usize..end as usize);
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn insert(&mut self, at: u64, bytes: &[u8]) -> Result<()> {
        check_range(at, at, self.len())?;
        let at = at as usize;
        self.data.splice(at..at, bytes.iter().copied());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.data.clear();
        Ok(())
    }
}
