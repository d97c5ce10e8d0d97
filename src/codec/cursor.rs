//! Cursor
//!
//! A mutable offset bookmark into one storage.

/// Offset into a storage, advanced by decode and skip
///
/// A cursor is only meaningful for the storage it was created against. A
/// decode at the end leaves it where it is, so appending more records later
/// lets the same cursor pick up the new data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    offset: u64,
}

impl Cursor {
    /// Cursor at the start of the storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at an arbitrary offset
    pub fn at(offset: u64) -> Self {
        Self { offset }
    }

    /// Current offset
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Move to `offset`
    pub fn seek(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Move back to the start
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
