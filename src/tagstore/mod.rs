//! Tag Store Module
//!
//! `(tag, value)` pairs encoded back to back through an indicator codec.
//!
//! ## Layout
//! ```text
//! ┌──────────┬────────────┬──────────┬────────────┬─────
//! │ rec(tag) │ rec(value) │ rec(tag) │ rec(value) │ ...
//! └──────────┴────────────┴──────────┴────────────┴─────
//! ```
//!
//! ## Responsibilities
//! - Linear-scan lookup, delete and existence checks (no index)
//! - Unchecked append and checked (scan, delete, append) put
//! - Restartable iteration with in-place removal
//! - Optional reader/writer lock decorator for shared use
//!
//! ## Concurrency
//! [`TagStore`] is single-threaded. [`SyncTagStore`] wraps any [`TagMap`] in
//! one `RwLock`: mutations take the write lock, lookups the read lock.
//! Iteration is only available inside `read_with`/`write_with`, where the
//! lock is held for the whole closure.

mod iter;
mod store;
mod sync;

pub use iter::TagIter;
pub use store::TagStore;
pub use sync::SyncTagStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// The tag store contract, shared by the plain store and its decorators
pub trait TagMap {
    /// Append a pair without looking for an existing one
    fn put_unchecked(&mut self, tag: &str, value: &[u8]) -> Result<()>;

    /// Remove every pair under `tag`, then append; returns whether one existed
    fn put(&mut self, tag: &str, value: &[u8]) -> Result<bool>;

    /// Value of the first pair under `tag`
    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>>;

    /// Remove the first pair under `tag` and return its value
    fn delete(&mut self, tag: &str) -> Result<Option<Vec<u8>>>;

    /// Whether any pair is stored under `tag`
    fn exists(&self, tag: &str) -> Result<bool>;

    /// Every tag in insertion order, duplicates included
    fn all_tags(&self) -> Result<Vec<String>>;

    /// Number of stored pairs
    fn len(&self) -> Result<usize>;

    /// True when no pairs are stored
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every pair
    fn clear(&mut self) -> Result<()>;
}

/// `serde` values on top of any [`TagMap`], encoded with bincode
pub trait TypedTagMap: TagMap {
    /// Checked put of a serialised value
    fn put_value<T: Serialize + ?Sized>(&mut self, tag: &str, value: &T) -> Result<bool> {
        let bytes = bincode::serialize(value)?;
        self.put(tag, &bytes)
    }

    /// Get and deserialise a value
    fn get_value<T: DeserializeOwned>(&self, tag: &str) -> Result<Option<T>> {
        match self.get(tag)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl<M: TagMap + ?Sized> TypedTagMap for M {}
