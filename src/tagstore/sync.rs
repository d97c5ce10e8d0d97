//! Synchronizing decorator

use parking_lot::RwLock;

use crate::error::Result;

use super::TagMap;

/// Wraps a [`TagMap`] in one reader/writer lock
///
/// - Mutations (`put`, `put_unchecked`, `delete`, `clear`): write lock
/// - Lookups (`get`, `exists`, `all_tags`, `len`): read lock
///
/// Iterators and streams are not handed out: the lock would be released
/// before the caller finished with them. Use [`SyncTagStore::read_with`] or
/// [`SyncTagStore::write_with`] to hold the lock across a traversal.
#[derive(Debug, Default)]
pub struct SyncTagStore<T> {
    inner: RwLock<T>,
}

impl<T: TagMap> SyncTagStore<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    pub fn put_unchecked(&self, tag: &str, value: &[u8]) -> Result<()> {
        self.inner.write().put_unchecked(tag, value)
    }

    pub fn put(&self, tag: &str, value: &[u8]) -> Result<bool> {
        self.inner.write().put(tag, value)
    }

    pub fn get(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        self.inner.read().get(tag)
    }

    pub fn delete(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        self.inner.write().delete(tag)
    }

    pub fn exists(&self, tag: &str) -> Result<bool> {
        self.inner.read().exists(tag)
    }

    pub fn all_tags(&self) -> Result<Vec<String>> {
        self.inner.read().all_tags()
    }

    pub fn len(&self) -> Result<usize> {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.write().clear()
    }

    /// Run `f` with the read lock held throughout
    pub fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with the write lock held throughout
    pub fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl<T: TagMap> TagMap for SyncTagStore<T> {
    fn put_unchecked(&mut self, tag: &str, value: &[u8]) -> Result<()> {
        self.inner.get_mut().put_unchecked(tag, value)
    }

    fn put(&mut self, tag: &str, value: &[u8]) -> Result<bool> {
        self.inner.get_mut().put(tag, value)
    }

    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        self.inner.read().get(tag)
    }

    fn delete(&mut self, tag: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get_mut().delete(tag)
    }

    fn exists(&self, tag: &str) -> Result<bool> {
        self.inner.read().exists(tag)
    }

    fn all_tags(&self) -> Result<Vec<String>> {
        self.inner.read().all_tags()
    }

    fn len(&self) -> Result<usize> {
        self.inner.read().len()
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.get_mut().clear()
    }
}
