//! Tag store over a single storage

use crate::codec::{Bounds, ByteCodec, Cursor, IndicatorCodec};
use crate::error::{Result, TagFrameError};
use crate::storage::Storage;

use super::{TagIter, TagMap};

/// Bounds of one stored pair
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairBounds {
    pub tag: Bounds,
    pub value: Bounds,
}

impl PairBounds {
    pub fn start(&self) -> u64 {
        self.tag.record_start
    }

    pub fn end(&self) -> u64 {
        self.value.content_end
    }
}

/// `(tag, value)` pairs stored back to back in one storage
///
/// Lookups are linear scans from the front. The storage may be empty or hold
/// bytes written by an earlier instance with the same codec.
#[derive(Debug)]
pub struct TagStore<S, C = ByteCodec> {
    storage: S,
    codec: C,
}

impl<S: Storage> TagStore<S, ByteCodec> {
    /// Tag store using the byte indicator scheme
    pub fn new(storage: S) -> Self {
        Self::with_codec(storage, ByteCodec)
    }
}

impl<S: Storage, C: IndicatorCodec> TagStore<S, C> {
    /// Tag store using an explicit codec
    pub fn with_codec(storage: S, codec: C) -> Self {
        Self { storage, codec }
    }

    /// Borrow the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Take the underlying storage back
    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Close the underlying storage
    pub fn close(&mut self) -> Result<()> {
        self.storage.close()
    }

    /// Lazy forward iteration from the first pair. Every call starts over.
    pub fn iter(&mut self) -> TagIter<'_, S, C> {
        TagIter::new(self)
    }

    /// Every pair, in order
    pub fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut cursor = Cursor::new();
        let mut entries = Vec::new();
        while let Some(pair) = self.pair_at(cursor.offset())? {
            entries.push(self.read_pair(&pair)?);
            cursor.seek(pair.end());
        }
        Ok(entries)
    }

    // =========================================================================
    // Scanning helpers
    // =========================================================================

    /// Bounds of the pair starting at `position`
    pub(crate) fn pair_at(&self, position: u64) -> Result<Option<PairBounds>> {
        let Some(tag) = self.codec.bounds_at(&self.storage, position)? else {
            return Ok(None);
        };
        let value = self
            .codec
            .bounds_at(&self.storage, tag.content_end)?
            .ok_or_else(|| TagFrameError::malformed(tag.record_start, "tag without a value"))?;
        Ok(Some(PairBounds { tag, value }))
    }

    pub(crate) fn read_tag(&self, bounds: &Bounds) -> Result<String> {
        let bytes = self.storage.slice(bounds.content_start, bounds.content_end)?;
        Ok(String::from_utf8(bytes)?)
    }

    pub(crate) fn read_pair(&self, pair: &PairBounds) -> Result<(String, Vec<u8>)> {
        let tag = self.read_tag(&pair.tag)?;
        let value = self
            .storage
            .slice(pair.value.content_start, pair.value.content_end)?;
        Ok((tag, value))
    }

    pub(crate) fn remove_range(&mut self, start: u64, end: u64) -> Result<()> {
        self.storage.delete(start, end)
    }

    /// Compare the tag at `bounds` with `tag`, reading storage only when the
    /// lengths agree
    fn tag_matches(&self, bounds: &Bounds, tag: &str) -> Result<bool> {
        if bounds.content_len() != tag.len() as u64 {
            return Ok(false);
        }
        let stored = self.storage.slice(bounds.content_start, bounds.content_end)?;
        Ok(stored == tag.as_bytes())
    }

    /// Scan from `position` for the first pair under `tag`. A mismatching
    /// pair's value is skipped, never read.
    fn find_from(&self, tag: &str, position: u64) -> Result<Option<PairBounds>> {
        let mut cursor = Cursor::at(position);
        while let Some(tag_bounds) = self.codec.skip(&self.storage, &mut cursor)? {
            let Some(value_bounds) = self.codec.skip(&self.storage, &mut cursor)? else {
                return Err(TagFrameError::malformed(
                    tag_bounds.record_start,
                    "tag without a value",
                ));
            };
            if self.tag_matches(&tag_bounds, tag)? {
                return Ok(Some(PairBounds {
                    tag: tag_bounds,
                    value: value_bounds,
                }));
            }
        }
        Ok(None)
    }

    /// Remove every pair under `tag`, returning how many went
    fn delete_all(&mut self, tag: &str) -> Result<usize> {
        let mut removed = 0;
        let mut position = 0;
        while let Some(pair) = self.find_from(tag, position)? {
            self.storage.delete(pair.start(), pair.end())?;
            position = pair.start();
            removed += 1;
        }
        Ok(removed)
    }
}

impl<S: Storage, C: IndicatorCodec> TagMap for TagStore<S, C> {
    fn put_unchecked(&mut self, tag: &str, value: &[u8]) -> Result<()> {
        let mut pair = self.codec.encode(tag.as_bytes());
        pair.extend_from_slice(&self.codec.encode(value));
        self.storage.append(&pair)
    }

    fn put(&mut self, tag: &str, value: &[u8]) -> Result<bool> {
        let existed = self.delete_all(tag)? > 0;
        self.put_unchecked(tag, value)?;
        Ok(existed)
    }

    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        match self.find_from(tag, 0)? {
            Some(pair) => Ok(Some(
                self.storage
                    .slice(pair.value.content_start, pair.value.content_end)?,
            )),
            None => Ok(None),
        }
    }

    fn delete(&mut self, tag: &str) -> Result<Option<Vec<u8>>> {
        let Some(pair) = self.find_from(tag, 0)? else {
            return Ok(None);
        };
        let value = self
            .storage
            .slice(pair.value.content_start, pair.value.content_end)?;
        self.storage.delete(pair.start(), pair.end())?;
        Ok(Some(value))
    }

    fn exists(&self, tag: &str) -> Result<bool> {
        Ok(self.find_from(tag, 0)?.is_some())
    }

    fn all_tags(&self) -> Result<Vec<String>> {
        let mut cursor = Cursor::new();
        let mut tags = Vec::new();
        while let Some(tag_bounds) = self.codec.skip(&self.storage, &mut cursor)? {
            if self.codec.skip(&self.storage, &mut cursor)?.is_none() {
                return Err(TagFrameError::malformed(
                    tag_bounds.record_start,
                    "tag without a value",
                ));
            }
            tags.push(self.read_tag(&tag_bounds)?);
        }
        Ok(tags)
    }

    fn len(&self) -> Result<usize> {
        let mut cursor = Cursor::new();
        let mut records = 0usize;
        while self.codec.skip(&self.storage, &mut cursor)?.is_some() {
            records += 1;
        }
        if records % 2 != 0 {
            return Err(TagFrameError::malformed(cursor.offset(), "tag without a value"));
        }
        Ok(records / 2)
    }

    fn clear(&mut self) -> Result<()> {
        self.storage.clear()
    }
}
