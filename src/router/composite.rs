//! Composite-key strategy
//!
//! Super-tag and sub-tag are joined into one tag: the super-tag framed as a
//! text record, followed by the raw sub-tag. Because the text indicator is
//! self-delimiting, "starts with the framed super-tag" is an exact namespace
//! test.

use crate::codec::{ByteCodec, IndicatorCodec, TextCodec};
use crate::error::Result;
use crate::storage::Storage;
use crate::tagstore::{SyncTagStore, TagStore};

use super::TupleRouter;

/// All namespaces in one tag store
pub struct CompositeRouter<S, C = ByteCodec> {
    store: SyncTagStore<TagStore<S, C>>,
    keys: TextCodec,
}

impl<S: Storage, C: IndicatorCodec> CompositeRouter<S, C> {
    pub fn new(store: TagStore<S, C>) -> Self {
        Self {
            store: SyncTagStore::new(store),
            keys: TextCodec::new(),
        }
    }

    /// Take the underlying tag store back
    pub fn into_inner(self) -> TagStore<S, C> {
        self.store.into_inner()
    }

    /// The composite tag for `(super_tag, sub_tag)`
    pub fn composite_tag(&self, super_tag: &str, sub_tag: &str) -> String {
        let mut tag = self.keys.encode_str(super_tag);
        tag.push_str(sub_tag);
        tag
    }

    /// Split a composite tag back into `(super_tag, sub_tag)`
    pub fn split_tag<'t>(&self, tag: &'t str) -> Result<Option<(&'t str, &'t str)>> {
        self.keys.split_str(tag)
    }

    /// Every super-tag in order of first appearance
    pub fn super_tags(&self) -> Result<Vec<String>> {
        let mut supers: Vec<String> = Vec::new();
        for tag in self.store.all_tags()? {
            if let Some((super_tag, _)) = self.split_tag(&tag)? {
                if !supers.iter().any(|s| s == super_tag) {
                    supers.push(super_tag.to_string());
                }
            }
        }
        Ok(supers)
    }
}

impl<S: Storage, C: IndicatorCodec> TupleRouter for CompositeRouter<S, C> {
    fn put(&self, super_tag: &str, sub_tag: &str, value: &[u8]) -> Result<bool> {
        self.store.put(&self.composite_tag(super_tag, sub_tag), value)
    }

    fn put_unchecked(&self, super_tag: &str, sub_tag: &str, value: &[u8]) -> Result<()> {
        self.store
            .put_unchecked(&self.composite_tag(super_tag, sub_tag), value)
    }

    fn get(&self, super_tag: &str, sub_tag: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(&self.composite_tag(super_tag, sub_tag))
    }

    fn delete(&self, super_tag: &str, sub_tag: &str) -> Result<Option<Vec<u8>>> {
        self.store.delete(&self.composite_tag(super_tag, sub_tag))
    }

    fn exists(&self, super_tag: &str, sub_tag: &str) -> Result<bool> {
        self.store.exists(&self.composite_tag(super_tag, sub_tag))
    }

    fn sub_tags(&self, super_tag: &str) -> Result<Vec<String>> {
        let prefix = self.keys.encode_str(super_tag);
        Ok(self
            .store
            .all_tags()?
            .into_iter()
            .filter_map(|tag| tag.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect())
    }

    fn clear_super(&self, super_tag: &str) -> Result<usize> {
        let prefix = self.keys.encode_str(super_tag);
        self.store.write_with(|store| {
            let mut removed = 0;
            let mut iter = store.iter();
            while let Some(entry) = iter.next() {
                let (tag, _) = entry?;
                if tag.starts_with(prefix.as_str()) {
                    iter.remove_current()?;
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }
}
