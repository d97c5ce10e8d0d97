//! Multi-store strategy
//!
//! One child tag store per super-tag, created lazily and kept in a bounded
//! LRU map.
//!
//! ## Concurrency:
//! - `children`: one Mutex around the LRU map. Lookup, creation and the
//!   choice of victim happen under it, so two threads can never both create
//!   past the cap.
//! - Each child has its own `SyncTagStore` lock. The map lock is released
//!   before the child is used, so a slow call on one child never holds up
//!   lookups of another.
//! - An evicted child moves to `releasing` and is handed back to the factory
//!   after the map lock is dropped. Reopening that super-tag waits on
//!   `released` until the hand-back is done, so its storage is never open
//!   twice.
//! - Eviction marks the child released under its write lock. A call that
//!   finds its child released looks the super-tag up again.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Condvar, Mutex};

use crate::config::Config;
use crate::error::{Result, TagFrameError};
use crate::tagstore::{SyncTagStore, TagMap, TagStore};

use super::{ChildFactory, TupleRouter};

/// One open child. `released` is only written under the store's write lock,
/// so a caller holding either lock sees a stable value.
struct Child<S> {
    store: SyncTagStore<TagStore<S>>,
    released: AtomicBool,
}

type ChildRef<F> = Arc<Child<<F as ChildFactory>::Storage>>;

/// Open children plus the evicted ones still being handed back
struct Children<S> {
    open: LruCache<String, Arc<Child<S>>>,
    releasing: HashMap<String, Arc<Child<S>>>,
}

/// Routes each super-tag to its own child store
pub struct MultiStoreRouter<F: ChildFactory> {
    factory: F,
    children: Mutex<Children<F::Storage>>,
    /// Signalled whenever an entry leaves `releasing`
    released: Condvar,
}

impl<F: ChildFactory> MultiStoreRouter<F> {
    /// Router keeping at most `max_open_children` children open
    pub fn new(factory: F, max_open_children: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(max_open_children).ok_or_else(|| {
            TagFrameError::Config("max_open_children must be at least 1".to_string())
        })?;
        Ok(Self {
            factory,
            children: Mutex::new(Children {
                open: LruCache::new(capacity),
                releasing: HashMap::new(),
            }),
            released: Condvar::new(),
        })
    }

    /// Router sized from `config.max_open_children`
    pub fn from_config(factory: F, config: &Config) -> Result<Self> {
        Self::new(factory, config.max_open_children)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of children currently open
    pub fn open_count(&self) -> usize {
        self.children.lock().open.len()
    }

    /// Whether `super_tag` has an open child (does not count as an access)
    pub fn is_open(&self, super_tag: &str) -> bool {
        self.children.lock().open.contains(super_tag)
    }

    /// Release every open child
    pub fn close_all(&self) -> Result<()> {
        let evicted: Vec<_> = {
            let mut children = self.children.lock();
            let mut evicted = Vec::with_capacity(children.open.len());
            while let Some((super_tag, child)) = children.open.pop_lru() {
                children
                    .releasing
                    .insert(super_tag.clone(), Arc::clone(&child));
                evicted.push((super_tag, child));
            }
            evicted
        };

        let mut first_error = None;
        for (super_tag, child) in evicted {
            if let Err(e) = self.release(&super_tag, &child) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Open child for `super_tag`, creating it (and evicting the least
    /// recently used child) if needed
    fn child(&self, super_tag: &str) -> Result<ChildRef<F>> {
        let mut children = self.children.lock();
        if let Some(child) = children.open.get(super_tag) {
            return Ok(Arc::clone(child));
        }

        // An earlier eviction of this super-tag is still handing it back
        while children.releasing.contains_key(super_tag) {
            self.released.wait(&mut children);
            if let Some(child) = children.open.get(super_tag) {
                return Ok(Arc::clone(child));
            }
        }

        let storage = self.factory.open(super_tag)?;
        let child = Arc::new(Child {
            store: SyncTagStore::new(TagStore::new(storage)),
            released: AtomicBool::new(false),
        });
        tracing::debug!("Opened child store for super-tag {:?}", super_tag);

        let evicted = children.open.push(super_tag.to_string(), Arc::clone(&child));
        if let Some((evicted_tag, evicted_child)) = &evicted {
            children
                .releasing
                .insert(evicted_tag.clone(), Arc::clone(evicted_child));
        }
        drop(children);

        if let Some((evicted_tag, evicted_child)) = evicted {
            tracing::debug!("Evicting child store for super-tag {:?}", evicted_tag);
            if let Err(e) = self.release(&evicted_tag, &evicted_child) {
                tracing::warn!("Failed to release child store {:?}: {}", evicted_tag, e);
            }
        }

        Ok(child)
    }

    /// Hand the child's storage back to the factory, then clear its
    /// `releasing` entry. Must be called without the map lock: the write lock
    /// waits for any call already running on that child.
    fn release(&self, super_tag: &str, child: &ChildRef<F>) -> Result<()> {
        let result = child.store.write_with(|store| {
            child.released.store(true, Ordering::Release);
            self.factory.release(super_tag, store.storage_mut())
        });

        let mut children = self.children.lock();
        if children
            .releasing
            .get(super_tag)
            .is_some_and(|pending| Arc::ptr_eq(pending, child))
        {
            children.releasing.remove(super_tag);
        }
        drop(children);
        self.released.notify_all();

        result
    }

    /// Run `op` under the child's write lock. A child evicted between lookup
    /// and lock is looked up again.
    fn write_child<R>(
        &self,
        super_tag: &str,
        mut op: impl FnMut(&mut TagStore<F::Storage>) -> Result<R>,
    ) -> Result<R> {
        loop {
            let child = self.child(super_tag)?;
            let outcome = child.store.write_with(|store| {
                if child.released.load(Ordering::Acquire) {
                    None
                } else {
                    Some(op(store))
                }
            });
            match outcome {
                Some(result) => return result,
                None => tracing::trace!("Child {:?} evicted mid-call, reopening", super_tag),
            }
        }
    }

    /// Run `op` under the child's read lock
    fn read_child<R>(
        &self,
        super_tag: &str,
        mut op: impl FnMut(&TagStore<F::Storage>) -> Result<R>,
    ) -> Result<R> {
        loop {
            let child = self.child(super_tag)?;
            let outcome = child.store.read_with(|store| {
                if child.released.load(Ordering::Acquire) {
                    None
                } else {
                    Some(op(store))
                }
            });
            match outcome {
                Some(result) => return result,
                None => tracing::trace!("Child {:?} evicted mid-call, reopening", super_tag),
            }
        }
    }
}

impl<F: ChildFactory> TupleRouter for MultiStoreRouter<F> {
    fn put(&self, super_tag: &str, sub_tag: &str, value: &[u8]) -> Result<bool> {
        self.write_child(super_tag, |store| store.put(sub_tag, value))
    }

    fn put_unchecked(&self, super_tag: &str, sub_tag: &str, value: &[u8]) -> Result<()> {
        self.write_child(super_tag, |store| store.put_unchecked(sub_tag, value))
    }

    fn get(&self, super_tag: &str, sub_tag: &str) -> Result<Option<Vec<u8>>> {
        self.read_child(super_tag, |store| store.get(sub_tag))
    }

    fn delete(&self, super_tag: &str, sub_tag: &str) -> Result<Option<Vec<u8>>> {
        self.write_child(super_tag, |store| store.delete(sub_tag))
    }

    fn exists(&self, super_tag: &str, sub_tag: &str) -> Result<bool> {
        self.read_child(super_tag, |store| store.exists(sub_tag))
    }

    fn sub_tags(&self, super_tag: &str) -> Result<Vec<String>> {
        self.read_child(super_tag, |store| store.all_tags())
    }

    fn clear_super(&self, super_tag: &str) -> Result<usize> {
        self.write_child(super_tag, |store| {
            let removed = store.len()?;
            store.clear()?;
            Ok(removed)
        })
    }
}
