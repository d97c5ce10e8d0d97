//! Tuple Router Module
//!
//! Two-level keys: a super-tag selects a namespace, a sub-tag is the key
//! inside it.
//!
//! ## Strategies
//! ```text
//! Composite:   one TagStore, tag = text-record(super) ‖ sub
//!              "5kusers" + "alice"  ->  "5kusersalice"
//!
//! Multi-store: super-tag ──► LRU map ──► child TagStore (own storage)
//!              at most `max_open_children` open; the least recently used
//!              child is closed, its data stays in its own storage
//! ```

mod composite;
mod factory;
mod multi;

pub use composite::CompositeRouter;
pub use factory::{sanitize_super_tag, ChildFactory, FileChildFactory, MemoryChildFactory};
pub use multi::MultiStoreRouter;

use crate::error::Result;

/// Operations on `(super_tag, sub_tag)` keys
pub trait TupleRouter {
    /// Checked put inside the super-tag's namespace
    fn put(&self, super_tag: &str, sub_tag: &str, value: &[u8]) -> Result<bool>;

    /// Append without looking for an existing entry
    fn put_unchecked(&self, super_tag: &str, sub_tag: &str, value: &[u8]) -> Result<()>;

    fn get(&self, super_tag: &str, sub_tag: &str) -> Result<Option<Vec<u8>>>;

    fn delete(&self, super_tag: &str, sub_tag: &str) -> Result<Option<Vec<u8>>>;

    fn exists(&self, super_tag: &str, sub_tag: &str) -> Result<bool>;

    /// Sub-tags under `super_tag`, in insertion order
    fn sub_tags(&self, super_tag: &str) -> Result<Vec<String>>;

    /// Remove everything under `super_tag`; returns how many entries went
    fn clear_super(&self, super_tag: &str) -> Result<usize>;
}
