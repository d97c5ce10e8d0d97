//! # tagframe
//!
//! Self-describing record framing over a mutable byte storage:
//! - Length-indicator codecs that frame records without an external index
//! - In-place append, insert and delete of single records
//! - A tag-keyed record store with two-level (super/sub) routing
//! - A small TCP protocol that makes any storage network-transparent
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Tuple Router                           │
//! │         (composite tags | LRU map of child stores)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Tag Store                             │
//! │       (tag, value) record pairs, optional RwLock wrap        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Indicator Codec                          │
//! │              (byte | reverse byte | text)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────┐
//!          ▼            ▼                 ▼
//!   ┌────────────┐ ┌────────────┐ ┌───────────────┐     ┌────────────┐
//!   │   Memory   │ │    File    │ │ RemoteStorage │────►│   Server   │
//!   │  Storage   │ │  Storage   │ │   (client)    │ TCP │ (any store)│
//!   └────────────┘ └────────────┘ └───────────────┘     └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod codec;
pub mod tagstore;
pub mod router;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TagFrameError};
pub use config::{Config, SyncMode};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use codec::{ByteCodec, Cursor, IndicatorCodec, ReverseByteCodec, TextCodec};
pub use tagstore::{SyncTagStore, TagMap, TagStore, TypedTagMap};
pub use router::{CompositeRouter, MultiStoreRouter, TupleRouter};
pub use network::{RemoteStorage, Server};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tagframe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
