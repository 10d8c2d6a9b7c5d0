//! # Arbor DB Core
//!
//! Core types for arbor-db, a versioned tree-structured document store.
//!
//! This crate provides:
//! - Node records and the closed node-kind set (`DataRecord`, `NodeKind`)
//! - DeweyID position labels and their prefix-delta codec
//! - The node record wire codec and varint primitives
//! - Pages, page fragments, and the fragment wire format
//! - Resource configuration and storage trait interfaces
//!
//! ## Design Principles
//!
//! 1. **Async at the I/O seam only**: codecs and page materialization are
//!    synchronous and CPU-bound; storage traits are async.
//! 2. **Immutable once sealed**: persisted fragments never change and may
//!    be cached and shared across concurrent readers.
//! 3. **Position vs identity**: DeweyIDs order nodes, node keys identify
//!    them; the two are never conflated.

pub mod codec;
pub mod config;
pub mod dewey;
pub mod error;
pub mod node;
pub mod page;
pub mod storage;

pub use codec::{deserialize_dewey, deserialize_record, serialize_dewey, serialize_record};
pub use config::{ResourceConfig, Versioning, DEFAULT_PAGE_CAPACITY, DEFAULT_REVISIONS_TO_RESTORE};
pub use dewey::DeweyId;
pub use error::{Error, Result};
pub use node::{DataRecord, NodeData, NodeKind, StructNode, NULL_NODE};
pub use page::{
    decode_fragment, encode_fragment, FragmentKind, Page, PageFragment, RecordSlot,
    FRAGMENT_MAGIC, FRAGMENT_VERSION,
};
pub use storage::{
    config_path, decode_json, fragment_path, head_path, manifest_path, MemoryStorage, Storage,
    StorageRead, StorageWrite,
};
#[cfg(feature = "native")]
pub use storage::FileStorage;
