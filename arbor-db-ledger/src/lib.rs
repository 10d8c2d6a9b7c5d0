//! # Arbor DB Ledger
//!
//! The revision manager for arbor-db resources. A [`Resource`] owns the
//! chain of committed revision manifests and hands out:
//!
//! - [`ReadView`]s — point-in-time reads, each pinned to one immutable
//!   revision forever; any number may run concurrently.
//! - The single [`WriteView`] — copy-on-write mutations over the latest
//!   revision, commit (atomic publish), and revert-to-revision.
//!
//! Revision numbers are 0-based and never reused; revision 0 is the empty
//! bootstrap committed at resource creation. Revert creates new history,
//! it never truncates old history.
//!
//! # Example
//!
//! ```ignore
//! use arbor_db_core::{MemoryStorage, ResourceConfig};
//! use arbor_db_ledger::Resource;
//!
//! let resource = Resource::create(MemoryStorage::new(), "docs", ResourceConfig::default()).await?;
//! let mut wtx = resource.begin_write()?;
//! let root = wtx.insert_element_as_first_child(None, "doc").await?;
//! wtx.commit().await?; // revision 1
//!
//! let rtx = resource.begin_read(Some(1))?;
//! assert_eq!(rtx.name(root).await?.as_deref(), Some("doc"));
//! ```

mod error;
mod manifest;
mod read;
mod resource;
mod write;

pub use error::{Result, StoreError};
pub use manifest::{FragmentRef, HeadPointer, RevisionInfo};
pub use read::ReadView;
pub use resource::Resource;
pub use write::WriteView;
