//! Revision manifests
//!
//! A [`RevisionInfo`] is the durable description of one committed
//! revision: the virtual document root's links, the node-key watermark,
//! and — per page — the fragment window a reconstruction at this revision
//! needs, newest first. Manifests are immutable once written; commit
//! builds the next manifest by carrying forward the windows of untouched
//! pages verbatim.
//!
//! The head pointer (`head.json`) names the latest revision and is the
//! last blob a commit writes: a revision becomes visible only once its
//! fragments and manifest are durable.

use arbor_db_core::node::NULL_NODE;
use arbor_db_core::page::FragmentKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable reference to one persisted page fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRef {
    /// Revision the fragment was committed at.
    pub revision: u64,
    pub kind: FragmentKind,
    /// Back-link to the fragment this one builds on (see `PageFragment`).
    pub reference: Option<u64>,
    /// Storage path of the fragment blob.
    pub path: String,
}

/// Durable description of one committed revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub revision: u64,

    /// First child of the virtual document root ([`NULL_NODE`] if the
    /// document is empty). The root is not stored as a record; its links
    /// are versioned here.
    pub root_first_child: i64,
    pub root_child_count: u64,

    /// Highest node key ever allocated as of this revision, `-1` before
    /// any allocation. The allocator never rewinds, also not across
    /// revert: node keys stay unique across all revisions.
    pub max_node_key: i64,

    /// Per-page fragment windows, newest first.
    pub pages: BTreeMap<u64, Vec<FragmentRef>>,
}

impl RevisionInfo {
    /// The empty bootstrap revision written at resource creation.
    pub fn bootstrap() -> Self {
        RevisionInfo {
            revision: 0,
            root_first_child: NULL_NODE,
            root_child_count: 0,
            max_node_key: -1,
            pages: BTreeMap::new(),
        }
    }
}

/// Content of `head.json`: the atomic publish pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadPointer {
    pub latest: u64,
}
