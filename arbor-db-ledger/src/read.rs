//! Point-in-time read views
//!
//! A [`ReadView`] is pinned to one immutable revision. Pages materialize
//! on first touch and are cached per view behind `Arc`s; persisted
//! fragments are immutable, so cached pages are shared freely and never
//! mutated in place. Dropping a view has no side effects.

use crate::error::Result;
use crate::manifest::RevisionInfo;
use crate::resource::{decode_slot, materialize_page};
use arbor_db_core::node::NULL_NODE;
use arbor_db_core::page::Page;
use arbor_db_core::{DataRecord, ResourceConfig, StorageRead};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Read transaction pinned to a single revision.
#[derive(Debug)]
pub struct ReadView<S> {
    config: ResourceConfig,
    storage: Arc<S>,
    info: Arc<RevisionInfo>,
    /// Materialized pages, shared immutably once built.
    cache: RwLock<FxHashMap<u64, Arc<Page>>>,
}

impl<S: StorageRead> ReadView<S> {
    pub(crate) fn new(config: ResourceConfig, storage: Arc<S>, info: Arc<RevisionInfo>) -> Self {
        ReadView {
            config,
            storage,
            info,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// The revision this view is pinned to.
    pub fn revision(&self) -> u64 {
        self.info.revision
    }

    /// First child of the virtual document root.
    pub fn root_first_child(&self) -> Option<u64> {
        link(self.info.root_first_child)
    }

    /// Child count of the virtual document root.
    pub fn root_child_count(&self) -> u64 {
        self.info.root_child_count
    }

    /// Fetch the record at `key`, or `None` if the slot was never written
    /// or holds a tombstone at this revision.
    pub async fn record(&self, key: u64) -> Result<Option<DataRecord>> {
        let Some(page) = self.page(self.config.page_of(key)).await? else {
            return Ok(None);
        };
        match page.get(self.config.slot_of(key)) {
            Some(slot) => decode_slot(slot, key),
            None => Ok(None),
        }
    }

    /// Parent key of the node at `key`.
    pub async fn parent(&self, key: u64) -> Result<Option<u64>> {
        Ok(self.record(key).await?.and_then(|r| match &r.data {
            arbor_db_core::NodeData::Attribute { parent, .. } => link(*parent),
            _ => r.data.structure().and_then(|s| link(s.parent)),
        }))
    }

    /// First child of the node at `key`.
    pub async fn first_child(&self, key: u64) -> Result<Option<u64>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().and_then(|s| link(s.first_child))))
    }

    /// Right sibling of the node at `key`.
    pub async fn right_sibling(&self, key: u64) -> Result<Option<u64>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().and_then(|s| link(s.right_sibling))))
    }

    /// Left sibling of the node at `key`.
    pub async fn left_sibling(&self, key: u64) -> Result<Option<u64>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().and_then(|s| link(s.left_sibling))))
    }

    /// Child count of the node at `key`.
    pub async fn child_count(&self, key: u64) -> Result<u64> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().map(|s| s.child_count))
            .unwrap_or(0))
    }

    /// Attribute keys of the element at `key`, in insertion order.
    pub async fn attributes(&self, key: u64) -> Result<Vec<u64>> {
        Ok(match self.record(key).await? {
            Some(DataRecord {
                data: arbor_db_core::NodeData::Element { attribute_keys, .. },
                ..
            }) => attribute_keys,
            _ => Vec::new(),
        })
    }

    /// Name of the node at `key` (element/attribute name, PI target).
    pub async fn name(&self, key: u64) -> Result<Option<String>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.name().map(str::to_owned)))
    }

    /// Value of the node at `key` (text/comment/attribute value, PI
    /// content).
    pub async fn value(&self, key: u64) -> Result<Option<String>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.value().map(str::to_owned)))
    }

    async fn page(&self, page_no: u64) -> Result<Option<Arc<Page>>> {
        if let Some(page) = self
            .cache
            .read()
            .expect("RwLock poisoned")
            .get(&page_no)
            .cloned()
        {
            return Ok(Some(page));
        }
        let Some(page) =
            materialize_page(self.storage.as_ref(), &self.config, &self.info, page_no).await?
        else {
            return Ok(None);
        };
        let page = Arc::new(page);
        self.cache
            .write()
            .expect("RwLock poisoned")
            .insert(page_no, page.clone());
        Ok(Some(page))
    }
}

fn link(key: i64) -> Option<u64> {
    if key == NULL_NODE {
        None
    } else {
        Some(key as u64)
    }
}
