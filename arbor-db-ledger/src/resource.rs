//! Resource lifecycle and the revision manager
//!
//! A [`Resource`] maps `(revision | latest)` to read views, hands out the
//! single write view per resource, and owns the in-memory chain of
//! committed revision manifests. Commit publication order is fragments →
//! manifest → head pointer → in-memory state, so readers can never observe
//! a partially committed revision.

use crate::error::{Result, StoreError};
use crate::manifest::{FragmentRef, HeadPointer, RevisionInfo};
use crate::read::ReadView;
use crate::write::WriteView;
use arbor_db_core::page::{Page, PageFragment, RecordSlot};
use arbor_db_core::storage::{config_path, head_path, manifest_path};
use arbor_db_core::{
    decode_fragment, decode_json, DataRecord, Error, NodeKind, ResourceConfig, Storage,
    StorageRead,
};
use arbor_db_revision::reconstruct;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Shared, atomically published revision chain.
#[derive(Debug)]
pub(crate) struct SharedState {
    /// Committed revisions, indexed by revision number.
    revisions: RwLock<Vec<Arc<RevisionInfo>>>,
}

impl SharedState {
    fn new(revisions: Vec<Arc<RevisionInfo>>) -> Self {
        SharedState {
            revisions: RwLock::new(revisions),
        }
    }

    pub(crate) fn latest(&self) -> Arc<RevisionInfo> {
        let revisions = self.revisions.read().expect("RwLock poisoned");
        revisions.last().expect("revision chain is never empty").clone()
    }

    pub(crate) fn latest_revision(&self) -> u64 {
        self.latest().revision
    }

    pub(crate) fn get(&self, revision: u64) -> Option<Arc<RevisionInfo>> {
        let revisions = self.revisions.read().expect("RwLock poisoned");
        revisions.get(revision as usize).cloned()
    }

    /// Publish a committed revision. Called only after its blobs are
    /// durable.
    pub(crate) fn publish(&self, info: Arc<RevisionInfo>) {
        let mut revisions = self.revisions.write().expect("RwLock poisoned");
        debug_assert_eq!(info.revision as usize, revisions.len());
        revisions.push(info);
    }
}

/// A named, independently versioned document resource.
///
/// Cloning the handle shares the underlying state; all clones observe the
/// same revision chain and contend for the same writer lease.
#[derive(Debug)]
pub struct Resource<S> {
    name: String,
    config: ResourceConfig,
    storage: Arc<S>,
    state: Arc<SharedState>,
    /// Explicit per-resource writer lease: held by at most one WriteView,
    /// released on its drop.
    writer_lease: Arc<AtomicBool>,
}

impl<S> Clone for Resource<S> {
    fn clone(&self) -> Self {
        Resource {
            name: self.name.clone(),
            config: self.config.clone(),
            storage: self.storage.clone(),
            state: self.state.clone(),
            writer_lease: self.writer_lease.clone(),
        }
    }
}

impl<S: Storage> Resource<S> {
    /// Create a new resource: persist its config, commit the empty
    /// bootstrap revision 0, and publish the head pointer.
    pub async fn create(storage: S, name: impl Into<String>, config: ResourceConfig) -> Result<Self> {
        let name = name.into();
        config.validate()?;
        if storage.exists(&config_path(&name)).await? {
            return Err(StoreError::ResourceExists(name));
        }

        storage
            .write_bytes(&config_path(&name), &serde_json::to_vec_pretty(&config).map_err(Error::from)?)
            .await?;
        let bootstrap = RevisionInfo::bootstrap();
        storage
            .write_bytes(
                &manifest_path(&name, 0),
                &serde_json::to_vec(&bootstrap).map_err(Error::from)?,
            )
            .await?;
        storage
            .write_bytes(
                &head_path(&name),
                &serde_json::to_vec(&HeadPointer { latest: 0 }).map_err(Error::from)?,
            )
            .await?;

        info!(resource = %name, versioning = ?config.versioning, "created resource");
        Ok(Resource {
            name,
            config,
            storage: Arc::new(storage),
            state: Arc::new(SharedState::new(vec![Arc::new(bootstrap)])),
            writer_lease: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Open an existing resource, loading its config and every manifest
    /// up to the published head.
    pub async fn open(storage: S, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let config_bytes = match storage.read_bytes(&config_path(&name)).await {
            Ok(bytes) => bytes,
            Err(Error::NotFound(_)) => return Err(StoreError::ResourceNotFound(name)),
            Err(e) => return Err(e.into()),
        };
        let config: ResourceConfig = decode_json(&config_bytes)?;
        config.validate()?;

        let head: HeadPointer = decode_json(&storage.read_bytes(&head_path(&name)).await?)?;
        let mut revisions = Vec::with_capacity(head.latest as usize + 1);
        for revision in 0..=head.latest {
            let info: RevisionInfo =
                decode_json(&storage.read_bytes(&manifest_path(&name, revision)).await?)?;
            if info.revision != revision {
                return Err(Error::corrupt(format!(
                    "manifest {revision} claims revision {}",
                    info.revision
                ))
                .into());
            }
            revisions.push(Arc::new(info));
        }

        info!(resource = %name, latest = head.latest, "opened resource");
        Ok(Resource {
            name,
            config,
            storage: Arc::new(storage),
            state: Arc::new(SharedState::new(revisions)),
            writer_lease: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Latest committed revision number.
    pub fn latest_revision(&self) -> u64 {
        self.state.latest_revision()
    }

    /// Begin a read transaction pinned to `revision` (`None` = latest).
    ///
    /// The view keeps a consistent snapshot of that revision forever,
    /// unaffected by later commits, and may be dropped at any point
    /// without side effects.
    pub fn begin_read(&self, revision: Option<u64>) -> Result<ReadView<S>> {
        let latest = self.state.latest_revision();
        let revision = revision.unwrap_or(latest);
        let info = self
            .state
            .get(revision)
            .ok_or(StoreError::RevisionNotFound {
                requested: revision,
                latest,
            })?;
        Ok(ReadView::new(self.config.clone(), self.storage.clone(), info))
    }

    /// Begin the write transaction. At most one is active per resource;
    /// a concurrent second request fails with [`StoreError::WriterBusy`].
    pub fn begin_write(&self) -> Result<WriteView<S>> {
        if self
            .writer_lease
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::WriterBusy);
        }
        let base = self.state.latest();
        Ok(WriteView::new(
            self.name.clone(),
            self.config.clone(),
            self.storage.clone(),
            self.state.clone(),
            self.writer_lease.clone(),
            base,
        ))
    }
}

// ============================================================================
// Shared materialization helpers (read + write paths)
// ============================================================================

/// Fetch and decode a page's fragment window, newest first.
pub(crate) async fn fetch_window<S: StorageRead>(
    storage: &S,
    config: &ResourceConfig,
    window: &[FragmentRef],
) -> Result<Vec<PageFragment>> {
    let mut fragments = Vec::with_capacity(window.len());
    for fragment_ref in window {
        let bytes = storage.read_bytes(&fragment_ref.path).await?;
        let fragment = decode_fragment(&bytes, config)?;
        if fragment.revision != fragment_ref.revision || fragment.kind != fragment_ref.kind {
            return Err(Error::corrupt(format!(
                "fragment at {} does not match its manifest entry",
                fragment_ref.path
            ))
            .into());
        }
        fragments.push(fragment);
    }
    Ok(fragments)
}

/// Materialize one page as of the given manifest, or `None` if the page
/// has never been written.
pub(crate) async fn materialize_page<S: StorageRead>(
    storage: &S,
    config: &ResourceConfig,
    info: &RevisionInfo,
    page_no: u64,
) -> Result<Option<Page>> {
    let Some(window) = info.pages.get(&page_no) else {
        return Ok(None);
    };
    let fragments = fetch_window(storage, config, window).await?;
    let page = reconstruct(
        config.versioning,
        &fragments,
        config.revisions_to_restore,
        config.page_capacity,
    )?;
    debug!(
        revision = info.revision,
        page = page_no,
        fragments = fragments.len(),
        "materialized page"
    );
    Ok(Some(page))
}

/// Decode one occupied slot into a record, treating tombstones as absent.
pub(crate) fn decode_slot(slot: &RecordSlot, key: u64) -> Result<Option<DataRecord>> {
    let mut pos = 0;
    let record = arbor_db_core::deserialize_record(&slot.bytes, &mut pos, key, slot.dewey.clone())?;
    if pos != slot.bytes.len() {
        return Err(Error::corrupt(format!(
            "record at key {key} has {} trailing bytes",
            slot.bytes.len() - pos
        ))
        .into());
    }
    if record.kind() == NodeKind::Deleted {
        return Ok(None);
    }
    Ok(Some(record))
}
