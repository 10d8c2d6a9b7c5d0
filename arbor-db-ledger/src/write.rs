//! The write transaction
//!
//! A [`WriteView`] holds the resource's writer lease and a copy-on-write
//! working image: pages materialize lazily from the base revision on
//! first touch, mutations stay private to the view, and only
//! [`WriteView::commit`] makes them visible. Dirty slots are tracked per
//! page so the versioning strategy can plan deltas.
//!
//! The view survives its commits (re-basing onto the revision it just
//! published) and releases the lease when dropped. Abandoning the view
//! without committing publishes nothing.

use crate::error::{Result, StoreError};
use crate::manifest::{FragmentRef, HeadPointer, RevisionInfo};
use crate::resource::{decode_slot, fetch_window, materialize_page, SharedState};
use arbor_db_core::node::NULL_NODE;
use arbor_db_core::page::{FragmentKind, Page, RecordSlot};
use arbor_db_core::storage::{fragment_path, head_path, manifest_path};
use arbor_db_core::{
    encode_fragment, serialize_record, DataRecord, DeweyId, Error, NodeData, ResourceConfig,
    Storage, StructNode,
};
use arbor_db_revision::{plan_commit, window_len};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Payload of a node being inserted on the sibling axis.
enum NewChild {
    Element { name: String },
    Text { value: String },
    Comment { value: String },
    ProcessingInstruction { target: String, content: String },
}

impl NewChild {
    fn into_data(self, structure: StructNode) -> NodeData {
        match self {
            NewChild::Element { name } => NodeData::Element {
                structure,
                attribute_keys: Vec::new(),
                name,
            },
            NewChild::Text { value } => NodeData::Text { structure, value },
            NewChild::Comment { value } => NodeData::Comment { structure, value },
            NewChild::ProcessingInstruction { target, content } => {
                NodeData::ProcessingInstruction {
                    structure,
                    target,
                    content,
                }
            }
        }
    }
}

/// The single write transaction of a resource.
pub struct WriteView<S> {
    resource: String,
    config: ResourceConfig,
    storage: Arc<S>,
    state: Arc<SharedState>,
    lease: Arc<AtomicBool>,
    /// Revision the working image is seeded from (latest at begin_write,
    /// or the revert target after `revert_to`).
    base: Arc<RevisionInfo>,
    /// Copy-on-write page images, keyed by page number.
    pages: FxHashMap<u64, Page>,
    /// Slots written since the last commit, per page.
    dirty: FxHashMap<u64, BTreeSet<usize>>,
    root_first_child: i64,
    root_child_count: u64,
    /// Next node key to allocate. Never rewinds, also not across revert:
    /// keys stay unique across all revisions of the resource.
    next_node_key: u64,
}

impl<S: Storage> WriteView<S> {
    pub(crate) fn new(
        resource: String,
        config: ResourceConfig,
        storage: Arc<S>,
        state: Arc<SharedState>,
        lease: Arc<AtomicBool>,
        base: Arc<RevisionInfo>,
    ) -> Self {
        let next_node_key = (base.max_node_key + 1) as u64;
        WriteView {
            resource,
            config,
            storage,
            state,
            lease,
            root_first_child: base.root_first_child,
            root_child_count: base.root_child_count,
            next_node_key,
            base,
            pages: FxHashMap::default(),
            dirty: FxHashMap::default(),
        }
    }

    /// Revision the working image is currently based on.
    pub fn base_revision(&self) -> u64 {
        self.base.revision
    }

    pub fn root_first_child(&self) -> Option<u64> {
        link(self.root_first_child)
    }

    pub fn root_child_count(&self) -> u64 {
        self.root_child_count
    }

    // ------------------------------------------------------------------
    // Read-back against the working image
    // ------------------------------------------------------------------

    /// Fetch the record at `key` as the transaction currently sees it.
    ///
    /// Takes `&mut self` because pages materialize lazily into the
    /// working image.
    pub async fn record(&mut self, key: u64) -> Result<Option<DataRecord>> {
        let page_no = self.config.page_of(key);
        self.ensure_page(page_no).await?;
        let page = &self.pages[&page_no];
        match page.get(self.config.slot_of(key)) {
            Some(slot) => decode_slot(slot, key),
            None => Ok(None),
        }
    }

    pub async fn first_child(&mut self, key: u64) -> Result<Option<u64>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().and_then(|s| link(s.first_child))))
    }

    pub async fn right_sibling(&mut self, key: u64) -> Result<Option<u64>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().and_then(|s| link(s.right_sibling))))
    }

    pub async fn left_sibling(&mut self, key: u64) -> Result<Option<u64>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().and_then(|s| link(s.left_sibling))))
    }

    pub async fn parent(&mut self, key: u64) -> Result<Option<u64>> {
        Ok(self.record(key).await?.and_then(|r| match &r.data {
            NodeData::Attribute { parent, .. } => link(*parent),
            _ => r.data.structure().and_then(|s| link(s.parent)),
        }))
    }

    pub async fn child_count(&mut self, key: u64) -> Result<u64> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.data.structure().map(|s| s.child_count))
            .unwrap_or(0))
    }

    pub async fn attributes(&mut self, key: u64) -> Result<Vec<u64>> {
        Ok(match self.record(key).await? {
            Some(DataRecord {
                data: NodeData::Element { attribute_keys, .. },
                ..
            }) => attribute_keys,
            _ => Vec::new(),
        })
    }

    pub async fn name(&mut self, key: u64) -> Result<Option<String>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.name().map(str::to_owned)))
    }

    pub async fn value(&mut self, key: u64) -> Result<Option<String>> {
        Ok(self
            .record(key)
            .await?
            .and_then(|r| r.value().map(str::to_owned)))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert an element as the first child of `parent` (`None` = the
    /// virtual document root). Returns the new node key.
    pub async fn insert_element_as_first_child(
        &mut self,
        parent: Option<u64>,
        name: impl Into<String>,
    ) -> Result<u64> {
        self.insert_first_child(parent, NewChild::Element { name: name.into() })
            .await
    }

    /// Insert an element as the right sibling of `left`.
    pub async fn insert_element_as_right_sibling(
        &mut self,
        left: u64,
        name: impl Into<String>,
    ) -> Result<u64> {
        self.insert_right_sibling(left, NewChild::Element { name: name.into() })
            .await
    }

    /// Insert a text node as the first child of `parent`.
    pub async fn insert_text_as_first_child(
        &mut self,
        parent: Option<u64>,
        value: impl Into<String>,
    ) -> Result<u64> {
        self.insert_first_child(parent, NewChild::Text { value: value.into() })
            .await
    }

    /// Insert a text node as the right sibling of `left`.
    pub async fn insert_text_as_right_sibling(
        &mut self,
        left: u64,
        value: impl Into<String>,
    ) -> Result<u64> {
        self.insert_right_sibling(left, NewChild::Text { value: value.into() })
            .await
    }

    /// Insert a comment as the first child of `parent`.
    pub async fn insert_comment_as_first_child(
        &mut self,
        parent: Option<u64>,
        value: impl Into<String>,
    ) -> Result<u64> {
        self.insert_first_child(parent, NewChild::Comment { value: value.into() })
            .await
    }

    /// Insert a comment as the right sibling of `left`.
    pub async fn insert_comment_as_right_sibling(
        &mut self,
        left: u64,
        value: impl Into<String>,
    ) -> Result<u64> {
        self.insert_right_sibling(left, NewChild::Comment { value: value.into() })
            .await
    }

    /// Insert a processing instruction as the first child of `parent`.
    pub async fn insert_pi_as_first_child(
        &mut self,
        parent: Option<u64>,
        target: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<u64> {
        self.insert_first_child(
            parent,
            NewChild::ProcessingInstruction {
                target: target.into(),
                content: content.into(),
            },
        )
        .await
    }

    /// Insert a processing instruction as the right sibling of `left`.
    pub async fn insert_pi_as_right_sibling(
        &mut self,
        left: u64,
        target: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<u64> {
        self.insert_right_sibling(
            left,
            NewChild::ProcessingInstruction {
                target: target.into(),
                content: content.into(),
            },
        )
        .await
    }

    /// Insert an attribute on the element at `element`. Attributes are
    /// owned by their element and do not participate in the sibling axis.
    pub async fn insert_attribute(
        &mut self,
        element: u64,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<u64> {
        let mut owner = self
            .record(element)
            .await?
            .ok_or_else(|| StoreError::illegal(format!("no node at key {element}")))?;
        let NodeData::Element { attribute_keys, .. } = &mut owner.data else {
            return Err(StoreError::illegal("attributes can only be set on elements"));
        };

        let key = self.allocate_key();
        let dewey = if self.config.store_dewey_ids {
            let owner_dewey = owner
                .dewey
                .clone()
                .ok_or_else(|| Error::corrupt(format!("element {element} has no DeweyID")))?;
            // Attributes live under the reserved division 1, which sibling
            // allocation never reaches.
            Some(
                owner_dewey
                    .child_with_division(1)
                    .child_with_division(attribute_keys.len() as u32 + 1),
            )
        } else {
            None
        };

        attribute_keys.push(key);
        let record = DataRecord {
            key,
            dewey,
            data: NodeData::Attribute {
                parent: element as i64,
                name: name.into(),
                value: value.into(),
            },
        };
        self.put_record(record).await?;
        self.put_record(owner).await?;
        Ok(key)
    }

    /// Rename an element, attribute, or processing-instruction target.
    pub async fn set_name(&mut self, key: u64, name: impl Into<String>) -> Result<()> {
        let mut record = self
            .record(key)
            .await?
            .ok_or_else(|| StoreError::illegal(format!("no node at key {key}")))?;
        match &mut record.data {
            NodeData::Element { name: n, .. } | NodeData::Attribute { name: n, .. } => {
                *n = name.into()
            }
            NodeData::ProcessingInstruction { target, .. } => *target = name.into(),
            _ => return Err(StoreError::illegal("node kind has no name")),
        }
        self.put_record(record).await
    }

    /// Replace the value of a text, comment, or attribute node, or a
    /// processing instruction's content.
    pub async fn set_value(&mut self, key: u64, value: impl Into<String>) -> Result<()> {
        let mut record = self
            .record(key)
            .await?
            .ok_or_else(|| StoreError::illegal(format!("no node at key {key}")))?;
        match &mut record.data {
            NodeData::Text { value: v, .. }
            | NodeData::Comment { value: v, .. }
            | NodeData::Attribute { value: v, .. } => *v = value.into(),
            NodeData::ProcessingInstruction { content, .. } => *content = value.into(),
            _ => return Err(StoreError::illegal("node kind has no value")),
        }
        self.put_record(record).await
    }

    /// Remove the node at `key` together with its subtree (and, for
    /// elements, their attributes). Slots are tombstoned so delta
    /// fragments carry the deletion; node keys are never reused.
    pub async fn remove(&mut self, key: u64) -> Result<()> {
        let record = self
            .record(key)
            .await?
            .ok_or_else(|| StoreError::illegal(format!("no node at key {key}")))?;

        if let NodeData::Attribute { parent, .. } = &record.data {
            let parent = *parent as u64;
            let mut owner = self
                .record(parent)
                .await?
                .ok_or_else(|| Error::corrupt(format!("attribute {key} has no owner")))?;
            if let NodeData::Element { attribute_keys, .. } = &mut owner.data {
                attribute_keys.retain(|&k| k != key);
            }
            self.put_record(owner).await?;
            return self.tombstone(key).await;
        }

        let structure = record
            .data
            .structure()
            .cloned()
            .ok_or_else(|| StoreError::illegal("node is not removable"))?;

        // Unlink from siblings and parent before tombstoning the subtree.
        if structure.left_sibling != NULL_NODE {
            let mut left = self
                .record(structure.left_sibling as u64)
                .await?
                .ok_or_else(|| Error::corrupt("dangling left sibling link"))?;
            if let Some(s) = left.data.structure_mut() {
                s.right_sibling = structure.right_sibling;
            }
            self.put_record(left).await?;
        }
        if structure.right_sibling != NULL_NODE {
            let mut right = self
                .record(structure.right_sibling as u64)
                .await?
                .ok_or_else(|| Error::corrupt("dangling right sibling link"))?;
            if let Some(s) = right.data.structure_mut() {
                s.left_sibling = structure.left_sibling;
            }
            self.put_record(right).await?;
        }
        if structure.parent == NULL_NODE {
            if self.root_first_child == key as i64 {
                self.root_first_child = structure.right_sibling;
            }
            self.root_child_count -= 1;
        } else {
            let mut parent = self
                .record(structure.parent as u64)
                .await?
                .ok_or_else(|| Error::corrupt("dangling parent link"))?;
            if let Some(s) = parent.data.structure_mut() {
                if s.first_child == key as i64 {
                    s.first_child = structure.right_sibling;
                }
                s.child_count -= 1;
            }
            self.put_record(parent).await?;
        }

        // Tombstone the whole subtree, attributes included.
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let node = self
                .record(k)
                .await?
                .ok_or_else(|| Error::corrupt(format!("dangling child link to {k}")))?;
            if let NodeData::Element { attribute_keys, .. } = &node.data {
                for &attr in attribute_keys {
                    self.tombstone(attr).await?;
                }
            }
            if let Some(s) = node.data.structure() {
                let mut child = s.first_child;
                while child != NULL_NODE {
                    stack.push(child as u64);
                    let next = self
                        .record(child as u64)
                        .await?
                        .ok_or_else(|| Error::corrupt(format!("dangling child link to {child}")))?;
                    child = next
                        .data
                        .structure()
                        .map(|s| s.right_sibling)
                        .unwrap_or(NULL_NODE);
                }
            }
            self.tombstone(k).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Revert and commit
    // ------------------------------------------------------------------

    /// Reseed the working image from revision `revision`, discarding all
    /// uncommitted work. Committed history is untouched; the next commit
    /// is numbered `latest + 1`, and the node-key allocator does not
    /// rewind.
    pub fn revert_to(&mut self, revision: u64) -> Result<()> {
        let latest = self.state.latest_revision();
        let target = self
            .state
            .get(revision)
            .ok_or(StoreError::RevisionNotFound {
                requested: revision,
                latest,
            })?;
        info!(
            resource = %self.resource,
            revision,
            "reverting write transaction"
        );
        self.pages.clear();
        self.dirty.clear();
        self.root_first_child = target.root_first_child;
        self.root_child_count = target.root_child_count;
        self.base = target;
        Ok(())
    }

    /// Persist the working image as the next revision and publish it.
    ///
    /// Per dirty page the configured strategy decides what is physically
    /// written; untouched pages carry their fragment windows forward.
    /// Publication order is fragments → manifest → head pointer →
    /// in-memory state, so readers never observe a partial commit. The
    /// view stays usable and is re-based onto the new revision.
    pub async fn commit(&mut self) -> Result<u64> {
        let revision = self.state.latest_revision() + 1;
        let mut pages = self.base.pages.clone();

        let mut dirty_pages: Vec<u64> = self
            .dirty
            .iter()
            .filter(|(_, slots)| !slots.is_empty())
            .map(|(&page_no, _)| page_no)
            .collect();
        dirty_pages.sort_unstable();

        for &page_no in &dirty_pages {
            let page = self
                .pages
                .get(&page_no)
                .ok_or_else(|| Error::corrupt(format!("dirty page {page_no} not materialized")))?;
            let window_refs = self.base.pages.get(&page_no).cloned().unwrap_or_default();
            let window = fetch_window(self.storage.as_ref(), &self.config, &window_refs).await?;
            let fragment = plan_commit(
                self.config.versioning,
                page,
                &self.dirty[&page_no],
                &window,
                revision,
                self.config.revisions_to_restore,
            )?;

            let path = fragment_path(&self.resource, page_no, revision);
            let bytes = encode_fragment(&fragment, &self.config)?;
            self.storage.write_bytes(&path, &bytes).await?;
            debug!(
                resource = %self.resource,
                revision,
                page = page_no,
                kind = ?fragment.kind,
                entries = fragment.entries.len(),
                bytes = bytes.len(),
                "wrote page fragment"
            );

            let mut refs = Vec::with_capacity(window_refs.len() + 1);
            refs.push(FragmentRef {
                revision,
                kind: fragment.kind,
                reference: fragment.reference,
                path,
            });
            refs.extend(window_refs);
            let kinds: Vec<FragmentKind> = refs.iter().map(|r| r.kind).collect();
            refs.truncate(window_len(
                self.config.versioning,
                &kinds,
                self.config.revisions_to_restore,
            ));
            pages.insert(page_no, refs);
        }

        let info = Arc::new(RevisionInfo {
            revision,
            root_first_child: self.root_first_child,
            root_child_count: self.root_child_count,
            max_node_key: self.next_node_key as i64 - 1,
            pages,
        });
        self.storage
            .write_bytes(
                &manifest_path(&self.resource, revision),
                &serde_json::to_vec(info.as_ref()).map_err(Error::from)?,
            )
            .await?;
        // The head pointer is the atomic publish step: the revision
        // exists durably before anything points at it.
        self.storage
            .write_bytes(
                &head_path(&self.resource),
                &serde_json::to_vec(&HeadPointer { latest: revision }).map_err(Error::from)?,
            )
            .await?;
        self.state.publish(info.clone());

        info!(
            resource = %self.resource,
            revision,
            pages = dirty_pages.len(),
            "committed revision"
        );
        self.base = info;
        self.dirty.clear();
        Ok(revision)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn allocate_key(&mut self) -> u64 {
        let key = self.next_node_key;
        self.next_node_key += 1;
        key
    }

    async fn ensure_page(&mut self, page_no: u64) -> Result<()> {
        if self.pages.contains_key(&page_no) {
            return Ok(());
        }
        let page = materialize_page(self.storage.as_ref(), &self.config, &self.base, page_no)
            .await?
            .unwrap_or_else(|| Page::empty(self.config.page_capacity));
        self.pages.insert(page_no, page);
        Ok(())
    }

    /// Serialize `record` into its slot and mark the slot dirty.
    async fn put_record(&mut self, record: DataRecord) -> Result<()> {
        let page_no = self.config.page_of(record.key);
        self.ensure_page(page_no).await?;
        let slot_index = self.config.slot_of(record.key);
        let mut bytes = Vec::new();
        serialize_record(&record, &mut bytes);
        let page = self.pages.get_mut(&page_no).expect("page just ensured");
        page.set(
            slot_index,
            RecordSlot {
                dewey: record.dewey,
                bytes,
            },
        );
        self.dirty.entry(page_no).or_default().insert(slot_index);
        Ok(())
    }

    /// Replace a slot with a tombstone record, keeping its DeweyID so the
    /// fragment codec can chain labels.
    async fn tombstone(&mut self, key: u64) -> Result<()> {
        let page_no = self.config.page_of(key);
        self.ensure_page(page_no).await?;
        let dewey = self.pages[&page_no]
            .get(self.config.slot_of(key))
            .and_then(|slot| slot.dewey.clone());
        self.put_record(DataRecord {
            key,
            dewey,
            data: NodeData::Deleted,
        })
        .await
    }

    async fn insert_first_child(&mut self, parent: Option<u64>, child: NewChild) -> Result<u64> {
        let (parent_link, parent_dewey, old_first) = match parent {
            None => (
                NULL_NODE,
                Some(DeweyId::document_root()),
                self.root_first_child,
            ),
            Some(p) => {
                let record = self
                    .record(p)
                    .await?
                    .ok_or_else(|| StoreError::illegal(format!("no node at key {p}")))?;
                let NodeData::Element { structure, .. } = &record.data else {
                    return Err(StoreError::illegal("only elements can have children"));
                };
                (p as i64, record.dewey.clone(), structure.first_child)
            }
        };

        let key = self.allocate_key();
        let dewey = if self.config.store_dewey_ids {
            if old_first == NULL_NODE {
                let parent_dewey = parent_dewey
                    .ok_or_else(|| Error::corrupt(format!("parent {parent_link} has no DeweyID")))?;
                Some(parent_dewey.first_child())
            } else {
                let first = self
                    .record(old_first as u64)
                    .await?
                    .ok_or_else(|| Error::corrupt("dangling first child link"))?;
                let first_dewey = first
                    .dewey
                    .ok_or_else(|| Error::corrupt("first child has no DeweyID"))?;
                Some(first_dewey.sibling_before()?)
            }
        } else {
            None
        };

        let structure = StructNode {
            parent: parent_link,
            left_sibling: NULL_NODE,
            right_sibling: old_first,
            first_child: NULL_NODE,
            child_count: 0,
        };
        self.put_record(DataRecord {
            key,
            dewey,
            data: child.into_data(structure),
        })
        .await?;

        if old_first != NULL_NODE {
            let mut first = self
                .record(old_first as u64)
                .await?
                .ok_or_else(|| Error::corrupt("dangling first child link"))?;
            if let Some(s) = first.data.structure_mut() {
                s.left_sibling = key as i64;
            }
            self.put_record(first).await?;
        }

        match parent {
            None => {
                self.root_first_child = key as i64;
                self.root_child_count += 1;
            }
            Some(p) => {
                let mut record = self
                    .record(p)
                    .await?
                    .ok_or_else(|| Error::corrupt("parent vanished during insert"))?;
                if let Some(s) = record.data.structure_mut() {
                    s.first_child = key as i64;
                    s.child_count += 1;
                }
                self.put_record(record).await?;
            }
        }
        Ok(key)
    }

    async fn insert_right_sibling(&mut self, left_key: u64, child: NewChild) -> Result<u64> {
        let left = self
            .record(left_key)
            .await?
            .ok_or_else(|| StoreError::illegal(format!("no node at key {left_key}")))?;
        let left_structure = left
            .data
            .structure()
            .cloned()
            .ok_or_else(|| StoreError::illegal("node cannot have siblings"))?;
        let right_link = left_structure.right_sibling;

        let key = self.allocate_key();
        let dewey = if self.config.store_dewey_ids {
            let left_dewey = left
                .dewey
                .ok_or_else(|| Error::corrupt(format!("node {left_key} has no DeweyID")))?;
            let right_dewey = if right_link != NULL_NODE {
                let right = self
                    .record(right_link as u64)
                    .await?
                    .ok_or_else(|| Error::corrupt("dangling right sibling link"))?;
                Some(
                    right
                        .dewey
                        .ok_or_else(|| Error::corrupt("right sibling has no DeweyID"))?,
                )
            } else {
                None
            };
            Some(left_dewey.sibling_after(right_dewey.as_ref())?)
        } else {
            None
        };

        let structure = StructNode {
            parent: left_structure.parent,
            left_sibling: left_key as i64,
            right_sibling: right_link,
            first_child: NULL_NODE,
            child_count: 0,
        };
        self.put_record(DataRecord {
            key,
            dewey,
            data: child.into_data(structure),
        })
        .await?;

        let mut left = self
            .record(left_key)
            .await?
            .ok_or_else(|| Error::corrupt("left sibling vanished during insert"))?;
        if let Some(s) = left.data.structure_mut() {
            s.right_sibling = key as i64;
        }
        self.put_record(left).await?;

        if right_link != NULL_NODE {
            let mut right = self
                .record(right_link as u64)
                .await?
                .ok_or_else(|| Error::corrupt("dangling right sibling link"))?;
            if let Some(s) = right.data.structure_mut() {
                s.left_sibling = key as i64;
            }
            self.put_record(right).await?;
        }

        if left_structure.parent == NULL_NODE {
            self.root_child_count += 1;
        } else {
            let mut parent = self
                .record(left_structure.parent as u64)
                .await?
                .ok_or_else(|| Error::corrupt("dangling parent link"))?;
            if let Some(s) = parent.data.structure_mut() {
                s.child_count += 1;
            }
            self.put_record(parent).await?;
        }
        Ok(key)
    }
}

impl<S> Drop for WriteView<S> {
    fn drop(&mut self) {
        // Release the writer lease; uncommitted work simply vanishes.
        self.lease.store(false, Ordering::Release);
    }
}

impl<S> std::fmt::Debug for WriteView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteView")
            .field("resource", &self.resource)
            .field("base_revision", &self.base.revision)
            .field("dirty_pages", &self.dirty.len())
            .finish()
    }
}

fn link(key: i64) -> Option<u64> {
    if key == NULL_NODE {
        None
    } else {
        Some(key as u64)
    }
}
