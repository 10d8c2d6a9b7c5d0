//! Pages, page fragments, and the fragment wire format
//!
//! A [`Page`] is the materialized, fixed-capacity slot array of node
//! records for one key range. What is physically persisted per revision is
//! a [`PageFragment`]: either the complete slot array (`Full`) or only the
//! slots a commit touched (`Delta`), with a back-reference to the fragment
//! it builds on. Fragments hold *undecoded* record bytes — the versioning
//! layer overlays them without ever decoding a record.
//!
//! Wire layout (fixed-width integers little-endian):
//!
//! ```text
//! [magic "AFR1"][version u8][kind u8][revision u64]
//! [ref flag u8][reference u64, if flag = 1]
//! [entry count u32]
//! entry*: [slot varint][dewey (prefix-delta, chained entry-to-entry)]
//!         [record len varint][record bytes]
//! ```
//!
//! Entries are sorted by slot. The DeweyID anchor chain runs across
//! consecutive entries of one fragment; the first entry is absolute.

use crate::codec::dewey_codec::{deserialize_dewey, serialize_dewey};
use crate::codec::varint::{read_u64, write_u64};
use crate::config::ResourceConfig;
use crate::dewey::DeweyId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic bytes identifying a fragment blob.
pub const FRAGMENT_MAGIC: [u8; 4] = *b"AFR1";

/// Current fragment format version.
pub const FRAGMENT_VERSION: u8 = 1;

/// One occupied slot: optional position label plus undecoded record bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSlot {
    /// Present when the resource stores DeweyIDs.
    pub dewey: Option<DeweyId>,
    /// Record bytes as produced by `codec::serialize_record`.
    pub bytes: Vec<u8>,
}

impl RecordSlot {
    /// True if the slot holds a deletion tombstone (a bare `Deleted` tag;
    /// the kind has no payload). Delta fragments carry tombstones so a
    /// deletion overlays older values; full dumps drop them.
    pub fn is_tombstone(&self) -> bool {
        self.bytes == [crate::node::NodeKind::Deleted as u8]
    }
}

/// Materialized slot array of one page at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    slots: Vec<Option<RecordSlot>>,
}

impl Page {
    /// An empty page with the given slot capacity.
    pub fn empty(capacity: usize) -> Self {
        Page {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<&RecordSlot> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Occupy or replace a slot.
    pub fn set(&mut self, slot: usize, record: RecordSlot) {
        self.slots[slot] = Some(record);
    }

    /// Iterate occupied slots in ascending slot order.
    pub fn iter_present(&self) -> impl Iterator<Item = (usize, &RecordSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|r| (i, r)))
    }

    /// Number of occupied slots.
    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Whether a fragment carries the whole page or only touched slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Full,
    Delta,
}

impl FragmentKind {
    fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(FragmentKind::Full),
            1 => Ok(FragmentKind::Delta),
            other => Err(Error::corrupt(format!(
                "invalid fragment kind byte: 0x{other:02x}"
            ))),
        }
    }
}

/// The bytes persisted for one page at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFragment {
    /// Revision this fragment was committed at.
    pub revision: u64,
    pub kind: FragmentKind,
    /// Back-link: previous fragment (Incremental/Sliding deltas) or the
    /// last Full (Differential deltas). `None` for Full fragments.
    pub reference: Option<u64>,
    /// Occupied slots carried by this fragment, sorted by slot index.
    pub entries: Vec<(u16, RecordSlot)>,
}

impl PageFragment {
    /// A Full fragment carrying every live slot of `page`. Tombstones are
    /// dropped: a full dump needs no deletion markers.
    pub fn full_of(page: &Page, revision: u64) -> Self {
        PageFragment {
            revision,
            kind: FragmentKind::Full,
            reference: None,
            entries: page
                .iter_present()
                .filter(|(_, record)| !record.is_tombstone())
                .map(|(slot, record)| (slot as u16, record.clone()))
                .collect(),
        }
    }

    /// Overlay this fragment's entries onto `page`, newer winning.
    pub fn apply_to(&self, page: &mut Page) {
        for (slot, record) in &self.entries {
            page.set(*slot as usize, record.clone());
        }
    }

    /// Materialize a Full fragment as a page of the given capacity.
    pub fn to_page(&self, capacity: usize) -> Page {
        let mut page = Page::empty(capacity);
        self.apply_to(&mut page);
        page
    }
}

/// Serialize a fragment. Fails if the resource stores DeweyIDs but an
/// entry lacks one (write paths must label every record).
pub fn encode_fragment(fragment: &PageFragment, config: &ResourceConfig) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64 + fragment.entries.len() * 16);
    buf.extend_from_slice(&FRAGMENT_MAGIC);
    buf.push(FRAGMENT_VERSION);
    buf.push(match fragment.kind {
        FragmentKind::Full => 0,
        FragmentKind::Delta => 1,
    });
    buf.extend_from_slice(&fragment.revision.to_le_bytes());
    match fragment.reference {
        Some(reference) => {
            buf.push(1);
            buf.extend_from_slice(&reference.to_le_bytes());
        }
        None => buf.push(0),
    }
    buf.extend_from_slice(&(fragment.entries.len() as u32).to_le_bytes());

    let mut previous: Option<&DeweyId> = None;
    for (slot, record) in &fragment.entries {
        write_u64(*slot as u64, &mut buf);
        if config.store_dewey_ids {
            let dewey = record.dewey.as_ref().ok_or_else(|| {
                Error::corrupt(format!("slot {slot} has no DeweyID but resource stores them"))
            })?;
            match previous {
                None => serialize_dewey(dewey, None, config, &mut buf)?,
                Some(prev) => serialize_dewey(prev, Some(dewey), config, &mut buf)?,
            }
            previous = Some(dewey);
        }
        write_u64(record.bytes.len() as u64, &mut buf);
        buf.extend_from_slice(&record.bytes);
    }
    Ok(buf)
}

/// Decode a fragment blob, validating framing, slot bounds, and ordering.
pub fn decode_fragment(buf: &[u8], config: &ResourceConfig) -> Result<PageFragment> {
    let mut pos = 0;
    let magic = take(buf, &mut pos, 4)?;
    if magic != FRAGMENT_MAGIC {
        return Err(Error::corrupt("bad fragment magic bytes"));
    }
    let version = take(buf, &mut pos, 1)?[0];
    if version != FRAGMENT_VERSION {
        return Err(Error::corrupt(format!(
            "unsupported fragment version: {version}"
        )));
    }
    let kind = FragmentKind::from_u8(take(buf, &mut pos, 1)?[0])?;
    let revision = u64::from_le_bytes(take(buf, &mut pos, 8)?.try_into().unwrap());
    let reference = match take(buf, &mut pos, 1)?[0] {
        0 => None,
        1 => Some(u64::from_le_bytes(take(buf, &mut pos, 8)?.try_into().unwrap())),
        other => {
            return Err(Error::corrupt(format!(
                "invalid fragment reference flag: 0x{other:02x}"
            )))
        }
    };
    if kind == FragmentKind::Full && reference.is_some() {
        return Err(Error::corrupt("full fragment carries a back-reference"));
    }
    if kind == FragmentKind::Delta && reference.is_none() {
        return Err(Error::corrupt("delta fragment missing its back-reference"));
    }
    let entry_count = u32::from_le_bytes(take(buf, &mut pos, 4)?.try_into().unwrap()) as usize;

    let mut entries = Vec::with_capacity(entry_count);
    let mut previous: Option<DeweyId> = None;
    let mut last_slot: Option<u16> = None;
    for _ in 0..entry_count {
        let slot = read_u64(buf, &mut pos)?;
        if slot >= config.page_capacity as u64 {
            return Err(Error::corrupt(format!(
                "slot {slot} out of bounds for capacity {}",
                config.page_capacity
            )));
        }
        let slot = slot as u16;
        if let Some(last) = last_slot {
            if slot <= last {
                return Err(Error::corrupt(format!(
                    "fragment entries out of order: slot {slot} after {last}"
                )));
            }
        }
        last_slot = Some(slot);

        let dewey = deserialize_dewey(buf, &mut pos, previous.as_ref(), config)?;
        previous = dewey.clone();

        let len = read_u64(buf, &mut pos)? as usize;
        let bytes = take(buf, &mut pos, len)?.to_vec();
        entries.push((slot, RecordSlot { dewey, bytes }));
    }
    if pos != buf.len() {
        return Err(Error::corrupt(format!(
            "{} trailing bytes after fragment payload",
            buf.len() - pos
        )));
    }
    Ok(PageFragment {
        revision,
        kind,
        reference,
        entries,
    })
}

fn take<'a>(buf: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = pos
        .checked_add(len)
        .filter(|&e| e <= buf.len())
        .ok_or_else(|| Error::corrupt("truncated fragment"))?;
    let bytes = &buf[*pos..end];
    *pos = end;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serialize_record;
    use crate::node::{DataRecord, NodeData, StructNode, NULL_NODE};

    fn config() -> ResourceConfig {
        ResourceConfig::default()
    }

    fn element_slot(key: u64, name: &str, dewey: DeweyId) -> RecordSlot {
        let record = DataRecord {
            key,
            dewey: Some(dewey.clone()),
            data: NodeData::Element {
                structure: StructNode::detached(NULL_NODE),
                attribute_keys: vec![],
                name: name.into(),
            },
        };
        let mut bytes = Vec::new();
        serialize_record(&record, &mut bytes);
        RecordSlot {
            dewey: Some(dewey),
            bytes,
        }
    }

    fn sample_fragment() -> PageFragment {
        let root = DeweyId::document_root();
        let first = root.first_child();
        let second = first.sibling_after(None).unwrap();
        PageFragment {
            revision: 3,
            kind: FragmentKind::Delta,
            reference: Some(2),
            entries: vec![
                (0, element_slot(0, "foo", first)),
                (5, element_slot(5, "bar", second)),
            ],
        }
    }

    #[test]
    fn test_fragment_round_trip() {
        let config = config();
        let fragment = sample_fragment();
        let bytes = encode_fragment(&fragment, &config).unwrap();
        assert_eq!(&bytes[..4], &FRAGMENT_MAGIC);
        let back = decode_fragment(&bytes, &config).unwrap();
        assert_eq!(back, fragment);
    }

    #[test]
    fn test_fragment_round_trip_without_dewey_ids() {
        let config = ResourceConfig {
            store_dewey_ids: false,
            ..Default::default()
        };
        let mut fragment = sample_fragment();
        for (_, record) in &mut fragment.entries {
            record.dewey = None;
        }
        let bytes = encode_fragment(&fragment, &config).unwrap();
        let back = decode_fragment(&bytes, &config).unwrap();
        assert_eq!(back, fragment);
    }

    #[test]
    fn test_missing_dewey_fails_encode() {
        let config = config();
        let mut fragment = sample_fragment();
        fragment.entries[1].1.dewey = None;
        assert!(encode_fragment(&fragment, &config).is_err());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let config = config();
        let mut bytes = encode_fragment(&sample_fragment(), &config).unwrap();
        bytes[0] = b'X';
        assert!(decode_fragment(&bytes, &config).is_err());
    }

    #[test]
    fn test_truncation_rejected() {
        let config = config();
        let bytes = encode_fragment(&sample_fragment(), &config).unwrap();
        for cut in [3, 10, bytes.len() - 1] {
            assert!(decode_fragment(&bytes[..cut], &config).is_err());
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let config = config();
        let mut bytes = encode_fragment(&sample_fragment(), &config).unwrap();
        bytes.push(0);
        assert!(decode_fragment(&bytes, &config).is_err());
    }

    #[test]
    fn test_kind_reference_consistency() {
        let config = config();
        let mut fragment = sample_fragment();
        fragment.kind = FragmentKind::Full;
        // Full with a back-reference must not decode.
        let bytes = encode_fragment(&fragment, &config).unwrap();
        assert!(decode_fragment(&bytes, &config).is_err());
    }

    #[test]
    fn test_slot_out_of_bounds_rejected() {
        let config = ResourceConfig {
            page_capacity: 4,
            ..Default::default()
        };
        let fragment = sample_fragment();
        let bytes = encode_fragment(&fragment, &config).unwrap();
        assert!(decode_fragment(&bytes, &config).is_err());
    }

    #[test]
    fn test_full_of_drops_tombstones() {
        let config = config();
        let mut page = Page::empty(config.page_capacity);
        let root = DeweyId::document_root();
        page.set(1, element_slot(1, "live", root.first_child()));
        page.set(
            2,
            RecordSlot {
                dewey: None,
                bytes: vec![crate::node::NodeKind::Deleted as u8],
            },
        );
        assert!(page.get(2).unwrap().is_tombstone());
        assert!(!page.get(1).unwrap().is_tombstone());

        let full = PageFragment::full_of(&page, 9);
        assert_eq!(full.entries.len(), 1);
        assert_eq!(full.entries[0].0, 1);
    }

    #[test]
    fn test_full_of_and_apply_to() {
        let config = config();
        let mut page = Page::empty(config.page_capacity);
        let root = DeweyId::document_root();
        page.set(2, element_slot(2, "a", root.first_child()));
        page.set(7, element_slot(7, "b", root.first_child().sibling_after(None).unwrap()));

        let full = PageFragment::full_of(&page, 1);
        assert_eq!(full.kind, FragmentKind::Full);
        assert_eq!(full.entries.len(), 2);
        assert_eq!(full.to_page(config.page_capacity), page);
    }
}
