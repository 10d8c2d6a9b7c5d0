//! Node records and kinds
//!
//! A [`DataRecord`] is one node of the document tree: a node key (assigned
//! once, never reused while the resource exists), an optional [`DeweyId`]
//! position label, and a kind-tagged payload. The kind set is closed; the
//! tag byte drives codec dispatch (see `codec::node_codec`).
//!
//! Structural fields follow the struct-delegate model: parent, sibling,
//! and first-child links are node keys ([`NULL_NODE`] when absent).

use crate::dewey::DeweyId;
use crate::error::{Error, Result};

/// Sentinel for an absent structural link.
pub const NULL_NODE: i64 = -1;

/// Closed node-kind enumeration; the discriminant is the wire tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeKind {
    Element = 1,
    Attribute = 2,
    Text = 3,
    /// Tombstone for a logically deleted slot; carried by delta fragments,
    /// dropped at the next full dump, reported as absent by readers.
    Deleted = 5,
    ProcessingInstruction = 7,
    Comment = 8,
}

impl NodeKind {
    /// Resolve a wire tag byte. Unknown tags are fatal for the containing
    /// read: payloads are length-implicit per kind, so the decoder cannot
    /// skip past an unrecognized record.
    pub fn from_u8(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(NodeKind::Element),
            2 => Ok(NodeKind::Attribute),
            3 => Ok(NodeKind::Text),
            5 => Ok(NodeKind::Deleted),
            7 => Ok(NodeKind::ProcessingInstruction),
            8 => Ok(NodeKind::Comment),
            other => Err(Error::UnknownNodeKind(other)),
        }
    }
}

/// Structural links of a node that participates in the sibling axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructNode {
    /// Parent node key, or [`NULL_NODE`] for children of the document root.
    pub parent: i64,
    pub left_sibling: i64,
    pub right_sibling: i64,
    pub first_child: i64,
    pub child_count: u64,
}

impl StructNode {
    /// Links for a fresh node under `parent` with no relatives yet.
    pub fn detached(parent: i64) -> Self {
        Self {
            parent,
            left_sibling: NULL_NODE,
            right_sibling: NULL_NODE,
            first_child: NULL_NODE,
            child_count: 0,
        }
    }
}

/// Kind-specific payload of a node record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element {
        structure: StructNode,
        /// Keys of attribute records owned by this element, in insertion
        /// order. Attributes are not on the sibling axis.
        attribute_keys: Vec<u64>,
        name: String,
    },
    Attribute {
        parent: i64,
        name: String,
        value: String,
    },
    Text {
        structure: StructNode,
        value: String,
    },
    Comment {
        structure: StructNode,
        value: String,
    },
    ProcessingInstruction {
        structure: StructNode,
        target: String,
        content: String,
    },
    /// See [`NodeKind::Deleted`].
    Deleted,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Attribute { .. } => NodeKind::Attribute,
            NodeData::Text { .. } => NodeKind::Text,
            NodeData::Comment { .. } => NodeKind::Comment,
            NodeData::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
            NodeData::Deleted => NodeKind::Deleted,
        }
    }

    /// Structural links, for kinds on the sibling axis.
    pub fn structure(&self) -> Option<&StructNode> {
        match self {
            NodeData::Element { structure, .. }
            | NodeData::Text { structure, .. }
            | NodeData::Comment { structure, .. }
            | NodeData::ProcessingInstruction { structure, .. } => Some(structure),
            NodeData::Attribute { .. } | NodeData::Deleted => None,
        }
    }

    /// Mutable structural links, for kinds on the sibling axis.
    pub fn structure_mut(&mut self) -> Option<&mut StructNode> {
        match self {
            NodeData::Element { structure, .. }
            | NodeData::Text { structure, .. }
            | NodeData::Comment { structure, .. }
            | NodeData::ProcessingInstruction { structure, .. } => Some(structure),
            NodeData::Attribute { .. } | NodeData::Deleted => None,
        }
    }
}

/// One node's record: identity, position, payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    /// Node key: unique within the resource across all revisions, assigned
    /// from a never-decreasing counter, never reassigned.
    pub key: u64,
    /// Position label, present when the resource stores DeweyIDs.
    pub dewey: Option<DeweyId>,
    pub data: NodeData,
}

impl DataRecord {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Element or attribute name, PI target; `None` for unnamed kinds.
    pub fn name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } | NodeData::Attribute { name, .. } => Some(name),
            NodeData::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Text/comment/attribute value, PI content; `None` for other kinds.
    pub fn value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text { value, .. }
            | NodeData::Comment { value, .. }
            | NodeData::Attribute { value, .. } => Some(value),
            NodeData::ProcessingInstruction { content, .. } => Some(content),
            _ => None,
        }
    }
}
