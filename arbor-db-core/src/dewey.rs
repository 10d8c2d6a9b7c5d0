//! DeweyID position labels
//!
//! A [`DeweyId`] encodes a node's hierarchical position as a byte sequence
//! with two load-bearing properties:
//!
//! - byte-lexicographic order of DeweyIDs equals document order;
//! - sharing a byte-prefix implies an ancestor relationship.
//!
//! The representation is a sequence of big-endian u32 divisions, one per
//! tree level. Fixed-width big-endian divisions keep both properties
//! trivially true: per-level numeric order is byte order, and an ancestor
//! is exactly a division-prefix (hence a byte-prefix).
//!
//! Sibling divisions are allocated with gaps ([`SIBLING_GAP`]) so inserts
//! between existing siblings find room via midpoint allocation without
//! relabeling. Relabeling on gap exhaustion is not implemented; allocation
//! then fails.
//!
//! A DeweyID is a position label, not an identity: node keys identify
//! nodes, DeweyIDs order them. The two must never be conflated.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gap between consecutively appended sibling divisions.
pub const SIBLING_GAP: u32 = 1 << 16;

/// Width in bytes of one division on the wire.
const DIVISION_WIDTH: usize = 4;

/// Hierarchical position label. The empty id denotes the document root.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeweyId(Vec<u8>);

impl DeweyId {
    /// The document root label (empty byte sequence).
    pub fn document_root() -> Self {
        DeweyId(Vec::new())
    }

    /// Build from raw bytes.
    ///
    /// The codec layer treats labels as opaque byte sequences; only labels
    /// produced by the navigation constructors are guaranteed to decompose
    /// into whole divisions.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        DeweyId(bytes)
    }

    /// Build from explicit divisions.
    pub fn from_divisions(divisions: &[u32]) -> Self {
        let mut bytes = Vec::with_capacity(divisions.len() * DIVISION_WIDTH);
        for d in divisions {
            bytes.extend_from_slice(&d.to_be_bytes());
        }
        DeweyId(bytes)
    }

    /// Raw label bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Divisions, one per level below the root. Meaningful for labels
    /// built from divisions; trailing partial bytes are ignored.
    pub fn divisions(&self) -> Vec<u32> {
        self.0
            .chunks_exact(DIVISION_WIDTH)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Depth below the document root.
    pub fn level(&self) -> usize {
        self.0.len() / DIVISION_WIDTH
    }

    /// The parent label, or `None` for the document root or a label
    /// shorter than one division.
    pub fn parent(&self) -> Option<DeweyId> {
        let end = self.0.len().checked_sub(DIVISION_WIDTH)?;
        Some(DeweyId(self.0[..end].to_vec()))
    }

    /// Last division, or `None` for the document root or a label shorter
    /// than one division.
    pub fn last_division(&self) -> Option<u32> {
        let start = self.0.len().checked_sub(DIVISION_WIDTH)?;
        let c = &self.0[start..];
        Some(u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// True if `self` labels an ancestor of the node labeled by `other`.
    ///
    /// Ancestor means proper byte-prefix; a label is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &DeweyId) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Length of the longest common byte-prefix with `other`.
    pub fn common_prefix_len(&self, other: &DeweyId) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Label for a child appended to `self` with the given division.
    pub fn child_with_division(&self, division: u32) -> DeweyId {
        let mut bytes = self.0.clone();
        bytes.extend_from_slice(&division.to_be_bytes());
        DeweyId(bytes)
    }

    /// Label for a first child of an empty parent.
    pub fn first_child(&self) -> DeweyId {
        self.child_with_division(SIBLING_GAP)
    }

    /// Label for a new child of `self`'s parent ordered before `self`.
    ///
    /// Fails when no division is left below `self`'s last division.
    pub fn sibling_before(&self) -> Result<DeweyId> {
        let last = self
            .last_division()
            .ok_or_else(|| Error::other("document root has no siblings"))?;
        if last <= 1 {
            return Err(Error::other("no DeweyID room before first sibling"));
        }
        let parent = self.parent().expect("non-root label has a parent");
        Ok(parent.child_with_division(last / 2))
    }

    /// Label for a new child of `self`'s parent ordered directly after
    /// `self` and, when `next` is the following sibling, before `next`.
    ///
    /// Fails when the gap between the two siblings is exhausted.
    pub fn sibling_after(&self, next: Option<&DeweyId>) -> Result<DeweyId> {
        let last = self
            .last_division()
            .ok_or_else(|| Error::other("document root has no siblings"))?;
        let parent = self.parent().expect("non-root label has a parent");
        let division = match next.and_then(|n| n.last_division()) {
            Some(bound) => {
                if bound <= last + 1 {
                    return Err(Error::other(format!(
                        "no DeweyID room between sibling divisions {last} and {bound}"
                    )));
                }
                last + (bound - last) / 2
            }
            None => last.checked_add(SIBLING_GAP).ok_or_else(|| {
                Error::other("DeweyID sibling division space exhausted")
            })?,
        };
        Ok(parent.child_with_division(division))
    }
}

impl fmt::Debug for DeweyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeweyId(")?;
        let divisions = self.divisions();
        for (i, d) in divisions.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_empty() {
        let root = DeweyId::document_root();
        assert_eq!(root.level(), 0);
        assert!(root.parent().is_none());
        assert!(root.as_bytes().is_empty());
    }

    #[test]
    fn test_prefix_implies_ancestor() {
        let a = DeweyId::from_divisions(&[1, 2]);
        let b = DeweyId::from_divisions(&[1, 2, 9]);
        assert!(a.is_ancestor_of(&b));
        assert!(!b.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(DeweyId::document_root().is_ancestor_of(&a));
    }

    #[test]
    fn test_order_matches_document_order() {
        let root = DeweyId::document_root();
        let first = root.first_child();
        let second = first.sibling_after(None).unwrap();
        let nested = first.first_child();

        // Document order: first, its descendant, then the next sibling.
        assert!(first < nested);
        assert!(nested < second);
        // Multi-byte divisions stay ordered because they are big-endian.
        let small = root.child_with_division(255);
        let large = root.child_with_division(256);
        assert!(small < large);
    }

    #[test]
    fn test_midpoint_insertion() {
        let root = DeweyId::document_root();
        let a = root.first_child();
        let c = a.sibling_after(None).unwrap();
        let b = a.sibling_after(Some(&c)).unwrap();
        assert!(a < b);
        assert!(b < c);

        let before = a.sibling_before().unwrap();
        assert!(before < a);
    }

    #[test]
    fn test_gap_exhaustion_fails() {
        let root = DeweyId::document_root();
        let a = root.child_with_division(10);
        let b = root.child_with_division(11);
        assert!(a.sibling_after(Some(&b)).is_err());

        let first = root.child_with_division(1);
        assert!(first.sibling_before().is_err());
    }

    #[test]
    fn test_from_bytes_is_opaque() {
        let id = DeweyId::from_bytes(vec![0, 1, 0, 0]);
        assert_eq!(id.divisions(), vec![1 << 16]);
    }

    #[test]
    fn test_common_prefix_len() {
        let a = DeweyId::from_divisions(&[1, 2]);
        let b = DeweyId::from_divisions(&[1, 3]);
        // First division shared (4 bytes), second differs in its low byte.
        assert_eq!(a.common_prefix_len(&b), 7);
    }
}
