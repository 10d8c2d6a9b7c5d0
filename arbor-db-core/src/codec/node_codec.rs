//! Node record wire codec: `[1 byte kind tag][kind-specific payload]`.
//!
//! The codec is a tag+dispatch wrapper: each kind owns its payload layout.
//! The node key is not part of the record bytes — it is derived from the
//! record's slot position and passed into [`deserialize_record`], so all
//! structural links are delta-encoded against it (small zigzag varints for
//! neighboring keys). The DeweyID travels outside the record payload too,
//! framed by the fragment codec (see `codec::dewey_codec`).

use crate::codec::varint::{read_i64, read_string, read_u64, write_i64, write_string, write_u64};
use crate::dewey::DeweyId;
use crate::error::Result;
use crate::node::{DataRecord, NodeData, NodeKind, StructNode};

/// Serialize one record's tag and payload into `buf`.
pub fn serialize_record(record: &DataRecord, buf: &mut Vec<u8>) {
    buf.push(record.kind() as u8);
    let key = record.key;
    match &record.data {
        NodeData::Element {
            structure,
            attribute_keys,
            name,
        } => {
            write_struct(key, structure, buf);
            write_u64(attribute_keys.len() as u64, buf);
            for &attr in attribute_keys {
                write_i64(key as i64 - attr as i64, buf);
            }
            write_string(name, buf);
        }
        NodeData::Attribute {
            parent,
            name,
            value,
        } => {
            write_i64(key as i64 - parent, buf);
            write_string(name, buf);
            write_string(value, buf);
        }
        NodeData::Text { structure, value } | NodeData::Comment { structure, value } => {
            write_struct(key, structure, buf);
            write_string(value, buf);
        }
        NodeData::ProcessingInstruction {
            structure,
            target,
            content,
        } => {
            write_struct(key, structure, buf);
            write_string(target, buf);
            write_string(content, buf);
        }
        NodeData::Deleted => {}
    }
}

/// Decode one record at `*pos`, reattaching the externally-supplied node
/// key and optional DeweyID.
pub fn deserialize_record(
    buf: &[u8],
    pos: &mut usize,
    key: u64,
    dewey: Option<DeweyId>,
) -> Result<DataRecord> {
    let tag = *buf
        .get(*pos)
        .ok_or_else(|| crate::error::Error::corrupt("missing record tag byte"))?;
    *pos += 1;
    let kind = NodeKind::from_u8(tag)?;
    let data = match kind {
        NodeKind::Element => {
            let structure = read_struct(key, buf, pos)?;
            let attr_count = read_u64(buf, pos)?;
            let mut attribute_keys = Vec::with_capacity(attr_count as usize);
            for _ in 0..attr_count {
                let delta = read_i64(buf, pos)?;
                attribute_keys.push((key as i64 - delta) as u64);
            }
            let name = read_string(buf, pos)?;
            NodeData::Element {
                structure,
                attribute_keys,
                name,
            }
        }
        NodeKind::Attribute => {
            let delta = read_i64(buf, pos)?;
            let parent = key as i64 - delta;
            let name = read_string(buf, pos)?;
            let value = read_string(buf, pos)?;
            NodeData::Attribute {
                parent,
                name,
                value,
            }
        }
        NodeKind::Text => NodeData::Text {
            structure: read_struct(key, buf, pos)?,
            value: read_string(buf, pos)?,
        },
        NodeKind::Comment => NodeData::Comment {
            structure: read_struct(key, buf, pos)?,
            value: read_string(buf, pos)?,
        },
        NodeKind::ProcessingInstruction => NodeData::ProcessingInstruction {
            structure: read_struct(key, buf, pos)?,
            target: read_string(buf, pos)?,
            content: read_string(buf, pos)?,
        },
        NodeKind::Deleted => NodeData::Deleted,
    };
    Ok(DataRecord { key, dewey, data })
}

fn write_struct(key: u64, structure: &StructNode, buf: &mut Vec<u8>) {
    write_i64(key as i64 - structure.parent, buf);
    write_i64(key as i64 - structure.left_sibling, buf);
    write_i64(key as i64 - structure.right_sibling, buf);
    write_i64(key as i64 - structure.first_child, buf);
    write_u64(structure.child_count, buf);
}

fn read_struct(key: u64, buf: &[u8], pos: &mut usize) -> Result<StructNode> {
    let parent = key as i64 - read_i64(buf, pos)?;
    let left_sibling = key as i64 - read_i64(buf, pos)?;
    let right_sibling = key as i64 - read_i64(buf, pos)?;
    let first_child = key as i64 - read_i64(buf, pos)?;
    let child_count = read_u64(buf, pos)?;
    Ok(StructNode {
        parent,
        left_sibling,
        right_sibling,
        first_child,
        child_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::node::NULL_NODE;

    fn round_trip(record: DataRecord) {
        let mut buf = Vec::new();
        serialize_record(&record, &mut buf);
        let mut pos = 0;
        let back = deserialize_record(&buf, &mut pos, record.key, record.dewey.clone()).unwrap();
        assert_eq!(back, record);
        assert_eq!(pos, buf.len(), "decoder must consume the exact payload");
    }

    #[test]
    fn test_element_round_trip() {
        round_trip(DataRecord {
            key: 130,
            dewey: Some(DeweyId::from_divisions(&[1 << 16, 3])),
            data: NodeData::Element {
                structure: StructNode {
                    parent: 4,
                    left_sibling: 129,
                    right_sibling: 131,
                    first_child: 200,
                    child_count: 12,
                },
                attribute_keys: vec![131, 132, 500],
                name: "foo".into(),
            },
        });
    }

    #[test]
    fn test_element_with_null_links() {
        round_trip(DataRecord {
            key: 0,
            dewey: None,
            data: NodeData::Element {
                structure: StructNode::detached(NULL_NODE),
                attribute_keys: vec![],
                name: "root-elem".into(),
            },
        });
    }

    #[test]
    fn test_attribute_round_trip() {
        round_trip(DataRecord {
            key: 9,
            dewey: None,
            data: NodeData::Attribute {
                parent: 3,
                name: "id".into(),
                value: "x-42".into(),
            },
        });
    }

    #[test]
    fn test_text_comment_pi_round_trip() {
        round_trip(DataRecord {
            key: 55,
            dewey: None,
            data: NodeData::Text {
                structure: StructNode::detached(54),
                value: "some text with ünïcode".into(),
            },
        });
        round_trip(DataRecord {
            key: 56,
            dewey: None,
            data: NodeData::Comment {
                structure: StructNode::detached(54),
                value: "-- note --".into(),
            },
        });
        round_trip(DataRecord {
            key: 57,
            dewey: None,
            data: NodeData::ProcessingInstruction {
                structure: StructNode::detached(54),
                target: "xml-stylesheet".into(),
                content: "href=\"a.css\"".into(),
            },
        });
    }

    #[test]
    fn test_deleted_round_trip_is_one_byte() {
        let record = DataRecord {
            key: 3,
            dewey: None,
            data: NodeData::Deleted,
        };
        let mut buf = Vec::new();
        serialize_record(&record, &mut buf);
        assert_eq!(buf, vec![NodeKind::Deleted as u8]);
        round_trip(record);
    }

    #[test]
    fn test_unknown_tag_surfaces() {
        let buf = [0x2au8];
        let mut pos = 0;
        match deserialize_record(&buf, &mut pos, 0, None) {
            Err(Error::UnknownNodeKind(0x2a)) => {}
            other => panic!("expected UnknownNodeKind, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let record = DataRecord {
            key: 1,
            dewey: None,
            data: NodeData::Text {
                structure: StructNode::detached(0),
                value: "hello".into(),
            },
        };
        let mut buf = Vec::new();
        serialize_record(&record, &mut buf);
        buf.truncate(buf.len() - 3);
        let mut pos = 0;
        assert!(deserialize_record(&buf, &mut pos, 1, None).is_err());
    }
}
