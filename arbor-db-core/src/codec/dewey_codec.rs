//! Prefix-delta DeweyID codec
//!
//! Sibling DeweyIDs share long byte-prefixes, so a fragment stores only
//! the differing suffix of each label relative to the label read just
//! before it. The direction is asymmetric and must be preserved exactly:
//! `serialize(sink, id, Some(next))` writes **next's** suffix against the
//! shared prefix of `id` and `next` — the codec always serializes the id
//! that becomes "current" on the following read, with the previous one as
//! dictionary. The decoder mirrors this with its `previous` anchor.
//!
//! Wire framing:
//! - first label in a sequence (no anchor): `[len u8][len bytes]`
//! - subsequent label: `[cutOff u8][suffixLen u8][suffixLen bytes]`,
//!   reconstructed as `anchor[0..cutOff] ++ suffix`
//! - resource with DeweyID storage disabled: zero bytes, both directions.

use crate::config::ResourceConfig;
use crate::dewey::DeweyId;
use crate::error::{Error, Result};

/// Serialize a DeweyID step into `buf`.
///
/// With `next` present, emits `next` delta-compressed against `id`; with
/// `next` absent (first label of a sequence), emits `id` verbatim.
pub fn serialize_dewey(
    id: &DeweyId,
    next: Option<&DeweyId>,
    config: &ResourceConfig,
    buf: &mut Vec<u8>,
) -> Result<()> {
    if !config.store_dewey_ids {
        return Ok(());
    }
    match next {
        Some(next) => {
            let next_bytes = next.as_bytes();
            let cut_off = id.common_prefix_len(next);
            let suffix = &next_bytes[cut_off..];
            if cut_off > u8::MAX as usize || suffix.len() > u8::MAX as usize {
                return Err(Error::corrupt(format!(
                    "DeweyID too long for delta framing: cutOff {cut_off}, suffix {}",
                    suffix.len()
                )));
            }
            buf.push(cut_off as u8);
            buf.push(suffix.len() as u8);
            buf.extend_from_slice(suffix);
        }
        None => {
            let bytes = id.as_bytes();
            if bytes.len() > u8::MAX as usize {
                return Err(Error::corrupt(format!(
                    "DeweyID too long for absolute framing: {} bytes",
                    bytes.len()
                )));
            }
            buf.push(bytes.len() as u8);
            buf.extend_from_slice(bytes);
        }
    }
    Ok(())
}

/// Decode a DeweyID step at `*pos`, anchored on the previously decoded
/// label when one exists. Returns `None` when the resource does not store
/// DeweyIDs (zero bytes consumed).
pub fn deserialize_dewey(
    buf: &[u8],
    pos: &mut usize,
    previous: Option<&DeweyId>,
    config: &ResourceConfig,
) -> Result<Option<DeweyId>> {
    if !config.store_dewey_ids {
        return Ok(None);
    }
    let id = match previous {
        Some(previous) => {
            let cut_off = read_byte(buf, pos)? as usize;
            let size = read_byte(buf, pos)? as usize;
            let anchor = previous.as_bytes();
            if cut_off > anchor.len() {
                return Err(Error::corrupt(format!(
                    "DeweyID cutOff {cut_off} exceeds anchor length {}",
                    anchor.len()
                )));
            }
            let suffix = take(buf, pos, size)?;
            let mut bytes = Vec::with_capacity(cut_off + size);
            bytes.extend_from_slice(&anchor[..cut_off]);
            bytes.extend_from_slice(suffix);
            DeweyId::from_bytes(bytes)
        }
        None => {
            let len = read_byte(buf, pos)? as usize;
            DeweyId::from_bytes(take(buf, pos, len)?.to_vec())
        }
    };
    Ok(Some(id))
}

fn read_byte(buf: &[u8], pos: &mut usize) -> Result<u8> {
    let byte = *buf
        .get(*pos)
        .ok_or_else(|| Error::corrupt("truncated DeweyID framing"))?;
    *pos += 1;
    Ok(byte)
}

fn take<'a>(buf: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = pos
        .checked_add(len)
        .filter(|&e| e <= buf.len())
        .ok_or_else(|| Error::corrupt("truncated DeweyID suffix"))?;
    let bytes = &buf[*pos..end];
    *pos = end;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(store: bool) -> ResourceConfig {
        ResourceConfig {
            store_dewey_ids: store,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_writes_and_reads_nothing() {
        let config = config(false);
        let id = DeweyId::from_divisions(&[1]);
        let mut buf = Vec::new();
        serialize_dewey(&id, None, &config, &mut buf).unwrap();
        assert!(buf.is_empty());
        let mut pos = 0;
        assert_eq!(deserialize_dewey(&buf, &mut pos, None, &config).unwrap(), None);
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_absolute_framing() {
        let config = config(true);
        let id = DeweyId::from_divisions(&[1 << 16]);
        let mut buf = Vec::new();
        serialize_dewey(&id, None, &config, &mut buf).unwrap();
        assert_eq!(buf[0] as usize, id.as_bytes().len());
        let mut pos = 0;
        let back = deserialize_dewey(&buf, &mut pos, None, &config)
            .unwrap()
            .unwrap();
        assert_eq!(back, id);
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_delta_framing_exact_bytes() {
        // [0x01, 0x02] anchored against next [0x01, 0x02, 0x01] encodes
        // as cutOff=2, suffixLen=1, suffix=[0x01].
        let config = ResourceConfig {
            store_dewey_ids: true,
            ..Default::default()
        };
        let current = DeweyId::from_bytes(vec![0x01, 0x02]);
        let next = DeweyId::from_bytes(vec![0x01, 0x02, 0x01]);
        let mut buf = Vec::new();
        serialize_dewey(&current, Some(&next), &config, &mut buf).unwrap();
        assert_eq!(buf, vec![2, 1, 0x01]);

        let mut pos = 0;
        let back = deserialize_dewey(&buf, &mut pos, Some(&current), &config)
            .unwrap()
            .unwrap();
        assert_eq!(back, next);
    }

    #[test]
    fn test_sequence_round_trip() {
        let config = config(true);
        let root = DeweyId::document_root();
        let mut ids = vec![root.first_child()];
        for _ in 0..10 {
            let next = ids.last().unwrap().sibling_after(None).unwrap();
            ids.push(next);
        }
        ids.push(ids.last().unwrap().first_child());

        // Encode the way a fragment does: first absolute, then each pair
        // (previous, current).
        let mut buf = Vec::new();
        serialize_dewey(&ids[0], None, &config, &mut buf).unwrap();
        for pair in ids.windows(2) {
            serialize_dewey(&pair[0], Some(&pair[1]), &config, &mut buf).unwrap();
        }

        let mut pos = 0;
        let mut decoded: Vec<DeweyId> = Vec::new();
        for _ in 0..ids.len() {
            let previous = decoded.last();
            let id = deserialize_dewey(&buf, &mut pos, previous, &config)
                .unwrap()
                .unwrap();
            decoded.push(id);
        }
        assert_eq!(decoded, ids);
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_cutoff_beyond_anchor_is_corrupt() {
        let config = config(true);
        let anchor = DeweyId::from_divisions(&[1]);
        // cutOff 9 > anchor length 4
        let buf = [9u8, 0u8];
        let mut pos = 0;
        assert!(deserialize_dewey(&buf, &mut pos, Some(&anchor), &config).is_err());
    }

    #[test]
    fn test_truncated_suffix_is_corrupt() {
        let config = config(true);
        let anchor = DeweyId::from_divisions(&[1]);
        let buf = [4u8, 8u8, 0, 0];
        let mut pos = 0;
        assert!(deserialize_dewey(&buf, &mut pos, Some(&anchor), &config).is_err());
    }
}
