//! Fragment planning and page reconstruction per versioning approach
//!
//! The [`Versioning`] variant is fixed per resource at creation time, so
//! each operation dispatches once on a closed enum — there is no per-call
//! polymorphism. Both directions operate on *undecoded* record bytes:
//! overlaying fragments never decodes a record.
//!
//! Reconstruction input is the page's fragment window ordered newest to
//! oldest, already bounded by the manifest to what the approach needs.
//! Commit planning input is the outgoing page image, the set of slots the
//! transaction touched, and the same window as of the previous revision.
//!
//! Full dumps are written every `revisions_to_restore`-th revision under
//! Incremental and Differential, which bounds Incremental chains at N-1
//! deltas and keeps Differential reconstruction at two fragments.
//! SlidingSnapshot never writes scheduled full dumps; instead the commit
//! that would push a fragment out of the N-window condenses that
//! fragment's surviving slots into the new fragment.

use crate::error::{Result, RevisionError};
use arbor_db_core::page::{FragmentKind, Page, PageFragment, RecordSlot};
use arbor_db_core::Versioning;
use std::collections::BTreeSet;
use tracing::debug;

/// Materialize the logical page for the newest revision in `fragments`.
///
/// `fragments` is ordered newest to oldest. Every variant validates the
/// back-reference chain it walks; a dangling link or an unreachable Full
/// fragment is corruption, never a partial result.
pub fn reconstruct(
    versioning: Versioning,
    fragments: &[PageFragment],
    revisions_to_restore: u32,
    capacity: usize,
) -> Result<Page> {
    let newest = fragments.first().ok_or(RevisionError::EmptyWindow)?;
    match versioning {
        Versioning::Full => {
            if newest.kind != FragmentKind::Full {
                return Err(RevisionError::MissingFull {
                    revision: newest.revision,
                });
            }
            Ok(newest.to_page(capacity))
        }
        Versioning::Incremental => {
            let seed = fragments
                .iter()
                .position(|f| f.kind == FragmentKind::Full)
                .ok_or(RevisionError::MissingFull {
                    revision: newest.revision,
                })?;
            verify_chain(&fragments[..=seed])?;
            let mut page = fragments[seed].to_page(capacity);
            // Overlay the deltas oldest to newest; newer slots win.
            for fragment in fragments[..seed].iter().rev() {
                fragment.apply_to(&mut page);
            }
            Ok(page)
        }
        Versioning::Differential => {
            if newest.kind == FragmentKind::Full {
                return Ok(newest.to_page(capacity));
            }
            let full_revision = newest.reference.ok_or_else(|| {
                RevisionError::corrupt("differential delta without a full reference")
            })?;
            let full = fragments
                .iter()
                .find(|f| f.revision == full_revision && f.kind == FragmentKind::Full)
                .ok_or(RevisionError::BrokenChain {
                    revision: newest.revision,
                    expected: Some(full_revision),
                    found: None,
                })?;
            let mut page = full.to_page(capacity);
            newest.apply_to(&mut page);
            Ok(page)
        }
        Versioning::SlidingSnapshot => {
            let window = &fragments[..fragments.len().min(revisions_to_restore as usize)];
            verify_chain(window)?;
            let oldest = window.last().expect("window is non-empty");
            if oldest.kind != FragmentKind::Full && window.len() < revisions_to_restore as usize {
                // A short chain must bottom out in a Full fragment; only a
                // complete N-window is self-sufficient by condensation.
                return Err(RevisionError::MissingFull {
                    revision: newest.revision,
                });
            }
            let mut page = Page::empty(capacity);
            for fragment in window.iter().rev() {
                fragment.apply_to(&mut page);
            }
            Ok(page)
        }
    }
}

/// Decide what to persist for a page the transaction touched.
///
/// `page` is the outgoing (post-mutation) image, `dirty` the slots the
/// transaction wrote, `window` the page's fragment window as of the
/// previous revision (newest first), `revision` the number being
/// committed. Deleted slots are expected to carry tombstone records, so
/// every dirty slot is occupied.
pub fn plan_commit(
    versioning: Versioning,
    page: &Page,
    dirty: &BTreeSet<usize>,
    window: &[PageFragment],
    revision: u64,
    revisions_to_restore: u32,
) -> Result<PageFragment> {
    let n = revisions_to_restore as u64;
    match versioning {
        Versioning::Full => Ok(PageFragment::full_of(page, revision)),
        Versioning::Incremental => {
            let previous = match window.first() {
                Some(previous) => previous,
                None => return Ok(PageFragment::full_of(page, revision)),
            };
            if revision % n == 0 {
                return Ok(PageFragment::full_of(page, revision));
            }
            Ok(PageFragment {
                revision,
                kind: FragmentKind::Delta,
                reference: Some(previous.revision),
                entries: dirty_entries(page, dirty)?,
            })
        }
        Versioning::Differential => {
            let full = window.iter().find(|f| f.kind == FragmentKind::Full);
            let full = match full {
                Some(full) if revision % n != 0 => full,
                _ => return Ok(PageFragment::full_of(page, revision)),
            };
            // Diff against the last full dump, not the previous revision:
            // every slot whose current bytes differ from the full's copy.
            let base = full.to_page(page.capacity());
            let mut entries = Vec::new();
            for (slot, record) in page.iter_present() {
                if base.get(slot) != Some(record) {
                    entries.push((slot as u16, record.clone()));
                }
            }
            for (slot, _) in base.iter_present() {
                if page.get(slot).is_none() {
                    return Err(RevisionError::corrupt(format!(
                        "slot {slot} vanished without a tombstone"
                    )));
                }
            }
            Ok(PageFragment {
                revision,
                kind: FragmentKind::Delta,
                reference: Some(full.revision),
                entries,
            })
        }
        Versioning::SlidingSnapshot => {
            let previous = match window.first() {
                Some(previous) => previous,
                None => return Ok(PageFragment::full_of(page, revision)),
            };
            let mut slots: BTreeSet<usize> = dirty.clone();
            if window.len() >= revisions_to_restore as usize {
                // The oldest window fragment slides out with this commit;
                // condense every slot whose only surviving copy it holds.
                let sliding_out = &window[revisions_to_restore as usize - 1];
                let newer = &window[..revisions_to_restore as usize - 1];
                let mut condensed = 0usize;
                for (slot, _) in &sliding_out.entries {
                    let slot = *slot as usize;
                    let covered = dirty.contains(&slot)
                        || newer
                            .iter()
                            .any(|f| f.entries.iter().any(|(s, _)| *s as usize == slot));
                    if !covered && page.get(slot).is_some() {
                        slots.insert(slot);
                        condensed += 1;
                    }
                }
                if condensed > 0 {
                    debug!(
                        revision,
                        condensed, "condensed slots from fragment sliding out of window"
                    );
                }
            }
            Ok(PageFragment {
                revision,
                kind: FragmentKind::Delta,
                reference: Some(previous.revision),
                entries: dirty_entries(page, &slots)?,
            })
        }
    }
}

/// How many of the newest window entries a reconstruction at the head
/// still needs, given the fragment kinds newest to oldest. Used for
/// manifest window trimming after a commit.
pub fn window_len(versioning: Versioning, kinds: &[FragmentKind], revisions_to_restore: u32) -> usize {
    match versioning {
        Versioning::Full => kinds.len().min(1),
        Versioning::Incremental | Versioning::Differential => kinds
            .iter()
            .position(|k| *k == FragmentKind::Full)
            .map(|i| i + 1)
            .unwrap_or(kinds.len()),
        Versioning::SlidingSnapshot => kinds.len().min(revisions_to_restore as usize),
    }
}

fn dirty_entries(page: &Page, dirty: &BTreeSet<usize>) -> Result<Vec<(u16, RecordSlot)>> {
    let mut entries = Vec::with_capacity(dirty.len());
    for &slot in dirty {
        let record = page.get(slot).ok_or_else(|| {
            RevisionError::corrupt(format!("dirty slot {slot} holds no record"))
        })?;
        entries.push((slot as u16, record.clone()));
    }
    Ok(entries)
}

/// Validate back-reference continuity across a newest-first chain.
fn verify_chain(fragments: &[PageFragment]) -> Result<()> {
    for pair in fragments.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        if newer.reference != Some(older.revision) {
            return Err(RevisionError::BrokenChain {
                revision: newer.revision,
                expected: newer.reference,
                found: Some(older.revision),
            });
        }
    }
    Ok(())
}
