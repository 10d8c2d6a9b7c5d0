//! Shared fixtures for ledger integration tests.
#![allow(dead_code)]

use arbor_db_core::{MemoryStorage, ResourceConfig, Versioning};
use arbor_db_ledger::{Resource, WriteView};

/// Slots per page in every test resource; one page holds exactly one
/// "fill" worth of sibling elements.
pub const PAGE_CAPACITY: usize = 128;

pub const REVISIONS_TO_RESTORE: u32 = 3;

pub fn test_config(versioning: Versioning) -> ResourceConfig {
    ResourceConfig {
        store_dewey_ids: true,
        versioning,
        revisions_to_restore: REVISIONS_TO_RESTORE,
        page_capacity: PAGE_CAPACITY,
    }
}

pub async fn create_resource(versioning: Versioning) -> Resource<MemoryStorage> {
    init_tracing();
    Resource::create(MemoryStorage::new(), "docs", test_config(versioning))
        .await
        .expect("resource creation")
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Insert `"foo"` elements filling the first page exactly: one first
/// child of the document root plus capacity-1 right siblings. Returns the
/// last inserted key.
pub async fn fill_first_page(wtx: &mut WriteView<MemoryStorage>) -> u64 {
    let mut key = wtx
        .insert_element_as_first_child(None, "foo")
        .await
        .expect("insert first child");
    for _ in 0..PAGE_CAPACITY - 1 {
        key = wtx
            .insert_element_as_right_sibling(key, "foo")
            .await
            .expect("insert sibling");
    }
    key
}

/// Insert one more page worth of `"foo"` siblings after `last`. Returns
/// the last inserted key.
pub async fn fill_page_after(wtx: &mut WriteView<MemoryStorage>, mut last: u64) -> u64 {
    for _ in 0..PAGE_CAPACITY {
        last = wtx
            .insert_element_as_right_sibling(last, "foo")
            .await
            .expect("insert sibling");
    }
    last
}
