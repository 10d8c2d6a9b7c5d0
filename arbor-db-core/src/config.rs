//! Per-resource configuration
//!
//! A [`ResourceConfig`] is fixed at resource-creation time, persisted as
//! JSON next to the resource's data, and reloaded verbatim on open. The
//! versioning approach and page capacity define the storage format, so
//! they can never change for an existing resource.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of record slots per page.
pub const DEFAULT_PAGE_CAPACITY: usize = 128;

/// Default bound on how many fragments a reconstruction may traverse.
pub const DEFAULT_REVISIONS_TO_RESTORE: u32 = 3;

/// Fragment-persistence/reconstruction policy for a resource.
///
/// Selected once at resource creation and stored in the config; every
/// commit and every reconstruction for the resource uses the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Versioning {
    /// Every commit writes a complete page copy.
    Full,
    /// Each commit writes only slots changed since the previous revision;
    /// a full dump is written every `revisions_to_restore`-th revision.
    Incremental,
    /// Each commit writes slots changed since the last full dump, so
    /// reconstruction needs at most two fragments.
    Differential,
    /// Like Incremental, but the boundary commit condenses slots falling
    /// out of the window, bounding chains at exactly
    /// `revisions_to_restore` fragments regardless of resource age.
    SlidingSnapshot,
}

/// Configuration of a single resource, fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Whether DeweyID position labels are stored (and wire-encoded) for
    /// this resource. When false the DeweyID codec is a no-op in both
    /// directions.
    pub store_dewey_ids: bool,

    /// Fragment-persistence policy.
    pub versioning: Versioning,

    /// Bound `N` on how many fragments a reconstruction may traverse.
    pub revisions_to_restore: u32,

    /// Record slots per page. Slot `i` of page `p` holds node key
    /// `p * page_capacity + i`.
    pub page_capacity: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            store_dewey_ids: true,
            versioning: Versioning::Incremental,
            revisions_to_restore: DEFAULT_REVISIONS_TO_RESTORE,
            page_capacity: DEFAULT_PAGE_CAPACITY,
        }
    }
}

impl ResourceConfig {
    /// Validate the configuration.
    ///
    /// Capacity must fit slot indices in a u16 on the wire; `N` must be
    /// positive or reconstruction windows would be empty.
    pub fn validate(&self) -> Result<()> {
        if self.revisions_to_restore == 0 {
            return Err(Error::invalid_config("revisions_to_restore must be >= 1"));
        }
        if self.page_capacity == 0 {
            return Err(Error::invalid_config("page_capacity must be >= 1"));
        }
        if self.page_capacity > u16::MAX as usize + 1 {
            return Err(Error::invalid_config(format!(
                "page_capacity {} exceeds maximum {}",
                self.page_capacity,
                u16::MAX as usize + 1
            )));
        }
        Ok(())
    }

    /// Page number holding the given node key.
    pub fn page_of(&self, key: u64) -> u64 {
        key / self.page_capacity as u64
    }

    /// Slot within the page holding the given node key.
    pub fn slot_of(&self, key: u64) -> usize {
        (key % self.page_capacity as u64) as usize
    }

    /// Node key stored at `(page, slot)`.
    pub fn key_at(&self, page: u64, slot: usize) -> u64 {
        page * self.page_capacity as u64 + slot as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ResourceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_capacity, 128);
        assert_eq!(config.revisions_to_restore, 3);
    }

    #[test]
    fn test_rejects_zero_restore_window() {
        let config = ResourceConfig {
            revisions_to_restore: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_capacity() {
        let config = ResourceConfig {
            page_capacity: 1 << 17,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_addressing_round_trip() {
        let config = ResourceConfig::default();
        for key in [0u64, 1, 127, 128, 129, 1000] {
            let page = config.page_of(key);
            let slot = config.slot_of(key);
            assert_eq!(config.key_at(page, slot), key);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let config = ResourceConfig {
            store_dewey_ids: false,
            versioning: Versioning::SlidingSnapshot,
            revisions_to_restore: 4,
            page_capacity: 64,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ResourceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
