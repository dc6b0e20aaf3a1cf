use serde::{Deserialize, Serialize};

/// How element rows of a dead collection are reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    /// Delete element rows in the same batch that drops the meta row.
    Local,
    /// Leave element rows behind for compaction to reclaim; only the
    /// meta row is removed.
    WaitCompact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub expiration_policy: ExpirationPolicy,

    /// Collections at or above this size land in the watch list.
    pub large_coll_watch_min: usize,

    /// Sizes above this are observed on the collection-length histogram.
    pub collection_len_for_metric: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            expiration_policy: ExpirationPolicy::Local,
            large_coll_watch_min: 4096,
            collection_len_for_metric: 1024,
        }
    }
}
