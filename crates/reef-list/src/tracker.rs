//! Watch list for unusually large collections.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Tracks the current size of every collection at or above a watch
/// threshold. Sizes are updated on every mutation; shrinking below the
/// threshold drops the entry.
pub struct LargeCollTracker {
    watch_min: usize,
    colls: RwLock<HashMap<Bytes, usize>>,
}

impl LargeCollTracker {
    pub fn new(watch_min: usize) -> Self {
        Self {
            watch_min,
            colls: RwLock::new(HashMap::new()),
        }
    }

    pub fn update(&self, key: &[u8], size: usize) {
        let mut colls = self.colls.write();
        if size >= self.watch_min {
            colls.insert(Bytes::copy_from_slice(key), size);
        } else {
            colls.remove(key);
        }
    }

    /// The `n` largest watched collections, biggest first.
    pub fn top(&self, n: usize) -> Vec<(Bytes, usize)> {
        let mut out: Vec<(Bytes, usize)> = self
            .colls
            .read()
            .iter()
            .map(|(k, &s)| (k.clone(), s))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out.truncate(n);
        out
    }
}
