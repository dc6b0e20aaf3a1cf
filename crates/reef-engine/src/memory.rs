//! In-memory ordered engine backed by a `BTreeMap`.
//!
//! Intended for tests and embedders that want the full contract without a
//! disk engine. Snapshots clone the map under the read lock, which is
//! enough for the workloads this engine targets.

use crate::batch::{BatchOp, WriteBatch};
use crate::engine::{KvEngine, KvPair, KvReader, ScanIter, ScanOpts};
use crate::error::Result;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};

type Map = BTreeMap<Bytes, Bytes>;

#[derive(Default)]
pub struct MemoryEngine {
    map: RwLock<Map>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows, across all keyspaces.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

fn scan_map(map: &Map, min: &[u8], max: &[u8], opts: ScanOpts) -> Vec<KvPair> {
    if min > max {
        return Vec::new();
    }
    let mut rows: Vec<KvPair> = map
        .range::<[u8], _>((Included(min), Included(max)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if opts.reverse {
        rows.reverse();
    }
    if let Some(limit) = opts.limit {
        rows.truncate(limit);
    }
    rows
}

fn apply(map: &mut Map, batch: &WriteBatch) {
    for op in batch.ops() {
        match op {
            BatchOp::Put { key, value } => {
                map.insert(key.clone(), value.clone());
            }
            BatchOp::Delete { key } => {
                map.remove(key);
            }
            BatchOp::DeleteRange { start, stop } => {
                if start >= stop {
                    continue;
                }
                let doomed: Vec<Bytes> = map
                    .range::<[u8], _>((Included(&start[..]), Excluded(&stop[..])))
                    .map(|(k, _)| k.clone())
                    .collect();
                for k in doomed {
                    map.remove(&k);
                }
            }
        }
    }
}

impl KvReader for MemoryEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn scan(&self, min: &[u8], max: &[u8], opts: ScanOpts) -> Result<ScanIter> {
        let rows = scan_map(&self.map.read(), min, max, opts);
        Ok(Box::new(rows.into_iter()))
    }
}

impl KvEngine for MemoryEngine {
    type Snap = MemorySnapshot;

    fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            map: self.map.read().clone(),
        }
    }

    fn commit(&self, batch: &WriteBatch) -> Result<()> {
        apply(&mut self.map.write(), batch);
        Ok(())
    }
}

/// A frozen copy of the keyspace at snapshot time.
pub struct MemorySnapshot {
    map: Map,
}

impl KvReader for MemorySnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.map.get(key).cloned())
    }

    fn scan(&self, min: &[u8], max: &[u8], opts: ScanOpts) -> Result<ScanIter> {
        let rows = scan_map(&self.map, min, max, opts);
        Ok(Box::new(rows.into_iter()))
    }
}
