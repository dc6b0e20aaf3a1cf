//! Write batches and the shared reusable batch buffer.
//!
//! Every mutating entry point in the structure layers stages its changes
//! into a [`WriteBatch`] and commits it in one call. The [`SharedBatch`]
//! wrapper reuses a single allocation across calls; its RAII guard clears
//! the buffer when dropped, so the next caller always starts clean no
//! matter how the previous call returned.

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A single staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put {
        key: Bytes,
        value: Bytes,
    },
    Delete {
        key: Bytes,
    },
    /// Deletes every key in `[start, stop)`. The upper bound is excluded;
    /// callers that need the endpoint gone must delete it explicitly.
    DeleteRange {
        start: Bytes,
        stop: Bytes,
    },
}

/// An ordered set of mutations applied atomically by
/// [`KvEngine::commit`](crate::KvEngine::commit).
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Bytes>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn delete_range(&mut self, start: impl Into<Bytes>, stop: impl Into<Bytes>) {
        self.ops.push(BatchOp::DeleteRange {
            start: start.into(),
            stop: stop.into(),
        });
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Staged operations in insertion order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

/// A batch buffer shared by every mutating entry point of a store.
///
/// Acquiring serializes mutators and hands out a [`BatchGuard`]; the
/// buffer is cleared when the guard drops, success or failure.
#[derive(Clone, Default)]
pub struct SharedBatch {
    inner: Arc<Mutex<WriteBatch>>,
}

impl SharedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> BatchGuard<'_> {
        BatchGuard {
            inner: self.inner.lock(),
        }
    }
}

/// Scoped access to the shared batch buffer.
pub struct BatchGuard<'a> {
    inner: MutexGuard<'a, WriteBatch>,
}

impl Deref for BatchGuard<'_> {
    type Target = WriteBatch;

    fn deref(&self) -> &WriteBatch {
        &self.inner
    }
}

impl DerefMut for BatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut WriteBatch {
        &mut self.inner
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_records_ops_in_order() {
        let mut wb = WriteBatch::new();
        wb.put(&b"a"[..], &b"1"[..]);
        wb.delete(&b"b"[..]);
        wb.delete_range(&b"c"[..], &b"d"[..]);

        assert_eq!(wb.len(), 3);
        assert!(matches!(wb.ops()[0], BatchOp::Put { .. }));
        assert!(matches!(wb.ops()[1], BatchOp::Delete { .. }));
        assert!(matches!(wb.ops()[2], BatchOp::DeleteRange { .. }));
    }

    #[test]
    fn guard_clears_on_drop() {
        let shared = SharedBatch::new();
        {
            let mut wb = shared.acquire();
            wb.put(&b"a"[..], &b"1"[..]);
            assert_eq!(wb.len(), 1);
        }
        assert!(shared.acquire().is_empty());
    }

    #[test]
    fn guard_clears_on_early_return() {
        fn failing(shared: &SharedBatch) -> Result<(), ()> {
            let mut wb = shared.acquire();
            wb.put(&b"a"[..], &b"1"[..]);
            Err(())
        }

        let shared = SharedBatch::new();
        assert!(failing(&shared).is_err());
        assert!(shared.acquire().is_empty());
    }
}
