//! The engine contract: reads, snapshots, and atomic batch commits.

use crate::batch::WriteBatch;
use crate::error::Result;
use bytes::Bytes;

pub type KvPair = (Bytes, Bytes);

/// Owned iterator over scan results, oldest-to-newest in key order
/// (or reversed when requested).
pub type ScanIter = Box<dyn Iterator<Item = KvPair> + Send>;

/// Options for a closed-range scan over `[min, max]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOpts {
    pub reverse: bool,
    pub limit: Option<usize>,
}

/// Read-side contract, implemented by both live engines and snapshots.
///
/// A missing key is `None`; an empty stored value is `Some` with zero
/// length. Structure layers rely on the distinction to tell corruption
/// apart from legitimately empty values.
pub trait KvReader {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Iterates the closed range `[min, max]`. An inverted range yields
    /// nothing.
    fn scan(&self, min: &[u8], max: &[u8], opts: ScanOpts) -> Result<ScanIter>;
}

/// An ordered byte-keyed KV engine with atomic batched writes.
///
/// Commits are linearizable: a batch is visible in full to any read that
/// starts after `commit` returns, and not at all before.
pub trait KvEngine: KvReader + Send + Sync + 'static {
    type Snap: KvReader + Send;

    /// A consistent point-in-time view of the keyspace.
    fn snapshot(&self) -> Self::Snap;

    /// Applies every staged op in order, atomically.
    fn commit(&self, batch: &WriteBatch) -> Result<()>;
}
