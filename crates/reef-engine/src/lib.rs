//! reef-engine: the ordered KV engine contract consumed by the data
//! structure layers, plus an in-memory reference engine.
//!
//! The contract is deliberately narrow, exactly what the structure code
//! needs from a log-structured store:
//! - point `get`
//! - `Put` / `Delete` / `DeleteRange` staged into a [`WriteBatch`]
//! - atomic batch commit
//! - closed-range forward/reverse iteration with an optional limit
//! - a consistent read snapshot
//!
//! No multi-key atomicity exists beyond a single committed batch.
//!
//! # Example
//!
//! ```
//! use reef_engine::{KvEngine, KvReader, MemoryEngine, ScanOpts, WriteBatch};
//!
//! let eng = MemoryEngine::new();
//! let mut wb = WriteBatch::new();
//! wb.put(&b"k1"[..], &b"v1"[..]);
//! wb.put(&b"k2"[..], &b"v2"[..]);
//! eng.commit(&wb).unwrap();
//!
//! assert_eq!(eng.get(b"k1").unwrap().unwrap(), &b"v1"[..]);
//! let rows: Vec<_> = eng.scan(b"k1", b"k2", ScanOpts::default()).unwrap().collect();
//! assert_eq!(rows.len(), 2);
//! ```

pub mod batch;
pub mod engine;
pub mod error;
pub mod memory;

pub use batch::{BatchGuard, BatchOp, SharedBatch, WriteBatch};
pub use engine::{KvEngine, KvPair, KvReader, ScanIter, ScanOpts};
pub use error::{EngineError, Result};
pub use memory::{MemoryEngine, MemorySnapshot};
