//! reef-list: a Redis-compatible list structure over an ordered KV
//! engine.
//!
//! A logically unbounded deque is mapped onto a single ordered keyspace
//! with a monotone-sequence encoding: the list's meta row carries a
//! `[head, tail]` sequence window, and one element row exists per
//! sequence inside it. Because the sequence trails the element key, a
//! forward range scan returns elements in list order.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use reef_engine::MemoryEngine;
//! use reef_list::{ListStore, StoreConfig};
//! use reef_observe::NoopMeter;
//! use std::sync::Arc;
//!
//! let store = ListStore::new(
//!     Arc::new(MemoryEngine::new()),
//!     StoreConfig::default(),
//!     Arc::new(NoopMeter),
//! );
//!
//! let n = store
//!     .r_push(1, b"t:queue", &[Bytes::from("a"), Bytes::from("b")])
//!     .unwrap();
//! assert_eq!(n, 2);
//! assert_eq!(store.l_pop(2, b"t:queue").unwrap().unwrap(), "a");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod header;
pub mod list;
pub mod meta;
pub mod tracker;

mod expire;
mod version;

pub use config::{ExpirationPolicy, StoreConfig};
pub use error::{ListError, Result};
pub use header::HeaderMeta;
pub use list::{ListEnd, ListStore, MAX_BATCH_NUM, RANGE_DELETE_NUM};
pub use version::KeyInfo;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock nanoseconds, used as the timestamp for read-side
/// expiration checks.
pub(crate) fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
