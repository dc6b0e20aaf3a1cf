//! reef-observe: vendor-neutral observability ABI.
//!
//! Core crates depend only on the [`Meter`] trait; backends live
//! elsewhere. Counters carry a `{table, cmd}` label pair, histograms a
//! `table` label, matching what the slow limiter and the list store emit.

use parking_lot::Mutex;
use std::collections::HashMap;

pub const SLOW_WRITE_10MS_CNT: &str = "slow_write_10ms_cnt";
pub const SLOW_WRITE_50MS_CNT: &str = "slow_write_50ms_cnt";
pub const SLOW_WRITE_100MS_CNT: &str = "slow_write_100ms_cnt";
pub const SLOW_LIMITER_REFUSED_CNT: &str = "slow_limiter_refused_cnt";
pub const COLLECTION_LEN_DIST: &str = "collection_len_dist";

pub trait Meter: Send + Sync + 'static {
    /// Increments a `{table, cmd}`-labeled counter by one.
    fn incr(&self, name: &'static str, table: &str, cmd: &str);

    /// Observes a value on a table-labeled histogram.
    fn observe(&self, name: &'static str, table: &str, value: f64);
}

/// A do-nothing meter for embedders who don't care about telemetry.
#[derive(Clone, Copy, Default)]
pub struct NoopMeter;

impl Meter for NoopMeter {
    fn incr(&self, _name: &'static str, _table: &str, _cmd: &str) {}
    fn observe(&self, _name: &'static str, _table: &str, _value: f64) {}
}

/// In-memory meter for tests. Counters and observations are keyed by
/// `name/table/cmd` (histograms use an empty cmd).
#[derive(Default)]
pub struct MemMeter {
    counters: Mutex<HashMap<String, u64>>,
    observations: Mutex<HashMap<String, Vec<f64>>>,
}

impl MemMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str, table: &str, cmd: &str) -> u64 {
        self.counters
            .lock()
            .get(&series_key(name, table, cmd))
            .copied()
            .unwrap_or(0)
    }

    pub fn observations(&self, name: &str, table: &str) -> Vec<f64> {
        self.observations
            .lock()
            .get(&series_key(name, table, ""))
            .cloned()
            .unwrap_or_default()
    }
}

fn series_key(name: &str, table: &str, cmd: &str) -> String {
    format!("{name}/{table}/{cmd}")
}

impl Meter for MemMeter {
    fn incr(&self, name: &'static str, table: &str, cmd: &str) {
        *self
            .counters
            .lock()
            .entry(series_key(name, table, cmd))
            .or_insert(0) += 1;
    }

    fn observe(&self, name: &'static str, table: &str, value: f64) {
        self.observations
            .lock()
            .entry(series_key(name, table, ""))
            .or_default()
            .push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_meter_counts_per_series() {
        let m = MemMeter::new();
        m.incr(SLOW_WRITE_100MS_CNT, "t", "lpush");
        m.incr(SLOW_WRITE_100MS_CNT, "t", "lpush");
        m.incr(SLOW_WRITE_100MS_CNT, "t", "rpush");

        assert_eq!(m.counter(SLOW_WRITE_100MS_CNT, "t", "lpush"), 2);
        assert_eq!(m.counter(SLOW_WRITE_100MS_CNT, "t", "rpush"), 1);
        assert_eq!(m.counter(SLOW_WRITE_100MS_CNT, "other", "lpush"), 0);
    }

    #[test]
    fn mem_meter_records_observations() {
        let m = MemMeter::new();
        m.observe(COLLECTION_LEN_DIST, "t", 2048.0);
        m.observe(COLLECTION_LEN_DIST, "t", 4096.0);

        assert_eq!(m.observations(COLLECTION_LEN_DIST, "t"), vec![2048.0, 4096.0]);
        assert!(m.observations(COLLECTION_LEN_DIST, "other").is_empty());
    }
}
