//! reef-limiter: adaptive slow-write limiter.
//!
//! Protects a replicated command pipeline from repeat-offender slow
//! operations. Completion costs feed per-(command, table) histograms at
//! the 10/50/100 ms thresholds; once the shared slow counter passes the
//! small threshold, commands whose history predicts another slow apply
//! are refused. Recovery is half-open: after a quiet window a probe is
//! let through, and the decay loop walks the counter back to zero,
//! clearing the histograms when the limiter leaves the slow state.
//!
//! Admission (`can_pass`) and recording are lock-light: the counter,
//! timestamps, and knobs are atomics; only the histogram maps sit
//! behind a read-write lock.

mod conf;
mod decay;

pub use conf::{
    ConfBus, CONF_SLOW_LIMITER_HALF_OPEN_SEC, CONF_SLOW_LIMITER_REFUSE_COST_MS,
    CONF_SLOW_LIMITER_SWITCH,
};

use parking_lot::{Mutex, RwLock};
use reef_observe::{
    Meter, SLOW_LIMITER_REFUSED_CNT, SLOW_WRITE_100MS_CNT, SLOW_WRITE_10MS_CNT,
    SLOW_WRITE_50MS_CNT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// The write was refused because its history predicts another slow
/// apply. Callers should map this to a client-visible "try again later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("refused by slow limiter")]
pub struct RefusedBySlowLimiter;

pub const MAX_SLOW_THRESHOLD: i64 = 300;
pub const HEAVY_SLOW_THRESHOLD: i64 = 250;
pub const MID_SLOW_THRESHOLD: i64 = 60;
pub const SMALL_SLOW_THRESHOLD: i64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Whether admission control starts enabled.
    pub enabled: bool,

    /// Cost at which a completion counts as slow unconditionally, in
    /// milliseconds.
    pub refuse_cost_ms: i64,

    /// Quiet window after the last recorded slow write before a probe
    /// is allowed, in seconds.
    pub half_open_sec: i64,

    /// Decay tick interval. Tests shorten this.
    pub check_interval: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refuse_cost_ms: 600,
            half_open_sec: 15,
            check_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Default)]
pub(crate) struct SlowHists {
    pub(crate) slow100: HashMap<String, i64>,
    pub(crate) slow50: HashMap<String, i64>,
    pub(crate) slow10: HashMap<String, i64>,
}

pub(crate) struct Shared {
    pub(crate) slow_counter: AtomicI64,
    pub(crate) last_slow_ts: AtomicI64,
    pub(crate) on: AtomicBool,
    pub(crate) refuse_cost_ms: AtomicI64,
    pub(crate) half_open_sec: AtomicI64,
    pub(crate) hists: RwLock<SlowHists>,
    pub(crate) meter: Arc<dyn Meter>,
}

impl Shared {
    pub(crate) fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Drops all recorded history. Only meaningful while the limiter is
    /// on; a disabled limiter keeps whatever it had.
    pub(crate) fn clear_slows(&self) {
        if !self.is_on() {
            return;
        }
        let mut hists = self.hists.write();
        if !hists.slow100.is_empty() {
            hists.slow100.clear();
        }
        if !hists.slow50.is_empty() {
            hists.slow50.clear();
        }
        if !hists.slow10.is_empty() {
            hists.slow10.clear();
        }
    }
}

fn feat_key(cmd: &str, table: &str) -> String {
    format!("{cmd} {table}")
}

pub struct SlowLimiter {
    shared: Arc<Shared>,
    check_interval: Duration,
    shutdown: Mutex<Option<Arc<Notify>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SlowLimiter {
    pub fn new(cfg: LimiterConfig, meter: Arc<dyn Meter>) -> Self {
        Self {
            shared: Arc::new(Shared {
                slow_counter: AtomicI64::new(0),
                last_slow_ts: AtomicI64::new(0),
                on: AtomicBool::new(cfg.enabled),
                refuse_cost_ms: AtomicI64::new(cfg.refuse_cost_ms),
                half_open_sec: AtomicI64::new(cfg.half_open_sec),
                hists: RwLock::new(SlowHists::default()),
                meter,
            }),
            check_interval: cfg.check_interval,
            shutdown: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Spawns the decay loop. Idempotent while running.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }
        let shutdown = Arc::new(Notify::new());
        *self.shutdown.lock() = Some(shutdown.clone());
        *task = Some(tokio::spawn(decay::decay_loop(
            self.shared.clone(),
            self.check_interval,
            shutdown,
        )));
    }

    /// Signals the decay loop and waits for it to exit.
    pub async fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().take() {
            shutdown.notify_one();
        }
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Subscribes the limiter's knobs to the config bus.
    pub fn register_conf_changed(&self, bus: &ConfBus) {
        let shared = self.shared.clone();
        bus.register(CONF_SLOW_LIMITER_SWITCH, move |v| {
            shared.on.store(v > 0, Ordering::SeqCst);
        });
        let shared = self.shared.clone();
        bus.register(CONF_SLOW_LIMITER_REFUSE_COST_MS, move |v| {
            shared.refuse_cost_ms.store(v, Ordering::SeqCst);
        });
        let shared = self.shared.clone();
        bus.register(CONF_SLOW_LIMITER_HALF_OPEN_SEC, move |v| {
            shared.half_open_sec.store(v, Ordering::SeqCst);
        });
    }

    pub fn turn_on(&self) {
        self.shared.on.store(true, Ordering::SeqCst);
    }

    pub fn turn_off(&self) {
        self.shared.on.store(false, Ordering::SeqCst);
    }

    pub fn is_on(&self) -> bool {
        self.shared.is_on()
    }

    pub fn slow_counter(&self) -> i64 {
        self.shared.slow_counter.load(Ordering::SeqCst)
    }

    pub fn last_slow_ts(&self) -> i64 {
        self.shared.last_slow_ts.load(Ordering::SeqCst)
    }

    /// Jams the counter to the ceiling and refreshes the slow
    /// timestamp. For out-of-band pressure signals.
    pub fn mark_heavy_slow(&self, ts: i64) {
        self.shared
            .slow_counter
            .store(MAX_SLOW_THRESHOLD, Ordering::SeqCst);
        self.shared.last_slow_ts.store(ts, Ordering::SeqCst);
    }

    /// Records a slow write at `ts`: refreshes the slow timestamp and
    /// bumps the counter up to its cap.
    pub fn add_slow(&self, ts: i64) {
        self.shared.last_slow_ts.store(ts, Ordering::SeqCst);
        self.add_counter_only();
    }

    fn add_counter_only(&self) {
        let cnt = self.shared.slow_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if cnt > MAX_SLOW_THRESHOLD {
            self.shared.slow_counter.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Admission check for a command against a table.
    ///
    /// Refused commands still charge the counter (letting them through
    /// would have slowed the apply loop just the same) but do not
    /// refresh the slow timestamp, so the state can drain during a
    /// half-open window.
    pub fn can_pass(&self, ts: i64, cmd: &str, table: &str) -> bool {
        if table.is_empty() {
            return true;
        }
        if !self.is_on() {
            return true;
        }
        let sc = self.shared.slow_counter.load(Ordering::SeqCst);
        if sc < SMALL_SLOW_THRESHOLD {
            return true;
        }
        let half_open_ns = self
            .shared
            .half_open_sec
            .load(Ordering::SeqCst)
            .saturating_mul(1_000_000_000);
        if ts > self.shared.last_slow_ts.load(Ordering::SeqCst) + half_open_ns {
            return true;
        }
        let (slow, _) = self.is_history_slow(cmd, table, sc, false);
        if slow {
            self.add_counter_only();
            self.shared
                .meter
                .incr(SLOW_LIMITER_REFUSED_CNT, table, cmd);
            return false;
        }
        true
    }

    /// Whether history says this feature will be slow again. The second
    /// flag reports that the verdict came from the 50/10 ms buckets
    /// rather than outright slowness.
    fn is_history_slow(&self, cmd: &str, table: &str, sc: i64, ignore_10ms: bool) -> (bool, bool) {
        let feat = feat_key(cmd, table);
        let hists = self.shared.hists.read();
        if hists.slow100.get(&feat).copied().unwrap_or(0) > 2 {
            return (true, false);
        }
        if sc >= MID_SLOW_THRESHOLD && hists.slow50.get(&feat).copied().unwrap_or(0) > 4 {
            return (true, true);
        }
        if !ignore_10ms
            && sc >= HEAVY_SLOW_THRESHOLD
            && hists.slow10.get(&feat).copied().unwrap_or(0) > 20
        {
            return (true, true);
        }
        (false, false)
    }

    /// Buckets a completed command at the highest threshold its cost
    /// exceeded and, while the limiter is already in a slow state,
    /// remembers the feature in the matching histogram.
    pub fn record_slow_cmd(&self, cmd: &str, table: &str, cost: Duration) {
        if table.is_empty() || cmd.is_empty() {
            return;
        }
        let kind = if cost >= Duration::from_millis(100) {
            self.shared.meter.incr(SLOW_WRITE_100MS_CNT, table, cmd);
            100
        } else if cost >= Duration::from_millis(50) {
            self.shared.meter.incr(SLOW_WRITE_50MS_CNT, table, cmd);
            50
        } else if cost >= Duration::from_millis(10) {
            self.shared.meter.incr(SLOW_WRITE_10MS_CNT, table, cmd);
            10
        } else {
            return;
        };
        if !self.is_on() {
            return;
        }
        if self.shared.slow_counter.load(Ordering::SeqCst) < SMALL_SLOW_THRESHOLD {
            return;
        }
        let feat = feat_key(cmd, table);
        let mut hists = self.shared.hists.write();
        let map = match kind {
            100 => &mut hists.slow100,
            50 => &mut hists.slow50,
            _ => &mut hists.slow10,
        };
        *map.entry(feat).or_insert(0) += 1;
    }

    /// Charges the limiter for a completed command if it was expensive
    /// enough: unconditionally past the refuse cost, or past 50 ms when
    /// the limiter is already slow and history agrees.
    pub fn maybe_add_slow(&self, ts: i64, cost: Duration, cmd: &str, table: &str) {
        let refuse_cost =
            Duration::from_millis(self.shared.refuse_cost_ms.load(Ordering::SeqCst).max(0) as u64);
        if cost < refuse_cost {
            if cost < Duration::from_millis(50) {
                return;
            }
            let sc = self.shared.slow_counter.load(Ordering::SeqCst);
            if sc < SMALL_SLOW_THRESHOLD {
                return;
            }
            let (slow, _) = self.is_history_slow(cmd, table, sc, true);
            if !slow {
                return;
            }
        }
        self.add_slow(ts);
    }
}
