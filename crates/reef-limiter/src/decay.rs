//! The decay loop: every tick, walk the slow counter back toward zero
//! (faster from heavier states, so low-cost writes stop being refused
//! sooner) and clear the histograms once the limiter crosses back
//! below the small threshold.

use crate::{Shared, HEAVY_SLOW_THRESHOLD, MID_SLOW_THRESHOLD, SMALL_SLOW_THRESHOLD};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub(crate) async fn decay_loop(shared: Arc<Shared>, interval: Duration, shutdown: Arc<Notify>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // the first tick completes immediately
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => decay_once(&shared),
            _ = shutdown.notified() => return,
        }
    }
}

pub(crate) fn decay_once(shared: &Shared) {
    let old = shared.slow_counter.load(Ordering::SeqCst);
    tracing::debug!(
        slow_counter = old,
        last_slow_ts = shared.last_slow_ts.load(Ordering::SeqCst),
        "slow counter decay tick"
    );
    let decr = if old >= HEAVY_SLOW_THRESHOLD {
        10
    } else if old >= MID_SLOW_THRESHOLD {
        2
    } else {
        1
    };
    let n = shared.slow_counter.fetch_sub(decr, Ordering::SeqCst) - decr;
    if old >= SMALL_SLOW_THRESHOLD && n < SMALL_SLOW_THRESHOLD {
        tracing::info!(
            from = old,
            to = n,
            last_slow_ts = shared.last_slow_ts.load(Ordering::SeqCst),
            "limiter left the slow state, clearing slow history"
        );
        shared.clear_slows();
    }
    if n < 0 {
        shared.slow_counter.fetch_add(decr, Ordering::SeqCst);
    }
}
