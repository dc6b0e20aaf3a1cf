//! Limiter scenarios: admission, history-driven refusal, half-open
//! probes, and decay-loop recovery.

use reef_limiter::{
    LimiterConfig, SlowLimiter, HEAVY_SLOW_THRESHOLD, MID_SLOW_THRESHOLD, SMALL_SLOW_THRESHOLD,
};
use reef_observe::{
    MemMeter, NoopMeter, SLOW_LIMITER_REFUSED_CNT, SLOW_WRITE_100MS_CNT, SLOW_WRITE_10MS_CNT,
    SLOW_WRITE_50MS_CNT,
};
use std::sync::Arc;
use std::time::Duration;

const SEC: i64 = 1_000_000_000;

fn limiter() -> SlowLimiter {
    SlowLimiter::new(LimiterConfig::default(), Arc::new(NoopMeter))
}

fn pump_counter(sl: &SlowLimiter, ts: i64, n: i64) {
    for _ in 0..n {
        sl.add_slow(ts);
    }
}

#[test]
fn empty_table_always_passes() {
    let sl = limiter();
    sl.mark_heavy_slow(100);
    assert!(sl.can_pass(101, "lpush", ""));
}

#[test]
fn disabled_limiter_always_passes() {
    let sl = limiter();
    sl.mark_heavy_slow(100);
    sl.turn_off();
    assert!(sl.can_pass(101, "lpush", "t"));
}

#[test]
fn quiet_limiter_always_passes() {
    let sl = limiter();
    pump_counter(&sl, 100, SMALL_SLOW_THRESHOLD - 1);
    assert!(sl.can_pass(101, "lpush", "t"));
}

#[test]
fn slow_state_without_history_passes() {
    let sl = limiter();
    pump_counter(&sl, 100, SMALL_SLOW_THRESHOLD + 5);
    assert!(sl.can_pass(101, "lpush", "t"));
}

#[test]
fn repeated_100ms_history_refuses_and_counts() {
    let meter = Arc::new(MemMeter::new());
    let sl = SlowLimiter::new(LimiterConfig::default(), meter.clone());
    let ts = 1000 * SEC;

    pump_counter(&sl, ts, SMALL_SLOW_THRESHOLD);
    for _ in 0..3 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(150));
    }

    let before = sl.slow_counter();
    assert!(!sl.can_pass(ts + 1, "lpush", "t"));
    // the refusal itself charges the counter but not the timestamp
    assert_eq!(sl.slow_counter(), before + 1);
    assert_eq!(sl.last_slow_ts(), ts);
    assert_eq!(meter.counter(SLOW_LIMITER_REFUSED_CNT, "t", "lpush"), 1);

    // an innocent feature still passes
    assert!(sl.can_pass(ts + 1, "get", "t"));
    assert!(sl.can_pass(ts + 1, "lpush", "other"));
}

#[test]
fn mid_state_consults_the_50ms_bucket() {
    let sl = limiter();
    let ts = 1000 * SEC;

    pump_counter(&sl, ts, MID_SLOW_THRESHOLD);
    for _ in 0..5 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(60));
    }
    assert!(!sl.can_pass(ts + 1, "lpush", "t"));

    // below the mid threshold the 50 ms bucket is ignored
    let sl = limiter();
    pump_counter(&sl, ts, SMALL_SLOW_THRESHOLD);
    for _ in 0..5 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(60));
    }
    assert!(sl.can_pass(ts + 1, "lpush", "t"));
}

#[test]
fn heavy_state_consults_the_10ms_bucket() {
    let sl = limiter();
    let ts = 1000 * SEC;

    sl.mark_heavy_slow(ts);
    assert!(sl.slow_counter() >= HEAVY_SLOW_THRESHOLD);
    for _ in 0..21 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(15));
    }
    assert!(!sl.can_pass(ts + 1, "lpush", "t"));
}

#[test]
fn half_open_window_lets_a_probe_through() {
    let sl = limiter();
    let ts = 1000 * SEC;

    pump_counter(&sl, ts, SMALL_SLOW_THRESHOLD);
    for _ in 0..3 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(150));
    }
    assert!(!sl.can_pass(ts + 1, "lpush", "t"));
    assert!(sl.can_pass(ts + 16 * SEC, "lpush", "t"));
}

#[test]
fn recording_requires_the_slow_state() {
    let meter = Arc::new(MemMeter::new());
    let sl = SlowLimiter::new(LimiterConfig::default(), meter.clone());
    let ts = 1000 * SEC;

    // metrics are emitted regardless, history only once slow
    sl.record_slow_cmd("lpush", "t", Duration::from_millis(150));
    assert_eq!(meter.counter(SLOW_WRITE_100MS_CNT, "t", "lpush"), 1);
    sl.record_slow_cmd("lpush", "t", Duration::from_millis(60));
    assert_eq!(meter.counter(SLOW_WRITE_50MS_CNT, "t", "lpush"), 1);
    sl.record_slow_cmd("lpush", "t", Duration::from_millis(15));
    assert_eq!(meter.counter(SLOW_WRITE_10MS_CNT, "t", "lpush"), 1);
    sl.record_slow_cmd("lpush", "t", Duration::from_millis(5));
    assert_eq!(meter.counter(SLOW_WRITE_10MS_CNT, "t", "lpush"), 1);

    pump_counter(&sl, ts, SMALL_SLOW_THRESHOLD);
    for _ in 0..2 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(150));
    }
    // two in-state records plus the earlier pre-slow one would refuse if
    // the pre-slow record had been remembered; it was not
    assert!(sl.can_pass(ts + 1, "lpush", "t"));
    sl.record_slow_cmd("lpush", "t", Duration::from_millis(150));
    assert!(!sl.can_pass(ts + 1, "lpush", "t"));
}

#[test]
fn slow_pipeline_scenario() {
    let meter = Arc::new(MemMeter::new());
    let sl = SlowLimiter::new(LimiterConfig::default(), meter.clone());
    let cost = Duration::from_millis(700);
    let ts = 1000 * SEC;

    let mut refused = 0;
    for i in 0..25 {
        let now = ts + i;
        if sl.can_pass(now, "lpush", "t") {
            sl.record_slow_cmd("lpush", "t", cost);
            sl.maybe_add_slow(now, cost, "lpush", "t");
        } else {
            refused += 1;
        }
    }
    assert!(sl.slow_counter() > SMALL_SLOW_THRESHOLD);
    assert!(refused > 0);
    assert!(!sl.can_pass(ts + 26, "lpush", "t"));
    assert!(meter.counter(SLOW_LIMITER_REFUSED_CNT, "t", "lpush") > 0);

    // fifteen quiet seconds later the probe goes through
    assert!(sl.can_pass(ts + 16 * SEC, "lpush", "t"));
}

#[tokio::test]
async fn decay_loop_recovers_and_clears_history() {
    let cfg = LimiterConfig {
        check_interval: Duration::from_millis(20),
        ..LimiterConfig::default()
    };
    let sl = SlowLimiter::new(cfg, Arc::new(NoopMeter));
    let ts = 1000 * SEC;

    pump_counter(&sl, ts, 30);
    for _ in 0..3 {
        sl.record_slow_cmd("lpush", "t", Duration::from_millis(150));
    }
    assert!(!sl.can_pass(ts + 1, "lpush", "t"));

    sl.start();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sl.slow_counter() > 0 {
        assert!(tokio::time::Instant::now() < deadline, "counter never decayed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    sl.stop().await;

    // crossing below the small threshold dropped the history: pumping
    // the counter back up does not resurrect the old verdict
    pump_counter(&sl, ts, SMALL_SLOW_THRESHOLD);
    assert!(sl.can_pass(ts + 1, "lpush", "t"));
}

#[tokio::test]
async fn stop_is_safe_without_start() {
    let sl = limiter();
    sl.stop().await;

    sl.start();
    sl.start();
    sl.stop().await;
}
