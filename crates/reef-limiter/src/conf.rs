//! Dynamic configuration: integer knobs that change at runtime.
//!
//! A [`ConfBus`] fans integer updates out to registered handlers. The
//! limiter subscribes its knobs as atomics, so the admission hot path
//! never takes a lock to read them.

use parking_lot::RwLock;
use std::collections::HashMap;

pub const CONF_SLOW_LIMITER_SWITCH: &str = "slow_limiter_switch";
pub const CONF_SLOW_LIMITER_REFUSE_COST_MS: &str = "slow_limiter_refuse_cost_ms";
pub const CONF_SLOW_LIMITER_HALF_OPEN_SEC: &str = "slow_limiter_half_open_sec";

type ConfHandler = Box<dyn Fn(i64) + Send + Sync>;

#[derive(Default)]
pub struct ConfBus {
    handlers: RwLock<HashMap<&'static str, Vec<ConfHandler>>>,
}

impl ConfBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: &'static str, handler: impl Fn(i64) + Send + Sync + 'static) {
        self.handlers
            .write()
            .entry(key)
            .or_default()
            .push(Box::new(handler));
    }

    /// Publishes a new value; every handler registered for `key` runs
    /// synchronously.
    pub fn set(&self, key: &'static str, value: i64) {
        let handlers = self.handlers.read();
        if let Some(list) = handlers.get(key) {
            for handler in list {
                handler(value);
            }
        }
    }
}
