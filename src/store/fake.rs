//! In-process fake Store Adapter for deterministic unit and property tests.
//!
//! Mirrors the shape of [`RedisStoreAdapter`](super::redis_adapter::RedisStoreAdapter)
//! but keeps everything in a `Mutex`-guarded map instead of talking to a real
//! store. It does not execute Lua: it knows the one atomic script the
//! accountant sends (prune/count/insert/expire, per §4.3) and performs the
//! equivalent operation directly, so the fake stays atomic the same way the
//! real script does — one exclusive critical section per call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ScriptValue, StoreAdapter};
use crate::core::error::AppError;

#[derive(Default)]
struct OrderedSet {
    // (score, member), kept sorted by score; expiry is not simulated since
    // tests control the clock explicitly and never outlive a single case.
    entries: Vec<(i64, String)>,
}

/// Fake store: a config map (set up directly by tests) plus the window
/// logs the accountant's script would otherwise maintain in Redis.
#[derive(Default)]
pub struct FakeStoreAdapter {
    configs: Mutex<HashMap<String, String>>,
    windows: Mutex<HashMap<String, OrderedSet>>,
    unreachable: Mutex<bool>,
}

impl FakeStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a config record as if written by the external seeder.
    pub fn set_config(&self, key: impl Into<String>, value: impl Into<String>) {
        self.configs.lock().unwrap().insert(key.into(), value.into());
    }

    /// Simulate the store becoming unreachable: every subsequent call fails
    /// with `AppError::Store`.
    pub fn break_connection(&self) {
        *self.unreachable.lock().unwrap() = true;
    }

    fn check_reachable(&self) -> Result<(), AppError> {
        if *self.unreachable.lock().unwrap() {
            return Err(AppError::store("fake store: connection severed"));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreAdapter for FakeStoreAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.check_reachable()?;
        Ok(self.configs.lock().unwrap().get(key).cloned())
    }

    async fn evaluate_script(
        &self,
        _script: &str,
        keys: &[&str],
        args: &[String],
    ) -> Result<ScriptValue, AppError> {
        self.check_reachable()?;

        let key = keys.first().copied().ok_or_else(|| {
            AppError::internal("evaluate_script called without a key")
        })?;
        let window_start: i64 = args[0].parse().map_err(|_| AppError::internal("bad window_start"))?;
        let points: i64 = args[1].parse().map_err(|_| AppError::internal("bad points"))?;
        let now: i64 = args[2].parse().map_err(|_| AppError::internal("bad now"))?;
        let member = args[3].clone();

        let mut windows = self.windows.lock().unwrap();
        let set = windows.entry(key.to_string()).or_default();

        set.entries.retain(|(score, _)| *score > window_start);

        let count = set.entries.len() as i64;
        if count < points {
            set.entries.push((now, member));
            set.entries.sort_by_key(|(score, _)| *score);
        }

        let oldest = set.entries.first().map(|(score, _)| *score).unwrap_or(now);

        Ok(ScriptValue::Array(vec![
            ScriptValue::Int(count),
            ScriptValue::Int(oldest),
        ]))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_reachable()
    }
}
