//! Store Adapter (§4.1): the only component that knows the shared store's
//! wire dialect. Everything above this trait speaks in plain strings and
//! script results, never in `redis`-crate types.

use async_trait::async_trait;

use crate::core::error::AppError;

/// Script result values the accountant's atomic script can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Int(i64),
    Array(Vec<ScriptValue>),
}

impl ScriptValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScriptValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ScriptValue]> {
        match self {
            ScriptValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Thin contract over the shared key-value store (§4.1). Implementations
/// hide connection pooling and transport-level retry; any transport,
/// timeout, or protocol failure surfaces as `AppError::Store`.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Read a single string value. `Ok(None)` means the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Evaluate a server-side script atomically against the store.
    async fn evaluate_script(
        &self,
        script: &str,
        keys: &[&str],
        args: &[String],
    ) -> Result<ScriptValue, AppError>;

    /// Liveness probe used by the readiness collaborator.
    async fn ping(&self) -> Result<(), AppError>;

    /// Release resources during process teardown. A no-op for adapters
    /// whose connection is reclaimed on drop.
    async fn close(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub mod redis_adapter;
pub mod fake;

pub use redis_adapter::RedisStoreAdapter;
