use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};

use super::{ScriptValue, StoreAdapter};
use crate::core::error::AppError;

/// Store Adapter backed by Redis (or a Redis-wire-compatible store).
///
/// Holds one long-lived, internally-multiplexed `ConnectionManager` shared
/// by every request; it is created once at process bootstrap and never
/// mutated afterwards (§5 resource policy).
#[derive(Clone)]
pub struct RedisStoreAdapter {
    conn: ConnectionManager,
}

impl RedisStoreAdapter {
    /// Connect to `redis_url` (e.g. `redis://:password@host:port/0`) and
    /// establish the shared connection manager.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url).map_err(AppError::from)?;
        let conn = ConnectionManager::new(client).await.map_err(AppError::from)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl StoreAdapter for RedisStoreAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(AppError::from)?;
        Ok(value)
    }

    async fn evaluate_script(
        &self,
        script: &str,
        keys: &[&str],
        args: &[String],
    ) -> Result<ScriptValue, AppError> {
        let mut conn = self.conn.clone();
        let mut invocation = Script::new(script).prepare_invoke();
        for key in keys {
            invocation.key(*key);
        }
        for arg in args {
            invocation.arg(arg);
        }

        let value: redis::Value = invocation.invoke_async(&mut conn).await.map_err(AppError::from)?;
        redis_value_to_script_value(value)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

fn redis_value_to_script_value(value: redis::Value) -> Result<ScriptValue, AppError> {
    match value {
        redis::Value::Int(n) => Ok(ScriptValue::Int(n)),
        redis::Value::Bulk(items) => {
            let converted = items
                .into_iter()
                .map(redis_value_to_script_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ScriptValue::Array(converted))
        }
        redis::Value::Data(bytes) => {
            // The accountant script only ever returns integers; a bulk
            // string here would mean the script body drifted from contract.
            let text = String::from_utf8_lossy(&bytes);
            text.parse::<i64>()
                .map(ScriptValue::Int)
                .map_err(|_| AppError::internal(format!("unexpected script reply: {text}")))
        }
        other => Err(AppError::internal(format!(
            "unexpected script reply shape: {other:?}"
        ))),
    }
}
