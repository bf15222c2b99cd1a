//! Window Accountant (§4.3): the atomic prune-count-insert-expire primitive
//! for one (rule, client) pair.

use rand::Rng;
use std::sync::Arc;

use crate::core::error::AppError;
use crate::rules::RateLimitRule;
use crate::store::{ScriptValue, StoreAdapter};

/// The server-side script implementing steps 3-6 of §4.3 atomically.
///
/// KEYS[1] = "swl:<ruleIndex>:<clientKey>"
/// ARGV[1] = window_start (ms)   -- prune boundary, inclusive
/// ARGV[2] = points              -- admission cap
/// ARGV[3] = now (ms)            -- candidate score if admitted
/// ARGV[4] = member               -- unique member string for this candidate
/// ARGV[5] = expiry_seconds       -- duration + 1
///
/// Returns `{count, oldest}` where `count` is the PRE-admission cardinality
/// and `oldest` is the lowest surviving score after the (possible) insert,
/// or `now` if the set ended up empty.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local window_start = tonumber(ARGV[1])
local points = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local member = ARGV[4]
local expiry_seconds = tonumber(ARGV[5])

redis.call('ZREMRANGEBYSCORE', key, 0, window_start)

local count = redis.call('ZCARD', key)

if count < points then
    redis.call('ZADD', key, now, member)
    redis.call('EXPIRE', key, expiry_seconds)
end

local oldest_entry = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local oldest = now
if oldest_entry[2] ~= nil then
    oldest = tonumber(oldest_entry[2])
end

return {count, oldest}
"#;

/// Result of one accountant evaluation: the pre-admission count and the
/// oldest surviving timestamp in the window after pruning (and the possible
/// insert).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountantResult {
    pub count: u64,
    pub oldest_ms: i64,
}

/// Evaluates one (rule, client) pair against the shared store (§4.3).
pub struct WindowAccountant {
    store: Arc<dyn StoreAdapter>,
}

impl WindowAccountant {
    pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
        Self { store }
    }

    /// Atomically prune, count, and (if admitted) insert a candidate for
    /// `rule` at `rule_index`, scoped to `client_key`, observed at `now_ms`.
    pub async fn evaluate(
        &self,
        rule_index: usize,
        client_key: &str,
        rule: RateLimitRule,
        now_ms: i64,
    ) -> Result<AccountantResult, AppError> {
        let key = format!("swl:{rule_index}:{client_key}");
        let window_start = now_ms - rule.duration_ms();
        let member = unique_member(now_ms);
        let expiry_seconds = (rule.duration + 1).to_string();

        let args = vec![
            window_start.to_string(),
            rule.points.to_string(),
            now_ms.to_string(),
            member,
            expiry_seconds,
        ];

        let result = self
            .store
            .evaluate_script(SLIDING_WINDOW_SCRIPT, &[key.as_str()], &args)
            .await?;

        parse_result(&result)
    }
}

/// `"<timestamp>:<random>"` member identity (§9): collision-free across
/// concurrent inserts that share `now`.
fn unique_member(now_ms: i64) -> String {
    let salt: u64 = rand::thread_rng().gen();
    format!("{now_ms}:{salt:x}")
}

fn parse_result(value: &ScriptValue) -> Result<AccountantResult, AppError> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::internal("accountant script returned a non-array reply"))?;

    let count = items
        .first()
        .and_then(ScriptValue::as_int)
        .ok_or_else(|| AppError::internal("accountant script reply missing count"))?;
    let oldest_ms = items
        .get(1)
        .and_then(ScriptValue::as_int)
        .ok_or_else(|| AppError::internal("accountant script reply missing oldest"))?;

    Ok(AccountantResult {
        count: count.max(0) as u64,
        oldest_ms,
    })
}
