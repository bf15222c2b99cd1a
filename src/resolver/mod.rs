//! Rule-Set Resolver (§4.2): given an application identifier, produces the
//! ordered rule set to enforce, consulting a per-identifier key and falling
//! back to the default key.

use std::sync::Arc;

use crate::core::error::AppError;
use crate::rules::{parse_rule_set, RuleSet};
use crate::store::StoreAdapter;

const CONFIG_KEY_PREFIX: &str = "rateLimitConfig:";
const DEFAULT_IDENTIFIER: &str = "default";

/// Normalizes an application identifier per §3: lowercased, with an empty
/// or absent identifier mapped to the literal `"unknown"`.
pub fn normalize_identifier(raw: &str) -> String {
    if raw.is_empty() {
        DEFAULT_UNKNOWN.to_string()
    } else {
        raw.to_lowercase()
    }
}

const DEFAULT_UNKNOWN: &str = "unknown";

/// Resolves an `ApplicationIdentifier` to the `RuleSet` that governs it.
pub struct RuleSetResolver {
    store: Arc<dyn StoreAdapter>,
}

impl RuleSetResolver {
    pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
        Self { store }
    }

    /// §4.2 algorithm: normalize, read per-identifier then default, parse,
    /// validate. At most two store reads; never returns a partial rule set.
    pub async fn resolve(&self, identifier: &str) -> Result<RuleSet, AppError> {
        let normalized = normalize_identifier(identifier);
        let per_id_key = format!("{CONFIG_KEY_PREFIX}{normalized}");

        let raw = match self.store.get(&per_id_key).await? {
            Some(value) => value,
            None => {
                let default_key = format!("{CONFIG_KEY_PREFIX}{DEFAULT_IDENTIFIER}");
                self.store
                    .get(&default_key)
                    .await?
                    .ok_or_else(|| AppError::ConfigMissing(normalized.clone()))?
            }
        };

        parse_rule_set(&normalized, &raw)
    }
}
