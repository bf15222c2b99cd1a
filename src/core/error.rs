/// Application-wide Result type
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Main application error type.
///
/// The resolver and accountant kinds (`ConfigMissing`, `ConfigMalformed`,
/// `ConfigInvalid`, `Store`) share this single taxonomy with the rest of the
/// binary rather than living in a separate error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Neither a per-identifier nor a default rate limit config exists in the store.
    #[error("rate limit config not found: {0}")]
    ConfigMissing(String),

    /// The config record exists but does not parse as `{ rules: [...] }`.
    #[error("rate limit config malformed: {0}")]
    ConfigMalformed(String),

    /// The config record parsed but failed validation (empty rules, non-positive points/duration).
    #[error("rate limit config invalid: {0}")]
    ConfigInvalid(String),

    /// Any transport, timeout, or protocol error from the shared store.
    #[error("store error: {0}")]
    Store(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn store(msg: impl Into<String>) -> Self {
        AppError::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Store(err.to_string())
    }
}

// No `ResponseError` impl: nothing in this binary returns `Result<_, AppError>`
// through actix's error-handling machinery. The admission middleware (the
// only place an `AppError` becomes an HTTP response) needs the resolver-vs-
// accountant phase distinction from §7, which this enum alone can't carry.
// See `resolver_error_response`/`accountant_error_response` in
// `middleware::admission`, which render phase-correct bodies directly.
