//! Admission Middleware (§4.4): per-request orchestration tying the
//! Resolver and Accountant together into one admit/reject decision and the
//! four quota-state response headers.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    http::StatusCode,
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;

use crate::accountant::WindowAccountant;
use crate::core::error::AppError;
use crate::middleware::MetricsCollector;
use crate::resolver::{normalize_identifier, RuleSetResolver};
use crate::rules::RuleSet;
use crate::store::StoreAdapter;

/// Aggregated outcome of evaluating every rule in a `RuleSet` for one request.
struct Decision {
    blocked: bool,
    strictest_rule_index: usize,
    strictest_remaining: i64,
    strictest_reset_sec: i64,
}

impl Decision {
    fn new() -> Self {
        Self {
            blocked: false,
            strictest_rule_index: 0,
            strictest_remaining: i64::MAX,
            strictest_reset_sec: 0,
        }
    }
}

/// Evaluates every rule in `rules` against `client_key` at `now_ms`,
/// implementing steps 4-5 of §4.4.
async fn evaluate_rules(
    accountant: &WindowAccountant,
    rules: &RuleSet,
    client_key: &str,
    now_ms: i64,
) -> Result<Decision, AppError> {
    let mut decision = Decision::new();

    for (i, rule) in rules.rules().iter().enumerate() {
        let result = accountant.evaluate(i, client_key, *rule, now_ms).await?;

        if result.count >= rule.points as u64 {
            decision.blocked = true;
            let reset_sec = ceil_div(
                result.oldest_ms + rule.duration_ms() - now_ms,
                1000,
            )
            .max(0);
            if reset_sec > decision.strictest_reset_sec {
                decision.strictest_reset_sec = reset_sec;
                decision.strictest_rule_index = i;
            }
            decision.strictest_remaining = 0;
        } else {
            let remaining = rule.points as i64 - result.count as i64 - 1;
            if remaining < decision.strictest_remaining {
                decision.strictest_remaining = remaining;
                decision.strictest_rule_index = i;
                decision.strictest_reset_sec = rule.duration as i64;
            }
        }
    }

    Ok(decision)
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1).div_euclid(denominator)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as i64
}

fn client_key(remote_addr: &str, identifier: &str) -> String {
    format!("{remote_addr}:{}", normalize_identifier(identifier))
}

fn quota_headers(rules: &RuleSet, decision: &Decision, now_ms: i64) -> Vec<(HeaderName, HeaderValue)> {
    let limit = rules[decision.strictest_rule_index].points;
    let remaining = decision.strictest_remaining.max(0);
    let reset_at_ms = now_ms + decision.strictest_reset_sec * 1000;

    vec![
        (HeaderName::from_static("x-ratelimit-limit"), header_value(limit)),
        (
            HeaderName::from_static("x-ratelimit-remaining"),
            header_value(remaining),
        ),
        (
            HeaderName::from_static("x-ratelimit-reset"),
            header_value(reset_at_ms),
        ),
        (
            HeaderName::from_static("retry-after"),
            header_value(decision.strictest_reset_sec),
        ),
    ]
}

fn header_value(n: impl std::fmt::Display) -> HeaderValue {
    HeaderValue::from_str(&n.to_string()).expect("decimal string is always a valid header value")
}

const HEADER_RETRY_AFTER: &str = "Retry-After";

/// §4.4 step 3: resolver-phase failure response. `ConfigMissing` is an
/// operator error (500); every other resolver failure, including a store
/// error observed during resolution, is a transient 503.
fn resolver_error_response(err: &AppError) -> HttpResponse {
    tracing::warn!(error = %err, "rate limit config resolution failed");
    match err {
        AppError::ConfigMissing(_) => {
            HttpResponse::InternalServerError().body("Rate limit config not found.")
        }
        _ => HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header((HEADER_RETRY_AFTER, "10"))
            .body("Service Unavailable: Rate limiter config error."),
    }
}

/// §4.4 step 5a: accounting-phase failure response. Only store errors reach
/// here; the accountant never returns `Config*` variants.
fn accountant_error_response(err: &AppError) -> HttpResponse {
    tracing::error!(error = %err, "rate limit backend error");
    HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
        .insert_header((HEADER_RETRY_AFTER, "10"))
        .body("Service Unavailable: Rate limiter backend error.")
}

/// actix-web `Transform` wiring the resolver + accountant into the request
/// pipeline. Attach with `.wrap(AdmissionMiddleware::new(store))` on a scope
/// whose routes carry an `{applicationId}` path parameter.
pub struct AdmissionMiddleware {
    resolver: Arc<RuleSetResolver>,
    accountant: Arc<WindowAccountant>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AdmissionMiddleware {
    pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
        Self {
            resolver: Arc::new(RuleSetResolver::new(store.clone())),
            accountant: Arc::new(WindowAccountant::new(store)),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdmissionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdmissionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionMiddlewareService {
            service: Rc::new(service),
            resolver: self.resolver.clone(),
            accountant: self.accountant.clone(),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct AdmissionMiddlewareService<S> {
    service: Rc<S>,
    resolver: Arc<RuleSetResolver>,
    accountant: Arc<WindowAccountant>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let resolver = self.resolver.clone();
        let accountant = self.accountant.clone();
        let metrics = self.metrics.clone();

        Box::pin(async move {
            let now_ms = now_millis();

            let identifier = req
                .match_info()
                .get("applicationId")
                .unwrap_or_default()
                .to_string();
            let remote_addr = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();
            let key = client_key(&remote_addr, &identifier);

            let rules = match resolver.resolve(&identifier).await {
                Ok(rules) => rules,
                Err(err) => {
                    if let Some(m) = &metrics {
                        m.record_rate_limit_config_error();
                    }
                    let response = resolver_error_response(&err);
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let decision = match evaluate_rules(&accountant, &rules, &key, now_ms).await {
                Ok(decision) => decision,
                Err(err) => {
                    if let Some(m) = &metrics {
                        m.record_rate_limit_backend_error();
                    }
                    let response = accountant_error_response(&err);
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let headers = quota_headers(&rules, &decision, now_ms);

            if decision.blocked {
                if let Some(m) = &metrics {
                    m.record_rate_limit_rejection();
                }
                let mut response = HttpResponse::TooManyRequests().body("Too Many Requests");
                for (name, value) in headers {
                    response.headers_mut().insert(name, value);
                }
                return Ok(req.into_response(response).map_into_right_body());
            }

            if let Some(m) = &metrics {
                m.record_rate_limit_admission();
            }

            let mut res = service.call(req).await?;
            for (name, value) in headers {
                res.headers_mut().insert(name, value);
            }
            Ok(res.map_into_left_body())
        })
    }
}
