//! Shared scaffolding for the integration tests: a stand-in downstream
//! handler and a config-seeding helper, reused across test files that each
//! build their own `actix_web::test::init_service` app wrapping the
//! Admission Middleware over a `FakeStoreAdapter`.

use actix_web::HttpResponse;
use ratewall::store::fake::FakeStoreAdapter;

pub async fn downstream_ok() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Seeds `store` with a rule set for `identifier` under the config key the
/// resolver expects.
pub fn seed_rules(store: &FakeStoreAdapter, identifier: &str, rules_json: &str) {
    store.set_config(format!("rateLimitConfig:{identifier}"), rules_json);
}
