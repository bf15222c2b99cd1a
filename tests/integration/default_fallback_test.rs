#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use actix_web::{test, web, App};
use ratewall::middleware::AdmissionMiddleware;
use ratewall::store::{fake::FakeStoreAdapter, StoreAdapter};

/// Scenario 3 (§8): only `rateLimitConfig:default` exists. Three GETs to
/// `/test/123` (an identifier with no dedicated config) return 200, 200, 429,
/// governed by the default rule set.
#[actix_web::test]
async fn unconfigured_identifier_falls_back_to_default_rules() {
    let store = FakeStoreAdapter::new();
    common::seed_rules(&store, "default", r#"{"rules":[{"points":2,"duration":20}]}"#);
    let store: Arc<dyn StoreAdapter> = Arc::new(store);

    let app = test::init_service(App::new().service(
        web::scope("/test/{applicationId}")
            .wrap(AdmissionMiddleware::new(store))
            .route("", web::get().to(common::downstream_ok)),
    ))
    .await;

    let first = test::call_service(&app, test::TestRequest::get().uri("/test/123").to_request()).await;
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers().get("X-RateLimit-Limit").unwrap(), "2");
    assert_eq!(first.headers().get("X-RateLimit-Remaining").unwrap(), "1");

    let second = test::call_service(&app, test::TestRequest::get().uri("/test/123").to_request()).await;
    assert_eq!(second.status(), 200);

    let third = test::call_service(&app, test::TestRequest::get().uri("/test/123").to_request()).await;
    assert_eq!(third.status(), 429);
}
