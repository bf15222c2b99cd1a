#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use actix_web::{test, web, App};
use ratewall::middleware::AdmissionMiddleware;
use ratewall::store::{fake::FakeStoreAdapter, StoreAdapter};

/// Scenario 7 (§8): `rateLimitConfig:appinvalid = {rules:[{points:-1,duration:0}]}`.
/// The first request fails validation and the middleware responds 503
/// without ever invoking the downstream handler or setting quota headers.
#[actix_web::test]
async fn invalid_rule_values_surface_as_service_unavailable() {
    let store = FakeStoreAdapter::new();
    common::seed_rules(&store, "appinvalid", r#"{"rules":[{"points":-1,"duration":0}]}"#);
    let store: Arc<dyn StoreAdapter> = Arc::new(store);

    let app = test::init_service(App::new().service(
        web::scope("/test/{applicationId}")
            .wrap(AdmissionMiddleware::new(store))
            .route("", web::get().to(common::downstream_ok)),
    ))
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/test/appInvalid").to_request()).await;
    assert_eq!(res.status(), 503);
    assert!(res.headers().get("X-RateLimit-Limit").is_none());
    assert_eq!(res.headers().get("Retry-After").unwrap(), "10");

    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"Service Unavailable: Rate limiter config error.");
}

/// A missing config (neither per-identifier nor default) is an operator
/// error, distinct from a malformed one: 500, not 503.
#[actix_web::test]
async fn missing_config_surfaces_as_internal_server_error() {
    let store = FakeStoreAdapter::new();
    let store: Arc<dyn StoreAdapter> = Arc::new(store);

    let app = test::init_service(App::new().service(
        web::scope("/test/{applicationId}")
            .wrap(AdmissionMiddleware::new(store))
            .route("", web::get().to(common::downstream_ok)),
    ))
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/test/ghost").to_request()).await;
    assert_eq!(res.status(), 500);

    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"Rate limit config not found.");
}
