#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use actix_web::{test, web, App};
use ratewall::middleware::AdmissionMiddleware;
use ratewall::store::{fake::FakeStoreAdapter, StoreAdapter};

/// Scenario 5 (§8): two independent middleware instances ("replicas") share
/// one store. Neither instance keeps any in-process state of its own — the
/// window log lives entirely in the shared store — so admissions against
/// one replica are visible to the other.
#[actix_web::test]
async fn two_replicas_sharing_one_store_enforce_a_single_shared_cap() {
    let fake = FakeStoreAdapter::new();
    common::seed_rules(&fake, "app1", r#"{"rules":[{"points":5,"duration":60}]}"#);
    let store: Arc<dyn StoreAdapter> = Arc::new(fake);

    let instance_a = test::init_service(App::new().service(
        web::scope("/test/{applicationId}")
            .wrap(AdmissionMiddleware::new(store.clone()))
            .route("", web::get().to(common::downstream_ok)),
    ))
    .await;
    let instance_b = test::init_service(App::new().service(
        web::scope("/test/{applicationId}")
            .wrap(AdmissionMiddleware::new(store.clone()))
            .route("", web::get().to(common::downstream_ok)),
    ))
    .await;

    for _ in 0..3 {
        let res =
            test::call_service(&instance_a, test::TestRequest::get().uri("/test/app1").to_request()).await;
        assert_eq!(res.status(), 200);
    }
    for _ in 0..2 {
        let res =
            test::call_service(&instance_b, test::TestRequest::get().uri("/test/app1").to_request()).await;
        assert_eq!(res.status(), 200);
    }

    // The cap (5) is now exhausted across both replicas combined; the very
    // next request to either one is rejected.
    let next_on_a =
        test::call_service(&instance_a, test::TestRequest::get().uri("/test/app1").to_request()).await;
    assert_eq!(next_on_a.status(), 429);

    let next_on_b =
        test::call_service(&instance_b, test::TestRequest::get().uri("/test/app1").to_request()).await;
    assert_eq!(next_on_b.status(), 429);
}
