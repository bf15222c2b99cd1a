use std::sync::Arc;

use ratewall::accountant::WindowAccountant;
use ratewall::rules::RateLimitRule;
use ratewall::store::fake::FakeStoreAdapter;

/// Scenario 2 (§8): config `[{points:5,duration:60}, {points:20,duration:300}]`
/// for `app1`. Twenty admissions at 12-second intervals all succeed (the
/// 60-second window holds at most 5 at once, but it slides every 12s so the
/// short rule never saturates); the twenty-first is rejected by the second
/// rule, which caps at 20 within five minutes. Driven directly against the
/// Accountant with an explicit clock since the scenario depends on a
/// precise, non-wall-clock cadence.
#[tokio::test]
async fn twenty_first_admission_is_rejected_by_the_longer_window() {
    let store = Arc::new(FakeStoreAdapter::new());
    let accountant = WindowAccountant::new(store);
    let rule_a = RateLimitRule { points: 5, duration: 60 };
    let rule_b = RateLimitRule { points: 20, duration: 300 };
    let client_key = "1.2.3.4:app1";

    let mut now_ms: i64 = 0;
    for i in 0..20 {
        let a = accountant.evaluate(0, client_key, rule_a, now_ms).await.unwrap();
        let b = accountant.evaluate(1, client_key, rule_b, now_ms).await.unwrap();
        assert!(a.count < rule_a.points as u64, "request {i} unexpectedly rejected by rule A");
        assert!(b.count < rule_b.points as u64, "request {i} unexpectedly rejected by rule B");
        now_ms += 12_000;
    }

    let a21 = accountant.evaluate(0, client_key, rule_a, now_ms).await.unwrap();
    let b21 = accountant.evaluate(1, client_key, rule_b, now_ms).await.unwrap();
    assert!(a21.count < rule_a.points as u64, "rule A's 60s window should have slid clear by now");
    assert!(b21.count >= rule_b.points as u64, "21st request should be rejected by the 300s cap");
}
