use std::sync::Arc;

use ratewall::accountant::WindowAccountant;
use ratewall::rules::RateLimitRule;
use ratewall::store::fake::FakeStoreAdapter;

/// P2 (atomicity): concurrent admissions across any number of processes
/// against the same (rule, client) pair produce the same observable
/// admission count as any serial ordering. Modeled here as two independent
/// `WindowAccountant` "replicas" racing over one shared store: if the
/// accountant's prune-count-insert step were not atomic, the cap below
/// would be exceeded under contention.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_admissions_never_exceed_the_cap_across_replicas() {
    let store = Arc::new(FakeStoreAdapter::new());
    let replica_a = Arc::new(WindowAccountant::new(store.clone()));
    let replica_b = Arc::new(WindowAccountant::new(store.clone()));
    let rule = RateLimitRule { points: 10, duration: 60 };

    let mut handles = Vec::new();
    for i in 0..200u32 {
        let accountant = if i % 2 == 0 { replica_a.clone() } else { replica_b.clone() };
        handles.push(tokio::spawn(async move {
            let result = accountant
                .evaluate(0, "contended-client", rule, 1_000)
                .await
                .unwrap();
            result.count < rule.points as u64
        }));
    }

    let mut admitted = 0u32;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, rule.points, "exactly `points` admissions should win the race, never more");
}
