//! Liveness and readiness collaborators (§10 of the expanded spec): thin
//! HTTP handlers, not part of the admission core, that external
//! orchestrators poll to decide whether to route traffic to this process.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::store::StoreAdapter;

/// `GET /health` — process liveness. Always `200` once the server is
/// accepting connections; does not touch the store.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}

/// `GET /ready` — readiness. Pings the shared store; `503` if unreachable,
/// since the admission core cannot make correct decisions without it.
pub async fn ready(store: web::Data<Arc<dyn StoreAdapter>>) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "ready" })),
        Err(err) => {
            tracing::warn!(error = %err, "readiness probe failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "not_ready",
                "reason": "store unreachable",
            }))
        }
    }
}
