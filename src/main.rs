use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratewall::config::server::ServerConfig;
use ratewall::config::Config;
use ratewall::health;
use ratewall::middleware::{
    AdmissionMiddleware, ErrorHandler, MetricsCollector, MetricsMiddleware, RequestId,
};
use ratewall::store::{RedisStoreAdapter, StoreAdapter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ratewall=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("failed to load configuration");
    let server_config = ServerConfig::new(config.app_host.clone(), config.app_port);

    tracing::info!(env = %config.app_env, "starting ratewall");
    tracing::info!(address = %server_config.bind_address(), "binding server");

    let store: Arc<dyn StoreAdapter> = Arc::new(
        RedisStoreAdapter::connect(&config.redis_url)
            .await
            .expect("failed to connect to the shared store"),
    );

    let metrics = Arc::new(MetricsCollector::new());

    let bind_address = server_config.bind_address();
    let workers = server_config.workers;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(ErrorHandler)
            .wrap(RequestId)
            .wrap(MetricsMiddleware::new((*metrics).clone()))
            .app_data(web::Data::new(store.clone()))
            .route("/health", web::get().to(health::health))
            .route("/ready", web::get().to(health::ready))
            .route(
                "/metrics",
                web::get().to({
                    let metrics = metrics.clone();
                    move || {
                        let metrics = metrics.clone();
                        async move { HttpResponse::Ok().json(metrics.get_metrics()) }
                    }
                }),
            )
            .service(
                web::scope("/test/{applicationId}")
                    .wrap(AdmissionMiddleware::new(store.clone()).with_metrics(metrics.clone()))
                    .route("", web::get().to(downstream_ok)),
            )
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!(address = %bind_address, "server started");

    server.await
}

/// Stand-in downstream handler: the admission core has no opinion on what
/// lives behind it, so the demo route simply echoes success.
async fn downstream_ok() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}
