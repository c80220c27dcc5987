//! Folia credit metering server
//!
//! HTTP backend for the clinical records credit ledger: per-professional
//! balances, the session reservation lifecycle, administrator top-ups under
//! a shared monthly quota, and folio number issuance.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use folia_api::handlers::{configure_adjustments, configure_credits, configure_folios};
use folia_api::AppState;
use folia_core::config::AppConfig;
use folia_services::{AdjustmentService, CreditService, FolioSequence, UserLocks};
use folia_store::{
    FileBackend, PersistentAdjustmentLog, PersistentBalanceStore, PersistentFolioCounters,
    PersistentTransactionLedger,
};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "folia",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Configure API routes
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_credits)
            .configure(configure_adjustments)
            .configure(configure_folios),
    );
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "folia={},folia_api={},folia_services={},folia_store={},actix_web=info",
            log_level, log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting Folia v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().unwrap_or_else(|e| {
        panic!("Failed to load configuration: {}", e);
    });

    info!("Persisting collections under {}", config.storage.data_dir);
    let backend = Arc::new(
        FileBackend::new(&config.storage.data_dir)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );

    // Persisted collections
    let balances = Arc::new(PersistentBalanceStore::new(
        backend.clone(),
        config.credits.clone(),
    ));
    let ledger = Arc::new(PersistentTransactionLedger::new(backend.clone()));
    let adjustment_log = Arc::new(PersistentAdjustmentLog::new(
        backend.clone(),
        config.credits.adjustment_log_max_entries,
    ));
    let counters = Arc::new(PersistentFolioCounters::new(backend));

    // One lock registry shared by every service that mutates balances
    let locks = Arc::new(UserLocks::new());

    let state = AppState::new(
        Arc::new(CreditService::new(
            balances.clone(),
            ledger.clone(),
            locks.clone(),
            config.credits.clone(),
        )),
        Arc::new(AdjustmentService::new(
            balances,
            ledger,
            adjustment_log,
            locks,
            config.credits.clone(),
        )),
        Arc::new(FolioSequence::new(counters)),
    );

    let cors_origins = env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message
                    })),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
