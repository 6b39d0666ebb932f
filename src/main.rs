//! Lotkeeper backend server
//!
//! Parking-lot management backend: session lifecycle, tiered-rate billing,
//! incremental payment reconciliation, and discount application.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use lotkeeper_api::{configure_discounts, configure_parking, PgDiscountService, PgParkingService};
use lotkeeper_core::config::AppConfig;
use lotkeeper_db::{create_pool, PgDiscountRepository, PgRateRepository, PgVehicleRepository};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "lotkeeper",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Configure API routes
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Health check
            .route("/health", web::get().to(health_check))
            // Session lifecycle and listings
            .configure(configure_parking)
            // Discount endpoints
            .configure(configure_discounts),
    );
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lotkeeper={},lotkeeper_api={},lotkeeper_services={},lotkeeper_db={},actix_web=info,sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!("Starting lotkeeper backend v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to create database pool: {}", e);
            std::process::exit(1);
        });

    info!(
        "Database connection established with {} max connections",
        config.database.max_connections
    );

    // Wire repositories and services
    let rate_repo = Arc::new(PgRateRepository::new(pool.clone()));
    let vehicle_repo = Arc::new(PgVehicleRepository::new(pool.clone()));
    let discount_repo = Arc::new(PgDiscountRepository::new(pool.clone()));

    let parking_service = web::Data::new(PgParkingService::new(pool.clone(), rate_repo.clone()));
    let discount_service = web::Data::new(PgDiscountService::new(
        pool.clone(),
        vehicle_repo,
        discount_repo,
        rate_repo,
    ));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    // Create and run server
    HttpServer::new(move || {
        // Configure CORS - clone cors_origins for each worker
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
            // Shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(parking_service.clone())
            .app_data(discount_service.clone())
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
            // Middleware
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            // Configure routes
            .configure(configure_routes)
            // Root redirect to health
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
