use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

mod config;
mod database;
mod handlers;
mod models;
mod services;
mod spreadsheet;
mod utils;

use crate::config::Settings;
use database::{DbPool, Repository};
use services::{
    FieldService, ImportService, RecordService, SchemaFilter, StockEntryService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,crm_api_server=debug".to_string()),
        )
        .with_target(true)
        .json()
        .init();

    info!("🚀 Starting CRM API Server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    // Initialize database pool
    let db_pool = DbPool::new(&settings.database).await?;
    info!("✅ Database connection established");

    // Repository backs both the record store and the field configuration store
    let repository = Arc::new(Repository::new(db_pool));

    // Initialize services
    let field_service = Arc::new(FieldService::new(repository.clone()));
    let schema_filter = SchemaFilter::new(repository.clone());
    let record_service = Arc::new(RecordService::new(repository.clone(), schema_filter));
    let import_service = Arc::new(ImportService::new(
        repository.clone(),
        repository.clone(),
        settings.import.batch_size,
    ));
    let stock_service = Arc::new(StockEntryService::new(repository.clone()));

    // Build router
    let app = build_router(
        repository,
        field_service,
        record_service,
        import_service,
        stock_service,
        settings.import.max_upload_mb,
    );

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(
    repository: Arc<Repository>,
    field_service: Arc<FieldService>,
    record_service: Arc<RecordService>,
    import_service: Arc<ImportService>,
    stock_service: Arc<StockEntryService>,
    max_upload_mb: usize,
) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check));

    let api_routes = Router::new()
        // Field configuration
        .route(
            "/api/admin/fields/seed",
            post(handlers::fields::seed_fields_handler),
        )
        .route(
            "/api/admin/fields/{record_type}",
            get(handlers::fields::list_fields_handler)
                .post(handlers::fields::upsert_field_handler)
                .delete(handlers::fields::delete_field_handler),
        )
        .route(
            "/api/admin/fields/{record_type}/bulk",
            put(handlers::fields::bulk_update_fields_handler),
        )
        // Record CRUD
        .route(
            "/api/records/{record_type}",
            get(handlers::records::list_records_handler)
                .post(handlers::records::create_record_handler),
        )
        .route(
            "/api/records/{record_type}/{id}",
            get(handlers::records::get_record_handler)
                .put(handlers::records::update_record_handler)
                .delete(handlers::records::delete_record_handler),
        )
        // Bulk exchange
        .route(
            "/api/records/{record_type}/import",
            post(handlers::import::import_handler),
        )
        .route(
            "/api/records/{record_type}/template",
            get(handlers::import::template_handler),
        )
        .route(
            "/api/records/{record_type}/export",
            get(handlers::import::export_handler),
        )
        // Stock entries (composite header + lines)
        .route(
            "/api/stock-entries",
            get(handlers::stock_entries::list_stock_entries_handler)
                .post(handlers::stock_entries::create_stock_entry_handler),
        );

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(Extension(repository))
        .layer(Extension(field_service))
        .layer(Extension(record_service))
        .layer(Extension(import_service))
        .layer(Extension(stock_service))
        // CORS
        .layer(
            CorsLayer::permissive()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        // Body limit for spreadsheet uploads
        .layer(DefaultBodyLimit::max(max_upload_mb * 1024 * 1024))
}
