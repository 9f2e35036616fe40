use axum::{routing::get, Router};
use bakery_sales::{api, AppConfig, CsvDirSource, ReportService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    let source = CsvDirSource::new(&config.source.data_dir);
    let service = Arc::new(ReportService::new(source));

    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/report", get(api::report))
        .route("/api/products", get(api::products))
        .route("/api/pickup-dates", get(api::pickup_dates))
        .route("/api/date-range", get(api::date_range))
        .with_state(service)
        .layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET /health           - health check");
    info!("  GET /api/report       - sales report (format=json|csv|document|product_day)");
    info!("  GET /api/products     - distinct product names");
    info!("  GET /api/pickup-dates - distinct pickup dates");
    info!("  GET /api/date-range   - min/max order date");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
