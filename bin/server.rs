// Sales by Price Band - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use log::{error, info};
use sales_bands::report::genre_label;
use sales_bands::{build_report, parse_period_bound, AppConfig, BandingConfig, PriceBandReport, SqliteStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<SqliteStore>>,
    banding: BandingConfig,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }

    fn err(status: StatusCode, message: impl Into<String>) -> Response {
        (
            status,
            Json(ApiResponse::<T> {
                success: false,
                data: None,
                error: Some(message.into()),
            }),
        )
            .into_response()
    }
}

/// Query string of /api/sales-by-price-band
#[derive(Deserialize)]
struct PriceBandQuery {
    start: String,
    end: String,
    rounding_unit: Option<i64>,
    max_num_bands: Option<i64>,
}

/// Aggregate row with the genre name resolved
#[derive(Serialize)]
struct PriceBandRowResponse {
    price_band: i64,
    from_price: i64,
    to_price: i64,
    genre_id: i64,
    genre: String,
    total_value: i64,
    total_volume: i64,
}

#[derive(Serialize)]
struct PriceBandResponse {
    start_date: String,
    end_date: String,
    rounding_unit: i64,
    max_num_bands: i64,
    max_price: Option<i64>,
    increment: i64,
    band_count: usize,
    sales_in_period: usize,
    excluded_sales: usize,
    total_value: i64,
    total_volume: i64,
    rows: Vec<PriceBandRowResponse>,
}

impl PriceBandResponse {
    fn from_report(report: PriceBandReport, genres: &std::collections::HashMap<i64, String>) -> Self {
        Self {
            start_date: report.start_date.to_string(),
            end_date: report.end_date.to_string(),
            rounding_unit: report.config.rounding_unit(),
            max_num_bands: report.config.max_num_bands(),
            max_price: report.max_price,
            increment: report.increment,
            band_count: report.bands.len(),
            sales_in_period: report.sales_in_period,
            excluded_sales: report.dropped_sales,
            total_value: report.total_value(),
            total_volume: report.total_volume(),
            rows: report
                .rows
                .into_iter()
                .map(|row| PriceBandRowResponse {
                    genre: genre_label(genres, row.genre_id),
                    price_band: row.price_band,
                    from_price: row.from_price,
                    to_price: row.to_price,
                    genre_id: row.genre_id,
                    total_value: row.total_value,
                    total_volume: row.total_volume,
                })
                .collect(),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// GET /api/sales-by-price-band?start=..&end=.. - Price band report
async fn sales_by_price_band(
    State(state): State<AppState>,
    Query(query): Query<PriceBandQuery>,
) -> Response {
    let bounds = parse_period_bound(&query.start, false)
        .and_then(|start| Ok((start, parse_period_bound(&query.end, true)?)));
    let (start, end) = match bounds {
        Ok(bounds) => bounds,
        Err(e) => return ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let banding = match state
        .banding
        .with_overrides(query.rounding_unit, query.max_num_bands)
    {
        Ok(banding) => banding,
        Err(e) => return ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let store = match state.store.lock() {
        Ok(store) => store,
        Err(_) => {
            return ApiResponse::<()>::err(StatusCode::INTERNAL_SERVER_ERROR, "store lock poisoned")
        }
    };

    let result = build_report(&*store, start, end, &banding)
        .map_err(anyhow::Error::from)
        .and_then(|report| Ok((report, store.genre_names()?)));

    match result {
        Ok((report, genres)) => ApiResponse::ok(PriceBandResponse::from_report(report, &genres)),
        Err(e) => {
            error!("Error computing price bands for {} to {}: {:#}", start, end, e);
            ApiResponse::<()>::err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🌐 Sales by Price Band - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut config = match std::env::var_os("SALES_BANDS_CONFIG") {
        Some(path) => AppConfig::from_file(PathBuf::from(path))?,
        None => AppConfig::default(),
    };
    if let Some(db) = std::env::var_os("SALES_BANDS_DB") {
        config.database_path = PathBuf::from(db);
    }

    if !config.database_path.exists() {
        eprintln!("❌ Database not found at {:?}", config.database_path);
        eprintln!("   Run: cargo run -- seed");
        eprintln!("   to create some sales first.");
        std::process::exit(1);
    }

    let store = SqliteStore::open(&config.database_path)?;
    println!("✓ Database opened: {:?}", config.database_path);

    // Create shared state
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        banding: config.banding,
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/sales-by-price-band", get(sales_by_price_band))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = std::env::var("SALES_BANDS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("listening on {}", addr);
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/sales-by-price-band?start=2016-01-01&end=2016-12-31", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
