use crate::alerts::{self, AlertThresholds, AlertsOutput};
use crate::analysis::{self, AnalysisParams, AnalysisReport};
use crate::config;
use crate::export;
use crate::loader::{self, MarketDataSource, SnapshotRequest};
use crate::models::{DataSource, ExpiryType, Index, IndexQuote, MarketStatus};
use crate::nse_client::NSEClient;
use crate::utils;
use anyhow::Result;
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    pub symbol: Option<String>,
    pub expiry_type: Option<String>,
    pub source: Option<String>,
    /// Percent, clamped to 5-20
    pub strike_range: Option<f64>,
    /// Percent, clamped to 0-15
    pub risk_free_rate: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiriesQuery {
    pub expiry_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }

    fn err(error: impl ToString, start_time: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotesResponse {
    pub quotes: Vec<IndexQuote>,
    pub market_status: MarketStatus,
}

#[derive(Debug, Serialize)]
pub struct ExpiriesResponse {
    pub expiry_type: ExpiryType,
    pub next_expiry: String,
    pub upcoming_weekly: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub report: AnalysisReport,
    pub alerts: Option<AlertsOutput>,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

/// Shared handler state over any market data source (NSE in production)
pub struct AppState<S = NSEClient> {
    source: Arc<S>,
    cache: Arc<RwLock<Cache>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cache: self.cache.clone(),
        }
    }
}

#[derive(Default)]
struct Cache {
    quotes: Option<(QuotesResponse, Instant)>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        Ok(Self::with_source(NSEClient::new()?))
    }
}

impl<S> AppState<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source: Arc::new(source),
            cache: Arc::new(RwLock::new(Cache::default())),
        }
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /health
async fn health() -> Json<ApiResponse<HealthResponse>> {
    let start_time = Instant::now();
    Json(ApiResponse::ok(
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        },
        start_time,
    ))
}

/// GET /api/quotes - NIFTY and BANKNIFTY quotes plus market status
async fn get_quotes<S: MarketDataSource + Send + Sync + 'static>(
    State(app_state): State<AppState<S>>,
) -> Json<ApiResponse<QuotesResponse>> {
    let start_time = Instant::now();

    // Check cache first
    {
        let cache = app_state.cache.read().await;
        if let Some((quotes, cached_at)) = &cache.quotes {
            if cached_at.elapsed() < config::QUOTES_CACHE_DURATION {
                return Json(ApiResponse::ok(quotes.clone(), start_time));
            }
        }
    }

    let (quotes, market_status) = futures::join!(
        app_state.source.index_quotes(),
        app_state.source.market_status()
    );

    match quotes {
        Ok(quotes) => {
            let response = QuotesResponse {
                quotes,
                market_status,
            };
            {
                let mut cache = app_state.cache.write().await;
                cache.quotes = Some((response.clone(), Instant::now()));
            }
            Json(ApiResponse::ok(response, start_time))
        }
        Err(e) => {
            warn!(error = %e, "quotes request failed");
            Json(ApiResponse::err(e, start_time))
        }
    }
}

/// GET /api/market-status
async fn get_market_status<S: MarketDataSource + Send + Sync + 'static>(
    State(app_state): State<AppState<S>>,
) -> Json<ApiResponse<MarketStatus>> {
    let start_time = Instant::now();
    let status = app_state.source.market_status().await;
    Json(ApiResponse::ok(status, start_time))
}

/// GET /api/expiries?expiry_type=weekly
async fn get_expiries(Query(query): Query<ExpiriesQuery>) -> Json<ApiResponse<ExpiriesResponse>> {
    let start_time = Instant::now();

    let expiry_type = match query.expiry_type.as_deref().unwrap_or("weekly").parse::<ExpiryType>() {
        Ok(t) => t,
        Err(e) => return Json(ApiResponse::err(e, start_time)),
    };

    let today = Local::now().date_naive();
    Json(ApiResponse::ok(
        ExpiriesResponse {
            expiry_type,
            next_expiry: utils::format_expiry(utils::next_expiry(expiry_type, today)),
            upcoming_weekly: utils::available_expiries(today),
        },
        start_time,
    ))
}

fn parse_analysis_query(query: &AnalysisQuery) -> Result<(SnapshotRequest, AnalysisParams)> {
    let index: Index = query.symbol.as_deref().unwrap_or("NIFTY").parse()?;
    let expiry_type: ExpiryType = query.expiry_type.as_deref().unwrap_or("weekly").parse()?;
    let source: DataSource = query.source.as_deref().unwrap_or("live").parse()?;

    let request = SnapshotRequest {
        seed: query.seed,
        ..SnapshotRequest::new(index, expiry_type, source)
    };
    let params = AnalysisParams::from_percent(
        query.strike_range.unwrap_or(config::DEFAULT_STRIKE_RANGE_PCT),
        query.risk_free_rate.unwrap_or(config::DEFAULT_RISK_FREE_RATE_PCT),
    );

    Ok((request, params))
}

async fn run_analysis<S: MarketDataSource + Sync>(
    app_state: &AppState<S>,
    query: &AnalysisQuery,
) -> Result<AnalysisReport> {
    let (request, params) = parse_analysis_query(query)?;
    let snapshot = loader::load_snapshot(app_state.source.as_ref(), &request).await?;
    let report = analysis::analyze(&snapshot, &params, Local::now().naive_local());

    info!(
        symbol = report.symbol(),
        expiry = %report.expiry,
        origin = ?report.origin,
        strikes = report.gex.len(),
        "analysis complete"
    );
    Ok(report)
}

/// GET /api/analysis?symbol=NIFTY&expiry_type=weekly&source=live&strike_range=10&risk_free_rate=7
async fn get_analysis<S: MarketDataSource + Send + Sync + 'static>(
    Query(query): Query<AnalysisQuery>,
    State(app_state): State<AppState<S>>,
) -> Json<ApiResponse<AnalysisResponse>> {
    let start_time = Instant::now();

    match run_analysis(&app_state, &query).await {
        Ok(report) => {
            let alerts = alerts::run_rules(&report, &AlertThresholds::default());
            Json(ApiResponse::ok(AnalysisResponse { report, alerts }, start_time))
        }
        Err(e) => Json(ApiResponse::err(e, start_time)),
    }
}

/// GET /api/analysis/csv - same parameters, per-strike GEX as a CSV download
async fn get_analysis_csv<S: MarketDataSource + Send + Sync + 'static>(
    Query(query): Query<AnalysisQuery>,
    State(app_state): State<AppState<S>>,
) -> Response {
    let csv = match run_analysis(&app_state, &query).await {
        Ok(report) => export::gex_csv_string(&report).map(|body| (export::csv_file_name(&report), body)),
        Err(e) => Err(e),
    };

    match csv {
        Ok((file_name, body)) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn build_router<S: MarketDataSource + Send + Sync + 'static>(app_state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/quotes", get(get_quotes::<S>))
        .route("/api/market-status", get(get_market_status::<S>))
        .route("/api/expiries", get(get_expiries))
        .route("/api/analysis", get(get_analysis::<S>))
        .route("/api/analysis/csv", get(get_analysis_csv::<S>))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(port: u16) -> Result<()> {
    let app = build_router(AppState::new()?);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "GEX API server listening");
    println!("🚀 GEX API Server running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /health");
    println!("   GET  /api/quotes");
    println!("   GET  /api/market-status");
    println!("   GET  /api/expiries?expiry_type=weekly");
    println!("   GET  /api/analysis?symbol=NIFTY&expiry_type=weekly&source=live&strike_range=10&risk_free_rate=7");
    println!("   GET  /api/analysis/csv?symbol=BANKNIFTY&source=sample&seed=42");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}
