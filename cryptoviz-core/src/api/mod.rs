//! REST API for web front-ends
//!
//! Serves filtered records, per-style visualization payloads, the market
//! overview and pipeline metrics as JSON.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::layout::{LayoutOptions, VisualizationStyle};
use crate::market_data::{MarketDataRecord, Timeframe};
use crate::market_scanner::FilterCriteria;
use crate::store::{CommitOutcome, StoreSnapshot};
use crate::CryptoVisualizer;

/// API error types
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn upstream(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, message: message.into() }
    }
}

impl warp::reject::Reject for ApiError {}

/// API server configuration
#[derive(Debug, Clone, Copy)]
pub struct ApiConfig {
    pub address: IpAddr,
    pub port: u16,
}

impl ApiConfig {
    pub fn with_port(port: u16) -> Self {
        Self { port, ..Default::default() }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        }
    }
}

/// API server backed by a shared visualizer
pub struct ApiServer {
    visualizer: Arc<CryptoVisualizer>,
    config: ApiConfig,
}

impl ApiServer {
    pub fn new(visualizer: Arc<CryptoVisualizer>, config: ApiConfig) -> Self {
        Self { visualizer, config }
    }

    pub async fn start(&self) {
        tracing::info!("Starting visualization API on {}", self.config.socket_addr());
        warp::serve(routes(self.visualizer.clone()))
            .run(self.config.socket_addr())
            .await;
    }
}

/// All routes with CORS and error recovery applied
pub fn routes(
    visualizer: Arc<CryptoVisualizer>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .and(with_visualizer(visualizer.clone()))
        .map(|visualizer: Arc<CryptoVisualizer>| {
            warp::reply::json(&json!({
                "status": "ok",
                "service": "cryptoviz",
                "feed": visualizer.feed_name(),
                "market": visualizer.store().status(),
                "timestamp": chrono::Utc::now()
            }))
        });

    let records = warp::path!("api" / "v1" / "records")
        .and(warp::get())
        .and(warp::query::<SelectionQuery>())
        .and(with_visualizer(visualizer.clone()))
        .and_then(get_records);

    let visualization = warp::path!("api" / "v1" / "visualization" / String)
        .and(warp::get())
        .and(warp::query::<VisualizationQuery>())
        .and(with_visualizer(visualizer.clone()))
        .and_then(get_visualization);

    let overview = warp::path!("api" / "v1" / "overview")
        .and(warp::get())
        .and(warp::query::<SelectionQuery>())
        .and(with_visualizer(visualizer.clone()))
        .and_then(get_overview);

    let metrics = warp::path!("api" / "v1" / "metrics")
        .and(warp::get())
        .and(with_visualizer(visualizer.clone()))
        .and_then(get_metrics);

    let refresh = warp::path!("api" / "v1" / "refresh")
        .and(warp::post())
        .and(with_visualizer(visualizer.clone()))
        .and_then(post_refresh);

    let reset = warp::path!("api" / "v1" / "reset")
        .and(warp::post())
        .and(with_visualizer(visualizer))
        .and_then(post_reset);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"]);

    health
        .or(records)
        .or(visualization)
        .or(overview)
        .or(metrics)
        .or(refresh)
        .or(reset)
        .with(cors)
        .recover(handle_rejection)
}

// Helper function to inject the visualizer
fn with_visualizer(
    visualizer: Arc<CryptoVisualizer>,
) -> impl Filter<Extract = (Arc<CryptoVisualizer>,), Error = Infallible> + Clone {
    warp::any().map(move || visualizer.clone())
}

/// Timeframe and filter overrides; absent fields fall back to the stored selection
#[derive(Debug, Default, Deserialize)]
struct SelectionQuery {
    timeframe: Option<String>,
    max_count: Option<i64>,
    search: Option<String>,
}

impl SelectionQuery {
    fn timeframe(&self, visualizer: &CryptoVisualizer) -> Result<Timeframe, ApiError> {
        match &self.timeframe {
            Some(raw) => raw
                .parse::<Timeframe>()
                .map_err(|e| ApiError::bad_request(e.to_string())),
            None => Ok(visualizer.store().timeframe()),
        }
    }

    fn criteria(&self, visualizer: &CryptoVisualizer) -> FilterCriteria {
        let stored = visualizer.store().criteria();
        let search = self.search.clone().unwrap_or(stored.search_term);
        match self.max_count {
            Some(count) => FilterCriteria::from_signed(count, search),
            None => FilterCriteria::new(stored.max_count).with_search(search),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct VisualizationQuery {
    timeframe: Option<String>,
    max_count: Option<i64>,
    search: Option<String>,
    base_offset: Option<f64>,
    max_slots: Option<usize>,
}

impl VisualizationQuery {
    fn selection(&self) -> SelectionQuery {
        SelectionQuery {
            timeframe: self.timeframe.clone(),
            max_count: self.max_count,
            search: self.search.clone(),
        }
    }

    fn options(&self, style: VisualizationStyle) -> Result<LayoutOptions, ApiError> {
        let mut options = LayoutOptions::for_style(style);
        if let Some(base_offset) = self.base_offset {
            options = options
                .with_base_offset(base_offset)
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
        }
        if self.max_slots.is_some() {
            options = options.with_max_slots(self.max_slots);
        }
        Ok(options)
    }
}

#[derive(Debug, Serialize)]
struct RecordsResponse {
    timeframe: Timeframe,
    criteria: FilterCriteria,
    count: usize,
    records: Vec<MarketDataRecord>,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    outcome: Option<CommitOutcome>,
    store: StoreSnapshot,
}

/// Get filtered records
async fn get_records(
    query: SelectionQuery,
    visualizer: Arc<CryptoVisualizer>,
) -> Result<impl Reply, Rejection> {
    let timeframe = query.timeframe(&visualizer).map_err(warp::reject::custom)?;
    let criteria = query.criteria(&visualizer);
    let records = crate::market_scanner::filter(&visualizer.store().records(), &criteria);

    Ok(warp::reply::json(&RecordsResponse {
        timeframe,
        criteria,
        count: records.len(),
        records,
    }))
}

/// Get the payload for one visualization style
async fn get_visualization(
    style: String,
    query: VisualizationQuery,
    visualizer: Arc<CryptoVisualizer>,
) -> Result<impl Reply, Rejection> {
    let style = style
        .parse::<VisualizationStyle>()
        .map_err(|e| warp::reject::custom(ApiError::bad_request(e.to_string())))?;
    let selection = query.selection();
    let timeframe = selection.timeframe(&visualizer).map_err(warp::reject::custom)?;
    let criteria = selection.criteria(&visualizer);
    let options = query.options(style).map_err(warp::reject::custom)?;

    let payload = visualizer.payload_with(style, timeframe, &criteria, &options);
    Ok(warp::reply::json(&payload))
}

/// Get market overview
async fn get_overview(
    query: SelectionQuery,
    visualizer: Arc<CryptoVisualizer>,
) -> Result<impl Reply, Rejection> {
    let timeframe = query.timeframe(&visualizer).map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&visualizer.overview_for(timeframe)))
}

/// Get all metrics
async fn get_metrics(visualizer: Arc<CryptoVisualizer>) -> Result<impl Reply, Rejection> {
    let all_metrics = visualizer.metrics_collector().get_all_metrics();
    Ok(warp::reply::json(&all_metrics))
}

/// Trigger a fetch and report whether it was committed
async fn post_refresh(visualizer: Arc<CryptoVisualizer>) -> Result<impl Reply, Rejection> {
    let outcome = visualizer
        .refresh()
        .await
        .map_err(|e| warp::reject::custom(ApiError::upstream(e.to_string())))?;

    Ok(warp::reply::json(&RefreshResponse {
        outcome: Some(outcome),
        store: visualizer.store().snapshot(),
    }))
}

/// Restore the default selection; `outcome` is null when no refetch was needed
async fn post_reset(visualizer: Arc<CryptoVisualizer>) -> Result<impl Reply, Rejection> {
    let outcome = visualizer
        .reset()
        .await
        .map_err(|e| warp::reject::custom(ApiError::upstream(e.to_string())))?;

    Ok(warp::reply::json(&RefreshResponse {
        outcome,
        store: visualizer.store().snapshot(),
    }))
}

/// Handle API errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Endpoint not found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(invalid) = err.find::<warp::reject::InvalidQuery>() {
        code = StatusCode::BAD_REQUEST;
        message = invalid.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method not allowed".to_string();
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal server error".to_string();
    }

    let json = warp::reply::json(&json!({
        "error": message,
        "code": code.as_u16()
    }));

    Ok(warp::reply::with_status(json, code))
}
