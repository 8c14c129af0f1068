use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::{
    CaseDetails, ScrapingContext, SearchQuery,
    case_fetcher::fetch_case_details,
    query_log::{QueryLog, QueryLogEntry},
};

const FRONTEND_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5173"];
const NOT_FOUND_DETAIL: &str = "Case not found or scraper failed. Check backend logs.";

pub struct ApiState {
    pub scraping: ScrapingContext,
    pub query_log: Arc<dyn QueryLog>,
}

pub enum ApiError {
    InvalidRequest(String),
    CaseNotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidRequest(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            ApiError::CaseNotFound => (StatusCode::NOT_FOUND, NOT_FOUND_DETAIL.to_string()),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(FRONTEND_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(read_root))
        .route("/api/fetch-case", post(fetch_case))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: Arc<ApiState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Court Data Fetcher API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn read_root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Court Data Fetcher API!" }))
}

async fn fetch_case(
    State(state): State<Arc<ApiState>>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<CaseDetails>, ApiError> {
    if let Some(field) = query.missing_field() {
        return Err(ApiError::InvalidRequest(format!("{field} must not be empty")));
    }
    info!(
        "Received request for: {} {}/{}",
        query.case_type, query.case_number, query.case_year
    );

    let details = fetch_case_details(&state.scraping, &query)
        .await
        .ok_or(ApiError::CaseNotFound)?;

    log_query(state.query_log.as_ref(), &query, &details).await;
    Ok(Json(details))
}

// A lost log entry never turns a found case into an error.
async fn log_query(query_log: &dyn QueryLog, query: &SearchQuery, details: &CaseDetails) {
    let entry = match QueryLogEntry::new(query, details) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Could not serialize case details for the query log: {e}");
            return;
        }
    };
    match query_log.record(&entry).await {
        Ok(id) => info!("Successfully logged query with ID: {id}"),
        Err(e) => warn!("Failed to log query: {e:#}"),
    }
}
