use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::num::IntErrorKind;
use std::sync::Arc;

use crate::company::Company;
use crate::server::AppState;
use crate::storage::CompanyStore;

pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 50;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Deserialize, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure of a request, rendered as a JSON error body
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed,
    Internal(String),
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Validation(msg) => Self::BadRequest(msg),
            crate::Error::NotFound(msg) => Self::NotFound(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl ApiError {
    /// Extractor rejections keep axum's message but use the JSON error body
    fn rejected(status: StatusCode, message: String) -> Self {
        if status.is_server_error() {
            Self::Internal(message)
        } else {
            Self::BadRequest(message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(error) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response(),
            Self::NotFound(error) => (StatusCode::NOT_FOUND, Json(ErrorResponse { error })).into_response(),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorResponse {
                    error: "Method not allowed".to_string(),
                }),
            )
                .into_response(),
            Self::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                internal_error(message)
            }
        }
    }
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Internal server error",
            "message": message,
        })),
    )
        .into_response()
}

/// Converts a handler panic into the standard 500 body
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!("Handler panicked: {}", message);
    internal_error(message)
}

/// Run a store call on the blocking pool
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&CompanyStore) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {}", e)))?
        .map_err(Into::into)
}

// ========== Pagination ==========

/// Resolved page window for a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u32,
}

impl PageRequest {
    /// Unparseable or non-positive values fall back to defaults;
    /// `per_page` is clamped to [`MAX_PER_PAGE`]. Numbers too large to
    /// represent saturate, so a huge `page` lands past the end.
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> Self {
        let per_page = parse_positive(per_page)
            .map_or(DEFAULT_PER_PAGE, |n| n.min(u64::from(MAX_PER_PAGE)) as u32);
        Self {
            page: parse_positive(page).unwrap_or(1),
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(u64::from(self.per_page))
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.per_page))
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    let parsed = match value?.trim().parse::<u64>() {
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
        Err(_) => return None,
    };
    (parsed >= 1).then_some(parsed)
}

// ========== Handlers ==========

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub storage: String,
    pub timestamp: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        database: "connected",
        storage: state.storage.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub companies: Vec<Company>,
    pub total: u64,
    pub page: u64,
    pub per_page: u32,
    pub total_pages: u64,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.q.as_deref().map(str::trim).unwrap_or_default().to_string();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Search query must be at least {} characters",
            MIN_QUERY_CHARS
        )));
    }

    let window = PageRequest::from_params(params.page.as_deref(), params.per_page.as_deref());
    let needle = query.clone();
    let (companies, total) = with_store(&state, move |store| {
        let companies = store.search_by_name(&needle, window.per_page, window.offset())?;
        let total = store.count_by_name(&needle)?;
        Ok((companies, total))
    })
    .await?;

    tracing::debug!(query = %query, total, page = window.page, "search");
    Ok(Json(SearchResponse {
        success: true,
        query,
        companies,
        total,
        page: window.page,
        per_page: window.per_page,
        total_pages: window.total_pages(total),
    }))
}

#[derive(Serialize)]
pub struct CompanyResponse {
    pub success: bool,
    pub company: Company,
}

pub async fn company(
    State(state): State<Arc<AppState>>,
    cin: Result<Path<String>, PathRejection>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let Path(cin) = cin?;
    let cin = cin.trim().to_string();
    if cin.is_empty() {
        return missing_cin().await;
    }

    let lookup = cin.clone();
    let company = with_store(&state, move |store| store.find_by_cin(&lookup))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company with CIN {} not found", cin)))?;

    Ok(Json(CompanyResponse { success: true, company }))
}

pub async fn missing_cin() -> Result<Json<CompanyResponse>, ApiError> {
    Err(ApiError::BadRequest("CIN is required".to_string()))
}

#[derive(Serialize)]
pub struct Limits {
    pub storage: String,
    pub reads_per_day: u64,
    pub writes_per_day: u64,
    pub max_companies: u64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_companies: u64,
    pub active_companies: u64,
    pub inactive_companies: u64,
    pub last_update: Option<String>,
    pub tier: String,
    pub limits: Limits,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = with_store(&state, |store| store.aggregate_stats()).await?;
    let tier = &state.tier;

    Ok(Json(StatsResponse {
        total_companies: stats.total,
        active_companies: stats.active,
        inactive_companies: stats.inactive(),
        last_update: stats.last_update,
        tier: tier.name.clone(),
        limits: Limits {
            storage: tier.storage_limit.clone(),
            reads_per_day: tier.reads_per_day,
            writes_per_day: tier.writes_per_day,
            max_companies: tier.max_companies,
        },
    }))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamp() {
        assert_eq!(
            PageRequest::from_params(None, None),
            PageRequest { page: 1, per_page: DEFAULT_PER_PAGE }
        );
        assert_eq!(PageRequest::from_params(Some("3"), Some("1000")).per_page, MAX_PER_PAGE);
        assert_eq!(PageRequest::from_params(Some("0"), Some("abc")).page, 1);
        assert_eq!(PageRequest::from_params(Some("-2"), Some("0")).per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_oversized_numbers_saturate() {
        let window = PageRequest::from_params(Some("99999999999"), Some("99999999999999999999999"));
        assert_eq!(window.page, 99_999_999_999);
        assert_eq!(window.per_page, MAX_PER_PAGE);

        let window = PageRequest::from_params(Some("99999999999999999999999"), None);
        assert_eq!(window.page, u64::MAX);
        assert_eq!(window.offset(), u64::MAX);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let window = PageRequest::from_params(Some("3"), Some("10"));
        assert_eq!(window.offset(), 20);
        assert_eq!(window.total_pages(0), 0);
        assert_eq!(window.total_pages(10), 1);
        assert_eq!(window.total_pages(21), 3);
    }

    #[test]
    fn test_store_errors_map_to_status() {
        let status = |err: crate::Error| ApiError::from(err).into_response().status();
        assert_eq!(status(crate::Error::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(crate::Error::NotFound("gone".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            status(crate::Error::Unavailable("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_panic_payload_becomes_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
