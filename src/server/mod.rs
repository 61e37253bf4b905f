use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::TierConfig;
use crate::storage::CompanyStore;

pub mod routes;

pub use routes::ApiError;

/// Server state
pub struct AppState {
    pub store: Arc<CompanyStore>,
    pub tier: TierConfig,
    /// Storage backend label reported by the health route
    pub storage: String,
}

impl AppState {
    pub fn new(store: Arc<CompanyStore>, tier: TierConfig) -> Self {
        Self {
            store,
            tier,
            storage: "sqlite".to_string(),
        }
    }
}

/// Build the HTTP router
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/", get(routes::index))
        .route("/index.html", get(routes::index))
        .route("/api/health", get(routes::health))
        .route("/api/search", get(routes::search))
        .route("/api/stats", get(routes::stats))
        .route("/api/company", get(routes::missing_cin))
        .route("/api/company/", get(routes::missing_cin))
        .route("/api/company/{cin}", get(routes::company))
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .with_state(state);
    with_layers(api)
}

/// Wrap a router in the panic, tracing and CORS layers shared by every route.
///
/// `CorsLayer` answers every OPTIONS request with an empty 200 before routing.
pub fn with_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    router
        .layer(CatchPanicLayer::custom(routes::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        ))
}

pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(Arc::clone(&state));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
