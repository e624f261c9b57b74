//! HTTP surface for Tableside.
//!
//! | Method | Path         | Description                              |
//! |--------|--------------|------------------------------------------|
//! | `POST` | `/query`     | Answer a guest question                  |
//! | `POST` | `/rag_query` | Alias of `/query`                        |
//! | `GET`  | `/health`    | Liveness plus the published generation   |
//!
//! Query bodies may be JSON or form-encoded and carry the question in
//! `query` or `message`. A missing question is a 400 with a `detail` body;
//! generation failures still answer 200 with apology text.

pub mod error;
mod routes;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tableside_assistant::Assistant;
use tableside_core::AppResult;
use tableside_knowledge::IndexHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub index: IndexHandle,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>, index: IndexHandle) -> Self {
        Self { assistant, index }
    }
}

/// Build the router. An empty origin list allows any origin.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/query", post(routes::handle_query))
        .route("/rag_query", post(routes::handle_query))
        .route("/health", get(routes::handle_health))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Serve on `addr` (`host:port`) until `cancel` fires, then drain in-flight
/// requests.
pub async fn serve(
    addr: &str,
    state: AppState,
    cors_origins: &[String],
    cancel: CancellationToken,
) -> AppResult<()> {
    let app = router(state, cors_origins);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
