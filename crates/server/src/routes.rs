use crate::error::ApiError;
use crate::AppState;
use axum::{
    body::to_bytes,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tableside_assistant::Answer;
use tracing::{debug, instrument};

/// Largest request body accepted by the query endpoints.
const MAX_BODY_BYTES: usize = 64 * 1024;

const MISSING_QUERY: &str = "Missing 'query' or 'message' field";

/// Accepted request fields; `query` wins over `message`.
#[derive(Debug, Default, Deserialize)]
struct QueryBody {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl QueryBody {
    fn into_query(self) -> Option<String> {
        [self.query, self.message]
            .into_iter()
            .flatten()
            .find(|q| !q.trim().is_empty())
    }
}

/// `POST /query` and `POST /rag_query`.
///
/// Reads a JSON or form-encoded body. Bodies without a recognised content
/// type are tried as JSON.
#[instrument(skip_all)]
pub(crate) async fn handle_query(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Answer>, ApiError> {
    let query = read_query(request, &state).await?;
    let query = query.ok_or_else(|| ApiError::BadRequest(MISSING_QUERY.to_string()))?;

    Ok(Json(state.assistant.answer(&query).await))
}

async fn read_query(request: Request, state: &AppState) -> Result<Option<String>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return Ok(match Form::<QueryBody>::from_request(request, state).await {
            Ok(Form(body)) => body.into_query(),
            Err(rejection) => {
                debug!(error = %rejection, "Unreadable form body");
                None
            }
        });
    }

    let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            debug!(error = %e, "Rejected request body");
            ApiError::PayloadTooLarge(format!(
                "Request body exceeds {} bytes",
                MAX_BODY_BYTES
            ))
        })?;

    Ok(match serde_json::from_slice::<QueryBody>(&bytes) {
        Ok(body) => body.into_query(),
        Err(e) => {
            debug!(error = %e, "Unreadable JSON body");
            None
        }
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    /// Id of the published index generation
    generation: u64,
    chunks: usize,
}

/// `GET /health`.
pub(crate) async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let current = state.index.current();
    Json(HealthResponse {
        status: "ok",
        generation: current.id,
        chunks: current.chunk_count(),
    })
}
