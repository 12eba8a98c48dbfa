//! API route handlers.

use std::io::Read;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_ENCODING;
use axum::http::HeaderMap;
use axum::Json;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::config::PlaybookConfig;

/// Response for an accepted request.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedResponse {
    /// Identifier used in the worker's log lines
    pub job_id: Uuid,
}

/// `POST /ansible`: decode, parse and queue a playbook configuration.
pub async fn handle_ansible(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<QueuedResponse>> {
    debug!("headers: {:?}", headers);

    let body = decode_body(&headers, &body)?;
    let config = parse_config(&body)?;
    let job_id = state.enqueue(config)?;

    info!(job = %job_id, "Finished processing ansible event");
    Ok(Json(QueuedResponse { job_id }))
}

/// Body bytes, gunzipped when `Content-Encoding` is `gzip`.
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> ApiResult<Vec<u8>> {
    let gzipped = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));

    if !gzipped {
        return Ok(body.to_vec());
    }

    let mut decoded = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut decoded)
        .map_err(|e| ApiError::BodyRead(e.to_string()))?;
    Ok(decoded)
}

/// Parse a JSON playbook configuration. Missing keys take their defaults.
pub fn parse_config(body: &[u8]) -> ApiResult<PlaybookConfig> {
    serde_json::from_slice(body).map_err(|e| ApiError::BodyParse(e.to_string()))
}
