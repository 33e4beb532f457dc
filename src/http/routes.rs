//! HTTP route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use tracing::{info, warn};

use super::types::{DownlinkRequest, DownlinkResponse, ErrorBody, HealthResponse};
use super::SharedState;
use crate::chirpstack::ForwardError;
use crate::payload::{self, Command, Payload, PayloadError};

/// Everything `POST /downlink` can fail with
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request; no downstream call was made
    BadRequest(String),
    /// Payload or command could not be normalized
    Payload(PayloadError),
    /// The network server refused or could not be reached
    Downstream(ForwardError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
            }
            ApiError::Payload(e) => (
                StatusCode::BAD_REQUEST,
                Json(DownlinkResponse::Error {
                    code: None,
                    message: e.to_string(),
                }),
            )
                .into_response(),
            ApiError::Downstream(e) => (
                StatusCode::BAD_GATEWAY,
                Json(DownlinkResponse::Error {
                    code: Some(e.code().to_string()),
                    message: e.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
    })
}

/// POST /downlink
pub async fn downlink(
    State(state): State<SharedState>,
    body: Result<Json<DownlinkRequest>, JsonRejection>,
) -> Result<Json<DownlinkResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        warn!("Rejected downlink request: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;

    let dev_eui = match req.dev_eui.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_dev_eui(raw)?,
        _ => return Err(ApiError::BadRequest("missing dev_eui".to_string())),
    };

    let data = resolve_payload(req.payload, req.command)?;
    info!("Downlink request for {} ({} bytes)", dev_eui, data.len());

    let downlink_id = state
        .queue
        .enqueue(&dev_eui, data)
        .await
        .map_err(ApiError::Downstream)?;

    Ok(Json(DownlinkResponse::Success { downlink_id }))
}

/// Validate an EUI-64 and return it in ChirpStack's lowercase form
fn parse_dev_eui(raw: &str) -> Result<String, ApiError> {
    let raw = raw.trim();
    let mut eui = [0u8; 8];
    hex::decode_to_slice(raw, &mut eui).map_err(|_| {
        ApiError::BadRequest(format!(
            "invalid dev_eui '{}': expected 16 hex digits",
            raw
        ))
    })?;
    Ok(hex::encode(eui))
}

fn resolve_payload(payload: Option<Value>, command: Option<String>) -> Result<Vec<u8>, ApiError> {
    match (payload, command) {
        (Some(value), None) => Payload::try_from(&value)
            .and_then(payload::normalize)
            .map_err(ApiError::Payload),
        (None, Some(command)) => command
            .parse::<Command>()
            .map(|c| vec![c.byte()])
            .map_err(ApiError::Payload),
        (Some(_), Some(_)) => Err(ApiError::BadRequest(
            "specify either payload or command, not both".to_string(),
        )),
        (None, None) => Err(ApiError::BadRequest(
            "missing payload or command".to_string(),
        )),
    }
}
