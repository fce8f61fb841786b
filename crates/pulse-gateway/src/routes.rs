//! Plain HTTP handlers (non-WS).

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use pulse_core::error::{ClientCode, PulseError};

use crate::app_state::AppState;

pub const LIVENESS_BODY: &str = "Session counter server is running!";

/// HTTP face of `PulseError`.
pub struct ApiError(pub PulseError);

impl From<PulseError> for ApiError {
    fn from(e: PulseError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
            ClientCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub async fn liveness() -> &'static str {
    LIVENESS_BODY
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub active: u64,
}

pub async fn sessions(State(app): State<AppState>) -> Result<Json<SessionsResponse>, ApiError> {
    let active = app.counter().snapshot().await?;
    Ok(Json(SessionsResponse { active }))
}

pub async fn metrics(State(app): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        app.metrics().render(),
    )
}
