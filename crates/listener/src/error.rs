use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use trigger::{DispatchError, ValidationError};

/// Everything a trigger endpoint can fail with, mapped to one HTTP answer.
///
/// The body is always `{"detail": "<message>"}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request body is not valid JSON.
    #[error("Invalid JSON body")]
    InvalidJson,

    /// A route parameter is unusable.
    #[error("route parameter '{0}' must not be empty")]
    EmptyRouteParameter(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson
            | GatewayError::EmptyRouteParameter(_)
            | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Dispatch(DispatchError::JobFailed { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Dispatch(DispatchError::Runner(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "{}", self);
        } else {
            warn!(%status, "rejected event: {}", self);
        }

        let body = Json(json!({
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}
