use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parlor_relay::RelayError;
use parlor_types::ValidationError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    MalformedPayload(String),

    /// Broken or oversized multipart body; keeps axum's status (400 or 413)
    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid keyword")]
    Unauthorized,

    #[error("{0}")]
    Relay(#[from] RelayError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Relay(RelayError::EmptyUpload) => StatusCode::BAD_REQUEST,
            AppError::Relay(RelayError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Relay(RelayError::Http(_) | RelayError::Rejected { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Relay(RelayError::Io(_)) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        }

        let body = json!({
            "status": "error",
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
