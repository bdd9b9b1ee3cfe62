use axum::extract::multipart::MultipartError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub fn superhero_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Superhero",
            id,
        }
    }

    pub fn image_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Image",
            id,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            RegistryError::NotFound { .. } => {
                let body = ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                };
                (StatusCode::NOT_FOUND, body)
            }
            RegistryError::Validation(msg) => {
                let body = ApiErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg,
                };
                (StatusCode::BAD_REQUEST, body)
            }
            RegistryError::Multipart(e) => {
                // Body-limit rejections surface through the multipart stream.
                let status = e.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PAYLOAD_TOO_LARGE"
                } else {
                    "VALIDATION_ERROR"
                };
                let body = ApiErrorBody {
                    code: code.to_string(),
                    message: e.body_text(),
                };
                (status, body)
            }
            RegistryError::DatabaseError(_) | RegistryError::Io(_) => {
                error!(error = %self, "request failed on storage");
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
