use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// A single failed field from request validation, reported back to the
/// client in the order the rules ran.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Domain error taxonomy. Every variant maps to a status code and is
/// rendered at the boundary as `{"status": "Failed", "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn conflict(msg: &str) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn not_found(msg: &str) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn unauthorized(msg: &str) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden(msg: &str) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Validation carries field-level messages; everything else a string.
        // Internal errors are logged and never leaked to the client.
        let message = match &self {
            ApiError::Validation(fields) => json!(fields),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                json!("Internal Server Error")
            }
            other => json!(other.to_string()),
        };

        let body = json!({
            "status": "Failed",
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_renders_field_array() {
        let err = ApiError::Validation(vec![
            FieldError::new("email", "Invalid email format"),
            FieldError::new("password", "Password must be at least 6 characters long"),
        ]);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let fields = match err {
            ApiError::Validation(f) => f,
            _ => unreachable!(),
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json[0]["path"], "email");
        assert_eq!(json[1]["message"], "Password must be at least 6 characters long");
    }

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::conflict("dup").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::not_found("gone").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::unauthorized("no").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::forbidden("wrong role").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
