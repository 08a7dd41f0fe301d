use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Uniform success envelope: `{"status": <code>, "details": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub status: u16,
    pub details: T,
    pub message: String,
}

pub fn success<T: Serialize>(
    code: StatusCode,
    details: T,
    message: &str,
) -> (StatusCode, Json<Success<T>>) {
    (
        code,
        Json(Success {
            status: code.as_u16(),
            details,
            message: message.into(),
        }),
    )
}
