//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use clf_core::ClfError;

/// Message returned when the `audio` field is absent.
pub const NO_AUDIO_FILE: &str = "No audio file";

/// Request-level failure, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// No `audio` field in the request (or the body is not multipart).
    MissingAudio,
    /// Upload exceeds the configured body limit.
    PayloadTooLarge(String),
    /// Decoding, preprocessing or inference failed.
    Processing(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAudio => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::MissingAudio => NO_AUDIO_FILE,
            ApiError::PayloadTooLarge(msg) | ApiError::Processing(msg) => msg,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<ClfError> for ApiError {
    fn from(err: ClfError) -> Self {
        ApiError::Processing(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingAudio.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingAudio.message(), "No audio file");

        let err: ApiError = ClfError::Decode("bad header".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Decode error: bad header");
    }
}
