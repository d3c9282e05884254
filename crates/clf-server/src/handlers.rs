//! Route handlers.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{debug, error, warn};

use clf_core::ClassificationResult;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the multipart field carrying the upload.
pub const AUDIO_FIELD: &str = "audio";

/// `POST /predict`
///
/// A body that is not multipart at all is treated like a missing field.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Not a multipart request: {}", rejection);
        ApiError::MissingAudio
    })?;

    let data = read_audio_field(&mut multipart).await?;
    debug!("Received {} bytes of audio", data.len());

    let pipeline = state.pipeline().clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.run(&data))
        .await
        .map_err(|e| {
            error!("Inference task failed: {}", e);
            ApiError::Processing(e.to_string())
        })?;

    match outcome.into_result() {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            error!("Prediction failed: {}", err);
            Err(err.into())
        }
    }
}

/// Bytes of the first `audio` file part.
///
/// Parts without a filename are plain form values, not uploads, and are skipped.
async fn read_audio_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::MissingAudio),
            Err(e) => return Err(multipart_error(e)),
        };

        if field.name() != Some(AUDIO_FIELD) || field.file_name().is_none() {
            continue;
        }

        return match field.bytes().await {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => Err(multipart_error(e)),
        };
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload rejected: {}", err.body_text());
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        debug!("Malformed multipart body: {}", err.body_text());
        ApiError::MissingAudio
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub labels: Vec<&'static str>,
    pub sample_rate: u32,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = state.pipeline();
    Json(HealthResponse {
        status: "ok",
        model: pipeline.model_name().to_string(),
        labels: pipeline.labels(),
        sample_rate: pipeline.sample_rate(),
    })
}
