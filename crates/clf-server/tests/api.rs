//! HTTP contract tests driven through the router with `oneshot`.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use candle_core::{Device, Tensor};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use clf_core::{Classifier, ClfResult, FeatureExtractor, ModelInput, PaddingPolicy, PreprocessConfig};
use clf_pipeline::InferencePipeline;
use clf_server::{AppState, ServerConfig};

const BOUNDARY: &str = "voiceclf-test-boundary";

struct PassthroughExtractor;

impl FeatureExtractor for PassthroughExtractor {
    fn extract(&self, samples: &[f32], _: u32, _: PaddingPolicy) -> ClfResult<ModelInput> {
        let values = Tensor::from_vec(samples.to_vec(), (1, samples.len()), &Device::Cpu)?;
        Ok(ModelInput::new(values))
    }
}

struct FixedClassifier;

impl Classifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed-test-model"
    }

    fn classify(&self, _: &ModelInput) -> ClfResult<Tensor> {
        Ok(Tensor::new(&[[0.2f32, 0.1, 1.5]], &Device::Cpu)?)
    }
}

fn app_with(config: ServerConfig) -> Router {
    let pipeline = InferencePipeline::new(
        PreprocessConfig::default(),
        Arc::new(PassthroughExtractor),
        Arc::new(FixedClassifier),
    )
    .unwrap();
    clf_server::init(AppState::new(pipeline), &config)
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

fn wav_bytes(samples: &[f32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer
                .write_sample((s * i16::MAX as f32).round() as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn sine(len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
        .collect()
}

fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    multipart_part(field, Some("clip.wav"), data)
}

fn multipart_part(field: &str, file_name: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    let disposition = match file_name {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };
    body.extend_from_slice(disposition.as_bytes());
    if file_name.is_some() {
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn predict_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_missing_audio_field_is_400() {
    let body = multipart_body("file", &wav_bytes(&sine(16000, 0.5)));
    let (status, json) = send(app(), predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({"error": "No audio file"}));
}

#[tokio::test]
async fn test_audio_text_field_without_file_is_400() {
    let body = multipart_part("audio", None, b"not-a-file");
    let (status, json) = send(app(), predict_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({"error": "No audio file"}));
}

#[tokio::test]
async fn test_non_multipart_request_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No audio file");
}

#[tokio::test]
async fn test_short_clip_is_unknown() {
    let body = multipart_body("audio", &wav_bytes(&vec![0.0; 3200]));
    let (status, json) = send(app(), predict_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({
            "result": "unknown",
            "scores": {"orig": 0.0, "tts": 0.0, "tts_gsm": 0.0}
        })
    );
}

#[tokio::test]
async fn test_corrupted_audio_is_500_with_message() {
    let body = multipart_body("audio", b"this is not audio at all");
    let (status, json) = send(app(), predict_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());
}

#[tokio::test]
async fn test_successful_prediction() {
    let body = multipart_body("audio", &wav_bytes(&sine(32000, 0.5)));
    let (status, json) = send(app(), predict_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "tts_gsm");

    let scores = json["scores"].as_object().unwrap();
    assert_eq!(scores.len(), 3);
    let total: f64 = scores.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-3);
    for key in ["orig", "tts", "tts_gsm"] {
        let p = scores[key].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
    }
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..Default::default()
    };
    let body = multipart_body("audio", &wav_bytes(&sine(16000, 0.5)));
    let response = app_with(config)
        .oneshot(predict_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health_reports_model() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "fixed-test-model");
    assert_eq!(json["labels"], serde_json::json!(["orig", "tts", "tts_gsm"]));
    assert_eq!(json["sample_rate"], 16000);
}
