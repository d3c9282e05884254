//! Error types for the voice classifier.

use thiserror::Error;

/// Main error type for preprocessing and inference.
///
/// Every variant collapses into the same generic failure at the HTTP boundary;
/// the split exists for logs and for tests.
#[derive(Error, Debug)]
pub enum ClfError {
    /// Bytes could not be recognised as audio.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Audio processing errors (resampling, channel layout).
    #[error("Audio error: {0}")]
    Audio(String),

    /// Model loading errors.
    #[error("Model error: {0}")]
    Model(String),

    /// Feature extraction and classification errors.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration errors.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Candle tensor errors.
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    /// JSON parsing errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for classifier operations.
pub type ClfResult<T> = Result<T, ClfError>;
