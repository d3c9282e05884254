//! Классификатор голосовых клипов на Candle.
//!
//! Экстрактор признаков сырой волны + лёгкая голова классификации
//! (orig / tts / tts_gsm). Оба реализуют трейты из `clf-core`.

pub mod config;
pub mod extractor;
pub mod model;

pub use config::{ExtractorConfig, HeadConfig};
pub use extractor::WaveformFeatureExtractor;
pub use model::PooledHeadClassifier;
