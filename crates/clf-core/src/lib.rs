//! # clf-core
//!
//! Базовые типы, трейты и определения ошибок для классификатора голоса.
//!
//! Этот крейт предоставляет фундаментальные абстракции для всех остальных
//! крейтов в workspace:
//!
//! - Общие типы данных (`AudioBuffer`, `Label`, `ModelInput`, `ClassificationResult`)
//! - Конфигурация предобработки [`PreprocessConfig`]
//! - Унифицированная обработка ошибок через `ClfError`
//! - Трейты [`FeatureExtractor`] и [`Classifier`] - внешние возможности модели

pub mod config;
pub mod error;
pub mod model_files;
pub mod traits;
pub mod types;

pub use config::PreprocessConfig;
pub use error::{ClfError, ClfResult};
pub use traits::{Classifier, FeatureExtractor};
pub use types::{
    AudioBuffer, ClassificationResult, Label, ModelInput, PaddingPolicy, UNKNOWN_LABEL,
};
