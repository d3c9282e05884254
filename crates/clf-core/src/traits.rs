//! Внешние возможности, которые пайплайн получает извне.
//!
//! Пайплайн предобработки не знает ни архитектуры модели, ни формата весов:
//! он видит только [`FeatureExtractor`] и [`Classifier`]. Реализации
//! разделяются между конкурентными запросами, поэтому обе трейта требуют
//! `Send + Sync` и работают через `&self`.

use candle_core::Tensor;

use crate::error::ClfResult;
use crate::types::{ModelInput, PaddingPolicy};

/// Преобразование сырых сэмплов во вход модели.
///
/// # Пример
/// ```ignore
/// let input = extractor.extract(&samples, 16_000, PaddingPolicy::Longest)?;
/// let logits = classifier.classify(&input)?;
/// ```
pub trait FeatureExtractor: Send + Sync {
    /// Ожидаемая частота дискретизации (обычно 16000).
    fn sample_rate(&self) -> u32 {
        16_000
    }

    /// Подготовить вход модели.
    ///
    /// # Аргументы
    /// * `samples` - моно аудио, `f32`.
    /// * `sample_rate` - частота `samples`; несовпадение с [`Self::sample_rate()`] - ошибка.
    /// * `padding` - политика паддинга; обрезка не выполняется никогда.
    fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        padding: PaddingPolicy,
    ) -> ClfResult<ModelInput>;
}

/// Классификатор: вход модели → логиты.
pub trait Classifier: Send + Sync {
    /// Имя загруженной модели (для логов и `/health`).
    fn name(&self) -> &str;

    /// Логиты формы [batch, num_labels] или [num_labels], в порядке
    /// [`Label::all()`](crate::types::Label::all).
    ///
    /// Softmax здесь не применяется: нормализация - забота пайплайна.
    fn classify(&self, input: &ModelInput) -> ClfResult<Tensor>;
}
