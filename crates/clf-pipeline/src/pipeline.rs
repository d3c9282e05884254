//! InferencePipeline - сквозная обработка одного клипа.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use candle_core::Device;
use tracing::{debug, info, warn};

use audio::{AudioLoader, DurationGate, GateDecision, LoudnessNormalizer, SilenceTrimmer};
use clf_core::model_files::PREPROCESSOR_CONFIG_FILE;
use clf_core::{
    AudioBuffer, ClassificationResult, Classifier, ClfError, ClfResult, FeatureExtractor, Label,
    PaddingPolicy, PreprocessConfig,
};
use clf_model::{ExtractorConfig, PooledHeadClassifier, WaveformFeatureExtractor};

use crate::outcome::{Outcome, RejectReason};
use crate::scores;

/// Неизменяемый сервисный объект: предобработка + модель.
///
/// Все методы работают через `&self`, так что один экземпляр
/// обслуживает конкурентные запросы.
pub struct InferencePipeline {
    config: PreprocessConfig,
    loader: AudioLoader,
    trimmer: SilenceTrimmer,
    gate: DurationGate,
    normalizer: LoudnessNormalizer,
    extractor: Arc<dyn FeatureExtractor>,
    classifier: Arc<dyn Classifier>,
    padding: PaddingPolicy,
}

impl InferencePipeline {
    /// Собрать пайплайн из готовых экстрактора и классификатора.
    ///
    /// # Ошибки
    /// - некорректный `config`;
    /// - частота экстрактора не совпадает с `config.target_sample_rate`.
    pub fn new(
        config: PreprocessConfig,
        extractor: Arc<dyn FeatureExtractor>,
        classifier: Arc<dyn Classifier>,
    ) -> ClfResult<Self> {
        config.validate()?;
        if extractor.sample_rate() != config.target_sample_rate {
            return Err(ClfError::Config(format!(
                "Экстрактор ожидает {} Гц, предобработка выдаёт {} Гц",
                extractor.sample_rate(),
                config.target_sample_rate
            )));
        }

        Ok(Self {
            loader: AudioLoader::new(config.target_sample_rate),
            trimmer: SilenceTrimmer::from_config(&config),
            gate: DurationGate::from_config(&config),
            normalizer: LoudnessNormalizer::from_config(&config),
            extractor,
            classifier,
            padding: PaddingPolicy::Longest,
            config,
        })
    }

    /// Загрузить модель из директории и собрать пайплайн.
    ///
    /// `preprocessor_config.json` необязателен.
    pub fn from_model_dir(
        model_dir: impl AsRef<Path>,
        device: &Device,
        config: PreprocessConfig,
    ) -> ClfResult<Self> {
        let model_dir = model_dir.as_ref();
        let extractor_config =
            ExtractorConfig::from_file_or_default(model_dir.join(PREPROCESSOR_CONFIG_FILE))?;
        let extractor = WaveformFeatureExtractor::new(extractor_config, device);
        let classifier = PooledHeadClassifier::load(model_dir, device)?;

        Self::new(config, Arc::new(extractor), Arc::new(classifier))
    }

    /// Имя модели.
    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    /// Частота, к которой приводится вход.
    pub fn sample_rate(&self) -> u32 {
        self.config.target_sample_rate
    }

    /// Метки в порядке выходов модели.
    pub fn labels(&self) -> Vec<&'static str> {
        Label::all().iter().map(|l| l.as_str()).collect()
    }

    /// Обработать загруженный файл.
    ///
    /// Никогда не паникует и не возвращает `Err`: любой итог - это [`Outcome`].
    pub fn run(&self, data: &[u8]) -> Outcome {
        let start = Instant::now();
        let outcome = match self.preprocess(data) {
            Ok(GateDecision::TooShort { samples, required }) => {
                Outcome::Rejected(RejectReason::TooShort { samples, required })
            }
            Ok(GateDecision::Pass(buffer)) => self.classify_buffer(buffer).into(),
            Err(err) => Outcome::Failed(err),
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &outcome {
            Outcome::Classified(result) => {
                info!("Клип классифицирован: {} за {:.1} мс", result.label, elapsed_ms)
            }
            Outcome::Rejected(reason) => info!("Клип отклонён: {}", reason),
            Outcome::Failed(err) => warn!("Ошибка обработки клипа: {}", err),
        }
        outcome
    }

    /// Состояния `loaded` → `gated`: декодирование, обрезка, гейт.
    pub fn preprocess(&self, data: &[u8]) -> ClfResult<GateDecision> {
        let loaded = self.loader.load(data)?;
        debug!(
            "Загружено {} сэмплов ({:.2} с, {} Гц)",
            loaded.num_samples(),
            loaded.duration(),
            loaded.sample_rate
        );

        let trimmed = self.trimmer.trim(loaded);
        Ok(self.gate.check(trimmed))
    }

    /// Состояние `classified`: нормализация, признаки, логиты, softmax.
    pub fn classify_buffer(&self, mut buffer: AudioBuffer) -> ClfResult<ClassificationResult> {
        self.normalizer.normalize(&mut buffer);

        let input = self
            .extractor
            .extract(&buffer.samples, buffer.sample_rate, self.padding)?;
        let logits = self.classifier.classify(&input)?;
        scores::to_result(&logits)
    }
}
