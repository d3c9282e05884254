//! Конфигурация классификатора и экстрактора признаков.
//!
//! Поля совпадают с именами из `config.json` / `preprocessor_config.json`
//! экспортов HuggingFace, лишние поля игнорируются.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use clf_core::{ClfError, ClfResult, Label};

fn default_model_name() -> String {
    "pooled-head-clf".to_string()
}

fn default_frame_length() -> usize {
    400
}

fn default_frame_stride() -> usize {
    320
}

/// Конфигурация классификатора (`config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Название модели.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Индекс выхода → имя класса ("0" → "orig", ...).
    pub id2label: BTreeMap<String, String>,

    /// Длина фрейма волны в сэмплах (400 = 25 мс при 16 кГц).
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,

    /// Шаг фреймов (320 = 20 мс при 16 кГц).
    #[serde(default = "default_frame_stride")]
    pub frame_stride: usize,

    /// Размерность проекции фреймов.
    pub hidden_size: usize,

    /// Размерность проектора перед классификатором.
    pub classifier_proj_size: usize,
}

impl HeadConfig {
    /// Загрузить из `config.json`.
    pub fn from_file(path: impl AsRef<Path>) -> ClfResult<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: HeadConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить размеры и порядок меток.
    ///
    /// Набор классов фиксирован: `id2label` обязан в точности повторять
    /// [`Label::all()`], иначе вероятности окажутся под чужими ключами.
    pub fn validate(&self) -> ClfResult<()> {
        if self.frame_length == 0 || self.frame_stride == 0 {
            return Err(ClfError::Config(
                "frame_length и frame_stride должны быть > 0".into(),
            ));
        }
        if self.hidden_size == 0 || self.classifier_proj_size == 0 {
            return Err(ClfError::Config(
                "hidden_size и classifier_proj_size должны быть > 0".into(),
            ));
        }

        let mut ordered: Vec<(usize, &str)> = Vec::with_capacity(self.id2label.len());
        for (id, name) in &self.id2label {
            let idx: usize = id
                .parse()
                .map_err(|_| ClfError::Config(format!("Некорректный индекс метки: {:?}", id)))?;
            ordered.push((idx, name.as_str()));
        }
        ordered.sort_by_key(|(idx, _)| *idx);

        let expected: Vec<(usize, &str)> = Label::all()
            .iter()
            .map(|l| (l.index(), l.as_str()))
            .collect();
        if ordered != expected {
            return Err(ClfError::Config(format!(
                "id2label {:?} не совпадает с ожидаемым набором {:?}",
                ordered, expected
            )));
        }
        Ok(())
    }

    /// Количество выходов модели.
    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }
}

fn default_sampling_rate() -> u32 {
    16_000
}

fn default_true() -> bool {
    true
}

/// Конфигурация экстрактора признаков (`preprocessor_config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Ожидаемая частота дискретизации.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,

    /// Значение для паддинга.
    #[serde(default)]
    pub padding_value: f32,

    /// Нормализация к нулевому среднему и единичной дисперсии.
    #[serde(default = "default_true")]
    pub do_normalize: bool,

    /// Всегда возвращать маску внимания.
    #[serde(default)]
    pub return_attention_mask: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            padding_value: 0.0,
            do_normalize: true,
            return_attention_mask: false,
        }
    }
}

impl ExtractorConfig {
    /// Загрузить из файла; при отсутствии файла - значения по умолчанию.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> ClfResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            info!(
                "{} не найден, использую конфигурацию экстрактора по умолчанию",
                path.display()
            );
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_json(id2label: &str) -> String {
        format!(
            r#"{{"id2label": {}, "hidden_size": 8, "classifier_proj_size": 4, "architectures": ["X"]}}"#,
            id2label
        )
    }

    #[test]
    fn test_head_config_accepts_fixed_labels() {
        let cfg: HeadConfig =
            serde_json::from_str(&head_json(r#"{"0": "orig", "1": "tts", "2": "tts_gsm"}"#))
                .unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.num_labels(), 3);
        assert_eq!(cfg.frame_length, 400);
        assert_eq!(cfg.frame_stride, 320);
    }

    #[test]
    fn test_head_config_rejects_reordered_labels() {
        let cfg: HeadConfig =
            serde_json::from_str(&head_json(r#"{"0": "tts", "1": "orig", "2": "tts_gsm"}"#))
                .unwrap();
        assert!(matches!(cfg.validate(), Err(ClfError::Config(_))));
    }

    #[test]
    fn test_extractor_config_hf_fields() {
        let json = r#"{
            "do_normalize": true,
            "feature_extractor_type": "Wav2Vec2FeatureExtractor",
            "feature_size": 1,
            "padding_side": "right",
            "padding_value": 0.0,
            "return_attention_mask": true,
            "sampling_rate": 16000
        }"#;
        let cfg: ExtractorConfig = serde_json::from_str(json).unwrap();
        assert!(cfg.do_normalize);
        assert!(cfg.return_attention_mask);
        assert_eq!(cfg.sampling_rate, 16000);
    }
}
