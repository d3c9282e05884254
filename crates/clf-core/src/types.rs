//! Общие типы для классификации аудио.
//!
//! Содержит базовые структуры данных, используемые всеми крейтами workspace:
//! аудио-буфер, фиксированный набор классов, вход модели и результат.

use std::collections::BTreeMap;
use std::fmt;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Аудио-буфер
// ---------------------------------------------------------------------------

/// Буфер необработанного аудио.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Аудио-сэмплы (обычно в диапазоне [-1.0, 1.0]), interleaved для channels > 1.
    pub samples: Vec<f32>,

    /// Частота дискретизации в Гц.
    pub sample_rate: u32,

    /// Количество каналов.
    pub channels: usize,
}

impl AudioBuffer {
    /// Создать новый буфер аудио.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Моно-буфер.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    /// Длительность в секундах.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as usize * self.channels) as f32
    }

    /// Количество сэмплов на канал.
    pub fn num_samples(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Пиковая абсолютная амплитуда (0.0 для пустого буфера).
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    /// Среднеквадратичная амплитуда (0.0 для пустого буфера).
    ///
    /// Сумма копится в f64: на длинных клипах f32 заметно теряет точность.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / self.samples.len() as f64).sqrt() as f32
    }
}

// ---------------------------------------------------------------------------
// Классы
// ---------------------------------------------------------------------------

/// Зарезервированная метка для мягкого отказа (слишком короткий клип).
///
/// Не входит в [`Label::all()`].
pub const UNKNOWN_LABEL: &str = "unknown";

/// Класс модели. Порядок вариантов совпадает с выходами классификатора.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Живая речь.
    Orig,
    /// Синтезированная речь.
    Tts,
    /// Синтезированная речь, прошедшая через GSM-кодек.
    TtsGsm,
}

impl Label {
    /// Все классы в порядке индексов модели.
    pub fn all() -> &'static [Label] {
        &[Label::Orig, Label::Tts, Label::TtsGsm]
    }

    /// Количество классов.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Строковое имя класса (ключ в JSON-ответе).
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Orig => "orig",
            Label::Tts => "tts",
            Label::TtsGsm => "tts_gsm",
        }
    }

    /// Индекс выхода модели.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Класс по индексу выхода модели.
    pub fn from_index(index: usize) -> Option<Label> {
        Self::all().get(index).copied()
    }

    /// Парсинг из строки (точное совпадение с [`Self::as_str`]).
    pub fn from_name(name: &str) -> Option<Label> {
        Self::all().iter().copied().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Вход модели
// ---------------------------------------------------------------------------

/// Политика паддинга для экстрактора признаков.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingPolicy {
    /// Паддинг до самой длинной последовательности в батче (для одного клипа - без паддинга).
    #[default]
    Longest,
    /// Паддинг до фиксированной длины. Длинные клипы не обрезаются.
    MaxLength(usize),
}

/// Вход классификатора, подготовленный экстрактором признаков.
#[derive(Debug, Clone)]
pub struct ModelInput {
    /// Тензор формы [batch, samples].
    pub input_values: Tensor,

    /// Маска валидных сэмплов [batch, samples] (1 - сигнал, 0 - паддинг).
    pub attention_mask: Option<Tensor>,
}

impl ModelInput {
    /// Создать вход без маски.
    pub fn new(input_values: Tensor) -> Self {
        Self {
            input_values,
            attention_mask: None,
        }
    }

    /// Добавить маску внимания.
    pub fn with_attention_mask(mut self, mask: Tensor) -> Self {
        self.attention_mask = Some(mask);
        self
    }
}

// ---------------------------------------------------------------------------
// Результат классификации
// ---------------------------------------------------------------------------

/// Результат классификации - тело успешного HTTP-ответа.
///
/// `scores` всегда содержит ровно по одному ключу на каждый [`Label`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Выбранная метка (один из [`Label`] или [`UNKNOWN_LABEL`]).
    #[serde(rename = "result")]
    pub label: String,

    /// Вероятность по каждому классу.
    pub scores: BTreeMap<String, f32>,
}

impl ClassificationResult {
    /// Результат для выбранного класса и вероятностей в порядке [`Label::all()`].
    ///
    /// Недостающие вероятности считаются нулевыми, лишние игнорируются.
    pub fn new(label: Label, probabilities: &[f32]) -> Self {
        let scores = Label::all()
            .iter()
            .map(|l| {
                let p = probabilities.get(l.index()).copied().unwrap_or(0.0);
                (l.as_str().to_string(), p)
            })
            .collect();
        Self {
            label: label.as_str().to_string(),
            scores,
        }
    }

    /// Мягкий отказ: метка `unknown`, все вероятности 0.0.
    pub fn unknown() -> Self {
        let scores = Label::all()
            .iter()
            .map(|l| (l.as_str().to_string(), 0.0))
            .collect();
        Self {
            label: UNKNOWN_LABEL.to_string(),
            scores,
        }
    }

    /// `true` для результата мягкого отказа.
    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }

    /// Вероятность класса.
    pub fn score(&self, label: Label) -> f32 {
        self.scores.get(label.as_str()).copied().unwrap_or(0.0)
    }
}
