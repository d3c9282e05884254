//! Конфигурация пайплайна предобработки.
//!
//! Значения по умолчанию - константы обученной модели: менять их имеет смысл
//! только вместе с переобучением.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClfError, ClfResult};

/// Целевая частота дискретизации.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Порог обрезки тишины, дБ ниже опорного уровня.
pub const TRIM_TOP_DB: f32 = 35.0;

/// Обрезка выполняется только при пике выше этого значения.
pub const TRIM_PEAK_FLOOR: f32 = 0.01;

/// Длина фрейма для оценки энергии при обрезке.
pub const TRIM_FRAME_LENGTH: usize = 2048;

/// Шаг фреймов при обрезке.
pub const TRIM_HOP_LENGTH: usize = 512;

/// Минимальная длительность клипа после обрезки, секунды.
pub const MIN_DURATION_SECS: f64 = 0.4;

/// Целевая громкость, dBFS.
pub const TARGET_DBFS: f32 = -20.0;

/// Ниже этого RMS нормализация громкости не выполняется.
pub const RMS_FLOOR: f32 = 1e-6;

/// Параметры предобработки.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Частота, к которой приводится любой вход.
    pub target_sample_rate: u32,

    /// Порог обрезки тишины (дБ ниже опорного уровня).
    pub trim_top_db: f32,

    /// Пик, при котором обрезка ещё пропускается.
    pub trim_peak_floor: f32,

    /// Длина фрейма обрезки.
    pub trim_frame_length: usize,

    /// Шаг фреймов обрезки.
    pub trim_hop_length: usize,

    /// Минимальная длительность, секунды.
    pub min_duration_secs: f64,

    /// Целевая громкость, dBFS.
    pub target_dbfs: f32,

    /// Порог RMS для нормализации.
    pub rms_floor: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: TARGET_SAMPLE_RATE,
            trim_top_db: TRIM_TOP_DB,
            trim_peak_floor: TRIM_PEAK_FLOOR,
            trim_frame_length: TRIM_FRAME_LENGTH,
            trim_hop_length: TRIM_HOP_LENGTH,
            min_duration_secs: MIN_DURATION_SECS,
            target_dbfs: TARGET_DBFS,
            rms_floor: RMS_FLOOR,
        }
    }
}

impl PreprocessConfig {
    /// Загрузить из JSON-файла. Отсутствующие поля берутся по умолчанию.
    pub fn from_file(path: impl AsRef<Path>) -> ClfResult<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: PreprocessConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить согласованность параметров.
    pub fn validate(&self) -> ClfResult<()> {
        if self.target_sample_rate == 0 {
            return Err(ClfError::Config("target_sample_rate must be > 0".into()));
        }
        if self.trim_frame_length == 0 || self.trim_hop_length == 0 {
            return Err(ClfError::Config(
                "trim_frame_length and trim_hop_length must be > 0".into(),
            ));
        }
        if self.trim_top_db <= 0.0 {
            return Err(ClfError::Config("trim_top_db must be > 0".into()));
        }
        if self.min_duration_secs < 0.0 {
            return Err(ClfError::Config("min_duration_secs must be >= 0".into()));
        }
        Ok(())
    }

    /// Минимальное число сэмплов: `floor(rate * min_duration)`.
    pub fn min_samples(&self) -> usize {
        (self.target_sample_rate as f64 * self.min_duration_secs) as usize
    }

    /// Целевой RMS в линейной шкале: `10^(dBFS / 20)`.
    pub fn target_rms(&self) -> f32 {
        10.0_f32.powf(self.target_dbfs / 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let cfg = PreprocessConfig::default();
        assert_eq!(cfg.min_samples(), 6400);
        assert!((cfg.target_rms() - 0.1).abs() < 1e-6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: PreprocessConfig = serde_json::from_str(r#"{"trim_top_db": 40.0}"#).unwrap();
        assert_eq!(cfg.trim_top_db, 40.0);
        assert_eq!(cfg.target_sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(cfg.trim_peak_floor, TRIM_PEAK_FLOOR);
    }

    #[test]
    fn test_validate_rejects_zero_hop() {
        let cfg = PreprocessConfig {
            trim_hop_length: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
