//! Экстрактор признаков для моделей, работающих с сырой волной.
//!
//! Повторяет поведение wav2vec2-экстрактора: нормализация к нулевому
//! среднему и единичной дисперсии, паддинг справа, без обрезки.

use candle_core::{Device, Tensor};
use tracing::debug;

use clf_core::{ClfError, ClfResult, FeatureExtractor, ModelInput, PaddingPolicy};

use crate::config::ExtractorConfig;

/// Добавка к дисперсии при нормализации.
const VARIANCE_EPS: f64 = 1e-7;

/// Экстрактор: волна → `input_values` [1, T] (+ маска).
#[derive(Debug, Clone)]
pub struct WaveformFeatureExtractor {
    config: ExtractorConfig,
    device: Device,
}

impl WaveformFeatureExtractor {
    pub fn new(config: ExtractorConfig, device: &Device) -> Self {
        Self {
            config,
            device: device.clone(),
        }
    }
}

/// `(x - mean) / sqrt(var + 1e-7)`.
pub fn zero_mean_unit_var(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let inv_std = 1.0 / (var + VARIANCE_EPS).sqrt();
    samples
        .iter()
        .map(|&x| ((x as f64 - mean) * inv_std) as f32)
        .collect()
}

impl FeatureExtractor for WaveformFeatureExtractor {
    fn sample_rate(&self) -> u32 {
        self.config.sampling_rate
    }

    fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        padding: PaddingPolicy,
    ) -> ClfResult<ModelInput> {
        if sample_rate != self.config.sampling_rate {
            return Err(ClfError::Inference(format!(
                "Экстрактор ожидает {} Гц, получено {} Гц",
                self.config.sampling_rate, sample_rate
            )));
        }
        if samples.is_empty() {
            return Err(ClfError::Inference("Пустой вход экстрактора".into()));
        }

        let mut values = if self.config.do_normalize {
            zero_mean_unit_var(samples)
        } else {
            samples.to_vec()
        };

        let valid = values.len();
        let target = match padding {
            PaddingPolicy::Longest => valid,
            PaddingPolicy::MaxLength(n) => n.max(valid),
        };
        values.resize(target, self.config.padding_value);

        debug!(
            "Экстрактор: {} сэмплов, паддинг до {} ({:?})",
            valid, target, padding
        );

        let input_values = Tensor::from_vec(values, (1, target), &self.device)?;
        let mut input = ModelInput::new(input_values);

        if self.config.return_attention_mask || target > valid {
            let mut mask = vec![1u32; valid];
            mask.resize(target, 0);
            input = input.with_attention_mask(Tensor::from_vec(mask, (1, target), &self.device)?);
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(config: ExtractorConfig) -> WaveformFeatureExtractor {
        WaveformFeatureExtractor::new(config, &Device::Cpu)
    }

    #[test]
    fn test_normalized_output_statistics() {
        let samples: Vec<f32> = (0..16000).map(|i| 0.3 + 0.1 * (i as f32 * 0.05).sin()).collect();
        let input = extractor(ExtractorConfig::default())
            .extract(&samples, 16000, PaddingPolicy::Longest)
            .unwrap();

        assert_eq!(input.input_values.dims(), &[1, 16000]);
        assert!(input.attention_mask.is_none());

        let values = input.input_values.squeeze(0).unwrap().to_vec1::<f32>().unwrap();
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
        assert!(mean.abs() < 1e-4);
        assert!((var - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_max_length_pads_without_truncating() {
        let ex = extractor(ExtractorConfig {
            do_normalize: false,
            ..Default::default()
        });

        let padded = ex
            .extract(&[0.5, 0.5, 0.5], 16000, PaddingPolicy::MaxLength(5))
            .unwrap();
        assert_eq!(
            padded.input_values.squeeze(0).unwrap().to_vec1::<f32>().unwrap(),
            vec![0.5, 0.5, 0.5, 0.0, 0.0]
        );
        let mask = padded.attention_mask.unwrap();
        assert_eq!(mask.squeeze(0).unwrap().to_vec1::<u32>().unwrap(), vec![1, 1, 1, 0, 0]);

        let long = ex
            .extract(&[0.1; 8], 16000, PaddingPolicy::MaxLength(5))
            .unwrap();
        assert_eq!(long.input_values.dims(), &[1, 8]);
    }

    #[test]
    fn test_sample_rate_mismatch_is_error() {
        let err = extractor(ExtractorConfig::default())
            .extract(&[0.0; 100], 8000, PaddingPolicy::Longest)
            .unwrap_err();
        assert!(matches!(err, ClfError::Inference(_)));
    }

    #[test]
    fn test_constant_signal_does_not_blow_up() {
        let values = zero_mean_unit_var(&[0.25; 64]);
        assert!(values.iter().all(|v| v.is_finite() && v.abs() < 1e-3));
    }
}
