//! PooledHeadClassifier - лёгкий классификатор поверх нарезанной волны.
//!
//! Реализует [`Classifier`] trait, так что пайплайн не зависит от архитектуры.
//!
//! Схема: фреймы волны [n, frame_length] → `feature_projection` → GELU →
//! среднее по времени → `projector` → `classifier` → логиты [1, num_labels].
//! Имена весов `projector` / `classifier` совпадают с головой
//! sequence-classification в экспортах HuggingFace.

use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use tracing::{debug, info};

use clf_core::model_files::{self, CONFIG_FILE};
use clf_core::{Classifier, ClfError, ClfResult, ModelInput};

use crate::config::HeadConfig;

/// Классификатор: проекция фреймов + усреднение + линейная голова.
pub struct PooledHeadClassifier {
    /// Linear(frame_length → hidden_size).
    feature_projection: Linear,
    /// Linear(hidden_size → classifier_proj_size).
    projector: Linear,
    /// Linear(classifier_proj_size → num_labels).
    classifier: Linear,
    /// Конфигурация модели.
    config: HeadConfig,
    /// Устройство (CPU, Metal, CUDA).
    device: Device,
    /// Тип весов.
    dtype: DType,
}

impl PooledHeadClassifier {
    /// Загрузить модель из директории.
    ///
    /// Ожидаемые файлы:
    /// - `config.json` - метки и размеры слоёв
    /// - `model.safetensors` (или шарды) - веса
    pub fn load(model_dir: impl AsRef<Path>, device: &Device) -> ClfResult<Self> {
        let model_dir = model_dir.as_ref();
        info!("Классификатор: загрузка модели из {:?}", model_dir);

        let config_path = model_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(ClfError::Model(format!(
                "Файл {} не найден в {:?}",
                CONFIG_FILE, model_dir
            )));
        }
        let config = HeadConfig::from_file(&config_path)?;

        let weights = model_files::resolve_safetensors_files(model_dir)?;
        let start = Instant::now();

        // Голова маленькая: f32 везде, кроме CUDA.
        let dtype = if device.is_cuda() { DType::BF16 } else { DType::F32 };
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, dtype, device)? };

        let model = Self::from_var_builder(config, vb, device)?;
        info!(
            "Классификатор: '{}' загружен за {:.2}с ({} классов)",
            model.config.model_name,
            start.elapsed().as_secs_f64(),
            model.config.num_labels()
        );
        Ok(model)
    }

    /// Собрать модель из готового `VarBuilder`.
    pub fn from_var_builder(config: HeadConfig, vb: VarBuilder, device: &Device) -> ClfResult<Self> {
        config.validate()?;
        let dtype = vb.dtype();

        let feature_projection = candle_nn::linear(
            config.frame_length,
            config.hidden_size,
            vb.pp("feature_projection"),
        )?;
        let projector = candle_nn::linear(
            config.hidden_size,
            config.classifier_proj_size,
            vb.pp("projector"),
        )?;
        let classifier = candle_nn::linear(
            config.classifier_proj_size,
            config.num_labels(),
            vb.pp("classifier"),
        )?;
        debug!("Классификатор: слои созданы");

        Ok(Self {
            feature_projection,
            projector,
            classifier,
            config,
            device: device.clone(),
            dtype,
        })
    }

    /// Прямой проход: [1, T] → логиты [1, num_labels].
    fn forward(&self, input: &ModelInput) -> ClfResult<Tensor> {
        let (batch, _) = input.input_values.dims2()?;
        if batch != 1 {
            return Err(ClfError::Inference(format!(
                "Ожидается batch=1, получено {}",
                batch
            )));
        }

        let mut values = input
            .input_values
            .to_dtype(DType::F32)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        // Паддинг в голову не попадает.
        if let Some(mask) = &input.attention_mask {
            let valid = mask.to_dtype(DType::F32)?.sum_all()?.to_scalar::<f32>()? as usize;
            values.truncate(valid);
        }

        let frames = frame_waveform(&values, self.config.frame_length, self.config.frame_stride);
        let n_frames = frames.len() / self.config.frame_length;
        debug!("Классификатор: {} фреймов", n_frames);

        let x = Tensor::from_vec(frames, (n_frames, self.config.frame_length), &self.device)?
            .to_dtype(self.dtype)?;

        // 1. Проекция фреймов
        let hidden = self.feature_projection.forward(&x)?.gelu_erf()?;

        // 2. Усреднение по времени: [n, hidden] → [1, hidden]
        let pooled = hidden.mean_keepdim(0)?;

        // 3. Голова
        let projected = self.projector.forward(&pooled)?;
        let logits = self.classifier.forward(&projected)?;

        Ok(logits.to_dtype(DType::F32)?)
    }
}

impl Classifier for PooledHeadClassifier {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    fn classify(&self, input: &ModelInput) -> ClfResult<Tensor> {
        self.forward(input)
    }
}

/// Нарезать волну на фреймы, как свёртка без паддинга.
///
/// Клип короче одного фрейма дополняется нулями до `frame_length`;
/// неполный хвост отбрасывается.
pub fn frame_waveform(samples: &[f32], frame_length: usize, stride: usize) -> Vec<f32> {
    if samples.len() < frame_length {
        let mut frame = samples.to_vec();
        frame.resize(frame_length, 0.0);
        return frame;
    }

    let n_frames = 1 + (samples.len() - frame_length) / stride;
    let mut frames = Vec::with_capacity(n_frames * frame_length);
    for i in 0..n_frames {
        let start = i * stride;
        frames.extend_from_slice(&samples[start..start + frame_length]);
    }
    frames
}
