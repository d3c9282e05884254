//! Логиты → вероятности → метка.

use candle_core::{DType, Tensor, D};

use clf_core::{ClassificationResult, ClfError, ClfResult, Label};

/// Softmax по последней оси.
///
/// Принимает логиты формы `[num_labels]` или `[1, num_labels]`; число
/// классов обязано совпадать с [`Label::count()`].
pub fn probabilities(logits: &Tensor) -> ClfResult<Vec<f32>> {
    let logits = match logits.dims() {
        [_] => logits.clone(),
        [1, _] => logits.squeeze(0)?,
        dims => {
            return Err(ClfError::Inference(format!(
                "Неожиданная форма логитов: {:?}",
                dims
            )))
        }
    };

    let n = logits.dim(0)?;
    if n != Label::count() {
        return Err(ClfError::Inference(format!(
            "Модель вернула {} логитов, ожидалось {}",
            n,
            Label::count()
        )));
    }

    let probs = candle_nn::ops::softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?.to_vec1::<f32>()?;
    if probs.iter().any(|p| !p.is_finite()) {
        return Err(ClfError::Inference(
            "Вероятности содержат NaN/Inf".to_string(),
        ));
    }
    Ok(probs)
}

/// Индекс максимума; при равенстве побеждает меньший индекс.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Логиты → готовый результат с полной картой вероятностей.
pub fn to_result(logits: &Tensor) -> ClfResult<ClassificationResult> {
    let probs = probabilities(logits)?;
    let label = argmax(&probs)
        .and_then(Label::from_index)
        .ok_or_else(|| ClfError::Inference("Пустой вектор вероятностей".to_string()))?;
    Ok(ClassificationResult::new(label, &probs))
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let logits = Tensor::new(&[[2.0f32, -1.0, 0.5]], &Device::Cpu).unwrap();
        let probs = probabilities(&logits).unwrap();

        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(probs[0] > probs[2] && probs[2] > probs[1]);
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5, 0.0]), Some(0));
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_equal_logits_choose_orig() {
        let logits = Tensor::new(&[1.0f32, 1.0, 1.0], &Device::Cpu).unwrap();
        let result = to_result(&logits).unwrap();

        assert_eq!(result.label, "orig");
        for label in Label::all() {
            assert!((result.score(*label) - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wrong_label_count_is_error() {
        let logits = Tensor::new(&[[0.1f32, 0.2]], &Device::Cpu).unwrap();
        assert!(matches!(probabilities(&logits), Err(ClfError::Inference(_))));

        let batched = Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(probabilities(&batched), Err(ClfError::Inference(_))));
    }

    #[test]
    fn test_large_logits_stay_finite() {
        let logits = Tensor::new(&[1000.0f32, 0.0, -1000.0], &Device::Cpu).unwrap();
        let result = to_result(&logits).unwrap();
        assert_eq!(result.label, "orig");
        assert!((result.score(Label::Orig) - 1.0).abs() < 1e-6);
    }
}
