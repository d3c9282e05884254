//! Итог обработки запроса.

use std::fmt;

use clf_core::{ClassificationResult, ClfError, ClfResult};

/// Причина мягкого отказа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// После обрезки тишины осталось меньше `required` сэмплов.
    TooShort { samples: usize, required: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooShort { samples, required } => {
                write!(f, "clip too short: {} < {} samples", samples, required)
            }
        }
    }
}

/// Терминальное состояние запроса.
#[derive(Debug)]
pub enum Outcome {
    /// Мягкий отказ: клиент получает `unknown` с нулевыми вероятностями.
    Rejected(RejectReason),
    /// Успешная классификация.
    Classified(ClassificationResult),
    /// Любая ошибка декодирования, предобработки или инференса.
    Failed(ClfError),
}

impl Outcome {
    /// Тело ответа: отказ превращается в `unknown`, ошибка остаётся ошибкой.
    pub fn into_result(self) -> ClfResult<ClassificationResult> {
        match self {
            Outcome::Rejected(_) => Ok(ClassificationResult::unknown()),
            Outcome::Classified(result) => Ok(result),
            Outcome::Failed(err) => Err(err),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl From<ClfResult<ClassificationResult>> for Outcome {
    fn from(result: ClfResult<ClassificationResult>) -> Self {
        match result {
            Ok(result) => Outcome::Classified(result),
            Err(err) => Outcome::Failed(err),
        }
    }
}
