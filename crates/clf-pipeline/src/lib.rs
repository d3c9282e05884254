//! # clf-pipeline
//!
//! Обработка одного запроса: байты → аудио → обрезка → гейт →
//! нормализация → признаки → логиты → вероятности.
//!
//! `InferencePipeline` - неизменяемый сервисный объект. Он создаётся один
//! раз при старте, разделяется между запросами через `Arc` и не хранит
//! состояния между вызовами.
//!
//! # Пример
//!
//! ```ignore
//! use clf_pipeline::{InferencePipeline, Outcome};
//! use clf_core::PreprocessConfig;
//!
//! let pipeline = InferencePipeline::from_model_dir(
//!     "models/voice-clf",
//!     &candle_core::Device::Cpu,
//!     PreprocessConfig::default(),
//! )?;
//!
//! match pipeline.run(&bytes) {
//!     Outcome::Classified(result) => println!("{}", result.label),
//!     Outcome::Rejected(reason) => println!("unknown: {}", reason),
//!     Outcome::Failed(err) => eprintln!("{}", err),
//! }
//! ```

mod outcome;
mod pipeline;
pub mod scores;

pub use outcome::{Outcome, RejectReason};
pub use pipeline::InferencePipeline;
