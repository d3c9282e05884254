//! # audio
//!
//! Audio preprocessing for the voice classifier.
//!
//! This crate handles:
//! - Decoding uploaded bytes (any container Symphonia can probe)
//! - Downmixing to mono and resampling to the target sample rate (16kHz)
//! - Conditional silence trimming
//! - Minimum duration gating
//! - RMS loudness normalization

pub mod gate;
pub mod loader;
pub mod loudness;
pub mod resample;
pub mod trim;

pub use gate::{DurationGate, GateDecision};
pub use loader::{AudioLoader, decode_bytes, to_mono};
pub use loudness::LoudnessNormalizer;
pub use resample::Resampler;
pub use trim::SilenceTrimmer;
