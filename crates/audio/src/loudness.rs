//! RMS loudness normalization.

use clf_core::{AudioBuffer, PreprocessConfig};
use tracing::debug;

/// Rescales a clip so its RMS matches a fixed dBFS target.
#[derive(Debug, Clone, Copy)]
pub struct LoudnessNormalizer {
    /// Target RMS, linear amplitude.
    pub target_rms: f32,

    /// Clips at or below this RMS are left alone.
    pub rms_floor: f32,
}

impl LoudnessNormalizer {
    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            target_rms: config.target_rms(),
            rms_floor: config.rms_floor,
        }
    }

    /// Normalize in place. Returns the applied gain (1.0 when skipped).
    pub fn normalize(&self, buffer: &mut AudioBuffer) -> f32 {
        let rms = buffer.rms();
        if rms <= self.rms_floor {
            debug!("RMS {:.2e} at or below floor, skipping normalization", rms);
            return 1.0;
        }

        let gain = self.target_rms / rms;
        for sample in buffer.samples.iter_mut() {
            *sample *= gain;
        }

        debug!(
            "RMS normalization: rms={:.2} dBFS, gain={:.2} dB",
            20.0 * rms.log10(),
            20.0 * gain.log10()
        );
        gain
    }
}

impl Default for LoudnessNormalizer {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}
