//! Audio resampling.

use clf_core::{AudioBuffer, ClfError, ClfResult};
use rubato::{FftFixedInOut, Resampler as RubatoResampler};
use tracing::debug;

/// Audio resampler for converting sample rates.
#[derive(Debug, Clone)]
pub struct Resampler {
    target_sample_rate: u32,
}

impl Resampler {
    /// Create a new resampler with target sample rate.
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Resample audio buffer to target sample rate.
    pub fn resample(&self, buffer: &AudioBuffer) -> ClfResult<AudioBuffer> {
        if buffer.sample_rate == self.target_sample_rate || buffer.samples.is_empty() {
            return Ok(AudioBuffer::new(
                buffer.samples.clone(),
                self.target_sample_rate,
                buffer.channels,
            ));
        }

        // Ensure mono audio
        if buffer.channels != 1 {
            return Err(ClfError::Audio(
                "Resampling requires mono audio. Use to_mono() first.".to_string(),
            ));
        }
        if buffer.sample_rate == 0 {
            return Err(ClfError::Audio("Source sample rate is 0".to_string()));
        }

        let ratio = self.target_sample_rate as f64 / buffer.sample_rate as f64;
        let expected_len = (buffer.samples.len() as f64 * ratio).ceil() as usize;

        let mut resampler = FftFixedInOut::<f32>::new(
            buffer.sample_rate as usize,
            self.target_sample_rate as usize,
            1024,
            1, // mono
        )
        .map_err(|e| ClfError::Audio(format!("Failed to create resampler: {}", e)))?;

        // FftFixedInOut rounds the requested chunk to a multiple of the rate ratio.
        let chunk_size = resampler.input_frames_next();
        // The first `delay` output frames are filter latency, not signal.
        let delay = resampler.output_delay();
        let needed = expected_len + delay;
        debug!(
            "Resampling {} samples {} Hz -> {} Hz (chunk {}, delay {})",
            buffer.samples.len(),
            buffer.sample_rate,
            self.target_sample_rate,
            chunk_size,
            delay
        );

        let mut output = Vec::with_capacity(needed + resampler.output_frames_next());

        // Zero chunks after the end of the input flush the latency out.
        let mut pos = 0;
        while output.len() < needed {
            let start = pos.min(buffer.samples.len());
            let end = (pos + chunk_size).min(buffer.samples.len());
            let mut chunk = buffer.samples[start..end].to_vec();
            chunk.resize(chunk_size, 0.0);

            let input_chunk = vec![chunk];
            let output_chunk = resampler
                .process(&input_chunk, None)
                .map_err(|e| ClfError::Audio(format!("Resampling failed: {}", e)))?;
            output.extend_from_slice(&output_chunk[0]);
            pos += chunk_size;
        }

        output.truncate(needed);
        output.drain(..delay);

        Ok(AudioBuffer::new(output, self.target_sample_rate, 1))
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(clf_core::config::TARGET_SAMPLE_RATE)
    }
}
