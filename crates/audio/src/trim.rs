//! Leading/trailing silence trimming.
//!
//! Frame energy is compared against the loudest frame of the clip. Frames are
//! centered (zero padded by `frame_length / 2` on both sides), so frame `t`
//! covers samples `[t * hop - frame_length / 2, t * hop + frame_length / 2)`.
//! The kept range is `[first * hop, min(len, (last + 1) * hop))` over the
//! non-silent frames.

use clf_core::{AudioBuffer, PreprocessConfig};
use tracing::debug;

/// Smallest power value considered by the dB conversion.
const AMIN: f64 = 1e-10;

/// Silence trimmer configuration.
#[derive(Debug, Clone)]
pub struct SilenceTrimmer {
    /// Frames quieter than this many dB below the loudest frame are silence.
    pub top_db: f32,

    /// Trimming is skipped when the peak amplitude is at or below this value.
    pub peak_floor: f32,

    /// Frame size for energy analysis.
    pub frame_length: usize,

    /// Hop between frames.
    pub hop_length: usize,
}

impl Default for SilenceTrimmer {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}

impl SilenceTrimmer {
    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            top_db: config.trim_top_db,
            peak_floor: config.trim_peak_floor,
            frame_length: config.trim_frame_length,
            hop_length: config.trim_hop_length,
        }
    }

    /// Trim the buffer.
    ///
    /// Near-silent clips (peak <= `peak_floor`) are returned unchanged: trimming
    /// them against their own noise floor could leave nothing.
    pub fn trim(&self, buffer: AudioBuffer) -> AudioBuffer {
        let peak = buffer.peak();
        if peak <= self.peak_floor {
            debug!(
                "Peak {:.4} <= {:.4}, skipping trim of {} samples",
                peak,
                self.peak_floor,
                buffer.samples.len()
            );
            return buffer;
        }

        let (start, end) = self.nonsilent_range(&buffer.samples);
        debug!(
            "Trimmed {} samples to [{}, {})",
            buffer.samples.len(),
            start,
            end
        );

        if start == 0 && end == buffer.samples.len() {
            return buffer;
        }

        let AudioBuffer {
            mut samples,
            sample_rate,
            channels,
        } = buffer;
        samples.truncate(end);
        samples.drain(..start);
        AudioBuffer::new(samples, sample_rate, channels)
    }

    /// Sample range `[start, end)` spanned by non-silent frames.
    pub fn nonsilent_range(&self, samples: &[f32]) -> (usize, usize) {
        let energies = self.frame_energies(samples);
        let reference = energies.iter().copied().fold(0.0f64, f64::max);
        let ref_db = 10.0 * reference.max(AMIN).log10();
        let threshold = -(self.top_db as f64);

        let mut nonsilent = energies
            .iter()
            .enumerate()
            .filter(|(_, &e)| 10.0 * e.max(AMIN).log10() - ref_db > threshold)
            .map(|(i, _)| i);

        let Some(first) = nonsilent.next() else {
            return (0, 0);
        };
        let last = nonsilent.last().unwrap_or(first);

        let start = (first * self.hop_length).min(samples.len());
        let end = ((last + 1) * self.hop_length).min(samples.len());
        (start, end.max(start))
    }

    /// Mean-square energy of each centered frame.
    fn frame_energies(&self, samples: &[f32]) -> Vec<f64> {
        let hop = self.hop_length.max(1);
        let frame = self.frame_length.max(1);
        let half = frame / 2;
        let n_frames = 1 + samples.len() / hop;

        // Prefix sums of squares make each frame O(1).
        let mut prefix = Vec::with_capacity(samples.len() + 1);
        prefix.push(0.0f64);
        let mut acc = 0.0f64;
        for &s in samples {
            acc += (s as f64) * (s as f64);
            prefix.push(acc);
        }

        (0..n_frames)
            .map(|t| {
                let center = t * hop;
                let lo = center.saturating_sub(half).min(samples.len());
                let hi = (center + frame - half).min(samples.len());
                (prefix[hi] - prefix[lo]) / frame as f64
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect()
    }

    #[test]
    fn test_quiet_clip_is_untouched() {
        let mut samples = vec![0.0f32; 8000];
        samples.extend(tone(8000, 0.009));
        let buffer = AudioBuffer::mono(samples, 16000);

        let trimmed = SilenceTrimmer::default().trim(buffer.clone());
        assert_eq!(trimmed, buffer);
    }

    #[test]
    fn test_silent_clip_is_untouched() {
        let buffer = AudioBuffer::mono(vec![0.0; 3200], 16000);
        let trimmed = SilenceTrimmer::default().trim(buffer.clone());
        assert_eq!(trimmed, buffer);
    }

    #[test]
    fn test_leading_and_trailing_silence_removed() {
        let mut samples = vec![0.0f32; 16000];
        samples.extend(tone(16000, 0.5));
        samples.extend(vec![0.0f32; 16000]);

        let trimmed = SilenceTrimmer::default().trim(AudioBuffer::mono(samples, 16000));

        // Frame granularity: edges land within one frame of the tone boundaries.
        assert!(trimmed.samples.len() >= 16000);
        assert!(trimmed.samples.len() <= 16000 + 2 * 2048);
        assert!(trimmed.samples.len() % 512 == 0 || trimmed.samples.len() == 48000);
    }

    #[test]
    fn test_loud_clip_without_silence_keeps_length() {
        let samples = tone(16000, 0.5);
        let trimmed = SilenceTrimmer::default().trim(AudioBuffer::mono(samples.clone(), 16000));
        assert_eq!(trimmed.samples, samples);
    }

    #[test]
    fn test_nonsilent_range_bounds() {
        let trimmer = SilenceTrimmer::default();
        let mut samples = vec![0.0f32; 10240];
        samples.extend(tone(5120, 0.8));
        let (start, end) = trimmer.nonsilent_range(&samples);

        assert_eq!(start % 512, 0);
        assert!(start <= 10240 && start >= 10240 - 1024);
        assert_eq!(end, samples.len());
    }
}
