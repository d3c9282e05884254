//! Minimum duration gate.

use clf_core::{AudioBuffer, PreprocessConfig};

/// Verdict of the duration gate.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Long enough to classify.
    Pass(AudioBuffer),
    /// Too short; carries the observed and required sample counts.
    TooShort { samples: usize, required: usize },
}

/// Soft-rejects clips shorter than a minimum number of samples.
#[derive(Debug, Clone, Copy)]
pub struct DurationGate {
    min_samples: usize,
}

impl DurationGate {
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self::new(config.min_samples())
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn check(&self, buffer: AudioBuffer) -> GateDecision {
        let samples = buffer.num_samples();
        if samples < self.min_samples {
            GateDecision::TooShort {
                samples,
                required: self.min_samples,
            }
        } else {
            GateDecision::Pass(buffer)
        }
    }
}

impl Default for DurationGate {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let gate = DurationGate::default();
        assert_eq!(gate.min_samples(), 6400);

        let short = AudioBuffer::mono(vec![0.1; 6399], 16000);
        assert_eq!(
            gate.check(short),
            GateDecision::TooShort {
                samples: 6399,
                required: 6400
            }
        );

        let exact = AudioBuffer::mono(vec![0.1; 6400], 16000);
        assert!(matches!(gate.check(exact), GateDecision::Pass(_)));
    }

    #[test]
    fn test_empty_clip_is_rejected() {
        let gate = DurationGate::default();
        assert!(matches!(
            gate.check(AudioBuffer::mono(vec![], 16000)),
            GateDecision::TooShort { samples: 0, .. }
        ));
    }
}
