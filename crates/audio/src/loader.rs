//! Audio loading from in-memory uploads.
//!
//! Container and codec are probed by Symphonia, so WAV, FLAC, MP3, OGG/Vorbis
//! and AAC/MP4 uploads all go through the same path. Nothing touches the disk.

use std::io::Cursor;

use clf_core::{AudioBuffer, ClfError, ClfResult};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::resample::Resampler;

/// Decode raw audio bytes into an interleaved buffer at the source rate.
pub fn decode_bytes(data: &[u8]) -> ClfResult<AudioBuffer> {
    if data.is_empty() {
        return Err(ClfError::Decode("empty audio payload".to_string()));
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ClfError::Decode(format!("Failed to probe audio format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ClfError::Decode("No supported audio tracks".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ClfError::Decode(format!("Unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(ClfError::Decode(format!(
                    "Failed to read audio packet: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Corrupt frame: skip it, the rest of the stream may still be usable.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(ClfError::Decode(format!(
                    "Failed to decode audio packet: {}",
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count());

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let sample_rate =
        sample_rate.ok_or_else(|| ClfError::Decode("Unknown sample rate".to_string()))?;
    let channels = channels.unwrap_or(1);
    if channels == 0 {
        return Err(ClfError::Decode("Invalid channel count: 0".to_string()));
    }

    debug!(
        "Decoded {} samples ({} ch) at {} Hz",
        samples.len(),
        channels,
        sample_rate
    );

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

/// Convert multi-channel audio to mono by averaging channels.
pub fn to_mono(buffer: &AudioBuffer) -> AudioBuffer {
    if buffer.channels <= 1 {
        return buffer.clone();
    }

    let mono_samples: Vec<f32> = buffer
        .samples
        .chunks(buffer.channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect();

    AudioBuffer::new(mono_samples, buffer.sample_rate, 1)
}

/// Decodes uploads into mono audio at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct AudioLoader {
    resampler: Resampler,
}

impl AudioLoader {
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            resampler: Resampler::new(target_sample_rate),
        }
    }

    /// Decode, downmix and resample.
    pub fn load(&self, data: &[u8]) -> ClfResult<AudioBuffer> {
        let decoded = decode_bytes(data)?;
        let mono = to_mono(&decoded);
        self.resampler.resample(&mono)
    }
}

impl Default for AudioLoader {
    fn default() -> Self {
        Self::new(clf_core::config::TARGET_SAMPLE_RATE)
    }
}
