use serde::{Deserialize, Serialize};

/// Sample encoding and rate tag carried alongside raw audio bytes.
///
/// The bridge only ever produces or consumes these four shapes: narrowband
/// telephony mu-law, and the three linear PCM rates the speech model and
/// its turn-detection front end use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// ITU-T G.711 mu-law, 8 kHz, 1 byte/sample. Telephony wire format.
    Mulaw8k,
    /// Signed 16-bit little-endian PCM, 8 kHz.
    Pcm16Le8k,
    /// Signed 16-bit little-endian PCM, 16 kHz. Model input format.
    Pcm16Le16k,
    /// Signed 16-bit little-endian PCM, 24 kHz. Model output format.
    Pcm16Le24k,
}

impl AudioEncoding {
    /// Samples per second for this encoding.
    #[must_use]
    pub const fn sample_rate_hz(self) -> u32 {
        match self {
            Self::Mulaw8k | Self::Pcm16Le8k => 8_000,
            Self::Pcm16Le16k => 16_000,
            Self::Pcm16Le24k => 24_000,
        }
    }

    /// Bytes needed to encode one sample.
    #[must_use]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Mulaw8k => 1,
            Self::Pcm16Le8k | Self::Pcm16Le16k | Self::Pcm16Le24k => 2,
        }
    }
}

/// A contiguous span of audio in a single, known encoding.
///
/// Frames are the unit of work for `Codec`, `OutputPacer`, and `InputFlow`;
/// none of those components ever operate on bare `Vec<u8>`, because the
/// encoding tag is what lets a frame be resampled, paced, or rejected
/// without re-deriving its shape from surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub encoding: AudioEncoding,
    pub samples: Vec<u8>,
}

impl AudioFrame {
    #[must_use]
    pub const fn new(encoding: AudioEncoding, samples: Vec<u8>) -> Self {
        Self { encoding, samples }
    }

    /// Number of complete samples in this frame. Any trailing partial
    /// sample (an odd byte count for 16-bit PCM) is not counted.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.samples.len() / self.encoding.bytes_per_sample()
    }

    /// Duration of this frame in milliseconds, rounded down.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        let samples = self.sample_count() as u64;
        samples.saturating_mul(1000) / u64::from(self.encoding.sample_rate_hz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_ms_for_20ms_mulaw_frame() {
        // 8000 Hz * 0.020s = 160 samples, 1 byte each.
        let frame = AudioFrame::new(AudioEncoding::Mulaw8k, vec![0u8; 160]);
        assert_eq!(frame.duration_ms(), 20);
    }

    #[test]
    fn duration_ms_for_20ms_pcm16_frame() {
        // 16000 Hz * 0.020s = 320 samples, 2 bytes each.
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 640]);
        assert_eq!(frame.duration_ms(), 20);
    }

    #[test]
    fn sample_count_ignores_trailing_partial_sample() {
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 3]);
        assert_eq!(frame.sample_count(), 1);
    }
}
