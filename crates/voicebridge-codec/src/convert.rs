use thiserror::Error;
use voicebridge_core::{AudioEncoding, AudioFrame};

use crate::mulaw::{linear_to_mulaw, mulaw_to_linear};
use crate::resample::resample_linear;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected {expected:?} input, got {actual:?}")]
    UnexpectedEncoding {
        expected: AudioEncoding,
        actual: AudioEncoding,
    },

    #[error("PCM frame has an odd byte length ({0}), cannot decode 16-bit samples")]
    OddByteLength(usize),
}

fn pcm16_bytes_to_samples(bytes: &[u8]) -> Result<Vec<i16>, CodecError> {
    if bytes.len() % 2 != 0 {
        return Err(CodecError::OddByteLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect())
}

fn samples_to_pcm16_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Telephony-side mu-law at 8kHz to the speech model's 16kHz PCM input.
///
/// This is the only conversion `InputFlow` performs on its way to
/// `ModelDriver`: decode the companded samples, then upsample.
pub fn mulaw8k_to_pcm16_16k(frame: &AudioFrame) -> Result<AudioFrame, CodecError> {
    if frame.encoding != AudioEncoding::Mulaw8k {
        return Err(CodecError::UnexpectedEncoding {
            expected: AudioEncoding::Mulaw8k,
            actual: frame.encoding,
        });
    }
    let pcm8k: Vec<i16> = frame.samples.iter().map(|&b| mulaw_to_linear(b)).collect();
    let pcm16k = resample_linear(&pcm8k, 8_000, 16_000);
    Ok(AudioFrame::new(
        AudioEncoding::Pcm16Le16k,
        samples_to_pcm16_bytes(&pcm16k),
    ))
}

/// Any 16-bit linear PCM frame the model produces (16kHz or 24kHz) to
/// telephony-ready 8kHz mu-law.
///
/// Used by `OutputPacer` on every `AudioOutput` event before it is paced
/// out to the telephony peer.
pub fn pcm16_any_to_mulaw8k(frame: &AudioFrame) -> Result<AudioFrame, CodecError> {
    let from_hz = match frame.encoding {
        AudioEncoding::Pcm16Le16k => 16_000,
        AudioEncoding::Pcm16Le24k => 24_000,
        AudioEncoding::Pcm16Le8k => 8_000,
        AudioEncoding::Mulaw8k => {
            return Err(CodecError::UnexpectedEncoding {
                expected: AudioEncoding::Pcm16Le16k,
                actual: AudioEncoding::Mulaw8k,
            });
        }
    };
    let pcm = pcm16_bytes_to_samples(&frame.samples)?;
    let pcm8k = resample_linear(&pcm, from_hz, 8_000);
    let mulaw: Vec<u8> = pcm8k.iter().map(|&s| linear_to_mulaw(s)).collect();
    Ok(AudioFrame::new(AudioEncoding::Mulaw8k, mulaw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mulaw_to_pcm16_upsamples_and_retags() {
        let frame = AudioFrame::new(AudioEncoding::Mulaw8k, vec![0xFFu8; 160]);
        let converted = mulaw8k_to_pcm16_16k(&frame).unwrap();
        assert_eq!(converted.encoding, AudioEncoding::Pcm16Le16k);
        assert_eq!(converted.samples.len(), 320 * 2);
    }

    #[test]
    fn mulaw_to_pcm16_rejects_wrong_encoding() {
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 4]);
        assert!(matches!(
            mulaw8k_to_pcm16_16k(&frame),
            Err(CodecError::UnexpectedEncoding { .. })
        ));
    }

    #[test]
    fn pcm16_to_mulaw_downsamples_from_24k() {
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le24k, vec![0u8; 480 * 2]);
        let converted = pcm16_any_to_mulaw8k(&frame).unwrap();
        assert_eq!(converted.encoding, AudioEncoding::Mulaw8k);
        assert_eq!(converted.samples.len(), 160);
    }

    #[test]
    fn pcm16_to_mulaw_rejects_odd_byte_length() {
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 3]);
        assert!(matches!(
            pcm16_any_to_mulaw8k(&frame),
            Err(CodecError::OddByteLength(3))
        ));
    }

    #[test]
    fn round_trip_preserves_rough_shape() {
        let original = AudioFrame::new(AudioEncoding::Mulaw8k, vec![0x80u8; 160]);
        let up = mulaw8k_to_pcm16_16k(&original).unwrap();
        let back = pcm16_any_to_mulaw8k(&up).unwrap();
        assert_eq!(back.samples.len(), original.samples.len());
    }
}
