use std::collections::VecDeque;

use voicebridge_core::{BufferOverflowPolicy, OutputBufferStats};

/// Bytes-per-millisecond for 8kHz mu-law (1 byte/sample, 8 samples/ms).
const MULAW_8K_BYTES_PER_MS: usize = 8;

/// Bytes in one 20ms telephony frame at 8kHz mu-law.
pub const MULAW_FRAME_BYTES: usize = MULAW_8K_BYTES_PER_MS * 20;

/// A FIFO byte buffer of telephony-ready (8kHz mu-law) audio, with a
/// capacity expressed in milliseconds rather than bytes so callers never
/// have to redo the sample-rate arithmetic themselves.
///
/// Every frame that reaches this buffer has already been through
/// `voicebridge_codec::pcm16_any_to_mulaw8k`; this type only ever sees
/// mu-law bytes.
pub struct OutputBuffer {
    bytes: VecDeque<u8>,
    max_buffer_ms: u32,
    overflow_policy: BufferOverflowPolicy,
    dropped_frames: u32,
}

impl OutputBuffer {
    #[must_use]
    pub fn new(max_buffer_ms: u32) -> Self {
        Self {
            bytes: VecDeque::new(),
            max_buffer_ms,
            overflow_policy: BufferOverflowPolicy::DropOldest,
            dropped_frames: 0,
        }
    }

    fn max_bytes(&self) -> usize {
        self.max_buffer_ms as usize * MULAW_8K_BYTES_PER_MS
    }

    /// Push mu-law bytes onto the end of the buffer, dropping the oldest
    /// bytes first if this push would exceed `max_buffer_ms`.
    ///
    /// Returns the number of bytes dropped (0 if none).
    pub fn push(&mut self, mulaw_bytes: &[u8]) -> usize {
        self.bytes.extend(mulaw_bytes.iter().copied());

        let max_bytes = self.max_bytes();
        let mut dropped = 0usize;
        let BufferOverflowPolicy::DropOldest = self.overflow_policy;
        while self.bytes.len() > max_bytes {
            self.bytes.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            self.dropped_frames += (dropped / MULAW_FRAME_BYTES) as u32;
        }
        dropped
    }

    /// Pop up to `quantum_ms` worth of audio, in whole bytes. Returns fewer
    /// bytes than requested (including zero) if the buffer has less than a
    /// full quantum buffered.
    pub fn pop_quantum(&mut self, quantum_ms: u32) -> Vec<u8> {
        let want = quantum_ms as usize * MULAW_8K_BYTES_PER_MS;
        let take = want.min(self.bytes.len());
        self.bytes.drain(..take).collect()
    }

    /// Pop everything remaining, padded with mu-law silence (0xFF) up to a
    /// whole `quantum_ms` frame. Used only by `flush()`: the grammar
    /// invariant is that every outbound frame is exactly one quantum except
    /// the final flushed one, which is padded rather than sent short.
    pub fn pop_quantum_padded(&mut self, quantum_ms: u32) -> Vec<u8> {
        const MULAW_SILENCE: u8 = 0xFF;
        let want = quantum_ms as usize * MULAW_8K_BYTES_PER_MS;
        let mut frame: Vec<u8> = self.bytes.drain(..).collect();
        frame.resize(want, MULAW_SILENCE);
        frame
    }

    /// Discard everything currently buffered, e.g. on barge-in.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn dropped_frames(&self) -> u32 {
        self.dropped_frames
    }

    #[must_use]
    pub fn stats(&self) -> OutputBufferStats {
        OutputBufferStats {
            buffered_bytes: self.bytes.len(),
            buffered_duration_ms: (self.bytes.len() / MULAW_8K_BYTES_PER_MS) as u64,
            max_duration_ms: u64::from(self.max_buffer_ms),
        }
    }
}
