/// What `OutputPacer` does when the model produces audio faster than it
/// can be drained to the telephony peer and the buffer hits its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOverflowPolicy {
    /// Discard the oldest buffered frames to make room for new ones. The
    /// telephony peer hears a discontinuity rather than growing latency
    /// without bound.
    DropOldest,
}

/// A point-in-time snapshot of how full an output buffer is, used for
/// overflow decisions and for emitting `BridgeEvent::OutputBufferOverflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBufferStats {
    pub buffered_bytes: usize,
    pub buffered_duration_ms: u64,
    pub max_duration_ms: u64,
}

impl OutputBufferStats {
    #[must_use]
    pub const fn is_over_capacity(&self) -> bool {
        self.buffered_duration_ms > self.max_duration_ms
    }
}
