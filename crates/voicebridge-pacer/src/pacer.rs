use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use voicebridge_core::{AppEventEmitter, AudioFrame, BridgeError, BridgeEvent, CallId, PacerConfig};
use voicebridge_codec::pcm16_any_to_mulaw8k;

use crate::buffer::{MULAW_FRAME_BYTES, OutputBuffer};

/// One outbound frame `OutputPacer` hands to the telephony adapter.
/// The adapter is responsible for base64-encoding `payload` and wrapping
/// it in the telephony wire envelope (`media` / `mark` JSON messages);
/// pacing logic itself knows nothing about that envelope.
#[derive(Debug, Clone)]
pub enum PacerOutput {
    /// `quantum_ms` worth of 8kHz mu-law audio, in wire order.
    Media { payload: Vec<u8>, sequence: u64 },
    /// A playback checkpoint marker, sent once the buffer has fully
    /// drained following a `flush()` call.
    Mark { name: String, sequence: u64 },
}

/// Paces model-produced audio out to the telephony peer at a fixed
/// cadence, regardless of how bursty the model's own output is.
///
/// Mirrors the ticked-loop-plus-cancellation-token shape used elsewhere in
/// this codebase for background drivers: a `CancellationToken` stops the
/// loop cooperatively, and `tokio::time::interval` with
/// `MissedTickBehavior::Delay` keeps ticks from piling up if the task is
/// briefly descheduled.
pub struct OutputPacer {
    call_id: CallId,
    config: PacerConfig,
    buffer: Mutex<OutputBuffer>,
    sequence: AtomicU64,
    mark_token: AtomicU64,
    out_tx: mpsc::Sender<PacerOutput>,
    cancel: CancellationToken,
    emitter: Arc<dyn AppEventEmitter>,
}

impl OutputPacer {
    /// `session_cancel` is the session's own cancellation token; the pacer
    /// derives a child of it so tripping the session token stops the
    /// pacing loop immediately, without waiting for `stop()` to be called
    /// explicitly during teardown.
    #[must_use]
    pub fn new(
        call_id: CallId,
        config: PacerConfig,
        out_tx: mpsc::Sender<PacerOutput>,
        session_cancel: CancellationToken,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            call_id,
            buffer: Mutex::new(OutputBuffer::new(config.max_buffer_ms)),
            config,
            sequence: AtomicU64::new(1),
            mark_token: AtomicU64::new(1),
            out_tx,
            cancel: session_cancel.child_token(),
            emitter,
        }
    }

    /// Queue model-produced audio for pacing. Converts to telephony mu-law
    /// first; the buffer never holds anything but wire-ready bytes.
    pub async fn enqueue(&self, frame: &AudioFrame) -> Result<(), BridgeError> {
        let mulaw = pcm16_any_to_mulaw8k(frame)
            .map_err(|e| BridgeError::Internal(format!("pacer codec conversion failed: {e}")))?;

        let dropped_bytes = self.buffer.lock().await.push(&mulaw.samples);
        if dropped_bytes > 0 {
            self.emitter.emit(BridgeEvent::OutputBufferOverflow {
                call_id: self.call_id.clone(),
                dropped_frames: (dropped_bytes / MULAW_FRAME_BYTES) as u32,
            });
        }
        Ok(())
    }

    /// Discard whatever is currently buffered without draining it onto the
    /// wire. Used on barge-in: the telephony peer started talking, so
    /// whatever the model was about to say is no longer relevant.
    pub async fn interrupt(&self) {
        self.buffer.lock().await.clear();
    }

    /// Drain the buffer completely, then emit a mark once it is empty,
    /// named with a monotonically increasing token (`bedrock_out_<n>`, per
    /// the wire contract) so the telephony peer can correlate "the model
    /// finished speaking" with a specific point in the audio stream.
    /// `reason` is carried for observability only.
    pub async fn flush(&self, reason: &str) -> Result<(), BridgeError> {
        tracing::debug!(call_id = %self.call_id, reason, "flushing output pacer");
        loop {
            let mut buffer = self.buffer.lock().await;
            if buffer.is_empty() {
                break;
            }
            let stats = buffer.stats();
            let chunk = if stats.buffered_duration_ms >= u64::from(self.config.quantum_ms) {
                buffer.pop_quantum(self.config.quantum_ms)
            } else {
                // Final sub-frame: pad with mu-law silence up to one quantum
                // rather than send it short.
                buffer.pop_quantum_padded(self.config.quantum_ms)
            };
            drop(buffer);
            self.send_media(chunk).await?;
        }
        let token = self.mark_token.fetch_add(1, Ordering::Relaxed);
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.out_tx
            .send(PacerOutput::Mark {
                name: format!("bedrock_out_{token}"),
                sequence,
            })
            .await
            .map_err(|_| BridgeError::ResourceExhaustion("pacer output channel closed".into()))
    }

    async fn send_media(&self, payload: Vec<u8>) -> Result<(), BridgeError> {
        if payload.is_empty() {
            return Ok(());
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.out_tx
            .send(PacerOutput::Media { payload, sequence })
            .await
            .map_err(|_| BridgeError::ResourceExhaustion("pacer output channel closed".into()))
    }

    /// Stop the pacing loop started by `run`. Idempotent. `reason` is carried
    /// for observability only (logged here); it never changes the outcome,
    /// which is unconditional immediate cancellation with no flush.
    pub fn stop(&self, reason: &str) {
        tracing::debug!(call_id = %self.call_id, reason, "stopping output pacer");
        self.cancel.cancel();
    }

    /// Drive the pacing loop: every `tick_ms`, check whether a full
    /// `quantum_ms` of audio has accumulated and, if so, drain and emit
    /// exactly one quantum. Runs until `stop()` is called.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(u64::from(
            self.config.tick_ms,
        )));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!(call_id = %self.call_id, "output pacer stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let chunk = {
                        let mut buffer = self.buffer.lock().await;
                        let stats = buffer.stats();
                        if stats.buffered_duration_ms < u64::from(self.config.quantum_ms) {
                            continue;
                        }
                        buffer.pop_quantum(self.config.quantum_ms)
                    };
                    if let Err(error) = self.send_media(chunk).await {
                        tracing::warn!(call_id = %self.call_id, %error, "failed to emit paced audio");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicebridge_core::{AudioEncoding, NoopEmitter};

    fn pacer() -> (Arc<OutputPacer>, mpsc::Receiver<PacerOutput>) {
        let (tx, rx) = mpsc::channel(16);
        let pacer = Arc::new(OutputPacer::new(
            CallId::new("CA1"),
            PacerConfig::default(),
            tx,
            CancellationToken::new(),
            Arc::new(NoopEmitter::new()),
        ));
        (pacer, rx)
    }

    #[tokio::test]
    async fn flush_drains_buffer_and_emits_mark() {
        let (pacer, mut rx) = pacer();
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 640]); // 20ms
        pacer.enqueue(&frame).await.unwrap();

        pacer.flush("turn-done").await.unwrap();

        let media = rx.recv().await.unwrap();
        assert!(matches!(media, PacerOutput::Media { .. }));
        let mark = rx.recv().await.unwrap();
        assert!(matches!(mark, PacerOutput::Mark { name, .. } if name.starts_with("bedrock_out_")));
    }

    #[tokio::test]
    async fn sequence_numbers_start_at_one_and_increase() {
        let (pacer, mut rx) = pacer();
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 640]); // 20ms
        pacer.enqueue(&frame).await.unwrap();
        pacer.flush("m1").await.unwrap();

        let media = rx.recv().await.unwrap();
        assert!(matches!(media, PacerOutput::Media { sequence: 1, .. }));
        let mark = rx.recv().await.unwrap();
        assert!(matches!(mark, PacerOutput::Mark { sequence: 2, .. }));
    }

    #[tokio::test]
    async fn interrupt_clears_buffer_before_flush() {
        let (pacer, mut rx) = pacer();
        let frame = AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 640]);
        pacer.enqueue(&frame).await.unwrap();

        pacer.interrupt().await;
        pacer.flush("barge-in").await.unwrap();

        // Only the mark should come through; the buffered audio was dropped.
        let only = rx.recv().await.unwrap();
        assert!(matches!(only, PacerOutput::Mark { .. }));
        assert!(rx.try_recv().is_err());
    }
}
