//! `ModelDriver`: owns the outbound HTTP/2 request to the speech model and
//! hands `SessionCoordinator` a typed, already-demultiplexed handle to a
//! single call's bidirectional stream.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;

use voicebridge_core::{BridgeError, CallId, ModelConfig, ModelResponseEvent};

use crate::grammar::Grammar;
use crate::request_stream::{RequestStream, run_writer};
use crate::response_demux::{ResponseMailboxes, run_demuxer};

/// Capacity of the channel feeding the outbound HTTP/2 request body. Small
/// and bounded: the writer task already applies backpressure per-lane
/// before anything reaches this channel.
const BODY_CHANNEL_CAPACITY: usize = 64;
/// Capacity of each inbound mailbox handed to `SessionCoordinator`.
const MAILBOX_CAPACITY: usize = 64;

/// Everything a `SessionCoordinator` needs to drive one call's model
/// conversation: a place to send outbound events, and three independent
/// mailboxes to read inbound ones from.
pub struct ModelCallHandle {
    pub requests: Arc<RequestStream>,
    pub audio_and_text: mpsc::Receiver<ModelResponseEvent>,
    pub tool_use: mpsc::Receiver<ModelResponseEvent>,
    pub control: mpsc::Receiver<ModelResponseEvent>,
}

/// Opens and owns the HTTP/2 connection to the speech model endpoint.
///
/// One `ModelDriver` is shared across all calls; `open_call` spins up the
/// per-call request body, writer task, and demuxer task, and is cheap to
/// call repeatedly.
pub struct ModelDriver {
    client: reqwest::Client,
    endpoint: String,
}

impl ModelDriver {
    pub fn new(config: &ModelConfig) -> Result<Self, BridgeError> {
        let region = config
            .region
            .as_deref()
            .ok_or_else(|| BridgeError::ExternalConfigInvalid("model.region is unset".into()))?;
        let model_id = config.model_id.as_deref().ok_or_else(|| {
            BridgeError::ExternalConfigInvalid("model.modelId is unset".into())
        })?;

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| BridgeError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "https://bidirectional-stream.{region}.speech-model.internal/v1/models/{model_id}/stream"
            ),
        })
    }

    /// Open the bidirectional stream for one call and return the handle
    /// `SessionCoordinator` drives for the life of that call.
    pub async fn open_call(&self, call_id: CallId) -> Result<ModelCallHandle, BridgeError> {
        let grammar = Arc::new(Mutex::new(Grammar::new()));
        let (requests, priority_rx, audio_rx) = RequestStream::new(Arc::clone(&grammar));

        let (body_tx, body_rx) = mpsc::channel::<Bytes>(BODY_CHANNEL_CAPACITY);
        tokio::spawn(run_writer(priority_rx, audio_rx, body_tx));

        let body_stream = ReceiverStream::new(body_rx).map(Ok::<_, std::io::Error>);
        let body = reqwest::Body::wrap_stream(body_stream);

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| BridgeError::TransientTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::TransientTransport(format!(
                "model endpoint returned {}",
                response.status()
            )));
        }

        let (audio_tx, audio_and_text) = mpsc::channel(MAILBOX_CAPACITY);
        let (tool_tx, tool_use) = mpsc::channel(MAILBOX_CAPACITY);
        let (control_tx, control) = mpsc::channel(MAILBOX_CAPACITY);

        tokio::spawn(run_demuxer(
            call_id,
            response.bytes_stream(),
            grammar,
            ResponseMailboxes {
                audio_and_text: audio_tx,
                tool_use: tool_tx,
                control: control_tx,
            },
        ));

        Ok(ModelCallHandle {
            requests: Arc::new(requests),
            audio_and_text,
            tool_use,
            control,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_missing_region() {
        let config = ModelConfig {
            region: None,
            model_id: Some("speech-model-1".into()),
            ..Default::default()
        };
        assert!(matches!(
            ModelDriver::new(&config),
            Err(BridgeError::ExternalConfigInvalid(_))
        ));
    }

    #[test]
    fn new_rejects_missing_model_id() {
        let config = ModelConfig {
            region: Some("us-east-1".into()),
            model_id: None,
            ..Default::default()
        };
        assert!(matches!(
            ModelDriver::new(&config),
            Err(BridgeError::ExternalConfigInvalid(_))
        ));
    }

    #[test]
    fn new_builds_endpoint_from_region_and_model_id() {
        let config = ModelConfig {
            region: Some("us-east-1".into()),
            model_id: Some("speech-model-1".into()),
            ..Default::default()
        };
        let driver = ModelDriver::new(&config).unwrap();
        assert!(driver.endpoint.contains("us-east-1"));
        assert!(driver.endpoint.contains("speech-model-1"));
    }
}
