//! HTTP/WebSocket handlers for the telephony transport adapter.

mod health;
mod stream;

pub use health::healthz;
pub use stream::stream;
