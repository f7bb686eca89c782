//! Telephony WebSocket transport adapter and HTTP knowledge client.
//!
//! The wire-format parsing ([`wire`]) and the `TelephonyReceiver`/
//! `TelephonySender` port implementations over a real `axum` socket
//! ([`ws_transport`]) live here, along with the one HTTP outbound
//! collaborator the bridge needs ([`knowledge_client`]). [`bootstrap`] and
//! [`routes`] assemble those into a server; [`handlers`] holds the
//! `/stream` upgrade and `/healthz` endpoints themselves.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod knowledge_client;
pub mod routes;
pub mod state;
pub mod wire;
pub mod ws_transport;

pub use bootstrap::{ServerConfig, start_server};
pub use error::{HttpError, TransportError};
pub use handlers::{healthz, stream};
pub use knowledge_client::HttpKnowledgeClient;
pub use routes::{CorsConfig, create_router};
pub use state::{AppState, BridgeContext};
pub use wire::{InboundFrame, OutboundFrame, WireError};
pub use ws_transport::{WsTelephonyReceiver, WsTelephonySender};
