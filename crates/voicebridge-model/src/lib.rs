//! `ModelDriver`: owns the bidirectional HTTP/2 stream to the speech model
//! for one call, serializes outbound events through the grammar-checked
//! single-writer lanes in [`request_stream`], and demultiplexes inbound
//! events into the typed mailboxes [`response_demux`] dispatches into.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod driver;
mod grammar;
mod request_stream;
mod response_demux;
mod wire;

pub use driver::{ModelCallHandle, ModelDriver};
pub use grammar::Grammar;
pub use request_stream::{RequestStream, run_writer};
pub use response_demux::{ResponseMailboxes, run_demuxer};
pub use wire::{InboundFrame, OutboundFrame, WireError};
