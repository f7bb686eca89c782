//! Command-line entry point for the voice bridge: argument parsing,
//! layered configuration loading, and the composition root that wires
//! the model driver, knowledge client, and tool directory into a running
//! server.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod cli;
pub mod config;
pub mod context;
pub mod event_emitter;
pub mod handlers;
pub mod tool_directory;

pub use cli::{Cli, Commands};
pub use context::{Bootstrapped, bootstrap};
pub use event_emitter::TracingEventEmitter;
