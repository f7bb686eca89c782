//! Jitter buffering and fixed-cadence output pacing for telephony-bound
//! audio.
//!
//! The model produces audio in bursts that have no fixed relationship to
//! wall-clock playback time; telephony providers expect a steady drip of
//! fixed-size frames. `OutputPacer` is the component that reconciles the
//! two, backed by a bounded, drop-oldest `OutputBuffer`.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod buffer;
mod pacer;

pub use buffer::OutputBuffer;
pub use pacer::{OutputPacer, PacerOutput};
