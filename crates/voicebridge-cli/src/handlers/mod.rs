//! Command handlers, dispatched to from `main`.

pub mod serve;
