//! `SessionCoordinator` and `SessionRegistry`: wires `InputFlow`,
//! `ModelDriver`, `OutputPacer`, and `ToolRunner` together for one
//! telephony call and tracks the set of calls currently in progress.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod coordinator;
mod input_flow;
mod registry;

pub use coordinator::{SessionCoordinator, SessionDeps};
pub use input_flow::InputFlow;
pub use registry::{SessionHandle, SessionRegistry};
