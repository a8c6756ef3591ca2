//! Identity registries: debuggees, scripts and frame actors.
//!
//! All three are plain insertion-ordered maps with no eviction beyond what the
//! session does explicitly; they are only mutated from the session lock.

mod debuggees;
mod frames;
mod scripts;

pub use debuggees::{Debuggee, DebuggeeId, DebuggeeRegistry};
pub use frames::{FrameDescriptor, FrameEntry, FrameTable};
pub use scripts::{ScriptIdx, ScriptNode, ScriptRegistry, SourceEntry};
