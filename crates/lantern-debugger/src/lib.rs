//! Lantern: an in-process script debugger.
//!
//! The crate provides:
//! - A debugger session core ([`DebugSession`]) that tracks debuggees, loaded
//!   scripts and frames, manages breakpoints and stepping, and suspends the
//!   target while it is paused.
//! - A [`host::Host`] trait at the seam to the engine running the target, plus
//!   a deterministic [`host::ScriptedHost`].
//! - A JSON message protocol framed with `Content-Length` headers and a server
//!   loop that speaks it over any async byte stream.

pub mod breakpoints;
pub mod error;
pub mod hardening;
pub mod host;
pub mod ids;
pub mod pause;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stepping;
pub mod transport;
pub mod value;

pub use crate::error::{DebugError, DebugResult};
pub use crate::pause::{PauseReason, ResumeDecision};
pub use crate::protocol::{Command, Outbound};
pub use crate::session::{DebugSession, SessionHooks, SessionSlot};
pub use crate::stepping::StepKind;
