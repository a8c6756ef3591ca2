//! Interface to the instrumentation facility that actually runs the target.
//!
//! The host owns execution. The session only asks it to install or remove
//! instrumentation and to describe scripts and frames; the host in turn calls
//! back into [`crate::session::SessionHooks`] on its own execution context when
//! something instrumented happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DebuggeeHandle, FrameRef, Offset, ScriptId, ScriptLocation, SourceId};
use crate::value::RawCompletion;

pub mod scripted;

pub use scripted::{ScriptedHost, ScriptedProgram};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host does not know script {0}")]
    UnknownScript(ScriptLocation),
    #[error("host does not know frame {0}")]
    UnknownFrame(FrameRef),
    #[error("no code at offset {offset} in script {location}")]
    InvalidOffset {
        location: ScriptLocation,
        offset: Offset,
    },
    #[error("debuggee {0} has been torn down")]
    DebuggeeGone(DebuggeeHandle),
}

/// Which per-frame hooks should be active on an activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameHooks {
    pub step: bool,
    pub pop: bool,
}

impl FrameHooks {
    pub const NONE: FrameHooks = FrameHooks {
        step: false,
        pop: false,
    };
    pub const STEP_AND_POP: FrameHooks = FrameHooks {
        step: true,
        pop: true,
    };
    pub const POP: FrameHooks = FrameHooks {
        step: false,
        pop: true,
    };

    pub fn is_empty(self) -> bool {
        !self.step && !self.pop
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameKind {
    Global,
    Call,
    Eval,
    Module,
}

/// What the host can tell about a live activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub debuggee: DebuggeeHandle,
    pub script: Option<ScriptLocation>,
    pub offset: Offset,
    pub kind: FrameKind,
    pub on_stack: bool,
    pub parent: Option<FrameRef>,
}

/// Line/column and step classification for one offset. Columns are zero-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OffsetMetadata {
    pub line: u32,
    pub column: u32,
    pub is_breakpoint: bool,
    pub is_step_start: bool,
}

/// A newly loaded source as reported by the host, with its script tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub source_id: SourceId,
    pub url: String,
    pub display_url: Option<String>,
    pub text: String,
    pub introduction_type: String,
    pub root: ScriptDescriptor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub script_id: ScriptId,
    pub name: Option<String>,
    pub children: Vec<ScriptDescriptor>,
}

/// Instrumentation facility consumed by the session.
///
/// Methods other than [`Host::evaluate`] are called with the session state
/// locked and must not call back into the session.
pub trait Host: Send + Sync {
    /// Start observing a global.
    fn add_debuggee(&self, debuggee: DebuggeeHandle) -> Result<(), HostError>;

    /// Install a hit action at `offset`. Hits are reported through
    /// `SessionHooks::on_breakpoint`.
    fn install_breakpoint(&self, location: ScriptLocation, offset: Offset)
        -> Result<(), HostError>;

    /// Remove every hit action installed at `offset`.
    fn clear_breakpoints(&self, location: ScriptLocation, offset: Offset) -> Result<(), HostError>;

    /// Candidate breakpoint offsets local to one script (nested scripts are
    /// enumerated separately).
    fn possible_breakpoints(&self, location: ScriptLocation) -> Result<Vec<Offset>, HostError>;

    fn offset_metadata(
        &self,
        location: ScriptLocation,
        offset: Offset,
    ) -> Result<OffsetMetadata, HostError>;

    fn frame(&self, frame: FrameRef) -> Option<FrameSnapshot>;

    /// Replace the per-frame hooks of `frame`. [`FrameHooks::NONE`] removes them.
    fn set_frame_hooks(&self, frame: FrameRef, hooks: FrameHooks) -> Result<(), HostError>;

    /// Toggle the global "entered a new frame" hook.
    fn set_enter_frame_hook(&self, enabled: bool);

    /// Run `code` in the debuggee's global. `None` means the code was
    /// terminated before completing.
    fn evaluate(&self, debuggee: DebuggeeHandle, code: &str) -> Option<RawCompletion>;
}
