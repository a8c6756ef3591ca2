//! Messages exchanged with the front-end.
//!
//! Every message is a JSON object discriminated by `"type"`. Requests that
//! expect an answer carry an optional numeric `"id"`, echoed back on the
//! matching `reply` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::breakpoints::PossibleBreakpoint;
use crate::ids::{
    DebuggeeHandle, FrameActorId, Offset, PipelineId, ScriptId, SourceId, WorkerId,
};
use crate::pause::PauseReason;
use crate::registry::FrameDescriptor;
use crate::stepping::StepKind;
use crate::value::EvalResult;

/// Front-end to session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Command {
    AddDebuggee {
        handle: DebuggeeHandle,
        pipeline_id: PipelineId,
        #[serde(default)]
        worker_id: Option<WorkerId>,
    },
    RemoveDebuggee {
        handle: DebuggeeHandle,
    },
    Eval {
        code: String,
        #[serde(default)]
        pipeline_id: Option<PipelineId>,
        #[serde(default)]
        worker_id: Option<WorkerId>,
    },
    GetPossibleBreakpoints {
        source_id: SourceId,
    },
    SetBreakpoint {
        source_id: SourceId,
        script_id: ScriptId,
        offset: Offset,
    },
    ClearBreakpoint {
        source_id: SourceId,
        script_id: ScriptId,
        offset: Offset,
    },
    /// List announced sources, optionally only those of one pipeline.
    GetSources {
        #[serde(default)]
        pipeline_id: Option<PipelineId>,
    },
    /// List the paused frame and its callers.
    GetFrames,
    Interrupt,
    Resume {
        #[serde(default)]
        frame_actor_id: Option<FrameActorId>,
        #[serde(default)]
        resume_limit: Option<StepKind>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddDebuggee { .. } => "add-debuggee",
            Command::RemoveDebuggee { .. } => "remove-debuggee",
            Command::Eval { .. } => "eval",
            Command::GetPossibleBreakpoints { .. } => "get-possible-breakpoints",
            Command::SetBreakpoint { .. } => "set-breakpoint",
            Command::ClearBreakpoint { .. } => "clear-breakpoint",
            Command::GetSources { .. } => "get-sources",
            Command::GetFrames => "get-frames",
            Command::Interrupt => "interrupt",
            Command::Resume { .. } => "resume",
        }
    }

    /// Commands answered with a `reply` (or an `error`). Everything else is
    /// fire-and-forget; failures are only logged.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Command::Eval { .. }
                | Command::GetPossibleBreakpoints { .. }
                | Command::GetSources { .. }
                | Command::GetFrames
                | Command::Resume { .. }
        )
    }
}

/// A decoded request: the optional correlation id plus the command, or the
/// reason the command could not be decoded.
#[derive(Debug)]
pub struct Request {
    pub id: Option<u64>,
    pub command: Result<Command, serde_json::Error>,
}

impl Request {
    /// The id is extracted first so a malformed command can still be answered.
    pub fn from_value(value: Value) -> Self {
        let id = value.get("id").and_then(Value::as_u64);
        Self {
            id,
            command: serde_json::from_value(value),
        }
    }
}

/// Frame location attached to a `paused` notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedFrame {
    pub actor: FrameActorId,
    pub line: u32,
    pub column: u32,
}

/// One entry of a `get-sources` reply. The text is only sent with
/// `new-source`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub source_id: SourceId,
    pub url: String,
    pub url_override: Option<String>,
    pub introduction_type: String,
    pub pipeline_id: PipelineId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Eval(EvalResult),
    PossibleBreakpoints { positions: Vec<PossibleBreakpoint> },
    Sources { sources: Vec<SourceInfo> },
    /// Youngest first.
    Frames { frames: Vec<FrameDescriptor> },
    Ack {},
}

/// Session to front-end. Notifications and replies share one ordered stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Outbound {
    NewSource {
        source_id: SourceId,
        url: String,
        url_override: Option<String>,
        text: String,
        introduction_type: String,
        pipeline_id: PipelineId,
        #[serde(skip_serializing_if = "Option::is_none")]
        worker_id: Option<WorkerId>,
    },
    FrameRegistered {
        pipeline_id: PipelineId,
        frame: FrameDescriptor,
    },
    Paused {
        pipeline_id: PipelineId,
        #[serde(skip_serializing_if = "Option::is_none")]
        worker_id: Option<WorkerId>,
        frame: PausedFrame,
        why: PauseReason,
    },
    Resumed {
        pipeline_id: PipelineId,
        frame_actor_id: FrameActorId,
        #[serde(skip_serializing_if = "Option::is_none")]
        resume_limit: Option<StepKind>,
    },
    Reply {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        body: ReplyBody,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        message: String,
    },
}
