use thiserror::Error;

use crate::host::HostError;
use crate::ids::{DebuggeeHandle, FrameActorId, FrameRef, PipelineId, ScriptId, SourceId, WorkerId};

pub type DebugResult<T> = Result<T, DebugError>;

#[derive(Error, Debug)]
pub enum DebugError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("a debugger session is already active")]
    SessionAlreadyActive,
    #[error("the debugger session has been shut down")]
    SessionClosed,
    #[error("unknown debuggee {0}")]
    UnknownDebuggee(DebuggeeHandle),
    #[error("no debuggee registered for pipeline {0}")]
    UnknownPipeline(PipelineId),
    #[error("no debuggee registered for worker {0}")]
    UnknownWorker(WorkerId),
    #[error("eval requires a pipelineId or workerId")]
    MissingEvalTarget,
    #[error("unknown source {0}")]
    UnknownSource(SourceId),
    #[error("no script {script} in source {source_id}")]
    UnknownScript { source_id: SourceId, script: ScriptId },
    #[error("unknown frame actor {0}")]
    UnknownFrameActor(FrameActorId),
    #[error("frame {0} is no longer live")]
    FrameGone(FrameRef),
    #[error("completion carried neither a return nor a throw value")]
    MalformedCompletion,
    #[error("target is not paused")]
    NotPaused,
    #[error("resume targets {requested} but the target is paused in {paused}")]
    FrameMismatch {
        requested: FrameActorId,
        paused: FrameActorId,
    },
}
