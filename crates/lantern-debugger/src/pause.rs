use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::{DebugError, DebugResult};
use crate::ids::{DebuggeeHandle, FrameActorId, FrameRef};
use crate::stepping::StepKind;

/// Why the target stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PauseReason {
    Breakpoint,
    Interrupted {
        #[serde(rename = "onNext")]
        on_next: bool,
    },
    ResumeLimit,
}

/// How a paused hook returns control to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeDecision {
    /// Keep executing (possibly with step hooks armed).
    Continue,
    /// The pause ended without a resume: the session shut down or the
    /// debuggee was torn down.
    Abandoned,
}

#[derive(Debug)]
pub(crate) struct ResumeRequest {
    pub step: Option<StepKind>,
}

#[derive(Debug)]
pub(crate) struct PendingPause {
    pub debuggee: DebuggeeHandle,
    pub frame: FrameRef,
    pub actor: FrameActorId,
    resume: oneshot::Sender<ResumeRequest>,
}

impl PendingPause {
    /// Wake the parked target. Returns false if it stopped waiting.
    pub fn resume(self, request: ResumeRequest) -> bool {
        self.resume.send(request).is_ok()
    }
}

/// At most one outstanding pause per session.
#[derive(Debug, Default)]
pub(crate) struct PauseController {
    pending: Option<PendingPause>,
}

impl PauseController {
    pub fn is_paused(&self) -> bool {
        self.pending.is_some()
    }

    pub fn paused_actor(&self) -> Option<&FrameActorId> {
        self.pending.as_ref().map(|pending| &pending.actor)
    }

    pub fn paused_frame(&self) -> Option<FrameRef> {
        self.pending.as_ref().map(|pending| pending.frame)
    }

    /// Record a new pause. The caller has checked that nothing is pending.
    pub fn begin(
        &mut self,
        debuggee: DebuggeeHandle,
        frame: FrameRef,
        actor: FrameActorId,
    ) -> oneshot::Receiver<ResumeRequest> {
        let (resume, parked) = oneshot::channel();
        self.pending = Some(PendingPause {
            debuggee,
            frame,
            actor,
            resume,
        });
        parked
    }

    /// Take the pending pause if `requested` (when given) names its frame.
    /// A mismatch leaves the pause in place.
    pub fn take_for_resume(
        &mut self,
        requested: Option<&FrameActorId>,
    ) -> DebugResult<PendingPause> {
        let pending = self.pending.as_ref().ok_or(DebugError::NotPaused)?;
        if let Some(requested) = requested {
            if *requested != pending.actor {
                return Err(DebugError::FrameMismatch {
                    requested: requested.clone(),
                    paused: pending.actor.clone(),
                });
            }
        }
        self.pending.take().ok_or(DebugError::NotPaused)
    }

    /// Drop the pending pause, waking the target with
    /// [`ResumeDecision::Abandoned`].
    pub fn abandon(&mut self) -> Option<PendingPause> {
        self.pending.take()
    }

    pub fn abandon_debuggee(&mut self, debuggee: DebuggeeHandle) -> Option<PendingPause> {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.debuggee == debuggee)
        {
            self.pending.take()
        } else {
            None
        }
    }
}
