//! The debugger session: the facade the front-end drives and the hooks the
//! host calls back into.
//!
//! All session state sits behind one lock. The host is only called while the
//! lock is held for instrumentation queries and updates; evaluation runs with
//! the lock released. A pause parks the host's task on a oneshot channel so
//! the front-end keeps being served until a matching `resume` arrives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lantern_config::SessionConfig;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::breakpoints::{BreakpointManager, PossibleBreakpoint};
use crate::error::{DebugError, DebugResult};
use crate::host::{FrameSnapshot, Host, SourceDescriptor};
use crate::ids::{
    DebuggeeHandle, FrameActorId, FrameRef, Offset, PipelineId, ScriptId, SourceId, WorkerId,
};
use crate::pause::{PauseController, PauseReason, ResumeDecision, ResumeRequest};
use crate::protocol::{Command, Outbound, PausedFrame, ReplyBody, Request, SourceInfo};
use crate::registry::{DebuggeeId, DebuggeeRegistry, FrameDescriptor, FrameTable, ScriptRegistry};
use crate::stepping::{PopAction, StepKind, SteppingEngine};
use crate::value::{CompletionOutcome, EvalResult};

/// One per execution context. At most one session can hold it at a time.
#[derive(Debug, Default)]
pub struct SessionSlot {
    active: AtomicBool,
}

impl SessionSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Holds the slot until dropped.
#[derive(Debug)]
struct SessionGuard {
    slot: Arc<SessionSlot>,
}

impl SessionGuard {
    fn acquire(slot: &Arc<SessionSlot>) -> DebugResult<Self> {
        slot.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DebugError::SessionAlreadyActive)?;
        Ok(Self { slot: slot.clone() })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.slot.active.store(false, Ordering::Release);
    }
}

struct SessionState {
    /// `None` once the session has been shut down.
    guard: Option<SessionGuard>,
    debuggees: DebuggeeRegistry,
    scripts: ScriptRegistry,
    frames: FrameTable,
    breakpoints: BreakpointManager,
    stepping: SteppingEngine,
    pause: PauseController,
    interrupt_armed: bool,
    enter_hook_enabled: bool,
}

impl SessionState {
    fn ensure_active(&self) -> DebugResult<()> {
        if self.guard.is_some() {
            Ok(())
        } else {
            Err(DebugError::SessionClosed)
        }
    }
}

struct SessionInner {
    host: Arc<dyn Host>,
    config: SessionConfig,
    outbound: mpsc::UnboundedSender<Outbound>,
    state: Mutex<SessionState>,
}

/// Front-end facing handle. Cheap to clone.
#[derive(Clone)]
pub struct DebugSession {
    inner: Arc<SessionInner>,
}

/// Host facing handle: the callbacks instrumentation fires into.
#[derive(Clone)]
pub struct SessionHooks {
    inner: Arc<SessionInner>,
}

impl DebugSession {
    /// Start a session in `slot`. Fails with
    /// [`DebugError::SessionAlreadyActive`] if another session holds it.
    pub fn init(
        slot: &Arc<SessionSlot>,
        host: Arc<dyn Host>,
        config: SessionConfig,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> DebugResult<Self> {
        let guard = SessionGuard::acquire(slot)?;
        tracing::info!(target: "lantern.debugger", "debugger session started");
        Ok(Self {
            inner: Arc::new(SessionInner {
                host,
                config,
                outbound,
                state: Mutex::new(SessionState {
                    guard: Some(guard),
                    debuggees: DebuggeeRegistry::new(),
                    scripts: ScriptRegistry::new(),
                    frames: FrameTable::new(),
                    breakpoints: BreakpointManager::new(),
                    stepping: SteppingEngine::new(),
                    pause: PauseController::default(),
                    interrupt_armed: false,
                    enter_hook_enabled: false,
                }),
            }),
        })
    }

    pub fn hooks(&self) -> SessionHooks {
        SessionHooks {
            inner: self.inner.clone(),
        }
    }

    /// End the session: release the slot, abandon any pending pause and
    /// disarm instrumentation. Hooks fired afterwards let the target run.
    pub fn shutdown(&self) {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        if state.guard.take().is_none() {
            return;
        }
        let abandoned = state.pause.abandon();
        state.stepping.clear_all(&*self.inner.host);
        state.interrupt_armed = false;
        self.inner.sync_enter_hook(state);
        drop(abandoned);
        tracing::info!(target: "lantern.debugger", "debugger session shut down");
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().guard.is_some()
    }

    pub fn add_debuggee(
        &self,
        handle: DebuggeeHandle,
        pipeline: PipelineId,
        worker: Option<WorkerId>,
    ) -> DebugResult<DebuggeeId> {
        let mut state = self.inner.state.lock();
        state.ensure_active()?;
        self.inner.host.add_debuggee(handle)?;
        let id = state.debuggees.register(handle, pipeline, worker);
        tracing::debug!(
            target: "lantern.debugger",
            debuggee = %handle,
            pipeline = %pipeline,
            worker = ?worker,
            "debuggee added"
        );
        Ok(id)
    }

    pub fn remove_debuggee(&self, handle: DebuggeeHandle) -> DebugResult<()> {
        let mut state = self.inner.state.lock();
        state.ensure_active()?;
        if state.debuggees.get(handle).is_none() {
            return Err(DebugError::UnknownDebuggee(handle));
        }
        self.inner.tear_down(&mut state, handle);
        Ok(())
    }

    /// Evaluate `code` in the global selected by `worker` (preferred) or
    /// `pipeline`.
    pub fn evaluate(
        &self,
        code: &str,
        pipeline: Option<PipelineId>,
        worker: Option<WorkerId>,
    ) -> DebugResult<CompletionOutcome> {
        let debuggee = {
            let state = self.inner.state.lock();
            state.ensure_active()?;
            let debuggee = match (worker, pipeline) {
                (Some(worker), _) => state
                    .debuggees
                    .resolve_by_worker(worker)
                    .ok_or(DebugError::UnknownWorker(worker))?,
                (None, Some(pipeline)) => state
                    .debuggees
                    .resolve_by_pipeline(pipeline)
                    .ok_or(DebugError::UnknownPipeline(pipeline))?,
                (None, None) => return Err(DebugError::MissingEvalTarget),
            };
            if state.debuggees.get(debuggee).is_some_and(|d| d.torn_down) {
                return Ok(CompletionOutcome::Terminated);
            }
            debuggee
        };

        // Evaluation may run arbitrary target code; keep the lock released.
        let raw = self.inner.host.evaluate(debuggee, code);
        CompletionOutcome::from_raw(raw)
    }

    pub fn possible_breakpoints(&self, source_id: SourceId) -> DebugResult<Vec<PossibleBreakpoint>> {
        let state = self.inner.state.lock();
        state.ensure_active()?;
        BreakpointManager::possible(&*self.inner.host, &state.scripts, source_id)
    }

    /// Returns whether a new hit action was installed.
    pub fn set_breakpoint(
        &self,
        source_id: SourceId,
        script_id: ScriptId,
        offset: Offset,
    ) -> DebugResult<bool> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.ensure_active()?;
        let installed = state.breakpoints.set(
            &*self.inner.host,
            &state.scripts,
            source_id,
            script_id,
            offset,
        )?;
        tracing::debug!(
            target: "lantern.debugger",
            source = %source_id,
            script = %script_id,
            offset,
            installed,
            "set breakpoint"
        );
        Ok(installed)
    }

    pub fn clear_breakpoint(
        &self,
        source_id: SourceId,
        script_id: ScriptId,
        offset: Offset,
    ) -> DebugResult<bool> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.ensure_active()?;
        let removed = state.breakpoints.clear(
            &*self.inner.host,
            &state.scripts,
            source_id,
            script_id,
            offset,
        )?;
        tracing::debug!(
            target: "lantern.debugger",
            source = %source_id,
            script = %script_id,
            offset,
            removed,
            "cleared breakpoint"
        );
        Ok(removed)
    }

    /// Sources announced so far, in load order. `pipeline` keeps only the
    /// sources loaded in that pipeline's globals.
    pub fn sources(&self, pipeline: Option<PipelineId>) -> DebugResult<Vec<SourceInfo>> {
        let state = self.inner.state.lock();
        state.ensure_active()?;
        let sources = state
            .scripts
            .sources()
            .filter_map(|entry| {
                let owner = state.debuggees.get(entry.debuggee)?;
                if pipeline.is_some_and(|pipeline| pipeline != owner.pipeline) {
                    return None;
                }
                Some(SourceInfo {
                    source_id: entry.source_id,
                    url: entry.url.clone(),
                    url_override: entry.display_url.clone(),
                    introduction_type: entry.introduction_type.clone(),
                    pipeline_id: owner.pipeline,
                    worker_id: owner.worker,
                })
            })
            .collect();
        Ok(sources)
    }

    /// The paused frame followed by its callers. Every listed frame gets an
    /// actor; descriptors reflect where each frame is now.
    pub fn frames(&self) -> DebugResult<Vec<FrameDescriptor>> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.ensure_active()?;
        let host = &*self.inner.host;
        let mut next = Some(state.pause.paused_frame().ok_or(DebugError::NotPaused)?);
        let mut frames = Vec::new();
        while let Some(frame) = next {
            let Some(snapshot) = host.frame(frame) else {
                break;
            };
            let actor = self.inner.register_frame(state, frame, &snapshot)?;
            frames.push(describe_frame(host, &state.scripts, actor, &snapshot));
            next = snapshot.parent;
        }
        Ok(frames)
    }

    /// Pause as soon as the target enters its next frame.
    pub fn interrupt(&self) -> DebugResult<()> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.ensure_active()?;
        if state.pause.is_paused() {
            tracing::debug!(target: "lantern.debugger", "interrupt while paused ignored");
            return Ok(());
        }
        state.interrupt_armed = true;
        self.inner.sync_enter_hook(state);
        Ok(())
    }

    /// Hand a resume decision to the paused target. `actor`, when given, must
    /// name the paused frame.
    pub fn resume(&self, actor: Option<&FrameActorId>, step: Option<StepKind>) -> DebugResult<()> {
        let mut state = self.inner.state.lock();
        state.ensure_active()?;
        let pending = state.pause.take_for_resume(actor)?;
        let frame = pending.frame;
        if !pending.resume(ResumeRequest { step }) {
            tracing::warn!(
                target: "lantern.debugger",
                frame = %frame,
                "paused target stopped waiting before resume"
            );
        }
        Ok(())
    }

    /// Assign (or look up) the actor id of a live frame.
    pub fn register_frame_actor(&self, frame: FrameRef) -> DebugResult<FrameActorId> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.ensure_active()?;
        let snapshot = self
            .inner
            .host
            .frame(frame)
            .ok_or(DebugError::FrameGone(frame))?;
        self.inner.register_frame(state, frame, &snapshot)
    }

    pub fn resolve_frame(&self, actor: &FrameActorId) -> DebugResult<FrameRef> {
        self.inner
            .state
            .lock()
            .frames
            .resolve(actor)
            .ok_or_else(|| DebugError::UnknownFrameActor(actor.clone()))
    }

    pub fn find_frame_actor(&self, frame: FrameRef) -> Option<FrameActorId> {
        self.inner.state.lock().frames.find_actor(frame).cloned()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().pause.is_paused()
    }

    pub fn paused_frame_actor(&self) -> Option<FrameActorId> {
        self.inner.state.lock().pause.paused_actor().cloned()
    }

    /// Run one command. `Some` carries the reply body for commands that
    /// expect one.
    pub fn handle(&self, command: Command) -> DebugResult<Option<ReplyBody>> {
        match command {
            Command::AddDebuggee {
                handle,
                pipeline_id,
                worker_id,
            } => self.add_debuggee(handle, pipeline_id, worker_id).map(|_| None),
            Command::RemoveDebuggee { handle } => self.remove_debuggee(handle).map(|_| None),
            Command::Eval {
                code,
                pipeline_id,
                worker_id,
            } => {
                let outcome = self.evaluate(&code, pipeline_id, worker_id)?;
                Ok(Some(ReplyBody::Eval(EvalResult::from(&outcome))))
            }
            Command::GetPossibleBreakpoints { source_id } => {
                let positions = self.possible_breakpoints(source_id)?;
                Ok(Some(ReplyBody::PossibleBreakpoints { positions }))
            }
            Command::SetBreakpoint {
                source_id,
                script_id,
                offset,
            } => self
                .set_breakpoint(source_id, script_id, offset)
                .map(|_| None),
            Command::ClearBreakpoint {
                source_id,
                script_id,
                offset,
            } => self
                .clear_breakpoint(source_id, script_id, offset)
                .map(|_| None),
            Command::GetSources { pipeline_id } => {
                let sources = self.sources(pipeline_id)?;
                Ok(Some(ReplyBody::Sources { sources }))
            }
            Command::GetFrames => {
                let frames = self.frames()?;
                Ok(Some(ReplyBody::Frames { frames }))
            }
            Command::Interrupt => self.interrupt().map(|_| None),
            Command::Resume {
                frame_actor_id,
                resume_limit,
            } => {
                self.resume(frame_actor_id.as_ref(), resume_limit)?;
                Ok(Some(ReplyBody::Ack {}))
            }
        }
    }

    /// Run one decoded request and queue its reply or error, if any.
    pub fn dispatch(&self, request: Request) {
        let Request { id, command } = request;
        let command = match command {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(target: "lantern.debugger", id = ?id, error = %err, "malformed command");
                if id.is_some() {
                    self.inner.emit(Outbound::Error {
                        id,
                        message: format!("malformed command: {err}"),
                    });
                }
                return;
            }
        };

        let name = command.name();
        let expects_reply = command.expects_reply();
        match self.handle(command) {
            Ok(Some(body)) => self.inner.emit(Outbound::Reply { id, body }),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    target: "lantern.debugger",
                    command = name,
                    id = ?id,
                    error = %err,
                    "command failed"
                );
                if expects_reply {
                    self.inner.emit(Outbound::Error {
                        id,
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}

impl SessionHooks {
    /// A new source finished loading in `debuggee`.
    pub fn on_new_script(&self, debuggee: DebuggeeHandle, source: SourceDescriptor) {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        if state.guard.is_none() {
            return;
        }
        let Some(owner) = state.debuggees.get(debuggee).cloned() else {
            tracing::warn!(
                target: "lantern.debugger",
                debuggee = %debuggee,
                source = %source.source_id,
                "new source from an unregistered debuggee ignored"
            );
            return;
        };
        if owner.torn_down {
            tracing::debug!(
                target: "lantern.debugger",
                debuggee = %debuggee,
                source = %source.source_id,
                "new source from a torn-down debuggee ignored"
            );
            return;
        }
        let Some(entry) = state.scripts.register(debuggee, source) else {
            return;
        };
        tracing::debug!(
            target: "lantern.debugger",
            pipeline = %owner.pipeline,
            source = %entry.source_id,
            url = %entry.url,
            "new source"
        );
        self.inner.emit(Outbound::NewSource {
            source_id: entry.source_id,
            url: entry.url.clone(),
            url_override: entry.display_url.clone(),
            text: entry.text.clone(),
            introduction_type: entry.introduction_type.clone(),
            pipeline_id: owner.pipeline,
            worker_id: owner.worker,
        });
    }

    /// An installed breakpoint was reached in `frame`.
    pub async fn on_breakpoint(&self, frame: FrameRef) -> ResumeDecision {
        let installed = {
            let state = self.inner.state.lock();
            self.inner
                .host
                .frame(frame)
                .and_then(|snapshot| snapshot.script.map(|script| (script, snapshot.offset)))
                .is_some_and(|(script, offset)| state.breakpoints.is_installed(script, offset))
        };
        if !installed {
            return ResumeDecision::Continue;
        }
        self.inner.pause(frame, PauseReason::Breakpoint).await
    }

    /// `frame` reached a new offset while its step hook is set.
    pub async fn on_step(&self, frame: FrameRef) -> ResumeDecision {
        let stop = {
            let state = self.inner.state.lock();
            let meta = self.inner.host.frame(frame).and_then(|snapshot| {
                let script = snapshot.script?;
                self.inner.host.offset_metadata(script, snapshot.offset).ok()
            });
            meta.is_some_and(|meta| state.stepping.should_stop_at(frame, &meta))
        };
        if !stop {
            return ResumeDecision::Continue;
        }
        self.inner.pause(frame, PauseReason::ResumeLimit).await
    }

    /// The target entered `frame` while the enter-frame hook is on.
    pub async fn on_enter_frame(&self, frame: FrameRef) -> ResumeDecision {
        let interrupted = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            if state.interrupt_armed {
                true
            } else {
                state.stepping.on_enter_frame(&*self.inner.host, frame);
                false
            }
        };
        if !interrupted {
            return ResumeDecision::Continue;
        }
        self.inner
            .pause(frame, PauseReason::Interrupted { on_next: true })
            .await
    }

    /// `frame` is returning while its pop hook is set.
    pub async fn on_pop(&self, frame: FrameRef) -> ResumeDecision {
        let action = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            state.frames.mark_completed(frame);
            let action = state.stepping.on_pop(&*self.inner.host, frame);
            self.inner.sync_enter_hook(state);
            action
        };
        match action {
            PopAction::Continue => ResumeDecision::Continue,
            PopAction::Pause => self.inner.pause(frame, PauseReason::ResumeLimit).await,
        }
    }

    /// `debuggee` is gone. A pause it holds is abandoned.
    pub fn on_debuggee_torn_down(&self, debuggee: DebuggeeHandle) {
        let mut state = self.inner.state.lock();
        self.inner.tear_down(&mut state, debuggee);
    }
}

impl SessionInner {
    fn emit(&self, message: Outbound) {
        if self.outbound.send(message).is_err() {
            tracing::debug!(target: "lantern.debugger", "front-end channel closed; message dropped");
        }
    }

    fn sync_enter_hook(&self, state: &mut SessionState) {
        let wanted = state.interrupt_armed || state.stepping.wants_enter_hook();
        if wanted != state.enter_hook_enabled {
            self.host.set_enter_frame_hook(wanted);
            state.enter_hook_enabled = wanted;
        }
    }

    fn register_frame(
        &self,
        state: &mut SessionState,
        frame: FrameRef,
        snapshot: &FrameSnapshot,
    ) -> DebugResult<FrameActorId> {
        let pipeline = state
            .debuggees
            .get(snapshot.debuggee)
            .map(|debuggee| debuggee.pipeline)
            .ok_or(DebugError::UnknownDebuggee(snapshot.debuggee))?;

        let host = &*self.host;
        let scripts = &state.scripts;
        let (actor, fresh) = state.frames.register(pipeline, frame, |actor| {
            describe_frame(host, scripts, actor, snapshot)
        });
        if fresh {
            if let Some(entry) = state.frames.entry(&actor) {
                self.emit(Outbound::FrameRegistered {
                    pipeline_id: pipeline,
                    frame: entry.descriptor.clone(),
                });
            }
        }
        Ok(actor)
    }

    /// Suspend the calling hook until the front-end resumes it.
    async fn pause(&self, frame: FrameRef, reason: PauseReason) -> ResumeDecision {
        let Some(parked) = self.begin_pause(frame, reason) else {
            return ResumeDecision::Continue;
        };
        match parked.await {
            Ok(request) => {
                self.finish_resume(frame, request);
                ResumeDecision::Continue
            }
            Err(_) => {
                tracing::debug!(target: "lantern.debugger", frame = %frame, "pause abandoned");
                ResumeDecision::Abandoned
            }
        }
    }

    fn begin_pause(
        &self,
        frame: FrameRef,
        reason: PauseReason,
    ) -> Option<tokio::sync::oneshot::Receiver<ResumeRequest>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.guard.is_none() {
            return None;
        }
        if state.pause.is_paused() {
            tracing::warn!(
                target: "lantern.debugger",
                frame = %frame,
                why = ?reason,
                "already paused; second pause ignored"
            );
            return None;
        }

        // Whatever stopped us, one-shot instrumentation is spent.
        state.stepping.clear_all(&*self.host);
        state.interrupt_armed = false;
        self.sync_enter_hook(state);

        let Some(snapshot) = self.host.frame(frame) else {
            tracing::warn!(target: "lantern.debugger", frame = %frame, "pause in unknown frame ignored");
            return None;
        };
        let Some(debuggee) = state.debuggees.get(snapshot.debuggee).cloned() else {
            self.report_unmapped_pause(frame, snapshot.debuggee);
            return None;
        };
        if debuggee.torn_down {
            tracing::debug!(
                target: "lantern.debugger",
                frame = %frame,
                debuggee = %debuggee.handle,
                "pause in a torn-down debuggee ignored"
            );
            return None;
        }

        let host = &*self.host;
        state.frames.retain(|entry| {
            entry.frame == frame || host.frame(entry.frame).is_some_and(|live| live.on_stack)
        });

        let actor = match self.register_frame(state, frame, &snapshot) {
            Ok(actor) => actor,
            Err(err) => {
                tracing::warn!(target: "lantern.debugger", frame = %frame, error = %err, "pause dropped");
                return None;
            }
        };
        let meta = snapshot
            .script
            .and_then(|script| host.offset_metadata(script, snapshot.offset).ok())
            .unwrap_or_default();

        let parked = state
            .pause
            .begin(debuggee.handle, frame, actor.clone());
        tracing::debug!(
            target: "lantern.debugger",
            pipeline = %debuggee.pipeline,
            frame = %actor,
            line = meta.line,
            why = ?reason,
            "paused"
        );
        self.emit(Outbound::Paused {
            pipeline_id: debuggee.pipeline,
            worker_id: debuggee.worker,
            frame: PausedFrame {
                actor,
                line: meta.line,
                column: meta.column,
            },
            why: reason,
        });
        Some(parked)
    }

    fn finish_resume(&self, frame: FrameRef, request: ResumeRequest) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let host = &*self.host;
        let armed = match request.step {
            Some(kind) => Some(state.stepping.arm(host, &state.frames, frame, kind)),
            None => {
                state.stepping.clear_from(host, frame);
                None
            }
        };
        self.sync_enter_hook(state);

        let Some(actor) = state.frames.find_actor(frame).cloned() else {
            return;
        };
        let Some(pipeline) = state.frames.entry(&actor).map(|entry| entry.pipeline) else {
            return;
        };
        tracing::debug!(
            target: "lantern.debugger",
            pipeline = %pipeline,
            frame = %actor,
            step = ?armed,
            "resumed"
        );
        self.emit(Outbound::Resumed {
            pipeline_id: pipeline,
            frame_actor_id: actor,
            resume_limit: armed,
        });
    }

    fn tear_down(&self, state: &mut SessionState, debuggee: DebuggeeHandle) {
        if let Some(abandoned) = state.pause.abandon_debuggee(debuggee) {
            tracing::debug!(
                target: "lantern.debugger",
                debuggee = %debuggee,
                frame = %abandoned.actor,
                "pause abandoned by teardown"
            );
            state.stepping.clear_all(&*self.host);
            self.sync_enter_hook(state);
        }

        let Some(pipeline) = state.debuggees.mark_torn_down(debuggee).map(|d| d.pipeline) else {
            return;
        };
        let host = &*self.host;
        for frame in state.frames.frames_for_pipeline(pipeline) {
            let owned = host
                .frame(frame)
                .map_or(true, |snapshot| snapshot.debuggee == debuggee);
            if owned {
                state.frames.mark_terminated(frame);
            }
        }
        tracing::debug!(
            target: "lantern.debugger",
            debuggee = %debuggee,
            pipeline = %pipeline,
            "debuggee torn down"
        );
    }

    fn report_unmapped_pause(&self, frame: FrameRef, debuggee: DebuggeeHandle) {
        if self.config.report_unmapped_pause_as_error {
            tracing::error!(
                target: "lantern.debugger",
                frame = %frame,
                debuggee = %debuggee,
                "no pipeline for paused frame; continuing"
            );
        } else {
            tracing::warn!(
                target: "lantern.debugger",
                frame = %frame,
                debuggee = %debuggee,
                "no pipeline for paused frame; continuing"
            );
        }
    }
}

fn describe_frame(
    host: &dyn Host,
    scripts: &ScriptRegistry,
    actor: FrameActorId,
    snapshot: &FrameSnapshot,
) -> FrameDescriptor {
    let meta = snapshot
        .script
        .and_then(|script| host.offset_metadata(script, snapshot.offset).ok())
        .unwrap_or_default();
    let url = snapshot
        .script
        .and_then(|script| scripts.lookup(script.source_id))
        .map(|source| source.url.clone());
    let name = snapshot
        .script
        .and_then(|script| scripts.find_script(script.source_id, script.script_id))
        .and_then(|node| node.name.clone());
    FrameDescriptor {
        actor,
        kind: snapshot.kind,
        name,
        source_id: snapshot.script.map(|script| script.source_id),
        script_id: snapshot.script.map(|script| script.script_id),
        offset: snapshot.offset,
        url,
        line: meta.line,
        column: meta.column,
        on_stack: snapshot.on_stack,
        terminated: false,
    }
}
