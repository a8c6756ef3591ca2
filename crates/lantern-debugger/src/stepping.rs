//! Step-in / step-over / step-out.
//!
//! A step request arms temporary per-frame hooks on the host. They are one-shot
//! per resume: the first qualifying stop (or any other pause) clears them all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::host::{FrameHooks, Host, OffsetMetadata};
use crate::ids::FrameRef;
use crate::registry::FrameTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Step in: stop at the next step boundary, including inside new calls.
    Step,
    /// Step over: stop at the next step boundary of the same frame.
    Next,
    /// Step out: stop when the frame returns.
    Finish,
}

/// What the session should do after a hooked frame popped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopAction {
    Continue,
    /// The frame being stepped out of returned; pause at the return point.
    Pause,
}

#[derive(Debug)]
struct StepPlan {
    kind: StepKind,
    /// Install step hooks on every newly entered frame.
    step_in: bool,
    finish_target: Option<FrameRef>,
    hooked: BTreeMap<FrameRef, FrameHooks>,
}

impl StepPlan {
    fn new(kind: StepKind) -> Self {
        Self {
            kind,
            step_in: false,
            finish_target: None,
            hooked: BTreeMap::new(),
        }
    }

    fn hook(&mut self, host: &dyn Host, frame: FrameRef, hooks: FrameHooks) {
        match host.set_frame_hooks(frame, hooks) {
            Ok(()) => {
                self.hooked.insert(frame, hooks);
            }
            Err(err) => tracing::warn!(
                target: "lantern.debugger",
                frame = %frame,
                error = %err,
                "failed to install step hooks"
            ),
        }
    }
}

/// Holds the single active stepping configuration, if any.
#[derive(Debug, Default)]
pub struct SteppingEngine {
    plan: Option<StepPlan>,
}

impl SteppingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.plan.is_some()
    }

    /// Whether the host's enter-frame hook is needed for stepping.
    pub fn wants_enter_hook(&self) -> bool {
        self.plan.as_ref().is_some_and(|plan| plan.step_in)
    }

    /// Plain continue: remove step hooks from `frame` outward through its
    /// callers, then anything still armed elsewhere.
    pub fn clear_from(&mut self, host: &dyn Host, frame: FrameRef) {
        let mut current = Some(frame);
        while let Some(frame) = current {
            let Some(snapshot) = host.frame(frame) else {
                break;
            };
            let _ = host.set_frame_hooks(frame, FrameHooks::NONE);
            if let Some(plan) = self.plan.as_mut() {
                plan.hooked.remove(&frame);
            }
            current = snapshot.parent;
        }
        self.clear_all(host);
    }

    pub fn clear_all(&mut self, host: &dyn Host) {
        let Some(plan) = self.plan.take() else {
            return;
        };
        for frame in plan.hooked.into_keys() {
            // The frame may already be gone; nothing left to clear then.
            let _ = host.set_frame_hooks(frame, FrameHooks::NONE);
        }
    }

    /// Arm hooks for a step starting at `origin`. Returns the step kind that
    /// was actually armed, which differs from `requested` when the request is
    /// downgraded.
    pub fn arm(
        &mut self,
        host: &dyn Host,
        frames: &FrameTable,
        origin: FrameRef,
        requested: StepKind,
    ) -> StepKind {
        self.clear_all(host);

        let completed = frames.is_completed(origin);
        let mut kind = requested;
        if kind == StepKind::Finish && completed {
            // Nothing left to step out of.
            kind = StepKind::Next;
        }

        let target = if completed {
            host.frame(origin).and_then(|snapshot| snapshot.parent)
        } else {
            Some(origin)
        };
        let target = target.filter(|frame| {
            host.frame(*frame)
                .is_some_and(|snapshot| snapshot.script.is_some())
        });

        let mut plan = StepPlan::new(kind);
        match target {
            None => {
                plan.kind = StepKind::Step;
                plan.step_in = true;
            }
            Some(target) => match kind {
                StepKind::Step => {
                    plan.step_in = true;
                    plan.hook(host, target, FrameHooks::STEP_AND_POP);
                }
                StepKind::Next => plan.hook(host, target, FrameHooks::STEP_AND_POP),
                StepKind::Finish => {
                    plan.finish_target = Some(target);
                    plan.hook(host, target, FrameHooks::POP);
                }
            },
        }

        let armed = plan.kind;
        tracing::debug!(
            target: "lantern.debugger",
            origin = %origin,
            requested = ?requested,
            armed = ?armed,
            "armed step"
        );
        self.plan = Some(plan);
        armed
    }

    /// A new frame was entered while stepping in.
    pub fn on_enter_frame(&mut self, host: &dyn Host, frame: FrameRef) {
        let Some(plan) = self.plan.as_mut() else {
            return;
        };
        if plan.step_in && !plan.hooked.contains_key(&frame) {
            plan.hook(host, frame, FrameHooks::STEP_AND_POP);
        }
    }

    /// Only offsets that are both breakpoint positions and the start of a
    /// source-level step count as stops; anything else is mid-expression.
    pub fn should_stop_at(&self, frame: FrameRef, meta: &OffsetMetadata) -> bool {
        let hooked_for_step = self
            .plan
            .as_ref()
            .and_then(|plan| plan.hooked.get(&frame))
            .is_some_and(|hooks| hooks.step);
        hooked_for_step && meta.is_breakpoint && meta.is_step_start
    }

    /// A hooked frame popped. Stepping carries over to the caller unless this
    /// is the frame being stepped out of.
    pub fn on_pop(&mut self, host: &dyn Host, frame: FrameRef) -> PopAction {
        let Some(plan) = self.plan.as_mut() else {
            return PopAction::Continue;
        };
        let Some(hooks) = plan.hooked.remove(&frame) else {
            return PopAction::Continue;
        };
        let _ = host.set_frame_hooks(frame, FrameHooks::NONE);

        if plan.finish_target == Some(frame) {
            return PopAction::Pause;
        }

        if hooks.step {
            let caller = host
                .frame(frame)
                .and_then(|snapshot| snapshot.parent)
                .filter(|parent| {
                    host.frame(*parent)
                        .is_some_and(|snapshot| snapshot.script.is_some())
                });
            if let Some(caller) = caller {
                if !plan.hooked.contains_key(&caller) {
                    plan.hook(host, caller, FrameHooks::STEP_AND_POP);
                }
            }
        }
        PopAction::Continue
    }
}
