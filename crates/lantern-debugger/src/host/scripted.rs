//! Deterministic in-memory host.
//!
//! A program is a list of sources; each source holds a tree of scripts made of
//! offset-addressed ops. Running a debuggee executes every source's root
//! script as a global frame and fires session hooks where a real engine
//! would: on entering frames, at breakpoints, at offsets of step-hooked frames
//! and when hooked frames pop.
//!
//! The host lock is never held across a hook call, and hooks are never called
//! with it held.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_recursion::async_recursion;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Notify;

use super::{
    FrameHooks, FrameKind, FrameSnapshot, Host, HostError, OffsetMetadata, ScriptDescriptor,
    SourceDescriptor,
};
use crate::ids::{DebuggeeHandle, FrameRef, Offset, ScriptId, ScriptLocation, SourceId};
use crate::session::SessionHooks;
use crate::value::{ObjectRef, RawCompletion, RuntimeValue};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedProgram {
    pub sources: Vec<ScriptedSource>,
}

impl ScriptedProgram {
    pub fn new(sources: Vec<ScriptedSource>) -> Self {
        Self { sources }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedSource {
    pub source_id: SourceId,
    pub url: String,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_introduction_type")]
    pub introduction_type: String,
    pub root: ScriptedScript,
}

fn default_introduction_type() -> String {
    "scriptElement".to_owned()
}

impl ScriptedSource {
    pub fn new(source_id: u32, url: impl Into<String>, root: ScriptedScript) -> Self {
        Self {
            source_id: SourceId(source_id),
            url: url.into(),
            display_url: None,
            text: String::new(),
            introduction_type: default_introduction_type(),
            root,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_display_url(mut self, url: impl Into<String>) -> Self {
        self.display_url = Some(url.into());
        self
    }

    fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            source_id: self.source_id,
            url: self.url.clone(),
            display_url: self.display_url.clone(),
            text: self.text.clone(),
            introduction_type: self.introduction_type.clone(),
            root: self.root.descriptor(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedScript {
    pub script_id: ScriptId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ops: Vec<ScriptedOp>,
    #[serde(default)]
    pub children: Vec<ScriptedScript>,
}

impl ScriptedScript {
    pub fn new(script_id: u32) -> Self {
        Self {
            script_id: ScriptId(script_id),
            name: None,
            ops: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn op(mut self, op: ScriptedOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn child(mut self, child: ScriptedScript) -> Self {
        self.children.push(child);
        self
    }

    fn descriptor(&self) -> ScriptDescriptor {
        ScriptDescriptor {
            script_id: self.script_id,
            name: self.name.clone(),
            children: self.children.iter().map(Self::descriptor).collect(),
        }
    }
}

/// What an op does once execution moves past it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpAction {
    #[default]
    Nop,
    /// Call a script of the same source.
    Call(ScriptId),
    Return,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedOp {
    pub offset: Offset,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default = "yes")]
    pub breakpoint: bool,
    #[serde(default = "yes")]
    pub step_start: bool,
    #[serde(default)]
    pub action: OpAction,
}

fn yes() -> bool {
    true
}

impl ScriptedOp {
    pub fn new(offset: Offset, line: u32) -> Self {
        Self {
            offset,
            line,
            column: 0,
            breakpoint: true,
            step_start: true,
            action: OpAction::Nop,
        }
    }

    pub fn call(offset: Offset, line: u32, callee: u32) -> Self {
        Self {
            action: OpAction::Call(ScriptId(callee)),
            ..Self::new(offset, line)
        }
    }

    pub fn ret(offset: Offset, line: u32) -> Self {
        Self {
            action: OpAction::Return,
            ..Self::new(offset, line)
        }
    }

    pub fn at_column(mut self, column: u32) -> Self {
        self.column = column;
        self
    }

    /// A breakable offset that does not start a source-level step.
    pub fn mid_step(mut self) -> Self {
        self.step_start = false;
        self
    }

    pub fn unbreakable(mut self) -> Self {
        self.breakpoint = false;
        self
    }
}

/// How a debuggee's run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    TornDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Completed,
    Abort,
}

#[derive(Clone, Debug)]
struct LiveFrame {
    debuggee: DebuggeeHandle,
    location: ScriptLocation,
    offset: Offset,
    kind: FrameKind,
    parent: Option<FrameRef>,
    hooks: FrameHooks,
}

#[derive(Default)]
struct HostState {
    attached: HashSet<DebuggeeHandle>,
    torn_down: HashSet<DebuggeeHandle>,
    breakpoints: BTreeSet<(ScriptLocation, Offset)>,
    frames: HashMap<FrameRef, LiveFrame>,
    next_frame: u64,
    next_object: u64,
    enter_hook: bool,
    evaluations: HashMap<String, Option<RawCompletion>>,
    trace: Vec<(ScriptLocation, Offset)>,
}

pub struct ScriptedHost {
    program: ScriptedProgram,
    scripts: HashMap<ScriptLocation, Vec<ScriptedOp>>,
    attached: Notify,
    state: Mutex<HostState>,
}

impl ScriptedHost {
    pub fn new(program: ScriptedProgram) -> Self {
        let mut scripts = HashMap::new();
        for source in &program.sources {
            index_script(source.source_id, &source.root, &mut scripts);
        }
        Self {
            program,
            scripts,
            attached: Notify::new(),
            state: Mutex::new(HostState::default()),
        }
    }

    /// Make `code` complete with `completion` instead of being evaluated as a
    /// literal. `None` makes it terminate.
    pub fn set_evaluation(&self, code: impl Into<String>, completion: Option<RawCompletion>) {
        self.state.lock().evaluations.insert(code.into(), completion);
    }

    /// Every `(script, offset)` executed so far, in order.
    pub fn trace(&self) -> Vec<(ScriptLocation, Offset)> {
        self.state.lock().trace.clone()
    }

    pub fn live_frames(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn enter_hook_enabled(&self) -> bool {
        self.state.lock().enter_hook
    }

    pub fn is_torn_down(&self, debuggee: DebuggeeHandle) -> bool {
        self.state.lock().torn_down.contains(&debuggee)
    }

    /// Wait for the session to attach `debuggee`, report its sources, then
    /// execute them.
    pub async fn run(&self, hooks: &SessionHooks, debuggee: DebuggeeHandle) -> RunOutcome {
        self.wait_attached(debuggee).await;
        self.load(hooks, debuggee);
        self.execute(hooks, debuggee).await
    }

    pub async fn wait_attached(&self, debuggee: DebuggeeHandle) {
        loop {
            let notified = self.attached.notified();
            if self.state.lock().attached.contains(&debuggee) {
                return;
            }
            notified.await;
        }
    }

    /// Report every source of the program as loaded in `debuggee`.
    pub fn load(&self, hooks: &SessionHooks, debuggee: DebuggeeHandle) {
        for source in &self.program.sources {
            hooks.on_new_script(debuggee, source.descriptor());
        }
    }

    /// Run each source's root script as a global frame, in order.
    pub async fn execute(&self, hooks: &SessionHooks, debuggee: DebuggeeHandle) -> RunOutcome {
        for source in &self.program.sources {
            let root = ScriptLocation::new(source.source_id, source.root.script_id);
            if self
                .run_frame(hooks, debuggee, root, None, FrameKind::Global)
                .await
                == Flow::Abort
            {
                return RunOutcome::TornDown;
            }
        }
        RunOutcome::Completed
    }

    /// Tear `debuggee` down. Frames still running for it unwind without
    /// firing further hooks.
    pub fn tear_down(&self, hooks: &SessionHooks, debuggee: DebuggeeHandle) {
        {
            let mut state = self.state.lock();
            state.attached.remove(&debuggee);
            state.torn_down.insert(debuggee);
        }
        hooks.on_debuggee_torn_down(debuggee);
    }

    #[async_recursion]
    async fn run_frame(
        &self,
        hooks: &SessionHooks,
        debuggee: DebuggeeHandle,
        location: ScriptLocation,
        parent: Option<FrameRef>,
        kind: FrameKind,
    ) -> Flow {
        let Some(ops) = self.scripts.get(&location) else {
            tracing::warn!(target: "lantern.debugger", script = %location, "call to unknown script skipped");
            return Flow::Completed;
        };

        let (frame, enter_hook) = {
            let mut state = self.state.lock();
            state.next_frame += 1;
            let frame = FrameRef(state.next_frame);
            state.frames.insert(
                frame,
                LiveFrame {
                    debuggee,
                    location,
                    offset: ops.first().map_or(0, |op| op.offset),
                    kind,
                    parent,
                    hooks: FrameHooks::NONE,
                },
            );
            (frame, state.enter_hook)
        };

        if enter_hook {
            hooks.on_enter_frame(frame).await;
        }
        if self.is_torn_down(debuggee) {
            return self.discard(frame, Flow::Abort);
        }

        for op in ops {
            let (at_breakpoint, stepping) = {
                let mut state = self.state.lock();
                state.trace.push((location, op.offset));
                let stepping = match state.frames.get_mut(&frame) {
                    Some(live) => {
                        live.offset = op.offset;
                        live.hooks.step
                    }
                    None => false,
                };
                (state.breakpoints.contains(&(location, op.offset)), stepping)
            };

            if at_breakpoint {
                hooks.on_breakpoint(frame).await;
            } else if stepping {
                hooks.on_step(frame).await;
            }
            if self.is_torn_down(debuggee) {
                return self.discard(frame, Flow::Abort);
            }

            match op.action {
                OpAction::Nop => {}
                OpAction::Call(callee) => {
                    let callee = ScriptLocation::new(location.source_id, callee);
                    let flow = self
                        .run_frame(hooks, debuggee, callee, Some(frame), FrameKind::Call)
                        .await;
                    if flow == Flow::Abort {
                        return self.discard(frame, Flow::Abort);
                    }
                }
                OpAction::Return => break,
            }
        }

        let pop_hook = self
            .state
            .lock()
            .frames
            .get(&frame)
            .is_some_and(|live| live.hooks.pop);
        if pop_hook {
            hooks.on_pop(frame).await;
        }
        if self.is_torn_down(debuggee) {
            return self.discard(frame, Flow::Abort);
        }
        self.discard(frame, Flow::Completed)
    }

    fn discard(&self, frame: FrameRef, flow: Flow) -> Flow {
        self.state.lock().frames.remove(&frame);
        flow
    }

    fn op(&self, location: ScriptLocation, offset: Offset) -> Result<&ScriptedOp, HostError> {
        self.scripts
            .get(&location)
            .ok_or(HostError::UnknownScript(location))?
            .iter()
            .find(|op| op.offset == offset)
            .ok_or(HostError::InvalidOffset { location, offset })
    }
}

fn index_script(
    source_id: SourceId,
    script: &ScriptedScript,
    out: &mut HashMap<ScriptLocation, Vec<ScriptedOp>>,
) {
    out.insert(
        ScriptLocation::new(source_id, script.script_id),
        script.ops.clone(),
    );
    for child in &script.children {
        index_script(source_id, child, out);
    }
}

impl Host for ScriptedHost {
    fn add_debuggee(&self, debuggee: DebuggeeHandle) -> Result<(), HostError> {
        {
            let mut state = self.state.lock();
            if state.torn_down.contains(&debuggee) {
                return Err(HostError::DebuggeeGone(debuggee));
            }
            state.attached.insert(debuggee);
        }
        self.attached.notify_waiters();
        Ok(())
    }

    fn install_breakpoint(&self, location: ScriptLocation, offset: Offset) -> Result<(), HostError> {
        let op = self.op(location, offset)?;
        if !op.breakpoint {
            return Err(HostError::InvalidOffset { location, offset });
        }
        self.state.lock().breakpoints.insert((location, offset));
        Ok(())
    }

    fn clear_breakpoints(&self, location: ScriptLocation, offset: Offset) -> Result<(), HostError> {
        if !self.scripts.contains_key(&location) {
            return Err(HostError::UnknownScript(location));
        }
        self.state.lock().breakpoints.remove(&(location, offset));
        Ok(())
    }

    fn possible_breakpoints(&self, location: ScriptLocation) -> Result<Vec<Offset>, HostError> {
        let ops = self
            .scripts
            .get(&location)
            .ok_or(HostError::UnknownScript(location))?;
        Ok(ops
            .iter()
            .filter(|op| op.breakpoint)
            .map(|op| op.offset)
            .collect())
    }

    fn offset_metadata(
        &self,
        location: ScriptLocation,
        offset: Offset,
    ) -> Result<OffsetMetadata, HostError> {
        let op = self.op(location, offset)?;
        Ok(OffsetMetadata {
            line: op.line,
            column: op.column,
            is_breakpoint: op.breakpoint,
            is_step_start: op.step_start,
        })
    }

    fn frame(&self, frame: FrameRef) -> Option<FrameSnapshot> {
        let state = self.state.lock();
        let live = state.frames.get(&frame)?;
        Some(FrameSnapshot {
            debuggee: live.debuggee,
            script: Some(live.location),
            offset: live.offset,
            kind: live.kind,
            on_stack: true,
            parent: live.parent,
        })
    }

    fn set_frame_hooks(&self, frame: FrameRef, hooks: FrameHooks) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let live = state
            .frames
            .get_mut(&frame)
            .ok_or(HostError::UnknownFrame(frame))?;
        live.hooks = hooks;
        Ok(())
    }

    fn set_enter_frame_hook(&self, enabled: bool) {
        self.state.lock().enter_hook = enabled;
    }

    fn evaluate(&self, debuggee: DebuggeeHandle, code: &str) -> Option<RawCompletion> {
        let mut state = self.state.lock();
        if !state.attached.contains(&debuggee) {
            return None;
        }
        if let Some(completion) = state.evaluations.get(code) {
            return completion.clone();
        }
        Some(evaluate_literal(code, &mut state.next_object))
    }
}

/// Evaluates literals, `new Class`, and `throw <literal>`. Anything else
/// throws a `ReferenceError`.
fn evaluate_literal(code: &str, next_object: &mut u64) -> RawCompletion {
    let code = code.trim().trim_end_matches(';').trim();
    if let Some(thrown) = code.strip_prefix("throw ") {
        return match literal(thrown.trim(), next_object) {
            Ok(value) | Err(value) => RawCompletion::threw(value),
        };
    }
    match literal(code, next_object) {
        Ok(value) => RawCompletion::returned(value),
        Err(exception) => RawCompletion::threw(exception),
    }
}

fn literal(expr: &str, next_object: &mut u64) -> Result<RuntimeValue, RuntimeValue> {
    let mut object = |class: &str| {
        *next_object += 1;
        RuntimeValue::Object(ObjectRef {
            id: *next_object,
            class: class.to_owned(),
        })
    };

    match expr {
        "" | "undefined" => return Ok(RuntimeValue::Undefined),
        "null" => return Ok(RuntimeValue::Null),
        "true" => return Ok(RuntimeValue::Boolean(true)),
        "false" => return Ok(RuntimeValue::Boolean(false)),
        "{}" => return Ok(object("Object")),
        "[]" => return Ok(object("Array")),
        _ => {}
    }

    if let Ok(number) = expr.parse::<f64>() {
        return Ok(RuntimeValue::Number(number));
    }
    for quote in ['"', '\''] {
        if expr.len() >= 2 && expr.starts_with(quote) && expr.ends_with(quote) {
            return Ok(RuntimeValue::String(expr[1..expr.len() - 1].to_owned()));
        }
    }
    if let Some(class) = expr.strip_prefix("new ") {
        let class = class.split('(').next().unwrap_or_default().trim();
        if !class.is_empty() && class.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Ok(object(class));
        }
    }
    Err(object("ReferenceError"))
}
