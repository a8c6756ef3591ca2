use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::host::FrameKind;
use crate::ids::{FrameActorId, FrameRef, Offset, PipelineId, ScriptId, SourceId};

/// What the front-end is told about a frame when its actor is registered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescriptor {
    pub actor: FrameActorId,
    pub kind: FrameKind,
    /// Name of the function the frame runs, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<SourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<ScriptId>,
    pub offset: Offset,
    pub url: Option<String>,
    pub line: u32,
    pub column: u32,
    pub on_stack: bool,
    pub terminated: bool,
}

#[derive(Clone, Debug)]
pub struct FrameEntry {
    pub frame: FrameRef,
    pub pipeline: PipelineId,
    /// The activation has reported completion (its pop hook fired).
    pub completed: bool,
    pub descriptor: FrameDescriptor,
}

/// Two-way map between frame actor ids and host activations.
#[derive(Default)]
pub struct FrameTable {
    next: u32,
    by_actor: BTreeMap<FrameActorId, FrameEntry>,
    by_frame: HashMap<FrameRef, FrameActorId>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an actor id to `frame`, reusing the existing one if the
    /// activation was seen before. The descriptor is built for fresh ids only;
    /// the boolean reports whether the id is new.
    pub fn register(
        &mut self,
        pipeline: PipelineId,
        frame: FrameRef,
        describe: impl FnOnce(FrameActorId) -> FrameDescriptor,
    ) -> (FrameActorId, bool) {
        if let Some(actor) = self.by_frame.get(&frame) {
            return (actor.clone(), false);
        }

        self.next += 1;
        let actor = FrameActorId::from_index(self.next);
        let descriptor = describe(actor.clone());
        self.by_frame.insert(frame, actor.clone());
        self.by_actor.insert(
            actor.clone(),
            FrameEntry {
                frame,
                pipeline,
                completed: false,
                descriptor,
            },
        );
        (actor, true)
    }

    pub fn resolve(&self, actor: &FrameActorId) -> Option<FrameRef> {
        self.by_actor.get(actor).map(|entry| entry.frame)
    }

    pub fn entry(&self, actor: &FrameActorId) -> Option<&FrameEntry> {
        self.by_actor.get(actor)
    }

    pub fn find_actor(&self, frame: FrameRef) -> Option<&FrameActorId> {
        self.by_frame.get(&frame)
    }

    /// Record that `frame` popped. Frames without an actor are not tracked.
    pub fn mark_completed(&mut self, frame: FrameRef) {
        let Some(actor) = self.by_frame.get(&frame) else {
            return;
        };
        if let Some(entry) = self.by_actor.get_mut(actor) {
            entry.completed = true;
            entry.descriptor.on_stack = false;
        }
    }

    pub fn mark_terminated(&mut self, frame: FrameRef) {
        let Some(actor) = self.by_frame.get(&frame) else {
            return;
        };
        if let Some(entry) = self.by_actor.get_mut(actor) {
            entry.descriptor.on_stack = false;
            entry.descriptor.terminated = true;
        }
    }

    pub fn is_completed(&self, frame: FrameRef) -> bool {
        self.by_frame
            .get(&frame)
            .and_then(|actor| self.by_actor.get(actor))
            .is_some_and(|entry| entry.completed)
    }

    /// Drop every entry for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&FrameEntry) -> bool) {
        let by_frame = &mut self.by_frame;
        self.by_actor.retain(|_, entry| {
            let kept = keep(entry);
            if !kept {
                by_frame.remove(&entry.frame);
            }
            kept
        });
    }

    pub fn frames_for_pipeline(&self, pipeline: PipelineId) -> Vec<FrameRef> {
        self.by_actor
            .values()
            .filter(|entry| entry.pipeline == pipeline)
            .map(|entry| entry.frame)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_actor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_actor.is_empty()
    }
}
