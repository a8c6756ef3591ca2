use std::collections::HashMap;

use crate::ids::{DebuggeeHandle, PipelineId, WorkerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebuggeeId(u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debuggee {
    pub id: DebuggeeId,
    pub handle: DebuggeeHandle,
    pub pipeline: PipelineId,
    pub worker: Option<WorkerId>,
    /// The global is gone. The entry stays so later lookups still resolve.
    pub torn_down: bool,
}

#[derive(Default)]
pub struct DebuggeeRegistry {
    next_id: u32,
    entries: Vec<Debuggee>,
    by_handle: HashMap<DebuggeeHandle, usize>,
}

impl DebuggeeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global. Registering the same handle again returns the id it
    /// already has and brings a torn-down entry back.
    pub fn register(
        &mut self,
        handle: DebuggeeHandle,
        pipeline: PipelineId,
        worker: Option<WorkerId>,
    ) -> DebuggeeId {
        if let Some(&idx) = self.by_handle.get(&handle) {
            let entry = &mut self.entries[idx];
            if entry.torn_down {
                entry.pipeline = pipeline;
                entry.worker = worker;
                entry.torn_down = false;
            }
            return entry.id;
        }

        self.next_id += 1;
        let id = DebuggeeId(self.next_id);
        self.by_handle.insert(handle, self.entries.len());
        self.entries.push(Debuggee {
            id,
            handle,
            pipeline,
            worker,
            torn_down: false,
        });
        id
    }

    /// The pipeline's own (non-worker) global, falling back to the first
    /// worker registered under that pipeline. Live globals win over torn-down
    /// ones.
    pub fn resolve_by_pipeline(&self, pipeline: PipelineId) -> Option<DebuggeeHandle> {
        self.entries
            .iter()
            .filter(|d| d.pipeline == pipeline)
            .min_by_key(|d| (d.torn_down, d.worker.is_some()))
            .map(|d| d.handle)
    }

    pub fn resolve_by_worker(&self, worker: WorkerId) -> Option<DebuggeeHandle> {
        self.entries
            .iter()
            .filter(|d| d.worker == Some(worker))
            .min_by_key(|d| d.torn_down)
            .map(|d| d.handle)
    }

    pub fn get(&self, handle: DebuggeeHandle) -> Option<&Debuggee> {
        self.by_handle.get(&handle).map(|&idx| &self.entries[idx])
    }

    /// Flag `handle` as torn down. Returns the entry only on the first call.
    pub fn mark_torn_down(&mut self, handle: DebuggeeHandle) -> Option<&Debuggee> {
        let &idx = self.by_handle.get(&handle)?;
        let entry = &mut self.entries[idx];
        if entry.torn_down {
            return None;
        }
        entry.torn_down = true;
        Some(&*entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
