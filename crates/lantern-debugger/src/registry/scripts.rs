use std::collections::HashMap;

use crate::host::{ScriptDescriptor, SourceDescriptor};
use crate::ids::{DebuggeeHandle, ScriptId, ScriptLocation, SourceId};

/// Index of a script node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScriptIdx(usize);

#[derive(Clone, Debug)]
pub struct ScriptNode {
    pub script_id: ScriptId,
    pub source_id: SourceId,
    pub name: Option<String>,
    pub parent: Option<ScriptIdx>,
    pub children: Vec<ScriptIdx>,
}

impl ScriptNode {
    pub fn location(&self) -> ScriptLocation {
        ScriptLocation::new(self.source_id, self.script_id)
    }
}

#[derive(Clone, Debug)]
pub struct SourceEntry {
    pub source_id: SourceId,
    pub debuggee: DebuggeeHandle,
    pub url: String,
    pub display_url: Option<String>,
    pub text: String,
    pub introduction_type: String,
    pub root: ScriptIdx,
}

/// Script trees stored as an arena with parent/child index links.
///
/// Nothing is removed within a session.
#[derive(Default)]
pub struct ScriptRegistry {
    nodes: Vec<ScriptNode>,
    sources: Vec<SourceEntry>,
    by_source: HashMap<SourceId, usize>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly loaded source and its script tree.
    ///
    /// Returns `None` when the source id is already known: one load is
    /// registered (and announced) once.
    pub fn register(
        &mut self,
        debuggee: DebuggeeHandle,
        source: SourceDescriptor,
    ) -> Option<&SourceEntry> {
        if self.by_source.contains_key(&source.source_id) {
            return None;
        }

        let root = self.insert_tree(source.source_id, &source.root, None);
        let idx = self.sources.len();
        self.sources.push(SourceEntry {
            source_id: source.source_id,
            debuggee,
            url: source.url,
            display_url: source.display_url,
            text: source.text,
            introduction_type: source.introduction_type,
            root,
        });
        self.by_source.insert(source.source_id, idx);
        self.sources.last()
    }

    fn insert_tree(
        &mut self,
        source_id: SourceId,
        script: &ScriptDescriptor,
        parent: Option<ScriptIdx>,
    ) -> ScriptIdx {
        let idx = ScriptIdx(self.nodes.len());
        self.nodes.push(ScriptNode {
            script_id: script.script_id,
            source_id,
            name: script.name.clone(),
            parent,
            children: Vec::with_capacity(script.children.len()),
        });
        for child in &script.children {
            let child_idx = self.insert_tree(source_id, child, Some(idx));
            self.nodes[idx.0].children.push(child_idx);
        }
        idx
    }

    pub fn lookup(&self, source_id: SourceId) -> Option<&SourceEntry> {
        self.by_source.get(&source_id).map(|&idx| &self.sources[idx])
    }

    pub fn node(&self, idx: ScriptIdx) -> &ScriptNode {
        &self.nodes[idx.0]
    }

    /// Depth-first (pre-order) search below `root`; the first node whose start
    /// offset matches wins.
    pub fn find_in_tree(&self, root: ScriptIdx, script_id: ScriptId) -> Option<ScriptIdx> {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx.0];
            if node.script_id == script_id {
                return Some(idx);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Resolve `script_id` inside the tree of `source_id`.
    pub fn find_script(&self, source_id: SourceId, script_id: ScriptId) -> Option<&ScriptNode> {
        let root = self.lookup(source_id)?.root;
        self.find_in_tree(root, script_id).map(|idx| self.node(idx))
    }

    /// Every script below `root` (inclusive), in pre-order.
    pub fn walk(&self, root: ScriptIdx) -> Vec<ScriptIdx> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx.0].children.iter().rev().copied());
        }
        out
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceEntry> + '_ {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
