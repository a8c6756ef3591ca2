use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{DebugError, DebugResult};
use crate::host::Host;
use crate::ids::{Offset, ScriptId, ScriptLocation, SourceId};
use crate::registry::ScriptRegistry;

/// One candidate breakpoint position, annotated with the (possibly nested)
/// script it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleBreakpoint {
    pub script_id: ScriptId,
    pub offset: Offset,
    pub line: u32,
    pub column: u32,
}

/// Tracks installed breakpoints as `(script, offset)` pairs.
///
/// At most one hit action exists per pair: setting an already installed
/// breakpoint is a no-op, and clearing removes whatever the host has at that
/// offset.
#[derive(Default)]
pub struct BreakpointManager {
    installed: BTreeSet<(ScriptLocation, Offset)>,
}

impl BreakpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a new hit action was installed.
    pub fn set(
        &mut self,
        host: &dyn Host,
        scripts: &ScriptRegistry,
        source_id: SourceId,
        script_id: ScriptId,
        offset: Offset,
    ) -> DebugResult<bool> {
        let location = resolve(scripts, source_id, script_id)?;
        if self.installed.contains(&(location, offset)) {
            return Ok(false);
        }

        host.install_breakpoint(location, offset)?;
        self.installed.insert((location, offset));
        Ok(true)
    }

    /// Returns whether a tracked breakpoint was removed. The host is told to
    /// clear the offset either way.
    pub fn clear(
        &mut self,
        host: &dyn Host,
        scripts: &ScriptRegistry,
        source_id: SourceId,
        script_id: ScriptId,
        offset: Offset,
    ) -> DebugResult<bool> {
        let location = resolve(scripts, source_id, script_id)?;
        host.clear_breakpoints(location, offset)?;
        Ok(self.installed.remove(&(location, offset)))
    }

    pub fn is_installed(&self, location: ScriptLocation, offset: Offset) -> bool {
        self.installed.contains(&(location, offset))
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    /// Every candidate offset in the whole tree of `source_id`.
    pub fn possible(
        host: &dyn Host,
        scripts: &ScriptRegistry,
        source_id: SourceId,
    ) -> DebugResult<Vec<PossibleBreakpoint>> {
        let root = scripts
            .lookup(source_id)
            .ok_or(DebugError::UnknownSource(source_id))?
            .root;

        let mut positions = Vec::new();
        for idx in scripts.walk(root) {
            let location = scripts.node(idx).location();
            for offset in host.possible_breakpoints(location)? {
                let meta = host.offset_metadata(location, offset)?;
                positions.push(PossibleBreakpoint {
                    script_id: location.script_id,
                    offset,
                    line: meta.line,
                    column: meta.column,
                });
            }
        }
        Ok(positions)
    }
}

fn resolve(
    scripts: &ScriptRegistry,
    source_id: SourceId,
    script_id: ScriptId,
) -> DebugResult<ScriptLocation> {
    if scripts.lookup(source_id).is_none() {
        return Err(DebugError::UnknownSource(source_id));
    }
    scripts
        .find_script(source_id, script_id)
        .map(|node| node.location())
        .ok_or(DebugError::UnknownScript {
            source_id,
            script: script_id,
        })
}
