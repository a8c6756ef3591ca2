//! Identifier newtypes shared by the registries, the host interface and the
//! wire protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Opaque handle the host uses for one global execution context.
    DebuggeeHandle(u64)
);
numeric_id!(
    /// Identifies the document/pipeline that owns a debuggee.
    PipelineId(u32)
);
numeric_id!(WorkerId(u32));
numeric_id!(
    /// Stable per load of a source.
    SourceId(u32)
);
numeric_id!(
    /// A script's identity inside its source: the offset at which it starts.
    ScriptId(u32)
);
numeric_id!(
    /// Host-side identity of one live activation.
    FrameRef(u64)
);

/// Bytecode offset inside a script.
pub type Offset = u32;

/// Session-local frame identifier handed to the front-end (`frame1`, `frame2`, ...).
///
/// Ids are never reused within a session, even after the frame is evicted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameActorId(String);

impl FrameActorId {
    pub(crate) fn from_index(index: u32) -> Self {
        Self(format!("frame{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FrameActorId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for FrameActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A script addressed the way the host knows it: source plus start offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptLocation {
    pub source_id: SourceId,
    pub script_id: ScriptId,
}

impl ScriptLocation {
    pub fn new(source_id: SourceId, script_id: ScriptId) -> Self {
        Self {
            source_id,
            script_id,
        }
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_id, self.script_id)
    }
}
