//! Tool artifact: the id plus the three source payloads of one generated tool

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::{extract, Extraction, ParseError};

/// Block name carrying the tool's state node (behavior)
pub const TOOL_FILE: &str = "tool.ts";
/// Block name carrying the shape util (rendering and interaction)
pub const UTIL_FILE: &str = "util.tsx";
/// Block name carrying the toolbar icon
pub const ICON_FILE: &str = "icon.svg";

/// A generated tool, ready to be written into a project.
///
/// Serialized as the flat `{"id","icon","tool","util"}` object returned to
/// HTTP clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolArtifact {
    pub id: String,
    pub icon: String,
    pub tool: String,
    pub util: String,
}

impl ToolArtifact {
    /// Map extracted blocks onto the three payload slots.
    ///
    /// Unrecognized block names are dropped. When a name repeats the last
    /// block wins. Empty payloads are allowed.
    pub fn assemble(extraction: Extraction) -> Self {
        let mut artifact = ToolArtifact {
            id: extraction.id,
            ..Default::default()
        };

        for block in extraction.blocks {
            let slot = match block.name.as_str() {
                TOOL_FILE => &mut artifact.tool,
                UTIL_FILE => &mut artifact.util,
                ICON_FILE => &mut artifact.icon,
                other => {
                    debug!("Ignoring unrecognized file block {other:?}");
                    continue;
                }
            };
            *slot = block.content;
        }

        artifact
    }
}

/// Extract and assemble in one step.
pub fn parse_tool_output(text: &str) -> Result<ToolArtifact, ParseError> {
    extract(text).map(ToolArtifact::assemble)
}
