//! toolgen forge: turns raw model output into files in a tldraw project
//!
//! - `extract`: tolerant scanner for `<tool>`/`<file>` tagged output
//! - `artifact`: maps extracted blocks onto a `ToolArtifact`
//! - `layout`: conventional project paths
//! - `manifest`: serialized updates to the shared `tools.json`
//! - `persist`: concurrent write of one artifact into the project

pub mod artifact;
pub mod extract;
pub mod layout;
pub mod manifest;
pub mod persist;

pub use artifact::{parse_tool_output, ToolArtifact};
pub use extract::{extract, Extraction, ParseError, TaggedBlock};
pub use layout::ProjectLayout;
pub use manifest::{ManifestError, ManifestHandle, ManifestWriter, Registration, ToolManifest};
pub use persist::{PersistError, PersistReport, Persister, Slot, SlotError, SlotOutcome};
