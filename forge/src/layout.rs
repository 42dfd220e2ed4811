//! Conventional file layout of the target project

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where generated tools land, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectLayout {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Parent of the per-tool directories
    #[serde(default = "default_tools_dir")]
    pub tools_dir: PathBuf,
    /// JSON manifest listing every tool id
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Flat directory of `<id>.svg` icons
    #[serde(default = "default_icons_dir")]
    pub icons_dir: PathBuf,
    #[serde(default = "default_behavior_file")]
    pub behavior_file: String,
    #[serde(default = "default_render_file")]
    pub render_file: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            root: default_root(),
            tools_dir: default_tools_dir(),
            manifest: default_manifest(),
            icons_dir: default_icons_dir(),
            behavior_file: default_behavior_file(),
            render_file: default_render_file(),
        }
    }
}

fn default_root() -> PathBuf { PathBuf::from("../frontend") }
fn default_tools_dir() -> PathBuf { PathBuf::from("components/tldraw-custom-tools") }
fn default_manifest() -> PathBuf { PathBuf::from("components/tldraw-custom-tools/tools.json") }
fn default_icons_dir() -> PathBuf { PathBuf::from("public/custom-tool-icons") }
fn default_behavior_file() -> String { "tool.ts".into() }
fn default_render_file() -> String { "util.tsx".into() }

impl ProjectLayout {
    /// Layout with the default conventional paths under `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }

    pub fn tool_dir(&self, id: &str) -> PathBuf {
        self.root.join(&self.tools_dir).join(id)
    }

    pub fn behavior_path(&self, id: &str) -> PathBuf {
        self.tool_dir(id).join(&self.behavior_file)
    }

    pub fn render_path(&self, id: &str) -> PathBuf {
        self.tool_dir(id).join(&self.render_file)
    }

    pub fn icon_path(&self, id: &str) -> PathBuf {
        self.root.join(&self.icons_dir).join(format!("{id}.svg"))
    }
}

/// True when `id` can be used verbatim as a single path component.
///
/// The id names a directory and an icon file, so anything that could escape
/// the tools directory is rejected.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
        && Path::new(id).components().count() == 1
}
