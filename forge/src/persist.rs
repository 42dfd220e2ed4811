//! Artifact persistence: writes a generated tool into the project tree
//!
//! After the per-tool directory exists, four independent branches run
//! concurrently: manifest registration, the behavior file, the rendering file
//! and the icon. Every branch is awaited even when a sibling fails, so a
//! partially written tool is a possible end state. Nothing is rolled back; the
//! report says which slots landed and the caller decides what to do.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::artifact::ToolArtifact;
use crate::layout::{is_safe_id, ProjectLayout};
use crate::manifest::{ManifestError, ManifestHandle, ManifestWriter};

/// One of the four persisted pieces of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Manifest,
    Tool,
    Util,
    Icon,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Manifest => "manifest",
            Slot::Tool => "tool",
            Slot::Util => "util",
            Slot::Icon => "icon",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SlotError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal conditions checked before anything is written
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("project root {} does not exist or is not a directory", .0.display())]
    RootMissing(PathBuf),

    #[error("invalid tool id {0:?}")]
    InvalidId(String),

    #[error("failed to create tool directory {}: {source}", .path.display())]
    ToolDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct SlotOutcome {
    pub slot: Slot,
    pub path: PathBuf,
    pub result: Result<(), SlotError>,
}

/// What happened to each slot of one persisted tool
#[derive(Debug)]
pub struct PersistReport {
    pub id: String,
    pub outcomes: Vec<SlotOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl PersistReport {
    /// True only when every slot was written
    pub fn ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn errors(&self) -> Vec<&SlotError> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err())
            .collect()
    }

    pub fn landed(&self) -> Vec<Slot> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.slot)
            .collect()
    }

    pub fn failed(&self) -> Vec<Slot> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.slot)
            .collect()
    }
}

/// Writes artifacts into one project according to its layout
#[derive(Clone)]
pub struct Persister {
    layout: ProjectLayout,
    manifest: ManifestHandle,
}

impl Persister {
    pub fn new(layout: ProjectLayout, manifest: ManifestHandle) -> Self {
        Self { layout, manifest }
    }

    /// Build a persister with its own manifest writer task.
    pub fn spawn(layout: ProjectLayout, cancel: CancellationToken) -> Self {
        let manifest = ManifestWriter::spawn(layout.manifest_path(), cancel);
        Self::new(layout, manifest)
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn manifest(&self) -> &ManifestHandle {
        &self.manifest
    }

    /// Persist `artifact`.
    ///
    /// Returns `Err` without writing anything when the project root is
    /// missing, the id is unusable as a directory name, or the tool directory
    /// cannot be created. Otherwise returns a report covering all four slots.
    pub async fn persist(&self, artifact: &ToolArtifact) -> Result<PersistReport, PersistError> {
        let root = &self.layout.root;
        match fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(PersistError::RootMissing(root.clone())),
        }

        let id = artifact.id.as_str();
        if !is_safe_id(id) {
            return Err(PersistError::InvalidId(id.to_string()));
        }

        let tool_dir = self.layout.tool_dir(id);
        ensure_dir(&tool_dir)
            .await
            .map_err(|source| PersistError::ToolDir {
                path: tool_dir.clone(),
                source,
            })?;

        let tool_path = self.layout.behavior_path(id);
        let util_path = self.layout.render_path(id);
        let icon_path = self.layout.icon_path(id);

        let (manifest, tool, util, icon) = tokio::join!(
            self.register(id),
            write_file(&tool_path, &artifact.tool),
            write_file(&util_path, &artifact.util),
            write_icon(&icon_path, &artifact.icon),
        );

        let outcomes = vec![
            SlotOutcome {
                slot: Slot::Manifest,
                path: self.manifest.path().to_path_buf(),
                result: manifest,
            },
            SlotOutcome {
                slot: Slot::Tool,
                path: tool_path,
                result: tool,
            },
            SlotOutcome {
                slot: Slot::Util,
                path: util_path,
                result: util,
            },
            SlotOutcome {
                slot: Slot::Icon,
                path: icon_path,
                result: icon,
            },
        ];

        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                warn!("Persisting {} for tool {id} failed: {e}", outcome.slot);
            }
        }

        // TODO: undo the slots that landed when a sibling fails
        let report = PersistReport {
            id: id.to_string(),
            outcomes,
            finished_at: Utc::now(),
        };
        if report.ok() {
            info!("Persisted tool {id} to {}", root.display());
        }
        Ok(report)
    }

    async fn register(&self, id: &str) -> Result<(), SlotError> {
        self.manifest.register(id).await?;
        Ok(())
    }
}

async fn ensure_dir(path: &Path) -> io::Result<()> {
    if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        debug!("Directory already exists: {}", path.display());
        return Ok(());
    }
    fs::create_dir_all(path).await?;
    debug!("Directory created: {}", path.display());
    Ok(())
}

async fn write_file(path: &Path, content: &str) -> Result<(), SlotError> {
    debug!("Writing to {}", path.display());
    fs::write(path, content)
        .await
        .map_err(|source| SlotError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Finished writing to {}", path.display());
    Ok(())
}

/// The icons directory is shared by every tool and may not exist yet.
async fn write_icon(path: &Path, content: &str) -> Result<(), SlotError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await.map_err(|source| SlotError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    write_file(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn sticker() -> ToolArtifact {
        ToolArtifact {
            id: "sticker".into(),
            icon: "<svg/>".into(),
            tool: "export default class StickerTool {}".into(),
            util: "export default class StickerUtil {}".into(),
        }
    }

    /// Project root with an empty manifest in place
    fn project() -> (TempDir, ProjectLayout) {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::with_root(dir.path());
        let manifest = layout.manifest_path();
        std_fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std_fs::write(&manifest, r#"{"ids":[]}"#).unwrap();
        (dir, layout)
    }

    fn count_entries(path: &Path) -> usize {
        walk(path).len()
    }

    fn walk(path: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Ok(entries) = std_fs::read_dir(path) {
            for entry in entries.flatten() {
                out.push(entry.path());
                out.extend(walk(&entry.path()));
            }
        }
        out
    }

    #[tokio::test]
    async fn test_persist_full_success() {
        let (_dir, layout) = project();
        let persister = Persister::spawn(layout.clone(), CancellationToken::new());

        let report = persister.persist(&sticker()).await.unwrap();

        assert!(report.ok());
        assert!(report.errors().is_empty());
        assert_eq!(report.landed().len(), 4);
        assert_eq!(
            std_fs::read_to_string(layout.behavior_path("sticker")).unwrap(),
            "export default class StickerTool {}"
        );
        assert_eq!(
            std_fs::read_to_string(layout.render_path("sticker")).unwrap(),
            "export default class StickerUtil {}"
        );
        assert_eq!(
            std_fs::read_to_string(layout.icon_path("sticker")).unwrap(),
            "<svg/>"
        );
        assert_eq!(
            std_fs::read_to_string(layout.manifest_path()).unwrap(),
            r#"{"ids":["sticker"]}"#
        );
    }

    #[tokio::test]
    async fn test_persist_twice_single_manifest_entry() {
        let (_dir, layout) = project();
        let persister = Persister::spawn(layout.clone(), CancellationToken::new());

        assert!(persister.persist(&sticker()).await.unwrap().ok());
        let mut updated = sticker();
        updated.tool = "v2".into();
        assert!(persister.persist(&updated).await.unwrap().ok());

        assert_eq!(
            std_fs::read_to_string(layout.manifest_path()).unwrap(),
            r#"{"ids":["sticker"]}"#
        );
        assert_eq!(
            std_fs::read_to_string(layout.behavior_path("sticker")).unwrap(),
            "v2"
        );
    }

    #[tokio::test]
    async fn test_missing_root_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("does-not-exist");
        let persister = Persister::spawn(ProjectLayout::with_root(&root), CancellationToken::new());

        let err = persister.persist(&sticker()).await.unwrap_err();

        assert!(matches!(err, PersistError::RootMissing(ref p) if p == &root));
        assert!(!root.exists());
        assert_eq!(count_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("frontend");
        std_fs::write(&root, "").unwrap();
        let persister = Persister::spawn(ProjectLayout::with_root(&root), CancellationToken::new());

        let err = persister.persist(&sticker()).await.unwrap_err();
        assert!(matches!(err, PersistError::RootMissing(_)));
    }

    #[tokio::test]
    async fn test_unsafe_id_rejected() {
        let (dir, layout) = project();
        let persister = Persister::spawn(layout, CancellationToken::new());
        let before = count_entries(dir.path());

        for id in ["", "..", "../escape"] {
            let mut artifact = sticker();
            artifact.id = id.into();
            let err = persister.persist(&artifact).await.unwrap_err();
            assert!(matches!(err, PersistError::InvalidId(_)));
        }
        assert_eq!(count_entries(dir.path()), before);
    }

    #[tokio::test]
    async fn test_tool_dir_creation_failure() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::with_root(dir.path());
        std_fs::create_dir_all(dir.path().join("components")).unwrap();
        std_fs::write(dir.path().join(&layout.tools_dir), "not a directory").unwrap();
        let persister = Persister::spawn(layout, CancellationToken::new());

        let err = persister.persist(&sticker()).await.unwrap_err();
        assert!(matches!(err, PersistError::ToolDir { .. }));
    }

    #[tokio::test]
    async fn test_partial_failure_reports_failed_slots() {
        let (dir, layout) = project();
        std_fs::create_dir_all(dir.path().join("public")).unwrap();
        std_fs::write(dir.path().join(&layout.icons_dir), "blocks the icons dir").unwrap();
        let persister = Persister::spawn(layout.clone(), CancellationToken::new());

        let report = persister.persist(&sticker()).await.unwrap();

        assert!(!report.ok());
        assert_eq!(report.failed(), vec![Slot::Icon]);
        assert_eq!(report.landed(), vec![Slot::Manifest, Slot::Tool, Slot::Util]);
        assert_eq!(report.errors().len(), 1);
        assert!(layout.behavior_path("sticker").exists());
        assert!(layout.render_path("sticker").exists());
    }

    #[tokio::test]
    async fn test_missing_manifest_only_fails_manifest_slot() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::with_root(dir.path());
        let persister = Persister::spawn(layout.clone(), CancellationToken::new());

        let report = persister.persist(&sticker()).await.unwrap();

        assert_eq!(report.failed(), vec![Slot::Manifest]);
        assert!(matches!(
            report.errors()[0],
            SlotError::Manifest(ManifestError::Read { .. })
        ));
        assert!(layout.behavior_path("sticker").exists());
        assert!(layout.icon_path("sticker").exists());
        assert!(!layout.manifest_path().exists());
    }

    #[tokio::test]
    async fn test_empty_payloads_written_as_empty_files() {
        let (_dir, layout) = project();
        let persister = Persister::spawn(layout.clone(), CancellationToken::new());
        let artifact = ToolArtifact {
            id: "blank".into(),
            ..Default::default()
        };

        let report = persister.persist(&artifact).await.unwrap();

        assert!(report.ok());
        assert_eq!(std_fs::read_to_string(layout.render_path("blank")).unwrap(), "");
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(Slot::Manifest.to_string(), "manifest");
        assert_eq!(
            serde_json::to_value(Slot::Icon).unwrap(),
            serde_json::json!("icon")
        );
    }
}
