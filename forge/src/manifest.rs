//! Tool manifest: the shared `{"ids": [...]}` file listing every tool
//!
//! All mutations for one manifest path go through a single `ManifestWriter`
//! task. Each read-modify-write also holds an exclusive advisory lock on a
//! sibling `.lock` file so separate processes pointed at the same project do
//! not lose updates, and the new content is renamed into place.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl ToolManifest {
    /// Append `id` unless already listed. Existing order is preserved and
    /// the list is never assumed to be sorted.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }
}

/// Outcome of registering an id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed manifest {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write manifest {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock manifest {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("manifest task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("manifest writer is not running")]
    WriterClosed,
}

/// Read and parse the manifest at `path`.
pub fn load(path: &Path) -> Result<ToolManifest, ManifestError> {
    let bytes = fs::read(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ManifestError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Register `id` in the manifest at `path` under an exclusive file lock.
///
/// A missing or malformed manifest is an error; nothing is written in that
/// case.
pub fn register_locked(path: &Path, id: &str) -> Result<Registration, ManifestError> {
    let lock_path = sibling(path, "lock");
    let lock_err = |source| ManifestError::Lock {
        path: lock_path.clone(),
        source,
    };

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(lock_err)?;
    FileExt::lock_exclusive(&lock_file).map_err(lock_err)?;

    let result = register_unlocked(path, id);

    if let Err(e) = FileExt::unlock(&lock_file) {
        warn!("Failed to release manifest lock {}: {e}", lock_path.display());
    }
    result
}

fn register_unlocked(path: &Path, id: &str) -> Result<Registration, ManifestError> {
    let mut manifest = load(path)?;
    debug!("Manifest before registering {id}: {:?}", manifest.ids);

    if !manifest.insert(id) {
        return Ok(Registration::AlreadyPresent);
    }

    let write_err = |source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    };
    let data = serde_json::to_vec(&manifest).map_err(|e| write_err(io::Error::other(e)))?;

    let tmp_path = sibling(path, "tmp");
    fs::write(&tmp_path, data).map_err(write_err)?;
    fs::rename(&tmp_path, path).map_err(write_err)?;

    Ok(Registration::Added)
}

/// `tools.json` -> `tools.json.<ext>`
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(ext);
    path.with_file_name(name)
}

enum ManifestCommand {
    Register {
        id: String,
        reply: oneshot::Sender<Result<Registration, ManifestError>>,
    },
    List {
        reply: oneshot::Sender<Result<ToolManifest, ManifestError>>,
    },
}

/// Cloneable front for the manifest writer task
#[derive(Clone)]
pub struct ManifestHandle {
    sender: mpsc::Sender<ManifestCommand>,
    path: PathBuf,
}

impl ManifestHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register `id`, waiting for the write to complete.
    pub async fn register(&self, id: &str) -> Result<Registration, ManifestError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ManifestCommand::Register {
                id: id.to_string(),
                reply,
            })
            .await
            .map_err(|_| ManifestError::WriterClosed)?;
        rx.await.map_err(|_| ManifestError::WriterClosed)?
    }

    /// Current manifest contents
    pub async fn list(&self) -> Result<ToolManifest, ManifestError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ManifestCommand::List { reply })
            .await
            .map_err(|_| ManifestError::WriterClosed)?;
        rx.await.map_err(|_| ManifestError::WriterClosed)?
    }
}

/// Single owner of every mutation to one manifest file
pub struct ManifestWriter {
    path: PathBuf,
    receiver: mpsc::Receiver<ManifestCommand>,
}

impl ManifestWriter {
    pub fn new(path: impl Into<PathBuf>) -> (Self, ManifestHandle) {
        let path = path.into();
        let (sender, receiver) = mpsc::channel(64);
        let handle = ManifestHandle {
            sender,
            path: path.clone(),
        };
        (Self { path, receiver }, handle)
    }

    /// Start the writer on the current runtime and return its handle.
    pub fn spawn(path: impl Into<PathBuf>, cancel: CancellationToken) -> ManifestHandle {
        let (writer, handle) = Self::new(path);
        tokio::spawn(writer.run(cancel));
        handle
    }

    /// Process commands until cancelled or every handle is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Manifest writer started for {}", self.path.display());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        info!("Manifest writer for {} stopped", self.path.display());
    }

    async fn handle(&self, command: ManifestCommand) {
        match command {
            ManifestCommand::Register { id, reply } => {
                info!("Appending tool id {id}");
                let path = self.path.clone();
                let task_id = id.clone();
                let result = tokio::task::spawn_blocking(move || register_locked(&path, &task_id))
                    .await
                    .map_err(ManifestError::from)
                    .and_then(|r| r);

                match &result {
                    Ok(Registration::Added) => info!("Finished appending tool id {id}"),
                    Ok(Registration::AlreadyPresent) => {
                        info!("Tool id {id} already in manifest")
                    }
                    Err(e) => warn!("Failed to append tool id {id}: {e}"),
                }
                let _ = reply.send(result);
            }
            ManifestCommand::List { reply } => {
                let path = self.path.clone();
                let result = tokio::task::spawn_blocking(move || load(&path))
                    .await
                    .map_err(ManifestError::from)
                    .and_then(|r| r);
                let _ = reply.send(result);
            }
        }
    }
}
