/*!
 * Per-run temporary workspaces and artifact naming.
 *
 * A `Workspace` owns an ephemeral directory for exactly one run. `release`
 * removes it and reports removal failures; if the workspace is dropped
 * without being released (a cancelled or panicking run) the directory is
 * still removed by the underlying `TempDir` guard.
 */

use log::debug;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use crate::errors::GenerationError;

/// Source of unique file names for run artifacts
pub trait NameGenerator: Send + Sync + Debug {
    /// Return a fresh name stem (no extension); never repeats within a process
    fn next_name(&self) -> String;
}

/// Random v4 UUID names
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNames;

impl NameGenerator for UuidNames {
    fn next_name(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` names
#[derive(Debug)]
pub struct SequentialNames {
    prefix: String,
    counter: AtomicUsize,
}

impl SequentialNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicUsize::new(0),
        }
    }
}

impl NameGenerator for SequentialNames {
    fn next_name(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// A directory in which uniquely named artifact paths are handed out
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    // @field: Directory the artifacts live in
    path: PathBuf,
    // @field: Shared naming strategy
    names: Arc<dyn NameGenerator>,
}

impl ArtifactDir {
    pub fn new(path: impl Into<PathBuf>, names: Arc<dyn NameGenerator>) -> Self {
        Self {
            path: path.into(),
            names,
        }
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // @returns: Fresh path `<dir>/<name>.<extension>`, not yet created
    pub fn artifact_path(&self, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        self.path.join(format!("{}.{}", self.names.next_name(), extension))
    }

    /// Check whether `candidate` lies inside this directory
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.path)
    }
}

/// Ephemeral directory owned by one run
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    artifacts: ArtifactDir,
}

impl Workspace {
    /// Directory path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Cloneable handle for naming files inside the workspace
    pub fn artifacts(&self) -> ArtifactDir {
        self.artifacts.clone()
    }

    /// Remove the directory and everything in it
    pub fn release(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Removed workspace {}", path.display());
        Ok(())
    }
}

/// Allocates run workspaces
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    // @field: Parent directory; system temp dir when None
    root: Option<PathBuf>,
    names: Arc<dyn NameGenerator>,
}

impl WorkspaceManager {
    pub fn new(root: Option<PathBuf>, names: Arc<dyn NameGenerator>) -> Self {
        Self { root, names }
    }

    /// Manager rooted at the system temp dir with UUID names
    pub fn system() -> Self {
        Self::new(None, Arc::new(UuidNames))
    }

    /// Create a fresh, private workspace directory
    pub fn acquire(&self) -> Result<Workspace, GenerationError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vidnarrate-");

        let dir = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .map_err(|e| GenerationError::resource("create workspace root", e))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| GenerationError::resource("create workspace", e))?;

        debug!("Created workspace {}", dir.path().display());
        let artifacts = ArtifactDir::new(dir.path(), Arc::clone(&self.names));
        Ok(Workspace { dir, artifacts })
    }
}
