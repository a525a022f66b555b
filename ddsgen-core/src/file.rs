use std::{
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Capability set the generator uses to reach documents and artifacts.
///
/// The generator never touches a concrete file-system API directly; every
/// model, template and artifact location goes through a provider.
pub trait FileProvider: Send + Sync {
    /// Locate a resource in the user's workspace (models, specs, artifacts).
    fn from_workspace(&self, path: &Path) -> Resource;

    /// Locate a resource in the template bundle.
    fn from_bundle(&self, path: &Path) -> Resource;

    /// Advertise that `target` changed so observers can pick it up.
    fn refresh(&self, target: &Path);
}

/// A located file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    path: PathBuf,
}

impl Resource {
    /// Create a resource for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the resource path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the resource, returning its path
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Check if the resource exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Check if the resource is an existing directory
    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }

    /// Last modification time, if the platform reports one
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Read the whole resource as UTF-8 text
    pub fn read_to_string(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    /// Create the directory (and parents) if it does not exist yet
    pub fn create_dir_all(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.path)
    }

    /// Write content, creating parent directories as needed
    pub fn write(&self, content: &str) -> io::Result<WriteResult> {
        write_file(&self.path, content)?;
        Ok(WriteResult::Written)
    }
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// Result of a write operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written
    Written,
    /// File was skipped (precondition not met)
    Skipped,
}

/// Plain file-system provider rooted at a workspace and a template bundle.
///
/// Relative paths are joined to the matching root; absolute paths are kept.
#[derive(Debug, Clone)]
pub struct FsFileProvider {
    workspace: PathBuf,
    bundle: PathBuf,
}

impl FsFileProvider {
    pub fn new(workspace: impl Into<PathBuf>, bundle: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            bundle: bundle.into(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace
    }

    pub fn bundle_root(&self) -> &Path {
        &self.bundle
    }
}

impl FileProvider for FsFileProvider {
    fn from_workspace(&self, path: &Path) -> Resource {
        Resource::new(join_root(&self.workspace, path))
    }

    fn from_bundle(&self, path: &Path) -> Resource {
        Resource::new(join_root(&self.bundle, path))
    }

    fn refresh(&self, target: &Path) {
        tracing::debug!(path = %target.display(), "refreshed");
    }
}

fn join_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
