//! Artifact persistence for fitted pipelines
//!
//! Runs hand fitted pipelines to an [`ArtifactStore`] and keep only an
//! opaque [`ArtifactRef`] handle. Promotion later resolves the handle back
//! into a pipeline. Keeping the handle separate from the in-memory object
//! means the storage backend can change without touching run or version
//! logic.


use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trainer::FittedPipeline;

/// Errors from artifact storage operations
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact not found: {0}")]
    NotFound(String),
}

/// Result alias for artifact operations
pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Opaque handle to a stored artifact.
///
/// The wrapped string is a backend-specific location; callers never
/// interpret it, only pass it back to the store that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    /// Handles are only minted by stores; callers receive them from
    /// [`ArtifactStore::write`].
    pub(crate) fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Backend-specific location string.
    pub fn location(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Artifact storage backend.
pub trait ArtifactStore {
    /// Persist a pipeline under the given path key, returning its handle.
    fn write(&mut self, path: &str, pipeline: &FittedPipeline) -> Result<ArtifactRef>;

    /// Resolve a handle back into a pipeline.
    fn read(&self, artifact: &ArtifactRef) -> Result<FittedPipeline>;

    /// Whether the handle resolves to a stored artifact.
    fn contains(&self, artifact: &ArtifactRef) -> bool;
}

/// In-memory artifact store for testing
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: HashMap<String, FittedPipeline>,
}

impl InMemoryArtifactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the store holds no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn write(&mut self, path: &str, pipeline: &FittedPipeline) -> Result<ArtifactRef> {
        self.artifacts.insert(path.to_string(), pipeline.clone());
        Ok(ArtifactRef::new(path))
    }

    fn read(&self, artifact: &ArtifactRef) -> Result<FittedPipeline> {
        self.artifacts
            .get(artifact.location())
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(artifact.location().to_string()))
    }

    fn contains(&self, artifact: &ArtifactRef) -> bool {
        self.artifacts.contains_key(artifact.location())
    }
}

/// Filesystem artifact store
///
/// Persists each pipeline as a JSON file under a root directory. Handles
/// are the absolute file paths.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at the given directory, creating it lazily on
    /// first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn artifact_path(&self, path: &str) -> PathBuf {
        self.root.join(format!("{path}.json"))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&mut self, path: &str, pipeline: &FittedPipeline) -> Result<ArtifactRef> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        let file = self.artifact_path(path);
        let json = serde_json::to_string_pretty(pipeline)?;
        fs::write(&file, json)?;
        Ok(ArtifactRef::new(file.to_string_lossy().into_owned()))
    }

    fn read(&self, artifact: &ArtifactRef) -> Result<FittedPipeline> {
        let file = Path::new(artifact.location());
        if !file.exists() {
            return Err(ArtifactError::NotFound(artifact.location().to_string()));
        }
        let json = fs::read_to_string(file)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn contains(&self, artifact: &ArtifactRef) -> bool {
        Path::new(artifact.location()).exists()
    }
}
