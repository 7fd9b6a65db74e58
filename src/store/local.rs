//! Local directory storage.

use crate::prelude::*;

use super::{ArtifactStore, check_key};

/// Stores artifacts as files under a local directory.
#[derive(Debug)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalDirStore {
    #[instrument(level = "debug", skip(self, data))]
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let path = self.root.join(check_key(key)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write file at path: {:?}", path))?;
        debug!(path = %path.display(), bytes = data.len(), "Stored artifact");
        Ok(path.display().to_string())
    }
}
