//! Manifest Writer
//!
//! Persists a built manifest. Writes go to a temp file first and are renamed
//! into place so readers never see a partial document.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::common::{ZephyrError, ZephyrResult};
use zephyr_protocol::{Manifest, MANIFEST_FILENAME};

#[async_trait]
pub trait ManifestWriter: Send + Sync {
    async fn write(&self, manifest: &Manifest) -> ZephyrResult<()>;
}

/// Writes `zephyr-manifest.json` into an output directory
pub struct FileManifestWriter {
    path: PathBuf,
}

impl FileManifestWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self::with_file_name(output_dir, MANIFEST_FILENAME)
    }

    pub fn with_file_name(output_dir: &Path, file_name: &str) -> Self {
        Self {
            path: output_dir.join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ManifestWriter for FileManifestWriter {
    async fn write(&self, manifest: &Manifest) -> ZephyrResult<()> {
        let content = manifest.to_json_pretty()?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ZephyrError::manifest_io(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| ZephyrError::manifest_io(format!("Failed to write {:?}: {}", tmp, e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ZephyrError::manifest_io(format!("Failed to move manifest into {:?}: {}", self.path, e))
        })?;

        info!(
            "Wrote manifest for {} with {} remotes to {:?}",
            manifest.application_uid,
            manifest.dependencies.len(),
            self.path
        );
        Ok(())
    }
}
