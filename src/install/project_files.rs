use anyhow::{Context, Result};
use log::{debug, error};
use std::path::{Path, PathBuf};

use crate::config::PackageManager;
use crate::package::MANIFEST_FILE;
use crate::runtime::Runtime;

/// Byte snapshot of a file that may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileSnapshot {
    path: PathBuf,
    content: Option<Vec<u8>>,
}

impl FileSnapshot {
    async fn capture<R: Runtime>(runtime: &R, path: PathBuf) -> Result<Self> {
        let content = if runtime.exists(&path).await {
            Some(
                runtime
                    .read(&path)
                    .await
                    .with_context(|| format!("Failed to read {:?}", path))?,
            )
        } else {
            None
        };
        Ok(Self { path, content })
    }

    async fn restore<R: Runtime>(&self, runtime: &R) -> Result<()> {
        match &self.content {
            Some(content) => runtime
                .write(&self.path, content)
                .await
                .with_context(|| format!("Failed to restore {:?}", self.path)),
            None if runtime.exists(&self.path).await => {
                debug!("Removing {:?} created by the install", self.path);
                runtime
                    .remove_file(&self.path)
                    .await
                    .with_context(|| format!("Failed to remove {:?}", self.path))
            }
            None => Ok(()),
        }
    }
}

/// The manifest and lock file of the project receiving an install, as they
/// were before the install tool touched them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    manifest: FileSnapshot,
    lock: FileSnapshot,
}

impl ProjectFiles {
    pub async fn snapshot<R: Runtime>(
        runtime: &R,
        project_dir: &Path,
        package_manager: PackageManager,
    ) -> Result<Self> {
        Ok(Self {
            manifest: FileSnapshot::capture(runtime, project_dir.join(MANIFEST_FILE)).await?,
            lock: FileSnapshot::capture(runtime, project_dir.join(package_manager.lock_file()))
                .await?,
        })
    }

    /// Put both files back to their captured bytes. A lock file that did not
    /// exist before is deleted. Failures are logged, not returned.
    pub async fn restore<R: Runtime>(&self, runtime: &R) {
        for snapshot in [&self.manifest, &self.lock] {
            if let Err(e) = snapshot.restore(runtime).await {
                error!("{:#}", e);
            }
        }
    }
}
