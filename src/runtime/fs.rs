//! File system operations (read, write, directory, tree copy).

use anyhow::{Context, Result};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

use super::{DirEntry, RealRuntime};

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn exists_impl(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn is_dir_impl(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn read_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {:?} to string", path))
    }

    #[tracing::instrument(skip(self, contents))]
    pub(crate) async fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write to {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove file {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn remove_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path)
            .await
            .with_context(|| format!("Failed to remove directory {:?} and its contents", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn read_dir_impl(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = fs::read_dir(path)
            .await
            .with_context(|| format!("Failed to read directory {:?}", path))?;

        let mut result = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            result.push(DirEntry {
                path: entry.path(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn modified_impl(&self, path: &Path) -> Result<SystemTime> {
        let metadata = fs::symlink_metadata(path)
            .await
            .with_context(|| format!("Failed to read metadata of {:?}", path))?;
        Ok(metadata.modified()?)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn copy_dir_all_impl(&self, from: &Path, to: &Path) -> Result<()> {
        copy_tree(from.to_path_buf(), to.to_path_buf()).await
    }
}

fn copy_tree(from: PathBuf, to: PathBuf) -> BoxFuture<'static, Result<()>> {
    async move {
        fs::create_dir_all(&to)
            .await
            .with_context(|| format!("Failed to create directory {:?}", to))?;

        let mut entries = fs::read_dir(&from)
            .await
            .with_context(|| format!("Failed to read directory {:?}", from))?;

        while let Some(entry) = entries.next_entry().await? {
            let source = entry.path();
            let dest = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                copy_tree(source, dest).await?;
            } else {
                fs::copy(&source, &dest)
                    .await
                    .with_context(|| format!("Failed to copy {:?} to {:?}", source, dest))?;
            }
        }
        Ok(())
    }
    .boxed()
}
