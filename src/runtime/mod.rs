//! Runtime abstraction for system operations.
//!
//! This module provides trait-based abstractions over filesystem, environment
//! and process operations, enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Home and current directory lookup
//! - `fs` - File system operations (read, write, directory listing, tree copy)
//! - `archive` - Gzipped tarball extraction
//! - `shell` - External command execution with an explicit working directory

mod archive;
mod env;
mod fs;
mod shell;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use shell::{ExecOutput, RealShell, Shell, quote_path};

#[cfg(test)]
pub use shell::MockShell;

/// A single directory entry. `is_dir` comes from the entry's own file type,
/// so symlinks to directories are reported as non-directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn dir(path: PathBuf) -> Self {
        Self { path, is_dir: true }
    }

    pub fn file(path: PathBuf) -> Self {
        Self {
            path,
            is_dir: false,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn current_dir(&self) -> Result<PathBuf>;

    // File System
    async fn exists(&self, path: &Path) -> bool;
    async fn is_dir(&self, path: &Path) -> bool;
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
    async fn read_to_string(&self, path: &Path) -> Result<String>;
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    async fn create_dir_all(&self, path: &Path) -> Result<()>;
    async fn remove_file(&self, path: &Path) -> Result<()>;
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
    async fn modified(&self, path: &Path) -> Result<SystemTime>;

    /// Recursively copy the directory tree at `from` into `to`, creating `to`
    /// and any missing parents.
    async fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<()>;

    /// Extract a gzipped tarball into `dest`, dropping the leading path
    /// component of every entry (npm tarballs wrap everything in `package/`).
    async fn unpack_tar_gz(&self, archive: &Path, dest: &Path) -> Result<()>;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    async fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path).await
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.read_impl(path).await
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path).await
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path).await
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        self.read_dir_impl(path).await
    }

    async fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.modified_impl(path).await
    }

    async fn copy_dir_all(&self, from: &Path, to: &Path) -> Result<()> {
        self.copy_dir_all_impl(from, to).await
    }

    async fn unpack_tar_gz(&self, archive: &Path, dest: &Path) -> Result<()> {
        self.unpack_tar_gz_impl(archive, dest).await
    }
}
