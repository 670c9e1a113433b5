//! Transient paths to remove when a run is interrupted with Ctrl-C.

use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Archives and staging directories that exist only for the current run.
#[derive(Default, Debug)]
pub struct CleanupContext {
    #[cfg(test)]
    pub paths: BTreeSet<PathBuf>,
    #[cfg(not(test))]
    paths: BTreeSet<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.insert(path);
    }

    pub fn remove(&mut self, path: &Path) {
        self.paths.remove(path);
    }

    /// Delete every registered path that still exists. Runs inside the
    /// interrupt handler, so it is synchronous and never fails.
    pub fn cleanup(&self) {
        for path in &self.paths {
            let result = match std::fs::symlink_metadata(path) {
                Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
                Ok(_) => std::fs::remove_file(path),
                Err(_) => continue,
            };
            match result {
                Ok(()) => debug!("Removed {:?}", path),
                Err(e) => warn!("could not remove {:?}: {}", path, e),
            }
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// Keeps a path registered for interruption cleanup while it is alive.
///
/// Dropping the guard unregisters the path; removing the path itself on the
/// normal exit path is the owner's job.
pub struct CleanupGuard {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Self {
        if let Ok(mut registry) = ctx.lock() {
            registry.add(path.clone());
        }
        Self { ctx, path }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.ctx.lock() {
            registry.remove(&self.path);
        }
    }
}
