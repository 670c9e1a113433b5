use anyhow::Result;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use log::warn;
use std::path::{Path, PathBuf};

use crate::package::DEPENDENCY_CACHE_DIR;
use crate::runtime::Runtime;

/// Hidden directories and dependency caches are never descended into.
pub fn is_pruned(name: &str) -> bool {
    name.starts_with('.') || name == DEPENDENCY_CACHE_DIR
}

/// Immediate subdirectories of `dir` that the scan may enter.
pub async fn child_dirs<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(runtime
        .read_dir(dir)
        .await?
        .into_iter()
        .filter(|entry| entry.is_dir && entry.file_name().is_some_and(|name| !is_pruned(name)))
        .map(|entry| entry.path)
        .collect())
}

/// Every directory below `root` reachable without crossing a pruned one.
///
/// Siblings are visited concurrently and each subtree is scanned without
/// waiting on its siblings. Unreadable directories are logged and left out
/// together with everything beneath them. The order of the result is
/// unspecified.
#[tracing::instrument(skip(runtime))]
pub async fn scan_workspace<R: Runtime>(runtime: &R, root: &Path) -> Vec<PathBuf> {
    visit(runtime, root.to_path_buf()).await.unwrap_or_default()
}

fn visit<R: Runtime>(runtime: &R, dir: PathBuf) -> BoxFuture<'_, Option<Vec<PathBuf>>> {
    async move {
        let children = match child_dirs(runtime, &dir).await {
            Ok(children) => children,
            Err(e) => {
                warn!("Skipping unreadable directory {:?}: {:#}", dir, e);
                return None;
            }
        };

        let subtrees = join_all(children.into_iter().map(|child| async move {
            let descendants = visit(runtime, child.clone()).await?;
            Some((child, descendants))
        }))
        .await;

        let mut found = Vec::new();
        for (child, descendants) in subtrees.into_iter().flatten() {
            found.push(child);
            found.extend(descendants);
        }
        Some(found)
    }
    .boxed()
}
