//! Polling change detection for `copy --watch`.

use anyhow::{Context, Result};
use glob::Pattern;
use log::{debug, info};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::runtime::Runtime;
use crate::workspace::is_pruned;

/// Paths (relative to the watched root) whose changes never trigger a run.
/// Packing writes the archive and the staging directory into the project, so
/// they would otherwise retrigger every run.
const IGNORED_PATTERNS: &[&str] = &["*.tgz", "package"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    /// How long the tree must stay unchanged before a run starts.
    pub quiet_period: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            quiet_period: Duration::from_secs(2),
        }
    }
}

pub struct WatchFilter {
    ignored: Vec<Pattern>,
}

impl WatchFilter {
    pub fn new() -> Result<Self> {
        let ignored = IGNORED_PATTERNS
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid watch pattern {:?}", p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { ignored })
    }

    /// Whether `relative` (a path below the watched root) is ignored.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let pruned = relative
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_pruned);
        pruned || self.ignored.iter().any(|p| p.matches_path(relative))
    }
}

/// Modification time of every watched file under a root.
pub type Snapshot = BTreeMap<PathBuf, SystemTime>;

/// Record every non-ignored file below `root`. Subdirectories that cannot be
/// read are left out; an unreadable root is an error.
pub async fn snapshot<R: Runtime>(runtime: &R, root: &Path, filter: &WatchFilter) -> Result<Snapshot> {
    let mut files = Snapshot::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match runtime.read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(e.context(format!("Failed to watch {:?}", root))),
            Err(e) => {
                debug!("Not watching {:?}: {:#}", dir, e);
                continue;
            }
        };

        for entry in entries {
            let relative = entry.path.strip_prefix(root).unwrap_or(&entry.path);
            if filter.is_ignored(relative) {
                continue;
            }
            if entry.is_dir {
                pending.push(entry.path);
            } else if let Ok(modified) = runtime.modified(&entry.path).await {
                files.insert(entry.path, modified);
            }
        }
    }
    Ok(files)
}

/// Poll until the tree differs from `baseline`, then wait until it has been
/// stable for the quiet period. Returns the settled snapshot.
pub async fn wait_for_change<R: Runtime>(
    runtime: &R,
    root: &Path,
    filter: &WatchFilter,
    options: &WatchOptions,
    baseline: &Snapshot,
) -> Result<Snapshot> {
    let mut current = loop {
        tokio::time::sleep(options.poll_interval).await;
        let current = snapshot(runtime, root, filter).await?;
        if &current != baseline {
            break current;
        }
    };

    loop {
        tokio::time::sleep(options.quiet_period).await;
        let next = snapshot(runtime, root, filter).await?;
        if next == current {
            return Ok(current);
        }
        current = next;
    }
}

/// Re-run `run` after every settled change below `root` until Ctrl-C.
pub async fn watch<R, F, Fut>(runtime: &R, root: &Path, options: WatchOptions, run: F) -> Result<()>
where
    R: Runtime,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    watch_until(runtime, root, options, run, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Like [`watch`], but stops when `stop` completes.
///
/// Runs never overlap: the next change is only looked for once the previous
/// run has returned, against a snapshot taken after it.
#[tracing::instrument(skip(runtime, run, stop))]
pub async fn watch_until<R, F, Fut, S>(
    runtime: &R,
    root: &Path,
    options: WatchOptions,
    mut run: F,
    stop: S,
) -> Result<()>
where
    R: Runtime,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    S: Future<Output = ()>,
{
    let filter = WatchFilter::new()?;
    tokio::pin!(stop);
    info!("watching {:?} for changes", root);

    loop {
        let baseline = snapshot(runtime, root, &filter).await?;
        tokio::select! {
            changed = wait_for_change(runtime, root, &filter, &options, &baseline) => {
                changed?;
                info!("change detected in {:?}", root);
                run().await;
            }
            _ = &mut stop => {
                info!("stopped watching {:?}", root);
                return Ok(());
            }
        }
    }
}
