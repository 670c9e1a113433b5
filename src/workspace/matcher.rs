use futures_util::future::join_all;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{WorkspaceNode, scan_workspace};
use crate::package::{ManifestLookup, dependency_slot};
use crate::runtime::Runtime;

/// A workspace project that should receive a copy of the target package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConsumerMatch {
    pub dir: PathBuf,
    /// The consumer's own package name, or its directory name.
    pub name: String,
}

/// True when an installed copy of `package` already sits in `dir`, whether or
/// not the manifest declares it.
pub async fn has_installed_copy<R: Runtime>(runtime: &R, dir: &Path, package: &str) -> bool {
    runtime.exists(&dependency_slot(dir, package)).await
}

/// Decide whether a single directory consumes `package`.
///
/// Only directories with a readable manifest can match. A match is either a
/// declared dependency (runtime, peer or dev) or an existing installed copy.
#[tracing::instrument(skip(runtime, node), fields(dir = ?node.path()))]
pub async fn match_node<R: Runtime>(
    runtime: &R,
    node: &WorkspaceNode,
    package: &str,
) -> Option<ConsumerMatch> {
    let manifest = match node.manifest(runtime).await {
        ManifestLookup::Missing => return None,
        ManifestLookup::Invalid(reason) => {
            warn!(
                "package.json for folder {:?} is invalid, skipping it: {}",
                node.path(),
                reason
            );
            return None;
        }
        ManifestLookup::Found(manifest) => manifest,
    };

    let declared = manifest.depends_on(package);
    if !declared && !has_installed_copy(runtime, node.path(), package).await {
        return None;
    }

    debug!(
        "{:?} uses {} ({})",
        node.path(),
        package,
        if declared { "declared" } else { "installed copy" }
    );
    Some(ConsumerMatch {
        dir: node.path().to_path_buf(),
        name: manifest
            .package_name()
            .map(str::to_string)
            .unwrap_or_else(|| node.dir_name()),
    })
}

/// Every project under `root` that consumes `package`, at most once per
/// directory, ordered by path.
#[tracing::instrument(skip(runtime))]
pub async fn find_consumers<R: Runtime>(
    runtime: &R,
    root: &Path,
    package: &str,
) -> Vec<ConsumerMatch> {
    let candidates = scan_workspace(runtime, root).await;
    debug!("Checking {} candidate director(ies)", candidates.len());

    let matches = join_all(candidates.into_iter().map(|dir| async move {
        let node = WorkspaceNode::new(dir);
        match_node(runtime, &node, package).await
    }))
    .await;

    let mut unique: BTreeMap<PathBuf, ConsumerMatch> = BTreeMap::new();
    for consumer in matches.into_iter().flatten() {
        unique.entry(consumer.dir.clone()).or_insert(consumer);
    }
    unique.into_values().collect()
}
