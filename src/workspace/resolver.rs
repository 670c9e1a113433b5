use futures_util::future::join_all;
use log::warn;
use std::path::{Path, PathBuf};

use super::{WorkspaceNode, scan_workspace};
use crate::package::ManifestLookup;
use crate::runtime::Runtime;

/// All directories under `root` whose manifest declares `package` as its own
/// name, sorted by path.
#[tracing::instrument(skip(runtime))]
pub async fn find_package_definitions<R: Runtime>(
    runtime: &R,
    root: &Path,
    package: &str,
) -> Vec<PathBuf> {
    let candidates = scan_workspace(runtime, root).await;

    let results = join_all(candidates.into_iter().map(|dir| async move {
        let node = WorkspaceNode::new(dir);
        match node.manifest(runtime).await {
            ManifestLookup::Found(manifest) if manifest.package_name() == Some(package) => {
                Some(node.path().to_path_buf())
            }
            ManifestLookup::Invalid(reason) => {
                warn!(
                    "package.json for folder {:?} is invalid, skipping it: {}",
                    node.path(),
                    reason
                );
                None
            }
            _ => None,
        }
    }))
    .await;

    let mut found: Vec<PathBuf> = results.into_iter().flatten().collect();
    found.sort();
    found
}

/// The directory that defines `package`.
///
/// When several directories define the same name the lexicographically
/// smallest path wins, so the choice does not depend on scan timing.
pub async fn resolve_package_dir<R: Runtime>(
    runtime: &R,
    root: &Path,
    package: &str,
) -> Option<PathBuf> {
    let found = find_package_definitions(runtime, root, package).await;
    if found.len() > 1 {
        warn!(
            "package {} is defined in {} directories ({}); using {:?}",
            package,
            found.len(),
            found
                .iter()
                .map(|p| display_relative(p, root))
                .collect::<Vec<_>>()
                .join(", "),
            found[0]
        );
    }
    found.into_iter().next()
}

fn display_relative(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
