//! Workspace traversal: discovering member projects under the configured root.
//!
//! - `scanner` - concurrent recursive directory enumeration with pruning
//! - `matcher` - finding projects that consume a given package
//! - `resolver` - finding the project that defines a given package

mod matcher;
mod resolver;
mod scanner;

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use crate::package::{ManifestLookup, load_manifest};
use crate::runtime::Runtime;

pub use matcher::{ConsumerMatch, find_consumers, has_installed_copy, match_node};
pub use resolver::{find_package_definitions, resolve_package_dir};
pub use scanner::{child_dirs, is_pruned, scan_workspace};

/// A directory visited during a scan. Its manifest is read on first access
/// and lives only as long as the node.
#[derive(Debug)]
pub struct WorkspaceNode {
    path: PathBuf,
    manifest: OnceCell<ManifestLookup>,
}

impl WorkspaceNode {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            manifest: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the directory, used when no manifest name is available.
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub async fn manifest<R: Runtime>(&self, runtime: &R) -> &ManifestLookup {
        self.manifest
            .get_or_init(|| load_manifest(runtime, &self.path))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[tokio::test]
    async fn test_node_loads_manifest_once() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().times(1).returning(|_| true);
        runtime
            .expect_read_to_string()
            .times(1)
            .returning(|_| Ok(r#"{"name": "lib"}"#.to_string()));

        let node = WorkspaceNode::new(PathBuf::from("/ws/lib"));
        let first = node.manifest(&runtime).await.clone();
        let second = node.manifest(&runtime).await;
        assert_eq!(&first, second);
        assert_eq!(node.dir_name(), "lib");
    }
}
