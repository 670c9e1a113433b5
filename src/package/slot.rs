use std::path::{Path, PathBuf};

/// Directory holding installed third-party packages.
pub const DEPENDENCY_CACHE_DIR: &str = "node_modules";

/// Location of an installed copy of `package` inside `project_dir`.
///
/// Scoped names (`@scope/name`) map to nested directories.
pub fn dependency_slot(project_dir: &Path, package: &str) -> PathBuf {
    let mut slot = project_dir.join(DEPENDENCY_CACHE_DIR);
    for part in package.split('/').filter(|p| !p.is_empty()) {
        slot.push(part);
    }
    slot
}
