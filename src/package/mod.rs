//! npm package descriptors and dependency slots.
//!
//! This module knows how a project declares its identity and dependencies
//! (`package.json`) and where an installed copy of a dependency lives
//! (`node_modules/<name>`).

mod manifest;
mod slot;

pub use manifest::{MANIFEST_FILE, Manifest, ManifestLookup, load_manifest};
pub use slot::{DEPENDENCY_CACHE_DIR, dependency_slot};
