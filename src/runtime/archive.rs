//! Gzipped tarball extraction.

use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use log::debug;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn unpack_tar_gz_impl(&self, archive: &Path, dest: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_stripped(&archive, &dest))
            .await
            .map_err(|e| anyhow!("Extraction task failed: {}", e))?
    }
}

fn unpack_stripped(archive_path: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting {:?} to {:?}...", archive_path, dest);
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    fs::create_dir_all(dest).with_context(|| format!("Failed to create directory {:?}", dest))?;

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read entries of {:?}", archive_path))?
    {
        let mut entry = entry.context("Failed to read archive entry")?;
        let entry_path = entry.path()?.into_owned();

        let Some(relative) = strip_leading_component(&entry_path) else {
            debug!("Skipping entry {:?}", entry_path);
            continue;
        };

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&target)
            .with_context(|| format!("Failed to extract {:?}", target))?;
    }

    Ok(())
}

/// `package/lib/index.js` -> `lib/index.js`. Returns `None` for the wrapper
/// directory itself and for entries that would escape the destination.
fn strip_leading_component(path: &Path) -> Option<PathBuf> {
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    components.next()?;

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}
