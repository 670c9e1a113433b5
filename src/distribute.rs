//! The `copy` pipeline: scripts, pack, stage, match consumers, synchronize.

use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::cleanup::{CleanupGuard, SharedCleanupContext};
use crate::config::Config;
use crate::error::PipelineError;
use crate::pack::{STAGING_DIR_NAME, pack, stage};
use crate::package::load_manifest;
use crate::runtime::{Runtime, Shell};
use crate::scripts::{ScriptSelection, run_scripts};
use crate::sync::{SyncReport, sync_consumers};
use crate::workspace::find_consumers;

/// Distribute the project at `project_dir` to every consumer under the
/// configured workspace root.
///
/// The archive and staging directory are removed before returning, on every
/// path that created them. While they exist they are also registered in
/// `cleanup` so an interrupt handler can remove them.
#[tracing::instrument(skip(runtime, shell, config, scripts, cleanup))]
pub async fn distribute<R: Runtime, S: Shell>(
    runtime: &R,
    shell: &S,
    config: &Config,
    scripts: &ScriptSelection,
    project_dir: &Path,
    cleanup: &SharedCleanupContext,
) -> Result<SyncReport, PipelineError> {
    run_scripts(shell, config, scripts, project_dir).await?;

    let package = load_manifest(runtime, project_dir)
        .await
        .manifest()
        .and_then(|m| m.package_name())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::ManifestMissing(project_dir.to_path_buf()))?;

    let archive = pack(shell, project_dir).await?;
    let _archive_guard = CleanupGuard::new(Arc::clone(cleanup), archive.clone());
    let _staging_guard =
        CleanupGuard::new(Arc::clone(cleanup), project_dir.join(STAGING_DIR_NAME));

    let artifact = stage(runtime, archive, project_dir).await?;

    info!("copying package {} to repos under: {:?}", package, config.dir);
    let consumers: Vec<_> = find_consumers(runtime, &config.dir, &package)
        .await
        .into_iter()
        .filter(|c| !c.dir.starts_with(artifact.staging_dir()))
        .collect();
    if consumers.is_empty() {
        warn!("no project under {:?} uses {}", config.dir, package);
    }

    let report = sync_consumers(runtime, artifact.staging_dir(), &package, &consumers).await;
    artifact.release(runtime).await;

    if !report.is_success() {
        return Err(PipelineError::ConsumerSync {
            failed: report.failed.len(),
            total: report.total(),
        });
    }
    info!("copied {} to {} project(s)", package, report.copied.len());
    Ok(report)
}
