//! Installing a workspace-local package into the current project.

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cleanup::{CleanupGuard, SharedCleanupContext};
use crate::config::Config;
use crate::error::PipelineError;
use crate::pack::pack;
use crate::runtime::{Runtime, Shell};
use crate::scripts::{ScriptSelection, run_scripts};
use crate::workspace::resolve_package_dir;

mod project_files;

pub use project_files::ProjectFiles;

/// Locate `package` under the workspace root, build and pack it there, and
/// install the archive into `project_dir` with the preferred package manager.
///
/// The install tool rewrites the project's `package.json` and lock file to
/// point at the temporary archive; both are restored afterwards so the
/// project keeps referring to the published package. The archive is removed
/// last, whatever the install outcome. While it exists the archive is
/// registered in `cleanup` so an interrupt handler can remove it. Returns the
/// archive path that was installed.
#[tracing::instrument(skip(runtime, shell, config, scripts, cleanup))]
pub async fn install_local_package<R: Runtime, S: Shell>(
    runtime: &R,
    shell: &S,
    config: &Config,
    package: &str,
    scripts: &ScriptSelection,
    project_dir: &Path,
    cleanup: &SharedCleanupContext,
) -> Result<PathBuf, PipelineError> {
    let package_dir = resolve_package_dir(runtime, &config.dir, package)
        .await
        .ok_or_else(|| PipelineError::PackageNotFound {
            name: package.to_string(),
            root: config.dir.clone(),
        })?;
    info!("found {} in {:?}", package, package_dir);

    run_scripts(shell, config, scripts, &package_dir).await?;
    let archive = pack(shell, &package_dir).await?;
    let _archive_guard = CleanupGuard::new(Arc::clone(cleanup), archive.clone());

    let result = install_archive(runtime, shell, config, &archive, project_dir).await;

    if runtime.exists(&archive).await
        && let Err(e) = runtime.remove_file(&archive).await
    {
        error!("could not remove {:?}: {:#}", archive, e);
    }

    result?;
    info!("installed {} into {:?}", package, project_dir);
    Ok(archive)
}

async fn install_archive<R: Runtime, S: Shell>(
    runtime: &R,
    shell: &S,
    config: &Config,
    archive: &Path,
    project_dir: &Path,
) -> Result<(), PipelineError> {
    let package_manager = config.preferred_package_manager;
    let files = ProjectFiles::snapshot(runtime, project_dir, package_manager).await?;

    let command = package_manager.install_command(archive);
    info!("running {}", command);
    let output = shell.run(&command, project_dir).await;

    files.restore(runtime).await;

    let output = output?;
    if !output.success() {
        if !output.stderr.trim().is_empty() {
            warn!("{}", output.stderr.trim_end());
        }
        return Err(PipelineError::InstallFailed {
            archive: archive.to_path_buf(),
            code: output.code_display(),
        });
    }
    Ok(())
}
