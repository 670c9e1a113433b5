use anyhow::Result;
use log::error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cleanup::{SharedCleanupContext, new_shared};
use crate::config::{Config, ConfigStore};
use crate::distribute::distribute;
use crate::error::PipelineError;
use crate::runtime::{Runtime, Shell};
use crate::scripts::ScriptSelection;
use crate::sync::SyncReport;
use crate::watch::{WatchOptions, watch};

/// Distribute the current project to its consumers. With `watch` set, keep
/// re-distributing whenever the watched path changes.
#[tracing::instrument(skip(runtime, shell, config_path, scripts))]
pub async fn copy<R: Runtime, S: Shell>(
    runtime: R,
    shell: S,
    config_path: Option<PathBuf>,
    scripts: ScriptSelection,
    watch_path: Option<Option<PathBuf>>,
) -> Result<()> {
    let config = ConfigStore::open(&runtime, config_path)?
        .load_initialized()
        .await?;
    let project_dir = runtime.current_dir()?;

    let Some(watch_path) = watch_path else {
        run_once(&runtime, &shell, &config, &scripts, &project_dir).await?;
        return Ok(());
    };

    let watch_root = match watch_path {
        Some(path) if path.is_absolute() => path,
        Some(path) => project_dir.join(path),
        None => project_dir.clone(),
    };

    let (runtime, shell, config, scripts, project_dir) =
        (&runtime, &shell, &config, &scripts, project_dir.as_path());
    let run = move || async move {
        if let Err(e) = run_once(runtime, shell, config, scripts, project_dir).await {
            error!("{}", e);
        }
    };

    run().await;
    watch(runtime, &watch_root, WatchOptions::default(), run).await
}

/// One distribution run with an interrupt handler armed that removes the
/// run's archive and staging directory before exiting.
async fn run_once<R: Runtime, S: Shell>(
    runtime: &R,
    shell: &S,
    config: &Config,
    scripts: &ScriptSelection,
    project_dir: &Path,
) -> Result<SyncReport, PipelineError> {
    let cleanup_ctx: SharedCleanupContext = new_shared();
    let cleanup_ctx_clone = Arc::clone(&cleanup_ctx);

    let ctrl_c_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cleaning up...");
            if let Ok(ctx) = cleanup_ctx_clone.lock() {
                ctx.cleanup();
            }
            std::process::exit(130);
        }
    });

    let result = distribute(runtime, shell, config, scripts, project_dir, &cleanup_ctx).await;

    ctrl_c_handler.abort();
    result
}
