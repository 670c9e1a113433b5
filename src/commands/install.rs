use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cleanup::{SharedCleanupContext, new_shared};
use crate::config::ConfigStore;
use crate::install::install_local_package;
use crate::runtime::{Runtime, Shell};
use crate::scripts::ScriptSelection;

/// Build the workspace package `package` and install it into the current
/// project. A Ctrl-C during the run removes the packed archive before
/// exiting.
#[tracing::instrument(skip(runtime, shell, config_path, scripts))]
pub async fn install<R: Runtime, S: Shell>(
    runtime: R,
    shell: S,
    config_path: Option<PathBuf>,
    package: &str,
    scripts: ScriptSelection,
) -> Result<()> {
    let config = ConfigStore::open(&runtime, config_path)?
        .load_initialized()
        .await?;
    let project_dir = runtime.current_dir()?;

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

    let result = install_local_package(
        &runtime,
        &shell,
        &config,
        package,
        &scripts,
        &project_dir,
        &cleanup_ctx,
    )
    .await;
    ctrl_c_handler.abort();
    result?;
    println!("{} installed", package);
    Ok(())
}
