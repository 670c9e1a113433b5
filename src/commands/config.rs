use anyhow::{Result, bail};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigStore, ConfigUpdate, PackageManager};
use crate::runtime::{Runtime, Shell};

/// Create the config file for the workspace at `dir`.
///
/// Compile and build scripts default to `<pm> run compile` / `<pm> run build`
/// for the detected package manager unless given in `scripts`.
#[tracing::instrument(skip(runtime, shell, config_path, scripts))]
pub async fn init<R: Runtime, S: Shell>(
    runtime: R,
    shell: S,
    config_path: Option<PathBuf>,
    dir: PathBuf,
    scripts: ConfigUpdate,
) -> Result<()> {
    let store = ConfigStore::open(&runtime, config_path)?;
    let dir = workspace_dir(&runtime, dir).await?;
    let cwd = runtime.current_dir()?;
    let package_manager = detect_package_manager(&shell, &cwd).await;
    info!("using {} as the package manager", package_manager.name());

    let mut config = Config {
        dir,
        compile_script: Some(package_manager.run_script("compile")),
        build_script: Some(package_manager.run_script("build")),
        preferred_package_manager: package_manager,
        ..Default::default()
    };
    config.apply(ConfigUpdate { dir: None, ..scripts });

    store.save(&config).await?;
    println!("localpkg initialized, config saved to {}", store.path().display());
    Ok(())
}

/// Merge the given values into the existing config.
#[tracing::instrument(skip(runtime, config_path, update))]
pub async fn set_config<R: Runtime>(
    runtime: R,
    config_path: Option<PathBuf>,
    mut update: ConfigUpdate,
) -> Result<()> {
    if update == ConfigUpdate::default() {
        bail!("nothing to set, pass at least one of --dir, --compile-script, --build-script, --custom-script");
    }

    let store = ConfigStore::open(&runtime, config_path)?;
    let Some(mut config) = store.load().await else {
        bail!(
            "no config found at {}, please run 'localpkg init <dir>' first",
            store.path().display()
        );
    };

    if let Some(dir) = update.dir.take() {
        update.dir = Some(workspace_dir(&runtime, dir).await?);
    }
    config.apply(update);

    store.save(&config).await?;
    println!("config updated");
    Ok(())
}

/// Print the config as JSON.
#[tracing::instrument(skip(runtime, config_path))]
pub async fn get_config<R: Runtime>(runtime: R, config_path: Option<PathBuf>) -> Result<()> {
    let store = ConfigStore::open(&runtime, config_path)?;
    let Some(config) = store.load().await else {
        bail!(
            "no config found at {}, please run 'localpkg init <dir>' first",
            store.path().display()
        );
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// `yarn` when `yarn --version` succeeds, `npm` otherwise.
pub async fn detect_package_manager<S: Shell>(shell: &S, cwd: &Path) -> PackageManager {
    match shell.run("yarn --version", cwd).await {
        Ok(output) if output.success() => PackageManager::Yarn,
        Ok(_) => PackageManager::Npm,
        Err(e) => {
            debug!("yarn is not available: {:#}", e);
            PackageManager::Npm
        }
    }
}

/// Absolute workspace root, which must be an existing directory.
async fn workspace_dir<R: Runtime>(runtime: &R, dir: PathBuf) -> Result<PathBuf> {
    let dir = if dir.is_absolute() {
        dir
    } else {
        runtime.current_dir()?.join(dir)
    };
    if !runtime.is_dir(&dir).await {
        bail!("{} is not a directory", dir.display());
    }
    Ok(dir)
}
