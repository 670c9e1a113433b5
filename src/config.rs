//! Persisted user configuration (`~/.localpkg-config.json`).

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::runtime::{Runtime, quote_path};
use crate::scripts::ScriptKind;

pub const CONFIG_FILE_NAME: &str = ".localpkg-config.json";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
}

impl PackageManager {
    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
        }
    }

    /// Lock file the install tool rewrites in the target project.
    pub fn lock_file(&self) -> &'static str {
        match self {
            PackageManager::Npm => "package-lock.json",
            PackageManager::Yarn => "yarn.lock",
        }
    }

    /// Default command for running a package script, e.g. `yarn run build`.
    pub fn run_script(&self, script: &str) -> String {
        format!("{} run {}", self.name(), script)
    }

    /// Command that installs a packed archive as a saved dependency.
    pub fn install_command(&self, archive: &Path) -> String {
        match self {
            PackageManager::Npm => format!("npm install --save {}", quote_path(archive)),
            PackageManager::Yarn => format!("yarn add {}", quote_path(archive)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Workspace root under which all member projects live.
    pub dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_script: Option<String>,
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub preferred_package_manager: PackageManager,
}

impl Config {
    /// Configured command for a script kind, ignoring blank entries.
    pub fn script(&self, kind: ScriptKind) -> Option<&str> {
        let script = match kind {
            ScriptKind::Custom => &self.custom_script,
            ScriptKind::Build => &self.build_script,
            ScriptKind::Compile => &self.compile_script,
        };
        script.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Merge the provided values over the current ones.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(dir) = update.dir {
            self.dir = dir;
        }
        if let Some(script) = non_blank(update.compile_script) {
            self.compile_script = Some(script);
        }
        if let Some(script) = non_blank(update.build_script) {
            self.build_script = Some(script);
        }
        if let Some(script) = non_blank(update.custom_script) {
            self.custom_script = Some(script);
        }
        self.initialized = true;
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Values supplied to `init` / `set-config`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    pub dir: Option<PathBuf>,
    pub compile_script: Option<String>,
    pub build_script: Option<String>,
    pub custom_script: Option<String>,
}

/// Reads and writes the config file.
pub struct ConfigStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> ConfigStore<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    /// Store at `path`, or at `<home>/.localpkg-config.json` when `None`.
    pub fn open(runtime: &'a R, path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => runtime
                .home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?
                .join(CONFIG_FILE_NAME),
        };
        Ok(Self::new(runtime, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config. A missing or unreadable file yields `None`.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Option<Config> {
        if !self.runtime.exists(&self.path).await {
            debug!("No config file at {:?}", self.path);
            return None;
        }
        let content = match self.runtime.read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("Failed to read config {:?}: {:#}", self.path, e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                debug!("Invalid config {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Load the config, failing unless `init` has completed.
    pub async fn load_initialized(&self) -> Result<Config, PipelineError> {
        match self.load().await {
            Some(config) if config.initialized => Ok(config),
            _ => Err(PipelineError::NotInitialized),
        }
    }

    #[tracing::instrument(skip(self, config))]
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !self.runtime.exists(parent).await
        {
            self.runtime.create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(config)?;
        self.runtime
            .write(&self.path, content.as_bytes())
            .await
            .with_context(|| format!("Failed to save config to {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_config_json_field_names() {
        let json = r#"{
            "dir": "/work",
            "compileScript": "npm run compile",
            "buildScript": "npm run build",
            "initialized": true,
            "preferredPackageManager": "yarn"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.dir, PathBuf::from("/work"));
        assert_eq!(config.compile_script.as_deref(), Some("npm run compile"));
        assert_eq!(config.custom_script, None);
        assert!(config.initialized);
        assert_eq!(config.preferred_package_manager, PackageManager::Yarn);
    }

    #[test]
    fn test_script_ignores_blank_entries() {
        let config = Config {
            build_script: Some("  ".to_string()),
            compile_script: Some("tsc".to_string()),
            ..Default::default()
        };
        assert_eq!(config.script(ScriptKind::Build), None);
        assert_eq!(config.script(ScriptKind::Compile), Some("tsc"));
        assert_eq!(config.script(ScriptKind::Custom), None);
    }

    #[test]
    fn test_apply_keeps_existing_values() {
        let mut config = Config {
            dir: PathBuf::from("/old"),
            build_script: Some("npm run build".to_string()),
            custom_script: Some("make".to_string()),
            initialized: true,
            ..Default::default()
        };
        config.apply(ConfigUpdate {
            dir: Some(PathBuf::from("/new")),
            custom_script: Some(String::new()),
            compile_script: Some("tsc -b".to_string()),
            ..Default::default()
        });

        assert_eq!(config.dir, PathBuf::from("/new"));
        assert_eq!(config.build_script.as_deref(), Some("npm run build"));
        assert_eq!(config.custom_script.as_deref(), Some("make"));
        assert_eq!(config.compile_script.as_deref(), Some("tsc -b"));
    }

    #[test]
    fn test_package_manager_commands() {
        assert_eq!(PackageManager::Npm.lock_file(), "package-lock.json");
        assert_eq!(PackageManager::Yarn.lock_file(), "yarn.lock");
        assert_eq!(PackageManager::Yarn.run_script("build"), "yarn run build");
        assert!(
            PackageManager::Npm
                .install_command(Path::new("/ws/foo/foo-1.0.0.tgz"))
                .starts_with("npm install --save ")
        );
        assert!(
            PackageManager::Yarn
                .install_command(Path::new("/ws/foo/foo-1.0.0.tgz"))
                .starts_with("yarn add ")
        );
    }

    #[test]
    fn test_open_defaults_to_home() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));

        let store = ConfigStore::open(&runtime, None).unwrap();
        assert_eq!(
            store.path(),
            Path::new("/home/user/.localpkg-config.json")
        );
    }

    #[test]
    fn test_open_without_home_fails() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| None);
        assert!(ConfigStore::open(&runtime, None).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/home/user/.localpkg-config.json");
        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| false);

        let store = ConfigStore::new(&runtime, path);
        assert!(store.load().await.is_none());
        assert!(matches!(
            store.load_initialized().await,
            Err(PipelineError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_load_invalid_json_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::new(&RealRuntime, path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_uninitialized_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"dir": "/work", "initialized": false}"#).unwrap();

        let store = ConfigStore::new(&RealRuntime, path);
        assert!(store.load().await.is_some());
        assert!(matches!(
            store.load_initialized().await,
            Err(PipelineError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let store = ConfigStore::new(&RealRuntime, path.clone());

        let config = Config {
            dir: PathBuf::from("/work"),
            build_script: Some("yarn run build".to_string()),
            initialized: true,
            preferred_package_manager: PackageManager::Yarn,
            ..Default::default()
        };
        store.save(&config).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"buildScript\""));
        assert!(raw.contains("\"preferredPackageManager\": \"yarn\""));
        assert_eq!(store.load_initialized().await.unwrap(), config);
    }
}
