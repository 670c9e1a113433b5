//! Pre-distribution scripts (custom, build, compile).

use log::{debug, error, info};
use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::error::PipelineError;
use crate::runtime::Shell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Custom,
    Build,
    Compile,
}

impl ScriptKind {
    /// Execution order, independent of the order flags were given in.
    pub const ORDER: [ScriptKind; 3] = [ScriptKind::Custom, ScriptKind::Build, ScriptKind::Compile];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptKind::Custom => "custom",
            ScriptKind::Build => "build",
            ScriptKind::Compile => "compile",
        }
    }

    /// Name of the matching field in the config file.
    pub fn config_key(&self) -> &'static str {
        match self {
            ScriptKind::Custom => "customScript",
            ScriptKind::Build => "buildScript",
            ScriptKind::Compile => "compileScript",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single script was requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScriptRequest {
    #[default]
    Skip,
    /// Bare flag: run whatever is configured for this kind.
    Configured,
    /// Flag with a value: run this literal command.
    Command(String),
}

impl ScriptRequest {
    /// Map an optional-value CLI flag: absent, `--build`, or `--build=<cmd>`.
    /// An empty value means the same as the bare flag.
    pub fn from_flag(flag: Option<Option<String>>) -> Self {
        match flag {
            None => ScriptRequest::Skip,
            Some(None) => ScriptRequest::Configured,
            Some(Some(cmd)) if cmd.trim().is_empty() => ScriptRequest::Configured,
            Some(Some(cmd)) => ScriptRequest::Command(cmd),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSelection {
    pub custom: ScriptRequest,
    pub build: ScriptRequest,
    pub compile: ScriptRequest,
}

impl ScriptSelection {
    pub fn get(&self, kind: ScriptKind) -> &ScriptRequest {
        match kind {
            ScriptKind::Custom => &self.custom,
            ScriptKind::Build => &self.build,
            ScriptKind::Compile => &self.compile,
        }
    }
}

/// Resolve every requested script to a command line, in execution order.
///
/// Fails before anything runs if a script was requested via its bare flag
/// but nothing is configured for it.
pub fn plan_scripts(
    config: &Config,
    selection: &ScriptSelection,
) -> Result<Vec<(ScriptKind, String)>, PipelineError> {
    let mut planned = Vec::new();
    for kind in ScriptKind::ORDER {
        match selection.get(kind) {
            ScriptRequest::Skip => {}
            ScriptRequest::Command(cmd) => planned.push((kind, cmd.clone())),
            ScriptRequest::Configured => match config.script(kind) {
                Some(script) => planned.push((kind, script.to_string())),
                None => {
                    let err = PipelineError::MissingScript { kind };
                    error!("{}", err);
                    return Err(err);
                }
            },
        }
    }
    Ok(planned)
}

/// Run the requested scripts inside `cwd`, stopping at the first failure.
#[tracing::instrument(skip(shell, config, selection))]
pub async fn run_scripts<S: Shell>(
    shell: &S,
    config: &Config,
    selection: &ScriptSelection,
    cwd: &Path,
) -> Result<(), PipelineError> {
    for (kind, script) in plan_scripts(config, selection)? {
        info!("running {} script ({})", kind, script);
        let output = shell.run(&script, cwd).await?;

        if !output.success() {
            error!("{} script failed to run", kind);
            if !output.stderr.trim().is_empty() {
                error!("{}", output.stderr.trim_end());
            }
            return Err(PipelineError::ScriptFailed {
                kind,
                code: output.code_display(),
            });
        }

        debug!("{} script output:\n{}", kind, output.stdout.trim_end());
        info!("{} script ran successfully", kind);
    }
    Ok(())
}
