use std::path::PathBuf;
use thiserror::Error;

use crate::scripts::ScriptKind;

/// Failures that abort a `copy` or `install` run.
///
/// Per-directory manifest parse errors are not part of this enum: they are
/// logged and the traversal continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("localpkg hasn't been initialized yet, please run 'localpkg init <dir>'")]
    NotInitialized,

    #[error(
        "there is no {key} in config. either set {key} or send the script in the command",
        key = .kind.config_key()
    )]
    MissingScript { kind: ScriptKind },

    #[error("{kind} script failed to run (exit code {code})")]
    ScriptFailed { kind: ScriptKind, code: String },

    #[error("no package name found in {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("pack failed: {0}")]
    PackFailed(String),

    #[error("unpack of {} failed: {reason}", .archive.display())]
    ExtractFailed { archive: PathBuf, reason: String },

    #[error("failed to copy package content to {failed} of {total} consumer(s)")]
    ConsumerSync { failed: usize, total: usize },

    #[error("package {name} not found under {}. cannot install", .root.display())]
    PackageNotFound { name: String, root: PathBuf },

    #[error("installing {} failed (exit code {code})", .archive.display())]
    InstallFailed { archive: PathBuf, code: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
