//! Packaging the current project and staging its content.
//!
//! `npm pack` writes a tarball next to the project and prints its file name;
//! the tarball is then extracted into a `package/` staging directory that the
//! synchronizer copies from.

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::runtime::{Runtime, Shell};

pub const PACK_COMMAND: &str = "npm pack";

/// Staging directory name, relative to the packed project.
pub const STAGING_DIR_NAME: &str = "package";

/// Archive file name from the packaging tool's stdout.
///
/// The tool prints a log whose second-to-last line (splitting on `\n`) is the
/// archive name; for newline-terminated output that is the last non-empty
/// line. This is the only place that knows the convention.
pub fn archive_name_from_output(stdout: &str) -> Option<&str> {
    let lines: Vec<&str> = stdout.split('\n').collect();
    if lines.len() < 2 {
        return None;
    }
    let name = lines[lines.len() - 2].trim();
    if name.is_empty() { None } else { Some(name) }
}

/// Pack `project_dir` and return the absolute path of the produced archive.
#[tracing::instrument(skip(shell))]
pub async fn pack<S: Shell>(shell: &S, project_dir: &Path) -> Result<PathBuf, PipelineError> {
    let output = shell.run(PACK_COMMAND, project_dir).await?;
    if !output.success() {
        error!("pack failed");
        if !output.stderr.trim().is_empty() {
            error!("{}", output.stderr.trim_end());
        }
        return Err(PipelineError::PackFailed(format!(
            "`{}` exited with code {}",
            PACK_COMMAND,
            output.code_display()
        )));
    }

    let name = archive_name_from_output(&output.stdout).ok_or_else(|| {
        error!("pack failed");
        PipelineError::PackFailed(format!(
            "could not find the archive name in the output of `{}`",
            PACK_COMMAND
        ))
    })?;
    debug!("Packed {:?} into {}", project_dir, name);
    Ok(project_dir.join(name))
}

/// Archive plus staging directory of one distribution run.
///
/// Both paths belong to that run alone and are removed by [`release`]
/// whatever the outcome.
///
/// [`release`]: DistributionArtifact::release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionArtifact {
    archive: PathBuf,
    staging_dir: PathBuf,
}

impl DistributionArtifact {
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Remove the archive and staging directory. Failures are logged only.
    #[tracing::instrument(skip(self, runtime))]
    pub async fn release<R: Runtime>(&self, runtime: &R) {
        if runtime.exists(&self.archive).await
            && let Err(e) = runtime.remove_file(&self.archive).await
        {
            error!("could not remove {:?}: {:#}", self.archive, e);
        }
        if runtime.exists(&self.staging_dir).await
            && let Err(e) = runtime.remove_dir_all(&self.staging_dir).await
        {
            error!("could not remove {:?}: {:#}", self.staging_dir, e);
        }
    }
}

/// Extract `archive` into a fresh staging directory inside `project_dir`.
///
/// Leftovers from an earlier run are removed first. If extraction fails the
/// archive and any partial staging content are removed before returning.
#[tracing::instrument(skip(runtime))]
pub async fn stage<R: Runtime>(
    runtime: &R,
    archive: PathBuf,
    project_dir: &Path,
) -> Result<DistributionArtifact, PipelineError> {
    let artifact = DistributionArtifact {
        archive,
        staging_dir: project_dir.join(STAGING_DIR_NAME),
    };

    let result = async {
        if runtime.exists(&artifact.staging_dir).await {
            debug!("Removing leftover staging directory {:?}", artifact.staging_dir);
            runtime.remove_dir_all(&artifact.staging_dir).await?;
        }
        runtime
            .unpack_tar_gz(&artifact.archive, &artifact.staging_dir)
            .await
    }
    .await;

    match result {
        Ok(()) => {
            info!(
                "unpacked {} into {:?}",
                artifact.archive.display(),
                artifact.staging_dir
            );
            Ok(artifact)
        }
        Err(e) => {
            warn!("unpack failed, removing {:?}", artifact.archive);
            artifact.release(runtime).await;
            Err(PipelineError::ExtractFailed {
                archive: artifact.archive,
                reason: format!("{:#}", e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, MockShell, RealRuntime};
    use crate::test_utils::{create_tar_gz, exec_output};
    use anyhow::anyhow;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_archive_name_from_npm_output() {
        assert_eq!(
            archive_name_from_output("foo-1.0.0.tgz\n"),
            Some("foo-1.0.0.tgz")
        );
        assert_eq!(
            archive_name_from_output("> foo@1.0.0 prepack\n> tsc\n\nfoo-1.0.0.tgz\n"),
            Some("foo-1.0.0.tgz")
        );
        assert_eq!(
            archive_name_from_output("acme-ui-2.0.0.tgz\r\n"),
            Some("acme-ui-2.0.0.tgz")
        );
    }

    #[test]
    fn test_archive_name_requires_convention() {
        assert_eq!(archive_name_from_output(""), None);
        assert_eq!(archive_name_from_output("foo-1.0.0.tgz"), None);
        assert_eq!(archive_name_from_output("\n\n"), None);
    }

    #[tokio::test]
    async fn test_pack_returns_archive_path_in_project() {
        let mut shell = MockShell::new();
        shell
            .expect_run()
            .withf(|cmd, cwd| cmd == "npm pack" && cwd == Path::new("/ws/foo"))
            .times(1)
            .returning(|_, _| Ok(exec_output(0, "foo-1.0.0.tgz\n")));

        let archive = pack(&shell, Path::new("/ws/foo")).await.unwrap();
        assert_eq!(archive, PathBuf::from("/ws/foo/foo-1.0.0.tgz"));
    }

    #[tokio::test]
    async fn test_pack_failure() {
        let mut shell = MockShell::new();
        shell
            .expect_run()
            .returning(|_, _| Ok(exec_output(1, "")));

        let result = pack(&shell, Path::new("/ws/foo")).await;
        assert!(matches!(result, Err(PipelineError::PackFailed(_))));
    }

    #[tokio::test]
    async fn test_pack_without_archive_name() {
        let mut shell = MockShell::new();
        shell
            .expect_run()
            .returning(|_, _| Ok(exec_output(0, "")));

        let result = pack(&shell, Path::new("/ws/foo")).await;
        assert!(matches!(result, Err(PipelineError::PackFailed(_))));
    }

    #[tokio::test]
    async fn test_stage_replaces_leftover_staging_dir() {
        let project = tempdir().unwrap();
        let archive = project.path().join("foo-1.0.0.tgz");
        fs::write(
            &archive,
            create_tar_gz(&[("package/index.js", "fresh")]),
        )
        .unwrap();
        fs::create_dir_all(project.path().join("package")).unwrap();
        fs::write(project.path().join("package/stale.js"), "old").unwrap();

        let artifact = stage(&RealRuntime, archive.clone(), project.path())
            .await
            .unwrap();

        assert_eq!(artifact.staging_dir(), project.path().join("package"));
        assert_eq!(artifact.archive(), archive);
        assert_eq!(
            fs::read_to_string(project.path().join("package/index.js")).unwrap(),
            "fresh"
        );
        assert!(!project.path().join("package/stale.js").exists());

        artifact.release(&RealRuntime).await;
        assert!(!archive.exists());
        assert!(!project.path().join("package").exists());
    }

    #[tokio::test]
    async fn test_stage_failure_removes_archive() {
        let project = tempdir().unwrap();
        let archive = project.path().join("foo-1.0.0.tgz");
        fs::write(&archive, "not a tarball").unwrap();

        let result = stage(&RealRuntime, archive.clone(), project.path()).await;

        assert!(matches!(result, Err(PipelineError::ExtractFailed { .. })));
        assert!(!archive.exists());
        assert!(!project.path().join("package").exists());
    }

    #[test_log::test(tokio::test)]
    async fn test_stage_reports_extract_failure_when_release_fails() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_remove_dir_all()
            .times(2)
            .returning(|_| Err(anyhow!("Device or resource busy")));
        runtime
            .expect_remove_file()
            .times(1)
            .returning(|_| Err(anyhow!("Permission denied")));

        let result = stage(
            &runtime,
            PathBuf::from("/ws/foo/foo-1.0.0.tgz"),
            Path::new("/ws/foo"),
        )
        .await;

        match result {
            Err(PipelineError::ExtractFailed { archive, reason }) => {
                assert_eq!(archive, PathBuf::from("/ws/foo/foo-1.0.0.tgz"));
                assert!(reason.contains("Device or resource busy"));
            }
            other => panic!("Expected ExtractFailed, got {:?}", other),
        }
    }
}
