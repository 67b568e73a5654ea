//! The external build driver seam

use async_trait::async_trait;
use pkgmend_config::constants::{log_file_name, BUILD_LOG_KIND, ROOT_LOG_KIND};
use pkgmend_errors::{Error, RepairError};
use pkgmend_manifest::Manifest;
use pkgmend_types::BuildSystemId;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Everything a build driver needs for one round
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub manifest: &'a Manifest,
    /// Persisted manifest, when the store keeps one on disk
    pub manifest_path: Option<&'a Path>,
    pub build_system: BuildSystemId,
    pub round: u32,
    pub source_dir: &'a Path,
    pub build_root: &'a Path,
    /// Where the driver leaves its transcripts
    pub results_dir: &'a Path,
}

/// What one build attempt left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// `None` when the driver was killed by a signal
    pub exit_code: Option<i32>,
    pub transcript: PathBuf,
    /// Secondary transcript of the build environment setup
    pub root_transcript: Option<PathBuf>,
}

impl BuildOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one build of the current manifest.
///
/// Sandboxing is entirely the driver's business. An `Err` means no transcript
/// could be produced at all; a failed build is a normal outcome.
#[async_trait]
pub trait Builder: Send + Sync {
    async fn run(&self, request: &BuildRequest<'_>) -> Result<BuildOutcome, Error>;

    /// Whether `build_system` can be driven for this source tree
    async fn probe(&self, _build_system: BuildSystemId, _source_dir: &Path) -> Result<bool, Error> {
        Ok(true)
    }
}

/// Builder that runs a configured program.
///
/// The program learns about the session through `PKGMEND_*` environment
/// variables. If it does not write `build.log`/`root.log` into the results
/// directory itself, its stdout and stderr become those transcripts.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
}

impl CommandBuilder {
    /// # Errors
    ///
    /// Returns `RepairError::EnvironmentFailure` for an empty command line.
    pub fn new(command: &[String]) -> Result<Self, Error> {
        let (program, args) = command.split_first().ok_or_else(|| {
            RepairError::EnvironmentFailure {
                message: "no build command configured (builder.command)".to_string(),
            }
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn run(&self, request: &BuildRequest<'_>) -> Result<BuildOutcome, Error> {
        let results_dir = request.results_dir;
        tokio::fs::create_dir_all(results_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, results_dir))?;

        let transcript = results_dir.join(log_file_name(BUILD_LOG_KIND));
        let root_transcript = results_dir.join(log_file_name(ROOT_LOG_KIND));
        // a stale transcript from the previous round must not be analyzed again
        for stale in [&transcript, &root_transcript] {
            match tokio::fs::remove_file(stale).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io_with_path(&e, stale)),
            }
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(request.source_dir)
            .env("PKGMEND_ROUND", request.round.to_string())
            .env("PKGMEND_BUILD_SYSTEM", request.build_system.to_string())
            .env("PKGMEND_SOURCE_DIR", request.source_dir)
            .env("PKGMEND_BUILD_ROOT", request.build_root)
            .env("PKGMEND_RESULTS_DIR", results_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = request.manifest_path {
            cmd.env("PKGMEND_MANIFEST", path);
        }

        info!(command = %self.command_line(), round = request.round, "running build driver");
        let output = cmd
            .output()
            .await
            .map_err(|e| RepairError::EnvironmentFailure {
                message: format!("{}: {e}", self.program),
            })?;
        debug!(status = ?output.status, "build driver finished");

        if !tokio::fs::try_exists(&transcript).await.unwrap_or(false) {
            tokio::fs::write(&transcript, &output.stdout)
                .await
                .map_err(|e| Error::io_with_path(&e, &transcript))?;
        }
        if !tokio::fs::try_exists(&root_transcript).await.unwrap_or(false)
            && !output.stderr.is_empty()
        {
            tokio::fs::write(&root_transcript, &output.stderr)
                .await
                .map_err(|e| Error::io_with_path(&e, &root_transcript))?;
        }
        let root_transcript = tokio::fs::try_exists(&root_transcript)
            .await
            .unwrap_or(false)
            .then_some(root_transcript);

        Ok(BuildOutcome {
            exit_code: output.status.code(),
            transcript,
            root_transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_an_environment_failure() {
        let err = CommandBuilder::new(&[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Repair(RepairError::EnvironmentFailure { .. })
        ));
    }

    #[test]
    fn command_line_joins_arguments() {
        let builder =
            CommandBuilder::new(&["mock".to_string(), "-r".to_string(), "fedora".to_string()])
                .unwrap();
        assert_eq!(builder.command_line(), "mock -r fedora");
    }
}
