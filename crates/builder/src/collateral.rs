//! Post-success reports
//!
//! Nothing here can turn a converged session into a failed one: every error
//! is logged and dropped by the caller.

use async_trait::async_trait;
use pkgmend_analyzer::configure_misses;
use pkgmend_catalog::RuleCatalog;
use pkgmend_errors::{BuildError, Error};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Answers which packages depend on the one being repaired
#[async_trait]
pub trait ReverseDependencyQuery: Send + Sync {
    async fn whatrequires(&self, package: &str) -> Result<Vec<String>, Error>;
}

/// Runs an external query program with the package name as last argument and
/// reads one dependent per stdout line
#[derive(Debug, Clone)]
pub struct CommandReverseDependencies {
    program: String,
    args: Vec<String>,
}

impl CommandReverseDependencies {
    /// `None` for an empty command line
    #[must_use]
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl ReverseDependencyQuery for CommandReverseDependencies {
    async fn whatrequires(&self, package: &str) -> Result<Vec<String>, Error> {
        let command = format!("{} {} {package}", self.program, self.args.join(" "));
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(package)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BuildError::CommandFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// A report written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collateral {
    pub path: PathBuf,
    pub entries: usize,
    /// Entries that name a blacklisted target
    pub flagged: Vec<String>,
}

/// Write the negative configure probes of `transcript` to `target`.
///
/// Returns `None` when the transcript has no misses worth reporting.
pub(crate) async fn write_configure_misses(
    transcript: &Path,
    catalog: &RuleCatalog,
    target: &Path,
) -> Result<Option<Collateral>, Error> {
    let bytes = tokio::fs::read(transcript)
        .await
        .map_err(|e| Error::io_with_path(&e, transcript))?;
    let text = String::from_utf8_lossy(&bytes);
    let report = configure_misses(text.lines(), catalog);
    if report.is_empty() {
        debug!("no configure misses");
        return Ok(None);
    }
    report.write_to(target).await?;
    Ok(Some(Collateral {
        path: target.to_path_buf(),
        entries: report.misses.len(),
        flagged: report.blacklisted.into_iter().collect(),
    }))
}

pub(crate) async fn write_whatrequires(
    query: &dyn ReverseDependencyQuery,
    package: &str,
    target: &Path,
) -> Result<Collateral, Error> {
    let mut dependents = query.whatrequires(package).await?;
    dependents.sort();
    dependents.dedup();
    let mut body = dependents.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    tokio::fs::write(target, body)
        .await
        .map_err(|e| Error::io_with_path(&e, target))?;
    Ok(Collateral {
        path: target.to_path_buf(),
        entries: dependents.len(),
        flagged: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_command_is_none() {
        assert!(CommandReverseDependencies::new(&[]).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn query_output_becomes_sorted_report() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("whatrequires");
        let query = CommandReverseDependencies::new(&[
            "sh".to_string(),
            "-c".to_string(),
            "printf 'zeta\\nalpha\\n\\nalpha\\n'".to_string(),
        ])
        .unwrap();

        let collateral = write_whatrequires(&query, "frob", &target).await.unwrap();
        assert_eq!(collateral.entries, 2);
        assert_eq!(
            tokio::fs::read_to_string(&target).await.unwrap(),
            "alpha\nzeta\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_query_is_an_error() {
        let query = CommandReverseDependencies::new(&["false".to_string()]).unwrap();
        assert!(query.whatrequires("frob").await.is_err());
    }
}
