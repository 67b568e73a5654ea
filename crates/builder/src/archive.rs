//! Round-numbered transcript archive

use pkgmend_config::constants::round_log_name;
use pkgmend_errors::Error;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps every round's transcripts as `round<N>-<kind>.log`
#[derive(Debug, Clone)]
pub struct RoundLogArchive {
    dir: PathBuf,
}

impl RoundLogArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, round: u32, kind: &str) -> PathBuf {
        self.dir.join(round_log_name(round, kind))
    }

    /// Copy `source` into the archive. A transcript the driver never wrote is
    /// not an error here; `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the copy fails.
    pub async fn archive(
        &self,
        round: u32,
        kind: &str,
        source: &Path,
    ) -> Result<Option<PathBuf>, Error> {
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Ok(None);
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.dir))?;
        let target = self.path_for(round, kind);
        tokio::fs::copy(source, &target)
            .await
            .map_err(|e| Error::io_with_path(&e, source))?;
        debug!(round, kind, path = %target.display(), "archived transcript");
        Ok(Some(target))
    }
}
