//! Manifest persistence between rounds

use crate::Manifest;
use async_trait::async_trait;
use pkgmend_errors::Error;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Read-current/write-current store the build driver consumes
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Current manifest, if one was ever saved
    async fn load(&self) -> Result<Option<Manifest>, Error>;

    /// Replace the stored manifest
    async fn save(&self, manifest: &Manifest) -> Result<(), Error>;

    /// Where the build driver can find the manifest, if it lives on disk
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Store backed by a single TOML file
#[derive(Debug, Clone)]
pub struct TomlManifestStore {
    path: PathBuf,
}

impl TomlManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ManifestStore for TomlManifestStore {
    async fn load(&self) -> Result<Option<Manifest>, Error> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        Manifest::from_file(&self.path).await.map(Some)
    }

    async fn save(&self, manifest: &Manifest) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }
        // Write-then-rename so the driver never reads a half-written file
        let staging = self.path.with_extension("toml.tmp");
        manifest.write_to_file(&staging).await?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.path))?;
        tracing::debug!(path = %self.path.display(), round = manifest.round, "manifest saved");
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// In-process store, used when the build driver is not file based
#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    current: Mutex<Option<Manifest>>,
    saves: Mutex<u32>,
}

impl MemoryManifestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves so far
    pub async fn save_count(&self) -> u32 {
        *self.saves.lock().await
    }
}

#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn load(&self) -> Result<Option<Manifest>, Error> {
        Ok(self.current.lock().await.clone())
    }

    async fn save(&self, manifest: &Manifest) -> Result<(), Error> {
        *self.current.lock().await = Some(manifest.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }
}
