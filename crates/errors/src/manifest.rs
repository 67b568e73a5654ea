//! Manifest persistence error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ManifestError {
    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("failed to read manifest {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("failed to write manifest {path}: {message}")]
    WriteFailed { path: String, message: String },
}

impl UserFacingError for ManifestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidManifest { .. } => "manifest.invalid",
            Self::ReadFailed { .. } => "manifest.read_failed",
            Self::WriteFailed { .. } => "manifest.write_failed",
        };
        Some(code)
    }
}
