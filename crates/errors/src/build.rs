//! Build invocation and detection error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BuildError {
    #[error("no build system detected in {path}")]
    NoBuildSystemDetected { path: String },

    #[error("build transcript missing: {path}")]
    TranscriptMissing { path: String },

    #[error("build command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    #[error("no builder accepted build system {build_system}")]
    ProbeFailed { build_system: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoBuildSystemDetected { .. } => {
                Some("Add a build.sh or compile.sh at the source root, or point at the right directory.")
            }
            Self::TranscriptMissing { .. } => {
                Some("Check that the build driver can write its logs; it may lack permissions.")
            }
            Self::CommandFailed { .. } => Some("Verify the configured build command exists and is executable."),
            Self::ProbeFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NoBuildSystemDetected { .. } => "build.no_build_system_detected",
            Self::TranscriptMissing { .. } => "build.transcript_missing",
            Self::CommandFailed { .. } => "build.command_failed",
            Self::ProbeFailed { .. } => "build.probe_failed",
        };
        Some(code)
    }
}
