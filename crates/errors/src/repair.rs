//! Repair session termination reasons

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Why a repair session ended without converging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RepairError {
    #[error("unresolved failure signatures: {}", signatures.join(", "))]
    UnresolvedSignature { signatures: Vec<String> },

    #[error("blacklisted corrective target: {target}")]
    BlacklistedMiss { target: String },

    #[error("build environment failure: {message}")]
    EnvironmentFailure { message: String },

    #[error("no corrective action applied in round {round}")]
    NoProgress { round: u32 },

    #[error("round cap exceeded after {rounds} rounds")]
    RoundCapExceeded { rounds: u32 },
}

impl RepairError {
    /// Fatal reasons short-circuit the session; the rest end it softly.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BlacklistedMiss { .. } | Self::EnvironmentFailure { .. }
        )
    }
}

impl UserFacingError for RepairError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnresolvedSignature { .. } => {
                Some("Add a rule or failed-command mapping for the reported signature.")
            }
            Self::BlacklistedMiss { .. } => {
                Some("This target is marked unsafe to fix automatically; patch the package by hand.")
            }
            Self::EnvironmentFailure { .. } => {
                Some("Check the build driver installation and its permissions.")
            }
            Self::NoProgress { .. } => {
                Some("Inspect the last round transcript under results/ for the real failure.")
            }
            Self::RoundCapExceeded { .. } => {
                Some("Look for rules whose fixes re-trigger each other, or raise repair.round_cap.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::EnvironmentFailure { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnresolvedSignature { .. } => "repair.unresolved_signature",
            Self::BlacklistedMiss { .. } => "repair.blacklisted_miss",
            Self::EnvironmentFailure { .. } => "repair.environment_failure",
            Self::NoProgress { .. } => "repair.no_progress",
            Self::RoundCapExceeded { .. } => "repair.round_cap_exceeded",
        };
        Some(code)
    }
}
