use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use pkgmend_types::{BuildSystemId, FixAction};

use super::FailureContext;

/// Events emitted by a repair session as it moves through its rounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RepairEvent {
    SessionStarted {
        session_id: Uuid,
        package: String,
        source_dir: PathBuf,
        round_cap: u32,
    },

    /// Detection picked a build system; `candidates` lists the runners-up
    BuildSystemDetected {
        session_id: Uuid,
        build_system: BuildSystemId,
        score: i32,
        candidates: Vec<BuildSystemId>,
    },

    RoundStarted {
        session_id: Uuid,
        round: u32,
    },

    BuildFinished {
        session_id: Uuid,
        round: u32,
        exit_code: Option<i32>,
        transcript: PathBuf,
    },

    FixApplied {
        session_id: Uuid,
        round: u32,
        fix: FixAction,
    },

    /// A failure line that matched a rule but could not be resolved
    SignatureUnresolved {
        session_id: Uuid,
        round: u32,
        signature: String,
    },

    RoundCompleted {
        session_id: Uuid,
        round: u32,
        must_restart: u32,
        file_restart: u32,
    },

    Converged {
        session_id: Uuid,
        rounds: u32,
        fixes: usize,
    },

    Aborted {
        session_id: Uuid,
        rounds: u32,
        failure: FailureContext,
    },

    /// Best-effort post-success report written to disk
    CollateralWritten {
        session_id: Uuid,
        path: PathBuf,
        entries: usize,
    },
}

impl RepairEvent {
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::SessionStarted { session_id, .. }
            | Self::BuildSystemDetected { session_id, .. }
            | Self::RoundStarted { session_id, .. }
            | Self::BuildFinished { session_id, .. }
            | Self::FixApplied { session_id, .. }
            | Self::SignatureUnresolved { session_id, .. }
            | Self::RoundCompleted { session_id, .. }
            | Self::Converged { session_id, .. }
            | Self::Aborted { session_id, .. }
            | Self::CollateralWritten { session_id, .. } => *session_id,
        }
    }
}
