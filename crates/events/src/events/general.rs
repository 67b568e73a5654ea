use serde::{Deserialize, Serialize};

/// Notices outside the repair state machine. None of them change a session's
/// outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    Warning {
        message: String,
        /// Target or path the warning is about
        context: Option<String>,
    },

    /// A best-effort step such as a collateral report did not complete
    StepFailed { step: String, error: String },
}

impl GeneralEvent {
    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    pub fn step_failed(step: impl Into<String>, error: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.into(),
            error: error.into(),
        }
    }
}
