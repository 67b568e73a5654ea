//! Event handling and progress display

use crate::logging::log_event_with_tracing;
use console::{Style, Term};
use pkgmend_events::{AppEvent, GeneralEvent, RepairEvent};
use pkgmend_types::BuildSystemId;

/// Event handler for progress display and user feedback
///
/// Progress goes to stderr so stdout carries only the final result.
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    /// Show per-fix lines and debug messages
    verbose: bool,
    /// Fixes announced in the current round
    round_fixes: usize,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, verbose: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            verbose,
            round_fixes: 0,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);
        match event {
            AppEvent::Repair(repair_event) => self.handle_repair_event(repair_event),
            AppEvent::General(general_event) => self.handle_general_event(general_event),
        }
    }

    fn handle_repair_event(&mut self, event: RepairEvent) {
        match event {
            RepairEvent::SessionStarted {
                package, round_cap, ..
            } => {
                self.show_status(&format!(
                    "Repairing {} (at most {round_cap} rounds)",
                    self.bold(&package)
                ));
            }
            RepairEvent::BuildSystemDetected {
                build_system,
                candidates,
                ..
            } => {
                if candidates.is_empty() {
                    self.show_status(&format!("Build system: {build_system}"));
                } else {
                    let others: Vec<&str> =
                        candidates.into_iter().map(BuildSystemId::as_str).collect();
                    self.show_status(&format!(
                        "Build system: {build_system} (also found {})",
                        others.join(", ")
                    ));
                }
            }
            RepairEvent::RoundStarted { round, .. } => {
                self.round_fixes = 0;
                self.show_status(&format!("Round {round}: building"));
            }
            RepairEvent::BuildFinished { exit_code, .. } => {
                if self.verbose {
                    let status = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                    self.show_status(&format!("  build exited with {status}"));
                }
            }
            RepairEvent::FixApplied { fix, .. } => {
                self.round_fixes += 1;
                if self.verbose {
                    self.show_status(&format!("  + {fix}"));
                }
            }
            RepairEvent::SignatureUnresolved { signature, .. } => {
                self.show_warning(&format!("  unresolved: {signature}"));
            }
            RepairEvent::RoundCompleted {
                round,
                must_restart,
                file_restart,
                ..
            } => {
                self.show_status(&format!(
                    "Round {round}: {} fixes ({must_restart} requirement, {file_restart} file)",
                    self.round_fixes
                ));
            }
            RepairEvent::Converged { rounds, fixes, .. } => {
                let message = format!("Build repaired after {rounds} rounds with {fixes} fixes");
                self.show_success(&message);
            }
            RepairEvent::Aborted {
                rounds, failure, ..
            } => {
                self.show_error(&format!(
                    "Repair aborted after {rounds} rounds: {}",
                    failure.message
                ));
            }
            RepairEvent::CollateralWritten { path, entries, .. } => {
                self.show_status(&format!("Wrote {} ({entries} entries)", path.display()));
            }
        }
    }

    fn handle_general_event(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.show_warning(&format!("Warning: {message} ({context})")),
                None => self.show_warning(&format!("Warning: {message}")),
            },
            GeneralEvent::StepFailed { step, error } => {
                self.show_warning(&format!("Warning: {step} skipped: {error}"));
            }
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.colors_enabled {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn show_status(&self, message: &str) {
        self.term.write_line(message).unwrap_or(());
    }

    fn show_success(&self, message: &str) {
        self.styled(message, &Style::new().green());
    }

    fn show_warning(&self, message: &str) {
        self.styled(message, &Style::new().yellow());
    }

    fn show_error(&self, message: &str) {
        self.styled(message, &Style::new().red());
    }

    fn styled(&self, message: &str, style: &Style) {
        if self.colors_enabled {
            self.show_status(&style.apply_to(message).to_string());
        } else {
            self.show_status(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgmend_types::{Dependency, FixAction};
    use uuid::Uuid;

    #[test]
    fn fixes_are_counted_per_round() {
        let session_id = Uuid::new_v4();
        let mut handler = EventHandler::new(false, false);

        handler.handle_event(AppEvent::Repair(RepairEvent::RoundStarted {
            session_id,
            round: 1,
        }));
        for name in ["zlib-devel", "openssl-devel"] {
            handler.handle_event(AppEvent::Repair(RepairEvent::FixApplied {
                session_id,
                round: 1,
                fix: FixAction::AddBuildRequire {
                    dependency: Dependency::bare(name),
                },
            }));
        }
        assert_eq!(handler.round_fixes, 2);

        handler.handle_event(AppEvent::Repair(RepairEvent::RoundStarted {
            session_id,
            round: 2,
        }));
        assert_eq!(handler.round_fixes, 0);
    }

    #[test]
    fn general_events_do_not_panic() {
        let mut handler = EventHandler::new(true, true);
        handler.handle_event(AppEvent::General(GeneralEvent::warning_with_context(
            "configure miss is blacklisted",
            "python2",
        )));
        handler.handle_event(AppEvent::General(GeneralEvent::step_failed(
            "whatrequires",
            "query timed out",
        )));
    }
}
