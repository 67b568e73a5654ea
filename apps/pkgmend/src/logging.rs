//! Structured logging integration for events
//!
//! Converts repair events into tracing records with structured fields, and
//! sets up the subscriber those records go to.

use pkgmend_events::{AppEvent, GeneralEvent, RepairEvent};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Initialize tracing/logging
///
/// JSON mode keeps stdout clean, so console logging is off and a file log is
/// only written with `--debug`. Debug mode writes JSON records under
/// `log_dir`; otherwise warnings go to stderr.
pub fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        if debug_enabled {
            if let Some(file) = create_log_file(log_dir) {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(debug_filter())
                    .init();
                return;
            }
        }
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!("Warning: Failed to create log directory: {e}");
        }
        let log_file = log_dir.join(log_file_name());
        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(debug_filter())
                    .init();
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                    )
                    .init();
            }
        }
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

fn debug_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,pkgmend=debug,pkgmend_builder=debug")
    })
}

fn log_file_name() -> String {
    format!("pkgmend-{}.log", chrono::Utc::now().format("%Y%m%d-%H%M%S"))
}

fn create_log_file(log_dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(log_dir).ok()?;
    std::fs::File::create(log_dir.join(log_file_name())).ok()
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    match event {
        AppEvent::Repair(repair_event) => log_repair_event(repair_event),
        AppEvent::General(general_event) => log_general_event(general_event),
    }
}

#[allow(clippy::too_many_lines)]
fn log_repair_event(event: &RepairEvent) {
    match event {
        RepairEvent::SessionStarted {
            session_id,
            package,
            source_dir,
            round_cap,
        } => {
            info!(
                session = %session_id,
                package = %package,
                source_dir = %source_dir.display(),
                round_cap,
                "Repair session started"
            );
        }
        RepairEvent::BuildSystemDetected {
            session_id,
            build_system,
            score,
            candidates,
        } => {
            info!(
                session = %session_id,
                build_system = %build_system,
                score,
                candidates = ?candidates,
                "Build system detected"
            );
        }
        RepairEvent::RoundStarted { session_id, round } => {
            info!(session = %session_id, round, "Round started");
        }
        RepairEvent::BuildFinished {
            session_id,
            round,
            exit_code,
            transcript,
        } => {
            debug!(
                session = %session_id,
                round,
                exit_code = ?exit_code,
                transcript = %transcript.display(),
                "Build finished"
            );
        }
        RepairEvent::FixApplied {
            session_id,
            round,
            fix,
        } => {
            debug!(
                session = %session_id,
                round,
                file_action = fix.is_file_action(),
                fix = %fix,
                "Fix applied"
            );
        }
        RepairEvent::SignatureUnresolved {
            session_id,
            round,
            signature,
        } => {
            warn!(
                session = %session_id,
                round,
                signature = %signature,
                "Failure signature unresolved"
            );
        }
        RepairEvent::RoundCompleted {
            session_id,
            round,
            must_restart,
            file_restart,
        } => {
            info!(
                session = %session_id,
                round,
                must_restart,
                file_restart,
                "Round completed"
            );
        }
        RepairEvent::Converged {
            session_id,
            rounds,
            fixes,
        } => {
            info!(session = %session_id, rounds, fixes, "Repair converged");
        }
        RepairEvent::Aborted {
            session_id,
            rounds,
            failure,
        } => {
            error!(
                session = %session_id,
                rounds,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Repair aborted"
            );
        }
        RepairEvent::CollateralWritten {
            session_id,
            path,
            entries,
        } => {
            info!(
                session = %session_id,
                path = %path.display(),
                entries,
                "Collateral report written"
            );
        }
    }
}

fn log_general_event(event: &GeneralEvent) {
    match event {
        GeneralEvent::Warning { message, context } => {
            warn!(context = ?context, "{message}");
        }
        GeneralEvent::StepFailed { step, error } => {
            warn!(step = %step, error = %error, "Best-effort step failed");
        }
    }
}
