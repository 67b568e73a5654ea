//! CLI error handling

use std::fmt;

use pkgmend_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    Config(pkgmend_errors::ConfigError),
    /// Error from one of the library crates
    Ops(pkgmend_errors::Error),
    InvalidArguments(String),
    Io(std::io::Error),
    /// The repair session ended without converging
    Aborted(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Aborted(reason) => write!(f, "Repair aborted: {reason}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<pkgmend_errors::ConfigError> for CliError {
    fn from(e: pkgmend_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<pkgmend_errors::Error> for CliError {
    fn from(e: pkgmend_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
