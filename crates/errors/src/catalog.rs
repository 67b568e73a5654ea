//! Rule catalog error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid rule pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("rule file parse error: {message}")]
    ParseError { message: String },

    #[error("unknown handler: {name}")]
    UnknownHandler { name: String },

    #[error("rule file not found: {path}")]
    NotFound { path: String },
}

impl UserFacingError for CatalogError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPattern { .. } => Some("Fix the regular expression in the rule file."),
            Self::UnknownHandler { .. } => {
                Some("Use one of the documented handler names in the rule file.")
            }
            Self::ParseError { .. } | Self::NotFound { .. } => {
                Some("Check the rule files listed under [catalog] in the configuration.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidPattern { .. } => "catalog.invalid_pattern",
            Self::ParseError { .. } => "catalog.parse_error",
            Self::UnknownHandler { .. } => "catalog.unknown_handler",
            Self::NotFound { .. } => "catalog.not_found",
        };
        Some(code)
    }
}
