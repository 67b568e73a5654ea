#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for pkgmend
//!
//! This crate provides the identifiers shared by every stage of a repair
//! session: build-system identities, namespaced dependencies, subpackage keys,
//! lifecycle phases, flag values and the record of applied fixes.

pub mod build_system;
pub mod dependency;
pub mod package;
pub mod reports;

// Re-export commonly used types
pub use build_system::{BuildSystemId, ParseBuildSystemError};
pub use dependency::{Dependency, Namespace};
pub use package::{FileAttr, FlagValue, PackageKey, Phase};
pub use reports::{AppliedFix, FixAction};

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    #[default]
    Tty,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}
