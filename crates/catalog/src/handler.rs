//! Closed set of corrective-action handlers a failure rule can route to

use pkgmend_errors::CatalogError;
use std::fmt;
use std::str::FromStr;

/// What to do with the identifier a failure rule captured.
///
/// Each handler has its own side effect on the manifest, so dispatch is a
/// `match` over this enum and never a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Resolve through the failed-command table or the file-path heuristic
    Command,
    /// Add `pkgconfig(<capture>)`
    Pkgconfig,
    /// Add `perl(<capture>)`
    Perl,
    /// Add `pypi(<capture>)`
    Pypi,
    /// Add `R-<capture>`
    R,
    /// Add `golang(<capture>)`
    Golang,
    /// Add `rubygem(<capture>)`
    Rubygem,
    /// Resolve through the cmake module table
    CmakeModule,
    /// Disable the captured cmake option
    CmakeFlag,
    /// Plugin `<group:artifact>` at version `<capture 2>` could not be resolved
    JavaPlugin,
    /// Comma-separated list of unresolvable artifacts
    JavaPluginList,
    /// Artifact jar was never downloaded from the repository
    JavaJar,
    /// Source file `<capture 1>` imports missing package `<capture 2>`
    JavaPackageMissing,
    /// Look up a flag change in the failed-flags table
    FlagDisable,
}

impl Handler {
    pub const ALL: [Self; 14] = [
        Self::Command,
        Self::Pkgconfig,
        Self::Perl,
        Self::Pypi,
        Self::R,
        Self::Golang,
        Self::Rubygem,
        Self::CmakeModule,
        Self::CmakeFlag,
        Self::JavaPlugin,
        Self::JavaPluginList,
        Self::JavaJar,
        Self::JavaPackageMissing,
        Self::FlagDisable,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Pkgconfig => "pkgconfig",
            Self::Perl => "perl",
            Self::Pypi => "pypi",
            Self::R => "r",
            Self::Golang => "golang",
            Self::Rubygem => "rubygem",
            Self::CmakeModule => "cmake_module",
            Self::CmakeFlag => "cmake_flag",
            Self::JavaPlugin => "java_plugin",
            Self::JavaPluginList => "java_plugin_list",
            Self::JavaJar => "java_jar",
            Self::JavaPackageMissing => "java_package_missing",
            Self::FlagDisable => "flag_disable",
        }
    }

    /// Handlers whose rules also run against the accumulated cmake error region
    #[must_use]
    pub fn is_cmake(self) -> bool {
        matches!(self, Self::CmakeModule | Self::CmakeFlag)
    }

    /// Handlers that act on the raw capture instead of a normalized name
    #[must_use]
    pub fn uses_raw_capture(self) -> bool {
        matches!(
            self,
            Self::FlagDisable
                | Self::JavaPlugin
                | Self::JavaPluginList
                | Self::JavaJar
                | Self::JavaPackageMissing
        )
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handler {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|handler| handler.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownHandler {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_name() {
        for handler in Handler::ALL {
            assert_eq!(handler.as_str().parse::<Handler>().unwrap(), handler);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(
            "bogus".parse::<Handler>(),
            Err(CatalogError::UnknownHandler { .. })
        ));
    }
}
