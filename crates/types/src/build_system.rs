//! Build-system identities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a build system a source tree can be driven with.
///
/// Variant order is the order candidates are tried in when several are
/// admissible: native build systems come before interpreted-language ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystemId {
    #[serde(alias = "autotools")]
    Configure,
    Autogen,
    #[serde(rename = "configure_ac")]
    ConfigureAc,
    CMake,
    Meson,
    Qmake,
    Scons,
    Make,
    Cargo,
    #[serde(alias = "golang")]
    Go,
    #[serde(alias = "java_pom")]
    Maven,
    #[serde(alias = "perl")]
    Cpan,
    #[serde(alias = "python")]
    Pyproject,
    Distutils3,
    Ruby,
    #[serde(alias = "nodejs")]
    Javascript,
    Script,
}

impl BuildSystemId {
    /// Every build system in priority order.
    pub const ALL: [Self; 17] = [
        Self::Configure,
        Self::Autogen,
        Self::ConfigureAc,
        Self::CMake,
        Self::Meson,
        Self::Qmake,
        Self::Scons,
        Self::Make,
        Self::Cargo,
        Self::Go,
        Self::Maven,
        Self::Cpan,
        Self::Pyproject,
        Self::Distutils3,
        Self::Ruby,
        Self::Javascript,
        Self::Script,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Autogen => "autogen",
            Self::ConfigureAc => "configure_ac",
            Self::CMake => "cmake",
            Self::Meson => "meson",
            Self::Qmake => "qmake",
            Self::Scons => "scons",
            Self::Make => "make",
            Self::Cargo => "cargo",
            Self::Go => "go",
            Self::Maven => "maven",
            Self::Cpan => "cpan",
            Self::Pyproject => "pyproject",
            Self::Distutils3 => "distutils3",
            Self::Ruby => "ruby",
            Self::Javascript => "javascript",
            Self::Script => "script",
        }
    }

    /// Position in the fixed try order; lower is tried first.
    #[must_use]
    pub fn priority(self) -> usize {
        Self::ALL
            .iter()
            .position(|id| *id == self)
            .unwrap_or(Self::ALL.len())
    }

    /// Build systems that compile native code.
    #[must_use]
    pub fn is_native(self) -> bool {
        matches!(
            self,
            Self::Configure
                | Self::Autogen
                | Self::ConfigureAc
                | Self::CMake
                | Self::Meson
                | Self::Qmake
                | Self::Scons
                | Self::Make
                | Self::Cargo
                | Self::Go
        )
    }

    /// Build systems whose transcripts end up in a make run and share the
    /// make-family failure rules.
    #[must_use]
    pub fn is_make_family(self) -> bool {
        matches!(
            self,
            Self::Configure
                | Self::Autogen
                | Self::ConfigureAc
                | Self::CMake
                | Self::Qmake
                | Self::Make
        )
    }

    /// Build systems that run an autotools configure script.
    #[must_use]
    pub fn is_autotools(self) -> bool {
        matches!(self, Self::Configure | Self::Autogen | Self::ConfigureAc)
    }
}

impl fmt::Display for BuildSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown build system: {0}")]
pub struct ParseBuildSystemError(pub String);

impl FromStr for BuildSystemId {
    type Err = ParseBuildSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s.trim().to_ascii_lowercase().as_str() {
            "configure" | "autotools" => Self::Configure,
            "autogen" => Self::Autogen,
            "configure_ac" => Self::ConfigureAc,
            "cmake" => Self::CMake,
            "meson" => Self::Meson,
            "qmake" => Self::Qmake,
            "scons" => Self::Scons,
            "make" => Self::Make,
            "cargo" => Self::Cargo,
            "go" | "golang" => Self::Go,
            "maven" | "java_pom" => Self::Maven,
            "cpan" | "perl" => Self::Cpan,
            "pyproject" | "python" => Self::Pyproject,
            "distutils3" => Self::Distutils3,
            "ruby" => Self::Ruby,
            "javascript" | "nodejs" => Self::Javascript,
            "script" => Self::Script,
            _ => return Err(ParseBuildSystemError(s.to_string())),
        };
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for id in BuildSystemId::ALL {
            assert_eq!(id.as_str().parse::<BuildSystemId>(), Ok(id));
        }
    }

    #[test]
    fn native_systems_are_tried_first() {
        let first_interpreted = BuildSystemId::ALL
            .iter()
            .position(|id| !id.is_native())
            .unwrap();
        assert!(BuildSystemId::ALL[first_interpreted..]
            .iter()
            .all(|id| !id.is_native()));
    }

    #[test]
    fn aliases_parse() {
        assert_eq!("java_pom".parse(), Ok(BuildSystemId::Maven));
        assert_eq!("autotools".parse(), Ok(BuildSystemId::Configure));
        assert!("bazel".parse::<BuildSystemId>().is_err());
    }
}
