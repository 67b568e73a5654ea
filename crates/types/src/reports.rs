//! Records of corrective actions applied during a repair session

use crate::{BuildSystemId, Dependency, FlagValue, PackageKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single change made to a manifest in response to a build failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixAction {
    AddBuildRequire { dependency: Dependency },
    RemoveBuildRequire { dependency: Dependency },
    RemovePatch { patch: String },
    SetFlag {
        tool: BuildSystemId,
        name: String,
        value: FlagValue,
    },
    RemoveJavaPlugin { plugin: String },
    DisableJavaModule { module: String },
    RemoveJavaDependency { artifact: String },
    AssignFile { path: String, package: PackageKey },
    ExcludeFile { path: String },
    AddLocale { domain: String },
    RemoveFile { path: String },
    PruneDirectory { path: String },
}

impl FixAction {
    /// File actions count toward `file_restart`, the rest toward `must_restart`.
    #[must_use]
    pub fn is_file_action(&self) -> bool {
        matches!(
            self,
            Self::AssignFile { .. }
                | Self::ExcludeFile { .. }
                | Self::AddLocale { .. }
                | Self::RemoveFile { .. }
                | Self::PruneDirectory { .. }
        )
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddBuildRequire { dependency } => write!(f, "add build requirement {dependency}"),
            Self::RemoveBuildRequire { dependency } => {
                write!(f, "remove build requirement {dependency}")
            }
            Self::RemovePatch { patch } => write!(f, "drop patch {patch}"),
            Self::SetFlag { tool, name, value } => match value {
                FlagValue::Bool(enabled) => write!(f, "set {tool} flag {name}={enabled}"),
                FlagValue::List(items) => write!(f, "set {tool} flag {name}={}", items.join(",")),
            },
            Self::RemoveJavaPlugin { plugin } => write!(f, "remove maven plugin {plugin}"),
            Self::DisableJavaModule { module } => write!(f, "disable maven module {module}"),
            Self::RemoveJavaDependency { artifact } => {
                write!(f, "remove maven dependency {artifact}")
            }
            Self::AssignFile { path, package } => write!(f, "package {path} in {package}"),
            Self::ExcludeFile { path } => write!(f, "exclude {path} from the main package"),
            Self::AddLocale { domain } => write!(f, "package locale domain {domain}"),
            Self::RemoveFile { path } => write!(f, "blacklist missing file {path}"),
            Self::PruneDirectory { path } => write!(f, "prune directory entry {path}"),
        }
    }
}

/// A fix together with the round it was applied in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFix {
    pub round: u32,
    pub action: FixAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let fix = FixAction::AddBuildRequire {
            dependency: Dependency::pkgconfig("zlib"),
        };
        let json = serde_json::to_value(&fix).unwrap();
        assert_eq!(json["type"], "add_build_require");
        assert_eq!(json["dependency"], "pkgconfig(zlib)");
    }

    #[test]
    fn file_actions_are_separated() {
        assert!(FixAction::RemoveFile { path: "/usr/bin/x".into() }.is_file_action());
        assert!(!FixAction::RemovePatch { patch: "a.patch".into() }.is_file_action());
    }
}
