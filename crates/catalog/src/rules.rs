//! Compiled rule types

use crate::Handler;
use pkgmend_errors::CatalogError;
use pkgmend_types::{BuildSystemId, Dependency, FlagValue, Phase};
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Build systems a rule is tested for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolScope {
    All,
    Only(Vec<BuildSystemId>),
}

impl ToolScope {
    /// Parse rule-file tool names; group names expand to several ids
    ///
    /// # Errors
    ///
    /// Returns an error for a name that is neither a build system nor a group.
    pub fn parse(names: &[String]) -> Result<Self, CatalogError> {
        if names.is_empty() {
            return Ok(Self::All);
        }
        let mut ids = Vec::new();
        for name in names {
            let expanded: Vec<BuildSystemId> = match name.as_str() {
                "all" | "*" => return Ok(Self::All),
                "make-family" => BuildSystemId::ALL
                    .into_iter()
                    .filter(|id| id.is_make_family())
                    .collect(),
                "autotools" => BuildSystemId::ALL
                    .into_iter()
                    .filter(|id| id.is_autotools())
                    .collect(),
                "native" => BuildSystemId::ALL
                    .into_iter()
                    .filter(|id| id.is_native())
                    .collect(),
                other => vec![other.parse().map_err(|_| CatalogError::ParseError {
                    message: format!("unknown build system in rule tools: {other}"),
                })?],
            };
            for id in expanded {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Ok(Self::Only(ids))
    }

    #[must_use]
    pub fn applies_to(&self, tool: BuildSystemId) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&tool),
        }
    }
}

/// Compile a rule pattern, naming the pattern in the error
///
/// # Errors
///
/// Returns `CatalogError::InvalidPattern` if the regex does not compile.
pub fn compile(pattern: &str) -> Result<Regex, CatalogError> {
    Regex::new(pattern).map_err(|e| CatalogError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Pattern that always implies one dependency
#[derive(Debug, Clone)]
pub struct SimpleRule {
    pub pattern: Regex,
    pub dependency: Dependency,
}

impl SimpleRule {
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Pattern whose capture is routed to a handler
#[derive(Debug, Clone)]
pub struct FailedRule {
    pub pattern: Regex,
    pub handler: Handler,
    pub scope: ToolScope,
}

impl FailedRule {
    #[must_use]
    pub fn applies_to(&self, tool: BuildSystemId) -> bool {
        self.scope.applies_to(tool)
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.pattern.captures(text)
    }
}

/// Flag change looked up by the flag-disable handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    pub value: FlagValue,
}

/// Seed requirements and phase text for one build system
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolDefaults {
    pub build_requires: Vec<Dependency>,
    pub phases: BTreeMap<Phase, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_expand() {
        let scope = ToolScope::parse(&["autotools".to_string()]).unwrap();
        assert!(scope.applies_to(BuildSystemId::Configure));
        assert!(scope.applies_to(BuildSystemId::ConfigureAc));
        assert!(!scope.applies_to(BuildSystemId::CMake));

        let scope = ToolScope::parse(&["make-family".to_string(), "cmake".to_string()]).unwrap();
        assert!(scope.applies_to(BuildSystemId::CMake));
        assert!(!scope.applies_to(BuildSystemId::Maven));
    }

    #[test]
    fn empty_scope_means_all() {
        let scope = ToolScope::parse(&[]).unwrap();
        assert!(scope.applies_to(BuildSystemId::Javascript));
    }

    #[test]
    fn bad_pattern_names_itself() {
        match compile("(unclosed") {
            Err(CatalogError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
