//! Ordered classification rules

use crate::glob::Glob;
use pkgmend_errors::{CatalogError, Error};
use pkgmend_types::PackageKey;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

const BUILTIN_RULES: &str = include_str!("../rules/classify.toml");

/// How a rule recognises a path
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Regex anchored at the start of the path
    Prefix(Regex),
    Glob(Glob),
}

impl PathPattern {
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidPattern` if the regex does not compile.
    pub fn prefix(pattern: &str) -> Result<Self, CatalogError> {
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^{pattern}")
        };
        Regex::new(&anchored)
            .map(Self::Prefix)
            .map_err(|e| CatalogError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns `CatalogError::InvalidPattern` for an unusable glob.
    pub fn glob(pattern: &str) -> Result<Self, CatalogError> {
        Glob::new(pattern).map(Self::Glob)
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(regex) => regex.is_match(path),
            Self::Glob(glob) => glob.matches(path),
        }
    }
}

/// One entry of the ordered rule list
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub pattern: PathPattern,
    pub package: PackageKey,
    /// Path recorded in the manifest instead of the matched one
    pub record_as: Option<String>,
}

impl ClassificationRule {
    #[must_use]
    pub fn new(pattern: PathPattern, package: impl Into<PackageKey>) -> Self {
        Self {
            pattern,
            package: package.into(),
            record_as: None,
        }
    }

    #[must_use]
    pub fn recording(mut self, path: impl Into<String>) -> Self {
        self.record_as = Some(path.into());
        self
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    #[must_use]
    pub fn recorded_path<'p>(&'p self, path: &'p str) -> &'p str {
        self.record_as.as_deref().unwrap_or(path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    prefix: Option<String>,
    glob: Option<String>,
    package: String,
    record: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RuleList {
    rule: Vec<RuleEntry>,
}

/// Classification rules in match order
#[derive(Debug, Clone, Default)]
pub struct ClassificationRules {
    rules: Vec<ClassificationRule>,
}

impl ClassificationRules {
    #[must_use]
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// Returns an error if the embedded rule list fails to compile.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    /// # Errors
    ///
    /// Returns an error if the content is not a valid rule list.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        let list: RuleList = toml::from_str(content).map_err(|e| CatalogError::ParseError {
            message: format!("classification rules: {e}"),
        })?;

        let mut rules = Vec::with_capacity(list.rule.len());
        for entry in list.rule {
            let pattern = match (entry.prefix.as_deref(), entry.glob.as_deref()) {
                (Some(prefix), None) => PathPattern::prefix(prefix)?,
                (None, Some(glob)) => PathPattern::glob(glob)?,
                _ => {
                    return Err(CatalogError::ParseError {
                        message: format!(
                            "classification rule for {} needs exactly one of prefix or glob",
                            entry.package
                        ),
                    }
                    .into())
                }
            };
            let mut rule = ClassificationRule::new(pattern, PackageKey::sub(entry.package));
            rule.record_as = entry.record;
            rules.push(rule);
        }
        Ok(Self { rules })
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| CatalogError::NotFound {
                path: path.display().to_string(),
            })?;
        Self::from_toml_str(&content)
    }

    /// First rule matching `path`
    #[must_use]
    pub fn first_match(&self, path: &str) -> Option<&ClassificationRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassificationRule> {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
