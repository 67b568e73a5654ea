#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Failure-signature rule catalog for pkgmend
//!
//! A [`RuleCatalog`] is built once from the embedded rule file plus any site
//! rule files, then shared by reference. Nothing in it changes after
//! construction, so one catalog can serve any number of repair sessions.
//!
//! The catalog holds four kinds of rules:
//! - *simple* rules that always imply a fixed dependency,
//! - *pkgconfig* rules that imply a `pkgconfig(..)` dependency,
//! - *failed* rules whose capture is routed to a [`Handler`],
//! - lookup tables used by the handlers (failed commands, cmake modules,
//!   failed flags) together with ignore, ban and blacklist lists.

mod file;
mod handler;
mod rules;

pub use handler::Handler;
pub use rules::{compile, FailedRule, FlagSpec, SimpleRule, ToolDefaults, ToolScope};

use file::RuleFile;
use pkgmend_errors::{CatalogError, Error};
use pkgmend_types::{BuildSystemId, Dependency, Phase};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

const BUILTIN_RULES: &str = include_str!("../rules/builtin.toml");

/// Immutable table of failure signatures and their corrective actions
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    simple: Vec<SimpleRule>,
    pkgconfig: Vec<SimpleRule>,
    failed: Vec<FailedRule>,
    failed_commands: HashMap<String, Dependency>,
    failed_flags: HashMap<String, FlagSpec>,
    cmake_modules: HashMap<String, Dependency>,
    ignored: HashSet<String>,
    banned: BTreeSet<Dependency>,
    blacklist: HashSet<String>,
    configure_whitelist: HashSet<String>,
    configure_blacklist: HashSet<String>,
    cmake_banner: Option<Regex>,
    cmake_end: Vec<String>,
    defaults: HashMap<BuildSystemId, ToolDefaults>,
}

impl RuleCatalog {
    /// Catalog holding only the embedded rules
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded rule file fails to compile.
    pub fn builtin() -> Result<Self, Error> {
        Self::compile(RuleFile::parse(BUILTIN_RULES)?)
    }

    /// Catalog built from rule text alone, without the embedded rules
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid rule file.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        Self::compile(RuleFile::parse(content)?)
    }

    /// Embedded rules overlaid with `extra` rule text, in order
    ///
    /// # Errors
    ///
    /// Returns an error if any rule text is invalid.
    pub fn with_overlays<'a, I>(extra: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut base = RuleFile::parse(BUILTIN_RULES)?;
        for content in extra {
            base.merge(RuleFile::parse(content)?);
        }
        Self::compile(base)
    }

    /// Embedded rules overlaid with the given rule files, in order
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or invalid.
    pub async fn load(rule_files: &[PathBuf]) -> Result<Self, Error> {
        let mut contents = Vec::with_capacity(rule_files.len());
        for path in rule_files {
            let content =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|_| CatalogError::NotFound {
                        path: path.display().to_string(),
                    })?;
            tracing::debug!(path = %path.display(), "loaded rule file");
            contents.push(content);
        }
        Self::with_overlays(contents.iter().map(String::as_str))
    }

    fn compile(file: RuleFile) -> Result<Self, Error> {
        let simple = file
            .simple
            .into_iter()
            .map(|entry| {
                Ok(SimpleRule {
                    pattern: compile(&entry.pattern)?,
                    dependency: Dependency::from(entry.requires.as_str()),
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let pkgconfig = file
            .pkgconfig
            .into_iter()
            .map(|entry| {
                Ok(SimpleRule {
                    pattern: compile(&entry.pattern)?,
                    dependency: Dependency::pkgconfig(entry.module),
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let failed = file
            .failed
            .into_iter()
            .map(|entry| {
                Ok(FailedRule {
                    pattern: compile(&entry.pattern)?,
                    handler: entry.handler.parse()?,
                    scope: ToolScope::parse(&entry.tools)?,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let failed_flags = file
            .failed_flags
            .into_iter()
            .map(|(key, entry)| {
                (
                    key,
                    FlagSpec {
                        name: entry.name,
                        value: entry.value,
                    },
                )
            })
            .collect();

        let cmake_banner = file.cmake.banner.as_deref().map(compile).transpose()?;

        let mut defaults = HashMap::new();
        for (tool, entry) in file.defaults {
            let id: BuildSystemId = tool.parse().map_err(|_| CatalogError::ParseError {
                message: format!("unknown build system in defaults: {tool}"),
            })?;
            let mut phases = std::collections::BTreeMap::new();
            for (phase, script) in entry.phases {
                let phase = parse_phase(&phase).ok_or_else(|| CatalogError::ParseError {
                    message: format!("unknown phase in defaults.{tool}: {phase}"),
                })?;
                phases.insert(phase, script);
            }
            defaults.insert(
                id,
                ToolDefaults {
                    build_requires: entry
                        .build_requires
                        .iter()
                        .map(|dep| Dependency::from(dep.as_str()))
                        .collect(),
                    phases,
                },
            );
        }

        Ok(Self {
            simple,
            pkgconfig,
            failed,
            failed_commands: dependency_table(file.failed_commands),
            failed_flags,
            cmake_modules: dependency_table(file.cmake_modules),
            ignored: file.ignored.into_iter().collect(),
            banned: file
                .banned
                .iter()
                .map(|dep| Dependency::from(dep.as_str()))
                .collect(),
            blacklist: file.blacklist.into_iter().collect(),
            configure_whitelist: file.configure.whitelist.into_iter().collect(),
            configure_blacklist: file.configure.blacklist.into_iter().collect(),
            cmake_banner,
            cmake_end: file.cmake.end,
            defaults,
        })
    }

    #[must_use]
    pub fn simple_rules(&self) -> &[SimpleRule] {
        &self.simple
    }

    #[must_use]
    pub fn pkgconfig_rules(&self) -> &[SimpleRule] {
        &self.pkgconfig
    }

    /// Failure rules for one build system, in declared order
    pub fn failed_rules(&self, tool: BuildSystemId) -> impl Iterator<Item = &FailedRule> {
        self.failed.iter().filter(move |rule| rule.applies_to(tool))
    }

    /// Failure rules that run against the accumulated cmake error region
    pub fn cmake_rules(&self, tool: BuildSystemId) -> impl Iterator<Item = &FailedRule> {
        self.failed_rules(tool).filter(|rule| rule.handler.is_cmake())
    }

    /// Package for a failed command or probe name; exact match first, then
    /// case-insensitive
    #[must_use]
    pub fn resolve_command(&self, name: &str) -> Option<&Dependency> {
        lookup(&self.failed_commands, name)
    }

    #[must_use]
    pub fn resolve_cmake_module(&self, name: &str) -> Option<&Dependency> {
        lookup(&self.cmake_modules, name)
    }

    #[must_use]
    pub fn failed_flag(&self, capture: &str) -> Option<&FlagSpec> {
        self.failed_flags.get(capture)
    }

    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Names that must never be auto-fixed
    #[must_use]
    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.contains(name)
    }

    #[must_use]
    pub fn banned(&self) -> &BTreeSet<Dependency> {
        &self.banned
    }

    #[must_use]
    pub fn is_configure_whitelisted(&self, name: &str) -> bool {
        self.configure_whitelist.contains(name)
    }

    #[must_use]
    pub fn is_configure_blacklisted(&self, name: &str) -> bool {
        self.configure_blacklist.contains(name)
    }

    /// Line that starts cmake accumulation mode
    #[must_use]
    pub fn is_cmake_banner(&self, line: &str) -> bool {
        self.cmake_banner
            .as_ref()
            .is_some_and(|banner| banner.is_match(line))
    }

    /// Line that closes the cmake error region
    #[must_use]
    pub fn is_cmake_end(&self, line: &str) -> bool {
        self.cmake_end.iter().any(|end| line.contains(end.as_str()))
    }

    #[must_use]
    pub fn defaults_for(&self, tool: BuildSystemId) -> Option<&ToolDefaults> {
        self.defaults.get(&tool)
    }

    /// Number of failure rules, for diagnostics
    #[must_use]
    pub fn failed_rule_count(&self) -> usize {
        self.failed.len()
    }
}

fn dependency_table(table: std::collections::BTreeMap<String, String>) -> HashMap<String, Dependency> {
    table
        .into_iter()
        .map(|(key, dep)| (key, Dependency::from(dep.as_str())))
        .collect()
}

fn lookup<'a>(table: &'a HashMap<String, Dependency>, name: &str) -> Option<&'a Dependency> {
    table.get(name).or_else(|| {
        let lower = name.to_lowercase();
        table.get(&lower).or_else(|| {
            table
                .iter()
                .find(|(key, _)| key.to_lowercase() == lower)
                .map(|(_, dep)| dep)
        })
    })
}

fn parse_phase(name: &str) -> Option<Phase> {
    Phase::ALL.into_iter().find(|phase| phase.as_str() == name)
}

/// Resolve the rule files named in configuration relative to `base`
#[must_use]
pub fn resolve_rule_paths(base: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|file| {
            if file.is_absolute() {
                file.clone()
            } else {
                base.join(file)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_compiles() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(catalog.failed_rule_count() > 20);
        assert!(catalog.banned().contains(&Dependency::pkgconfig("hal")));
    }

    #[test]
    fn command_lookup_falls_back_to_lowercase() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert_eq!(
            catalog.resolve_command("OpenSSL"),
            Some(&Dependency::bare("openssl-devel"))
        );
        assert_eq!(
            catalog.resolve_cmake_module("zlib"),
            Some(&Dependency::bare("zlib-devel"))
        );
        assert!(catalog.resolve_command("no-such-tool").is_none());
    }

    #[test]
    fn rules_are_scoped_by_tool() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(catalog
            .failed_rules(BuildSystemId::Maven)
            .any(|rule| rule.handler == Handler::JavaPlugin));
        assert!(!catalog
            .failed_rules(BuildSystemId::Configure)
            .any(|rule| rule.handler == Handler::JavaPlugin));
        assert!(catalog
            .cmake_rules(BuildSystemId::CMake)
            .all(|rule| rule.handler.is_cmake()));
    }

    #[test]
    fn cmake_region_markers() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(catalog.is_cmake_banner("CMake Error at CMakeLists.txt:12 (find_package):"));
        assert!(catalog.is_cmake_end("-- Configuring incomplete, errors occurred!"));
    }

    #[test]
    fn defaults_seed_build_requires() {
        let catalog = RuleCatalog::builtin().unwrap();
        let cmake = catalog.defaults_for(BuildSystemId::CMake).unwrap();
        assert_eq!(cmake.build_requires, vec![Dependency::bare("cmake")]);
        assert!(cmake.phases.contains_key(&Phase::Build));
        let autogen = catalog.defaults_for(BuildSystemId::Autogen).unwrap();
        assert!(autogen.build_requires.contains(&Dependency::bare("libtool")));
    }

    #[test]
    fn unknown_handler_is_rejected() {
        let err = RuleCatalog::from_toml_str(
            r#"
[[failed]]
pattern = 'x (\w+)'
handler = "teleport"
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::UnknownHandler { .. })
        ));
    }
}
