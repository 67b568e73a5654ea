//! On-disk rule file schema

use pkgmend_errors::CatalogError;
use pkgmend_types::FlagValue;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RuleFile {
    pub simple: Vec<SimpleEntry>,
    pub pkgconfig: Vec<PkgconfigEntry>,
    pub failed: Vec<FailedEntry>,
    pub failed_commands: BTreeMap<String, String>,
    pub failed_flags: BTreeMap<String, FlagEntry>,
    pub cmake_modules: BTreeMap<String, String>,
    pub ignored: Vec<String>,
    pub banned: Vec<String>,
    pub blacklist: Vec<String>,
    pub configure: ConfigureEntry,
    pub cmake: CmakeEntry,
    pub defaults: BTreeMap<String, DefaultsEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SimpleEntry {
    pub pattern: String,
    pub requires: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PkgconfigEntry {
    pub pattern: String,
    pub module: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FailedEntry {
    pub pattern: String,
    pub handler: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FlagEntry {
    pub name: String,
    pub value: FlagValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigureEntry {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CmakeEntry {
    pub banner: Option<String>,
    pub end: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DefaultsEntry {
    pub build_requires: Vec<String>,
    pub phases: BTreeMap<String, String>,
}

impl RuleFile {
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        toml::from_str(content).map_err(|e| CatalogError::ParseError {
            message: e.to_string(),
        })
    }

    /// Layer `overlay` over this file. Overlay rules are tried first and
    /// overlay table entries replace ours.
    pub fn merge(&mut self, overlay: RuleFile) {
        prepend(&mut self.simple, overlay.simple);
        prepend(&mut self.pkgconfig, overlay.pkgconfig);
        prepend(&mut self.failed, overlay.failed);
        self.failed_commands.extend(overlay.failed_commands);
        self.failed_flags.extend(overlay.failed_flags);
        self.cmake_modules.extend(overlay.cmake_modules);
        extend_unique(&mut self.ignored, overlay.ignored);
        extend_unique(&mut self.banned, overlay.banned);
        extend_unique(&mut self.blacklist, overlay.blacklist);
        extend_unique(&mut self.configure.whitelist, overlay.configure.whitelist);
        extend_unique(&mut self.configure.blacklist, overlay.configure.blacklist);
        if overlay.cmake.banner.is_some() {
            self.cmake.banner = overlay.cmake.banner;
        }
        extend_unique(&mut self.cmake.end, overlay.cmake.end);
        for (tool, entry) in overlay.defaults {
            let slot = self.defaults.entry(tool).or_default();
            extend_unique(&mut slot.build_requires, entry.build_requires);
            slot.phases.extend(entry.phases);
        }
    }
}

fn prepend<T>(base: &mut Vec<T>, mut front: Vec<T>) {
    front.append(base);
    *base = front;
}

fn extend_unique(base: &mut Vec<String>, more: Vec<String>) {
    for item in more {
        if !base.contains(&item) {
            base.push(item);
        }
    }
}
