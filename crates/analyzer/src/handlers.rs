//! Corrective actions for matched failure rules

use crate::normalize::normalize;
use crate::resolve::{guess_owner, PackageResolver};
use pkgmend_catalog::{Handler, RuleCatalog};
use pkgmend_errors::{Error, RepairError};
use pkgmend_manifest::Manifest;
use pkgmend_types::{BuildSystemId, Dependency, FixAction, FlagValue};
use regex::Captures;
use tracing::debug;

const MAVEN_CORE_PLUGINS: &str = "org.apache.maven.plugins";

pub(crate) struct HandlerContext<'a> {
    pub catalog: &'a RuleCatalog,
    pub resolver: &'a dyn PackageResolver,
    pub tool: BuildSystemId,
}

/// What a matched rule amounted to
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Changes made to the manifest; empty when the fix was already in place
    Applied(Vec<FixAction>),
    /// Capture was noise
    Ignored,
    /// Nothing in the catalog or the resolver names a package for this
    Unresolved(String),
}

impl HandlerContext<'_> {
    pub fn dispatch(
        &self,
        manifest: &mut Manifest,
        handler: Handler,
        caps: &Captures<'_>,
        enriched: &[Dependency],
    ) -> Result<Outcome, Error> {
        let raw = caps.get(1).map_or("", |m| m.as_str());

        // the empty capture is a valid key in the flag table
        if handler == Handler::FlagDisable {
            return Ok(self.disable_flag(manifest, raw));
        }

        let name = if handler.uses_raw_capture() {
            raw.trim().to_string()
        } else {
            match normalize(raw) {
                Some(name) => name,
                None => return Ok(Outcome::Ignored),
            }
        };
        if name.is_empty()
            || self.catalog.is_ignored(&name)
            || self.catalog.is_configure_whitelisted(&name)
        {
            debug!(capture = raw, "ignoring capture");
            return Ok(Outcome::Ignored);
        }
        self.check_blacklist(&name)?;

        match handler {
            Handler::Command => match self.resolve_command(&name) {
                Some(dep) => self.add(manifest, enriched, dep),
                None => Ok(Outcome::Unresolved(name)),
            },
            Handler::Pkgconfig => self.add(manifest, enriched, Dependency::pkgconfig(name)),
            Handler::Perl => self.add(manifest, enriched, Dependency::perl(name)),
            Handler::Pypi => self.add(manifest, enriched, Dependency::pypi(name)),
            Handler::R => self.add(manifest, enriched, Dependency::r(name)),
            Handler::Golang => self.add(manifest, enriched, Dependency::golang(name)),
            Handler::Rubygem => self.add(manifest, enriched, Dependency::rubygem(name)),
            Handler::CmakeModule => {
                let dep = self
                    .catalog
                    .resolve_cmake_module(&name)
                    .cloned()
                    .or_else(|| self.resolve_command(&name));
                match dep {
                    Some(dep) => self.add(manifest, enriched, dep),
                    None => Ok(Outcome::Unresolved(name)),
                }
            }
            Handler::CmakeFlag => Ok(Outcome::Applied(set_flag(
                manifest,
                BuildSystemId::CMake,
                &name,
                FlagValue::Bool(false),
            ))),
            Handler::JavaPlugin => self.java_plugin(manifest, &name, enriched),
            Handler::JavaPluginList => Ok(java_plugin_list(manifest, &name)),
            Handler::JavaJar => match maven_coordinate(&name) {
                Some(artifact) => self.add(manifest, enriched, Dependency::maven(artifact)),
                None => Ok(Outcome::Unresolved(name)),
            },
            Handler::JavaPackageMissing => match module_of(&name) {
                Some(module) => {
                    let mut fixes = Vec::new();
                    if manifest.disable_java_module(module) {
                        fixes.push(FixAction::DisableJavaModule {
                            module: module.to_string(),
                        });
                    }
                    Ok(Outcome::Applied(fixes))
                }
                None => Ok(Outcome::Unresolved(name)),
            },
            Handler::FlagDisable => Ok(self.disable_flag(manifest, raw)),
        }
    }

    fn check_blacklist(&self, target: &str) -> Result<(), Error> {
        if self.catalog.is_blacklisted(target) {
            return Err(RepairError::BlacklistedMiss {
                target: target.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn resolve_command(&self, name: &str) -> Option<Dependency> {
        self.catalog
            .resolve_command(name)
            .cloned()
            .or_else(|| guess_owner(self.resolver, name).map(Dependency::bare))
    }

    /// Add a build requirement. A dependency a simple rule already added on
    /// the same line still counts as this line's fix.
    fn add(
        &self,
        manifest: &mut Manifest,
        enriched: &[Dependency],
        dep: Dependency,
    ) -> Result<Outcome, Error> {
        self.check_blacklist(&dep.to_string())?;
        self.check_blacklist(dep.name())?;
        if self.catalog.banned().contains(&dep) {
            debug!(dependency = %dep, "banned dependency not added");
            return Ok(Outcome::Ignored);
        }
        let mut fixes = Vec::new();
        if manifest.add_build_require(dep.clone()) || enriched.contains(&dep) {
            fixes.push(FixAction::AddBuildRequire { dependency: dep });
        }
        Ok(Outcome::Applied(fixes))
    }

    fn disable_flag(&self, manifest: &mut Manifest, capture: &str) -> Outcome {
        let Some(spec) = self.catalog.failed_flag(capture) else {
            return Outcome::Unresolved(capture.to_string());
        };
        let value = match (
            &spec.value,
            manifest
                .flags
                .get(&self.tool)
                .and_then(|flags| flags.get(&spec.name)),
        ) {
            (FlagValue::List(extra), Some(FlagValue::List(current))) => {
                let mut merged = current.clone();
                for item in extra {
                    if !merged.contains(item) {
                        merged.push(item.clone());
                    }
                }
                FlagValue::List(merged)
            }
            _ => spec.value.clone(),
        };
        Outcome::Applied(set_flag(manifest, self.tool, &spec.name, value))
    }

    /// A plugin that cannot be resolved is dropped if we added it, removed
    /// from the POM if it is a core plugin, and required otherwise.
    fn java_plugin(
        &self,
        manifest: &mut Manifest,
        plugin: &str,
        enriched: &[Dependency],
    ) -> Result<Outcome, Error> {
        let plugin = if plugin.contains(':') {
            plugin.to_string()
        } else {
            format!("{MAVEN_CORE_PLUGINS}:{plugin}")
        };
        let dep = Dependency::maven(plugin.clone());

        if manifest.build_requires.contains(&dep) {
            let mut fixes = Vec::new();
            if manifest.remove_build_require(&dep) {
                fixes.push(FixAction::RemoveBuildRequire { dependency: dep });
            }
            if manifest.remove_java_plugin(plugin.clone()) {
                fixes.push(FixAction::RemoveJavaPlugin { plugin });
            }
            return Ok(Outcome::Applied(fixes));
        }

        if plugin.starts_with(MAVEN_CORE_PLUGINS) {
            let mut fixes = Vec::new();
            if manifest.remove_java_plugin(plugin.clone()) {
                fixes.push(FixAction::RemoveJavaPlugin { plugin });
            }
            return Ok(Outcome::Applied(fixes));
        }

        self.add(manifest, enriched, dep)
    }
}

fn set_flag(manifest: &mut Manifest, tool: BuildSystemId, name: &str, value: FlagValue) -> Vec<FixAction> {
    if manifest.set_flag(tool, name, value.clone()) {
        vec![FixAction::SetFlag {
            tool,
            name: name.to_string(),
            value,
        }]
    } else {
        Vec::new()
    }
}

/// `group:artifact:type:version, group:artifact:type:version, ...`
fn java_plugin_list(manifest: &mut Manifest, list: &str) -> Outcome {
    let mut fixes = Vec::new();
    for item in list.split(", ") {
        let parts: Vec<&str> = item.trim().split(':').collect();
        if parts.len() < 2 {
            continue;
        }
        let dep = Dependency::maven(format!("{}:{}", parts[0], parts[1]));
        if manifest.remove_build_require(&dep) {
            fixes.push(FixAction::RemoveBuildRequire { dependency: dep });
        }
        if manifest.remove_java_dependency(parts[1]) {
            fixes.push(FixAction::RemoveJavaDependency {
                artifact: parts[1].to_string(),
            });
        }
    }
    Outcome::Applied(fixes)
}

/// `group:artifact` from a longer coordinate
fn maven_coordinate(coordinate: &str) -> Option<String> {
    let mut parts = coordinate.split(':');
    let group = parts.next().filter(|s| !s.is_empty())?;
    let artifact = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{group}:{artifact}"))
}

/// Maven module owning a source file: the directory holding its `src/`
fn module_of(path: &str) -> Option<&str> {
    let at = path.find("/src/")?;
    let module_dir = &path[..at];
    module_dir.rsplit('/').next().filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maven_coordinates() {
        assert_eq!(
            maven_coordinate("org.foo:bar:1.0"),
            Some("org.foo:bar".to_string())
        );
        assert_eq!(maven_coordinate("bar"), None);
    }

    #[test]
    fn module_from_source_path() {
        assert_eq!(
            module_of("/builddir/build/BUILD/proj/core-api/src/main/java/A.java"),
            Some("core-api")
        );
        assert_eq!(module_of("/A.java"), None);
    }
}
