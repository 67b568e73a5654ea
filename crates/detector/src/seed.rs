//! Build requirements read from build descriptors
//!
//! Autotools and CMake projects name most of their dependencies up front.
//! Seeding the manifest with them saves one failed round per dependency.

use pkgmend_catalog::RuleCatalog;
use pkgmend_errors::Error;
use pkgmend_types::{BuildSystemId, Dependency};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static CONFIGURE_MACRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(PKG_CHECK_MODULES|PKG_CHECK_EXISTS|XDT_CHECK_PACKAGE)\s*\(([^)]*)\)")
        .expect("constant regex")
});

static CMAKE_FIND_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfind_package\s*\(\s*([A-Za-z0-9_.+-]+)").expect("constant regex")
});

static CMAKE_PKG_CHECK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpkg_(?:check|search)_modules\s*\(\s*\w+([^)]*)\)").expect("constant regex")
});

const CMAKE_KEYWORDS: &[&str] = &[
    "REQUIRED",
    "QUIET",
    "IMPORTED_TARGET",
    "GLOBAL",
    "NO_CMAKE_PATH",
    "NO_CMAKE_ENVIRONMENT_PATH",
];

const VERSION_OPERATORS: &[&str] = &["<", ">", "<=", ">=", "=", "==", "!="];

/// Split macro arguments on commas outside `[...]` quoting
fn macro_args(args: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(args[start..].trim());
    out
}

/// Module names from a pkg-config module list, without versions or variables
fn module_names(list: &str) -> Vec<String> {
    list.split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_matches(|c| matches!(c, '[' | ']' | '"' | '\'')))
        .filter_map(|token| {
            // "glib-2.0>=2.50" carries its version inline
            let name = token
                .find(['<', '>', '='])
                .map_or(token, |at| &token[..at]);
            let keep = !name.is_empty()
                && !name.starts_with('$')
                && !name.contains("${")
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && !VERSION_OPERATORS.contains(&token);
            keep.then(|| name.to_string())
        })
        .collect()
}

/// pkg-config modules named by `configure.ac` macros
#[must_use]
pub fn parse_configure_modules(text: &str) -> Vec<String> {
    let mut modules = Vec::new();
    for caps in CONFIGURE_MACRO.captures_iter(text) {
        let args = macro_args(&caps[2]);
        let list = match &caps[1] {
            "PKG_CHECK_EXISTS" => args.first(),
            _ => args.get(1),
        };
        if let Some(list) = list {
            for module in module_names(list) {
                if !modules.contains(&module) {
                    modules.push(module);
                }
            }
        }
    }
    modules
}

/// Package names from CMake `find_package` calls
#[must_use]
pub fn parse_cmake_packages(text: &str) -> Vec<String> {
    let mut packages = Vec::new();
    for caps in CMAKE_FIND_PACKAGE.captures_iter(text) {
        let name = caps[1].to_string();
        if !packages.contains(&name) {
            packages.push(name);
        }
    }
    packages
}

/// pkg-config modules from CMake `pkg_check_modules` calls
#[must_use]
pub fn parse_cmake_pkgconfig(text: &str) -> Vec<String> {
    let mut modules = Vec::new();
    for caps in CMAKE_PKG_CHECK.captures_iter(text) {
        let list: Vec<&str> = caps[1]
            .split_whitespace()
            .filter(|token| !CMAKE_KEYWORDS.contains(token))
            .collect();
        for module in module_names(&list.join(" ")) {
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
    }
    modules
}

async fn read_optional(path: &Path) -> Result<Option<String>, Error> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io_with_path(&err, path)),
    }
}

/// Build requirements declared by the descriptors in `root`
///
/// # Errors
///
/// Returns an error if a descriptor exists but cannot be read.
pub async fn seed_requirements(
    root: &Path,
    build_system: BuildSystemId,
    catalog: &RuleCatalog,
) -> Result<BTreeSet<Dependency>, Error> {
    let mut seeds = BTreeSet::new();

    if build_system.is_autotools() {
        for name in ["configure.ac", "configure.in"] {
            if let Some(text) = read_optional(&root.join(name)).await? {
                seeds.extend(parse_configure_modules(&text).into_iter().map(Dependency::pkgconfig));
                break;
            }
        }
    }

    if build_system == BuildSystemId::CMake {
        if let Some(text) = read_optional(&root.join("CMakeLists.txt")).await? {
            for package in parse_cmake_packages(&text) {
                match catalog.resolve_cmake_module(&package) {
                    Some(dep) => {
                        seeds.insert(dep.clone());
                    }
                    None => debug!(package, "no package known for cmake module"),
                }
            }
            seeds.extend(parse_cmake_pkgconfig(&text).into_iter().map(Dependency::pkgconfig));
        }
    }

    seeds.retain(|dep| !catalog.banned().contains(dep));
    debug!(build_system = %build_system, count = seeds.len(), "seeded build requirements");
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_ac_module_lists() {
        let text = r"
PKG_CHECK_MODULES([GTK], [gtk+-3.0 >= 3.22 glib-2.0 >= $GLIB_REQUIRED])
XDT_CHECK_PACKAGE([LIBXFCE4UI], [libxfce4ui-2], [4.12.0])
PKG_CHECK_EXISTS([libnotify], [have_notify=yes], [have_notify=no])
";
        assert_eq!(
            parse_configure_modules(text),
            vec!["gtk+-3.0", "glib-2.0", "libxfce4ui-2", "libnotify"]
        );
    }

    #[test]
    fn cmake_calls() {
        let text = r"
find_package(ZLIB REQUIRED)
FIND_PACKAGE(OpenSSL 1.1)
pkg_check_modules(DEPS REQUIRED IMPORTED_TARGET glib-2.0>=2.50 gio-2.0)
";
        assert_eq!(parse_cmake_packages(text), vec!["ZLIB", "OpenSSL"]);
        assert_eq!(parse_cmake_pkgconfig(text), vec!["glib-2.0", "gio-2.0"]);
    }

    #[test]
    fn args_respect_quoting() {
        assert_eq!(macro_args("A, [b, c], d"), vec!["A", "[b, c]", "d"]);
    }
}
