//! Line-level recognisers for transcript regions that are not failure
//! signatures: patch application, the unpackaged-file list, missing files and
//! the package manager's root log.

use regex::Regex;
use std::sync::LazyLock;

static PATCH_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Patch #\d+ \(([^)]+)\):").expect("constant regex"));

static FILE_NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"File not found: (\S+)").expect("constant regex"));

static NO_MATCHING_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"No matching package to install: '(.*)'").expect("constant regex")
});

pub(crate) const SKIPPING_PATCH: &str = "Skipping patch.";
pub(crate) const UNPACKAGED_HEADER: &str = "Installed (but unpackaged) file(s) found:";
const UNPACKAGED_FOREIGN_ARCH: &str = "not matching the package arch";
const UNPACKAGED_TERMINATORS: &[&str] = &[
    "RPM build errors",
    "Child return code",
    "Empty %files file",
];
const BUILDROOT_MARKER: &str = "/BUILDROOT/";

/// Name of the patch a `Patch #N (name):` header announces
pub(crate) fn patch_header(line: &str) -> Option<&str> {
    PATCH_HEADER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Line that closes the unpackaged-file list
pub(crate) fn ends_unpackaged(line: &str) -> bool {
    let trimmed = line.trim_start();
    UNPACKAGED_TERMINATORS
        .iter()
        .any(|marker| trimmed.contains(marker))
        || trimmed.starts_with("Building")
}

/// Path listed inside the unpackaged-file section
pub(crate) fn unpackaged_path(line: &str) -> Option<&str> {
    if line.contains(UNPACKAGED_FOREIGN_ARCH) {
        return None;
    }
    let path = line.trim();
    path.starts_with('/').then_some(path)
}

/// Installed path of a `File not found:` report, relative to the build root
pub(crate) fn missing_file(line: &str, build_root: Option<&str>) -> Option<String> {
    let full = FILE_NOT_FOUND.captures(line)?.get(1)?.as_str();
    Some(strip_build_root(full, build_root))
}

/// Installed path for a path under the build root.
///
/// A configured prefix is stripped first; otherwise everything up to and
/// including the package directory after `/BUILDROOT/` is dropped.
#[must_use]
pub fn strip_build_root(path: &str, build_root: Option<&str>) -> String {
    if let Some(rest) = build_root
        .map(|root| root.trim_end_matches('/'))
        .filter(|root| !root.is_empty())
        .and_then(|root| path.strip_prefix(root))
    {
        return ensure_absolute(rest);
    }
    if let Some(at) = path.find(BUILDROOT_MARKER) {
        let after = &path[at + BUILDROOT_MARKER.len()..];
        return match after.find('/') {
            Some(slash) => ensure_absolute(&after[slash..]),
            None => "/".to_string(),
        };
    }
    path.to_string()
}

fn ensure_absolute(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Dependencies the package manager could not install
pub fn root_log_misses<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut misses = Vec::new();
    for line in lines {
        if let Some(caps) = NO_MATCHING_PACKAGE.captures(line) {
            let dep = caps[1].to_string();
            if !misses.contains(&dep) {
                misses.push(dep);
            }
        }
    }
    misses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_headers() {
        assert_eq!(
            patch_header("Patch #3 (0003-fix-build.patch):"),
            Some("0003-fix-build.patch")
        );
        assert_eq!(patch_header("patching file foo.c"), None);
    }

    #[test]
    fn build_root_prefix_is_stripped() {
        assert_eq!(
            strip_build_root(
                "/builddir/build/BUILDROOT/foo-1.0-1.x86_64/usr/bin/foo",
                None
            ),
            "/usr/bin/foo"
        );
        assert_eq!(
            strip_build_root("/tmp/root/usr/lib/libfoo.so", Some("/tmp/root/")),
            "/usr/lib/libfoo.so"
        );
        assert_eq!(strip_build_root("/usr/share/x", None), "/usr/share/x");
    }

    #[test]
    fn unpackaged_lines() {
        assert_eq!(unpackaged_path("   /usr/bin/foo"), Some("/usr/bin/foo"));
        assert_eq!(
            unpackaged_path("   /usr/lib/x.so not matching the package arch"),
            None
        );
        assert!(ends_unpackaged("RPM build errors:"));
        assert!(ends_unpackaged("Building target platforms: x86_64"));
        assert!(!ends_unpackaged("   /usr/bin/foo"));
    }

    #[test]
    fn root_log() {
        let lines = [
            "DEBUG util.py: No matching package to install: 'libfoo-devel'",
            "No matching package to install: 'libfoo-devel'",
            "No matching package to install: 'pkgconfig(bar)'",
        ];
        assert_eq!(
            root_log_misses(lines),
            vec!["libfoo-devel".to_string(), "pkgconfig(bar)".to_string()]
        );
    }
}
