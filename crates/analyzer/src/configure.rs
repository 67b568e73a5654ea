//! Post-success report of configure probes that answered "no"

use pkgmend_catalog::RuleCatalog;
use pkgmend_errors::Error;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

static CONFIGURE_MISS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"checking (?:for )?(.+?)\.\.\. no").expect("constant regex"));

/// Probes a successful configure run could not satisfy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigureMisses {
    pub misses: BTreeSet<String>,
    /// Misses the catalog marks as never auto-fixable
    pub blacklisted: BTreeSet<String>,
}

impl ConfigureMisses {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.misses.is_empty()
    }

    /// One miss per line, sorted; blacklisted ones are flagged
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for miss in &self.misses {
            out.push_str(miss);
            if self.blacklisted.contains(miss) {
                out.push_str(" (blacklisted)");
            }
            out.push('\n');
        }
        out
    }

    /// # Errors
    ///
    /// Returns an error if the report cannot be written.
    pub async fn write_to(&self, path: &Path) -> Result<(), Error> {
        tokio::fs::write(path, self.render())
            .await
            .map_err(|e| Error::io_with_path(&e, path))
    }
}

/// Scan a transcript for negative configure probes
pub fn configure_misses<'a, I>(lines: I, catalog: &RuleCatalog) -> ConfigureMisses
where
    I: IntoIterator<Item = &'a str>,
{
    let mut report = ConfigureMisses::default();
    for line in lines {
        let Some(caps) = CONFIGURE_MISS.captures(line) else {
            continue;
        };
        let probe = caps[1].trim();
        if probe.is_empty() || catalog.is_configure_whitelisted(probe) {
            continue;
        }
        if catalog.is_configure_blacklisted(probe) {
            report.blacklisted.insert(probe.to_string());
        }
        report.misses.insert(probe.to_string());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_and_blacklist() {
        let catalog = RuleCatalog::builtin().unwrap();
        let lines = [
            "checking for working vfork... no",
            "checking for libsecret... no",
            "checking for gtk+-2.0... no",
            "checking for zlib... yes",
        ];
        let report = configure_misses(lines, &catalog);
        assert_eq!(
            report.misses.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["gtk+-2.0", "libsecret"]
        );
        assert_eq!(report.render(), "gtk+-2.0 (blacklisted)\nlibsecret\n");
    }
}
