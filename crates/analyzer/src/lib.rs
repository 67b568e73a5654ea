#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build transcript analysis for pkgmend
//!
//! [`LogAnalyzer`] reads one build transcript in order and turns recognised
//! failure signatures into manifest changes. Every change is recorded on the
//! manifest with [`Manifest::record_fix`], so re-reading the same transcript
//! against an already-fixed manifest reports no progress.
//!
//! Per line, in order:
//! 1. the cmake error region is extended and re-matched while it is open,
//! 2. the success banner or a clean exit ends processing,
//! 3. patch headers, the unpackaged-file list and missing-file reports are
//!    collected,
//! 4. simple and pkgconfig rules enrich the requirements,
//! 5. the failure rules for the build system are tried; first match wins.

mod configure;
mod handlers;
mod normalize;
mod resolve;
mod sections;

pub use configure::{configure_misses, ConfigureMisses};
pub use normalize::normalize;
pub use resolve::{candidate_paths, guess_owner, FileOwnerIndex, NoResolver, PackageResolver};
pub use sections::{root_log_misses, strip_build_root};

use handlers::{HandlerContext, Outcome};
use pkgmend_catalog::RuleCatalog;
use pkgmend_config::constants::{DEFAULT_CLEAN_MARKER, DEFAULT_SUCCESS_BANNER};
use pkgmend_config::Config;
use pkgmend_errors::{BuildError, Error};
use pkgmend_manifest::Manifest;
use pkgmend_types::{BuildSystemId, Dependency, FixAction, PackageKey};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

static NO_RESOLVER: NoResolver = NoResolver;

/// Longest cmake error region, in transcript lines
pub const MAX_CMAKE_REGION_LINES: usize = 32;

/// Transcript markers that end analysis early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    pub success_banner: String,
    pub clean_marker: String,
    /// Build root prefix stripped from `File not found:` paths
    pub build_root: Option<String>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            success_banner: DEFAULT_SUCCESS_BANNER.to_string(),
            clean_marker: DEFAULT_CLEAN_MARKER.to_string(),
            build_root: None,
        }
    }
}

impl AnalyzerOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            success_banner: config.repair.success_banner.clone(),
            clean_marker: config.repair.clean_marker.clone(),
            build_root: Some(config.build_root().display().to_string()),
        }
    }
}

/// Result of reading one transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    /// The success banner or a clean exit was seen
    pub success: bool,
    /// Manifest changes made, in transcript order
    pub fixes: Vec<FixAction>,
    /// Captures nothing could resolve
    pub unresolved: Vec<String>,
    /// Paths from the unpackaged-file list
    pub unpackaged: Vec<String>,
    /// Installed paths the packaging step could not find
    pub missing_files: Vec<String>,
    pub lines: usize,
}

impl AnalysisReport {
    #[must_use]
    pub fn applied(&self) -> usize {
        self.fixes.len()
    }

    /// The file classifier has work to do
    #[must_use]
    pub fn has_file_reports(&self) -> bool {
        !self.unpackaged.is_empty() || !self.missing_files.is_empty()
    }
}

#[derive(Default)]
struct ScanState {
    current_patch: Option<String>,
    in_unpackaged: bool,
    cmake_region: Option<String>,
    cmake_region_lines: usize,
}

/// Maps transcript lines to manifest fixes
pub struct LogAnalyzer<'a> {
    catalog: &'a RuleCatalog,
    resolver: &'a dyn PackageResolver,
    options: AnalyzerOptions,
}

impl<'a> LogAnalyzer<'a> {
    #[must_use]
    pub fn new(catalog: &'a RuleCatalog) -> Self {
        Self {
            catalog,
            resolver: &NO_RESOLVER,
            options: AnalyzerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn PackageResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    /// Read a transcript file and analyze it
    ///
    /// # Errors
    ///
    /// Returns `BuildError::TranscriptMissing` if the file does not exist,
    /// and whatever [`Self::analyze`] returns.
    pub async fn analyze_file(
        &self,
        path: &Path,
        manifest: &mut Manifest,
        tool: BuildSystemId,
        exit_code: Option<i32>,
    ) -> Result<AnalysisReport, Error> {
        let text = match tokio::fs::read(path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BuildError::TranscriptMissing {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(err) => return Err(Error::io_with_path(&err, path)),
        };
        self.analyze(text.lines(), manifest, tool, exit_code)
    }

    /// Analyze transcript lines, applying fixes to `manifest`
    ///
    /// # Errors
    ///
    /// Returns `RepairError::BlacklistedMiss` as soon as a capture names a
    /// blacklisted target; the manifest keeps the fixes made before it.
    pub fn analyze<'l, I>(
        &self,
        lines: I,
        manifest: &mut Manifest,
        tool: BuildSystemId,
        exit_code: Option<i32>,
    ) -> Result<AnalysisReport, Error>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let ctx = HandlerContext {
            catalog: self.catalog,
            resolver: self.resolver,
            tool,
        };
        let mut state = ScanState::default();
        let mut report = AnalysisReport::default();

        for line in lines {
            report.lines += 1;

            if tool == BuildSystemId::CMake {
                self.track_cmake_region(&ctx, &mut state, line, manifest, &mut report)?;
            }

            if line.contains(&self.options.success_banner) {
                debug!(line = report.lines, "success banner");
                report.success = true;
                break;
            }
            if exit_code == Some(0) && line.contains(&self.options.clean_marker) {
                debug!(line = report.lines, "clean phase reached");
                report.success = true;
                break;
            }

            if self.collect_section_line(&mut state, line, manifest, &mut report) {
                continue;
            }

            let enriched = self.enrich(line, manifest);

            for rule in self.catalog.failed_rules(tool) {
                let Some(caps) = rule.captures(line) else {
                    continue;
                };
                debug!(handler = %rule.handler, line, "failure rule matched");
                let outcome = ctx.dispatch(manifest, rule.handler, &caps, &enriched)?;
                absorb(outcome, manifest, &mut report);
                break;
            }
        }

        Ok(report)
    }

    /// Simple rules add a build and runtime requirement, pkgconfig rules a
    /// build requirement. Neither counts as progress; the dependencies that
    /// were new are returned so a failure rule on the same line can claim them.
    fn enrich(&self, line: &str, manifest: &mut Manifest) -> Vec<Dependency> {
        let mut added = Vec::new();
        for rule in self.catalog.simple_rules() {
            if !rule.matches(line) || self.catalog.banned().contains(&rule.dependency) {
                continue;
            }
            manifest.add_requires(rule.dependency.clone(), PackageKey::Main);
            if manifest.add_build_require(rule.dependency.clone()) {
                debug!(dependency = %rule.dependency, "simple rule matched");
                added.push(rule.dependency.clone());
            }
        }
        for rule in self.catalog.pkgconfig_rules() {
            if rule.matches(line)
                && !self.catalog.banned().contains(&rule.dependency)
                && manifest.add_build_require(rule.dependency.clone())
            {
                debug!(dependency = %rule.dependency, "pkgconfig rule matched");
                added.push(rule.dependency.clone());
            }
        }
        added
    }

    /// Patch, unpackaged-file and missing-file lines; true when consumed
    fn collect_section_line(
        &self,
        state: &mut ScanState,
        line: &str,
        manifest: &mut Manifest,
        report: &mut AnalysisReport,
    ) -> bool {
        if line.contains(sections::UNPACKAGED_HEADER) {
            state.in_unpackaged = true;
            return true;
        }
        if state.in_unpackaged {
            if sections::ends_unpackaged(line) {
                state.in_unpackaged = false;
            } else {
                if let Some(path) = sections::unpackaged_path(line) {
                    push_unique(&mut report.unpackaged, path.to_string());
                }
                return true;
            }
        }

        if let Some(patch) = sections::patch_header(line) {
            state.current_patch = Some(patch.to_string());
            return true;
        }
        if line.contains(sections::SKIPPING_PATCH) {
            if let Some(patch) = state.current_patch.take() {
                if manifest.remove_patch(&patch) {
                    absorb(
                        Outcome::Applied(vec![FixAction::RemovePatch { patch }]),
                        manifest,
                        report,
                    );
                }
            }
            return true;
        }

        if let Some(path) = sections::missing_file(line, self.options.build_root.as_deref()) {
            push_unique(&mut report.missing_files, path);
            return true;
        }
        false
    }

    /// Once a cmake error banner is seen, following lines are joined into one
    /// region until a cmake rule matches it or the region ends. A blank line,
    /// the end marker, a fresh banner or [`MAX_CMAKE_REGION_LINES`] lines end it.
    fn track_cmake_region(
        &self,
        ctx: &HandlerContext<'_>,
        state: &mut ScanState,
        line: &str,
        manifest: &mut Manifest,
        report: &mut AnalysisReport,
    ) -> Result<(), Error> {
        if state.cmake_region.is_some()
            && (line.trim().is_empty()
                || self.catalog.is_cmake_banner(line)
                || state.cmake_region_lines >= MAX_CMAKE_REGION_LINES)
        {
            state.cmake_region = None;
        }
        let Some(region) = state.cmake_region.as_mut() else {
            if self.catalog.is_cmake_banner(line) {
                state.cmake_region = Some(line.trim().to_string());
                state.cmake_region_lines = 1;
            }
            return Ok(());
        };

        region.push(' ');
        region.push_str(line.trim());
        state.cmake_region_lines += 1;

        let mut matched = false;
        for rule in self.catalog.cmake_rules(ctx.tool) {
            if let Some(caps) = rule.captures(region) {
                debug!(handler = %rule.handler, "cmake region matched");
                let outcome = ctx.dispatch(manifest, rule.handler, &caps, &[])?;
                absorb(outcome, manifest, report);
                matched = true;
                break;
            }
        }

        if matched || self.catalog.is_cmake_end(line) {
            state.cmake_region = None;
        }
        Ok(())
    }
}

fn absorb(outcome: Outcome, manifest: &mut Manifest, report: &mut AnalysisReport) {
    match outcome {
        Outcome::Applied(fixes) => {
            for fix in fixes {
                debug!(fix = %fix, "applied fix");
                manifest.record_fix(&fix);
                report.fixes.push(fix);
            }
        }
        Outcome::Ignored => {}
        Outcome::Unresolved(signature) => {
            warn!(signature, "no package resolves failure signature");
            push_unique(&mut report.unresolved, signature);
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}
