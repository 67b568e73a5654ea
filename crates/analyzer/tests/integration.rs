//! Integration tests for transcript analysis

#[cfg(test)]
mod tests {
    use pkgmend_analyzer::{
        root_log_misses, AnalyzerOptions, FileOwnerIndex, LogAnalyzer, MAX_CMAKE_REGION_LINES,
    };
    use pkgmend_catalog::RuleCatalog;
    use pkgmend_errors::{BuildError, Error, RepairError};
    use pkgmend_manifest::{Manifest, ManifestBuilder};
    use pkgmend_types::{BuildSystemId, Dependency, FixAction, FlagValue, PackageKey};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn catalog() -> RuleCatalog {
        RuleCatalog::builtin().unwrap()
    }

    fn started(name: &str) -> Manifest {
        let mut manifest = Manifest::new(name, "1.0");
        manifest.begin_round();
        manifest
    }

    #[test]
    fn configure_probe_adds_resolved_package() {
        let catalog = catalog();
        let mut manifest = started("scenario-a");

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["checking for OpenSSL... no"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(1),
            )
            .unwrap();

        assert!(manifest
            .build_requires
            .contains(&Dependency::bare("openssl-devel")));
        assert_eq!(manifest.must_restart, 1);
        assert_eq!(report.applied(), 1);
        assert!(!report.success);
    }

    #[test]
    fn pkgconfig_miss_adds_namespaced_dependency() {
        let catalog = catalog();
        let mut manifest = started("scenario-b");

        LogAnalyzer::new(&catalog)
            .analyze(
                ["Package 'gtk+-3.0', required by 'app', not found"],
                &mut manifest,
                BuildSystemId::Meson,
                Some(1),
            )
            .unwrap();

        assert!(manifest
            .build_requires
            .contains(&Dependency::pkgconfig("gtk+-3.0")));
        assert_eq!(manifest.build_requires.iter().next().unwrap().to_string(), "pkgconfig(gtk+-3.0)");
    }

    #[test]
    fn second_application_reports_no_progress() {
        let catalog = catalog();
        let analyzer = LogAnalyzer::new(&catalog);
        let mut manifest = started("idempotent");
        let lines = ["No package 'libxml-2.0' found"];

        let first = analyzer
            .analyze(lines, &mut manifest, BuildSystemId::Configure, Some(1))
            .unwrap();
        assert_eq!(first.applied(), 1);

        manifest.begin_round();
        let second = analyzer
            .analyze(lines, &mut manifest, BuildSystemId::Configure, Some(1))
            .unwrap();
        assert_eq!(second.applied(), 0);
        assert!(manifest.is_fixed_point());
        assert_eq!(manifest.build_requires.len(), 1);
    }

    #[test]
    fn banned_dependency_is_never_added() {
        let catalog = catalog();
        let mut manifest = ManifestBuilder::new("banned", "1.0")
            .banned(catalog.banned().iter().cloned())
            .build()
            .unwrap();
        manifest.begin_round();

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["No package 'hal' found"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(1),
            )
            .unwrap();
        assert_eq!(report.applied(), 0);
        assert!(manifest.build_requires.is_empty());
    }

    #[test]
    fn first_matching_rule_wins() {
        let catalog = catalog();
        let mut manifest = started("first-match");

        // matches both the perl-module probe and the generic probe
        LogAnalyzer::new(&catalog)
            .analyze(
                ["checking for perl module XML::Parser 2.34... no"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(1),
            )
            .unwrap();
        assert_eq!(
            manifest.build_requires.iter().collect::<Vec<_>>(),
            vec![&Dependency::perl("XML::Parser")]
        );
    }

    #[test]
    fn unresolved_capture_is_reported_without_progress() {
        let catalog = catalog();
        let mut manifest = started("unresolved");

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["checking for frobnicate... no"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(1),
            )
            .unwrap();
        assert_eq!(report.unresolved, vec!["frobnicate".to_string()]);
        assert!(manifest.is_fixed_point());
    }

    #[test]
    fn file_owner_index_resolves_libraries() {
        let catalog = catalog();
        let mut index = FileOwnerIndex::new();
        index.insert("/usr/lib64/libfrob.so", "frob-devel");
        let mut manifest = started("owner");

        LogAnalyzer::new(&catalog)
            .with_resolver(&index)
            .analyze(
                ["/usr/bin/ld: cannot find -lfrob"],
                &mut manifest,
                BuildSystemId::Make,
                Some(2),
            )
            .unwrap();
        assert!(manifest
            .build_requires
            .contains(&Dependency::bare("frob-devel")));
    }

    #[test]
    fn blacklisted_target_aborts() {
        let catalog = catalog();
        let mut manifest = started("blacklist");

        let err = LogAnalyzer::new(&catalog)
            .analyze(
                ["checking for python2... no"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(1),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Repair(RepairError::BlacklistedMiss { ref target }) if target == "python2"
        ));
    }

    #[test]
    fn success_banner_stops_processing() {
        let catalog = catalog();
        let mut manifest = started("banner");

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["Compress success", "checking for OpenSSL... no"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(0),
            )
            .unwrap();
        assert!(report.success);
        assert_eq!(report.lines, 1);
        assert!(manifest.build_requires.is_empty());
    }

    #[test]
    fn clean_marker_needs_zero_exit() {
        let catalog = catalog();
        let analyzer = LogAnalyzer::new(&catalog);
        let lines = ["Executing(%clean): /bin/sh -e /var/tmp/rpm-tmp.1"];

        let mut manifest = started("clean");
        assert!(analyzer
            .analyze(lines, &mut manifest, BuildSystemId::Make, Some(0))
            .unwrap()
            .success);
        assert!(!analyzer
            .analyze(lines, &mut manifest, BuildSystemId::Make, Some(1))
            .unwrap()
            .success);
    }

    #[test]
    fn failed_patch_is_dropped() {
        let catalog = catalog();
        let mut manifest = ManifestBuilder::new("patched", "1.0")
            .patches(["0001-a.patch", "0002-b.patch"])
            .build()
            .unwrap();
        manifest.begin_round();

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                [
                    "Patch #1 (0001-a.patch):",
                    "patching file src/a.c",
                    "Patch #2 (0002-b.patch):",
                    "Reversed (or previously applied) patch detected!  Skipping patch.",
                ],
                &mut manifest,
                BuildSystemId::Make,
                Some(1),
            )
            .unwrap();
        assert_eq!(manifest.patches, vec!["0001-a.patch".to_string()]);
        assert_eq!(
            report.fixes,
            vec![FixAction::RemovePatch {
                patch: "0002-b.patch".to_string()
            }]
        );
        assert_eq!(manifest.must_restart, 1);
    }

    #[test]
    fn collects_unpackaged_and_missing_files() {
        let catalog = catalog();
        let mut manifest = started("files");

        let report = LogAnalyzer::new(&catalog)
            .with_options(AnalyzerOptions {
                build_root: Some("/builddir/build/BUILDROOT/files-1.0-1.x86_64".to_string()),
                ..AnalyzerOptions::default()
            })
            .analyze(
                [
                    "error: Installed (but unpackaged) file(s) found:",
                    "   /usr/bin/files",
                    "   /usr/include/files.h",
                    "   /usr/lib/i386/x.so not matching the package arch",
                    "RPM build errors:",
                    "    File not found: /builddir/build/BUILDROOT/files-1.0-1.x86_64/usr/share/doc/files",
                ],
                &mut manifest,
                BuildSystemId::Make,
                Some(1),
            )
            .unwrap();
        assert_eq!(report.unpackaged, vec!["/usr/bin/files", "/usr/include/files.h"]);
        assert_eq!(report.missing_files, vec!["/usr/share/doc/files"]);
        assert!(report.has_file_reports());
    }

    #[test]
    fn cmake_region_spanning_lines() {
        let catalog = catalog();
        let mut manifest = started("cmake");

        LogAnalyzer::new(&catalog)
            .analyze(
                [
                    "CMake Error at CMakeLists.txt:20 (find_package):",
                    "  By not providing \"FindZLIB.cmake\" in",
                    "  CMAKE_MODULE_PATH this project has asked CMake to find a package",
                    "-- Configuring incomplete, errors occurred!",
                ],
                &mut manifest,
                BuildSystemId::CMake,
                Some(1),
            )
            .unwrap();
        assert!(manifest
            .build_requires
            .contains(&Dependency::bare("zlib-devel")));
        assert_eq!(manifest.must_restart, 1);
    }

    #[test]
    fn cmake_option_is_disabled() {
        let catalog = catalog();
        let mut manifest = started("cmake-flag");

        LogAnalyzer::new(&catalog)
            .analyze(
                ["  Either enable it or disable WITH_DOCS"],
                &mut manifest,
                BuildSystemId::CMake,
                Some(1),
            )
            .unwrap();
        assert_eq!(
            manifest.flag_arguments(BuildSystemId::CMake),
            vec!["-DWITH_DOCS=OFF".to_string()]
        );
    }

    #[test]
    fn compiler_flag_lists_merge() {
        let catalog = catalog();
        let mut manifest = started("flags");
        manifest.set_flag(
            BuildSystemId::Make,
            "CFLAGS",
            FlagValue::List(vec!["-O2".to_string()]),
        );

        LogAnalyzer::new(&catalog)
            .analyze(
                ["/usr/bin/ld: a.o:(.bss+0x0): multiple definition of `x'; b.o:(.bss+0x0): first defined here"],
                &mut manifest,
                BuildSystemId::Make,
                Some(2),
            )
            .unwrap();
        assert_eq!(
            manifest.flags[&BuildSystemId::Make]["CFLAGS"],
            FlagValue::List(vec!["-O2".to_string(), "-fcommon".to_string()])
        );
    }

    #[test]
    fn maven_plugin_added_then_removed_in_same_round() {
        let catalog = catalog();
        let analyzer = LogAnalyzer::new(&catalog);
        let line = "[ERROR] Plugin org.codehaus.mojo:exec-maven-plugin:1.6.0 or one of its dependencies could not be resolved";
        let dep = Dependency::maven("org.codehaus.mojo:exec-maven-plugin");

        let mut manifest = started("java");
        analyzer
            .analyze([line], &mut manifest, BuildSystemId::Maven, Some(1))
            .unwrap();
        assert!(manifest.build_requires.contains(&dep));

        manifest.begin_round();
        let report = analyzer
            .analyze([line], &mut manifest, BuildSystemId::Maven, Some(1))
            .unwrap();
        assert!(!manifest.build_requires.contains(&dep));
        assert!(manifest.java.removed_requires.contains(&dep));
        assert!(manifest
            .java
            .removed_plugins
            .contains("org.codehaus.mojo:exec-maven-plugin"));
        assert_eq!(report.applied(), 2);
    }

    #[test]
    fn maven_missing_package_disables_module() {
        let catalog = catalog();
        let mut manifest = started("java-module");

        LogAnalyzer::new(&catalog)
            .analyze(
                ["[ERROR] /builddir/build/BUILD/app/plugins-extra/src/main/java/a/B.java:[3,17] package org.gone does not exist"],
                &mut manifest,
                BuildSystemId::Maven,
                Some(1),
            )
            .unwrap();
        assert!(manifest.java.disabled_modules.contains("plugins-extra"));
    }

    #[tokio::test]
    async fn missing_transcript_is_fatal() {
        let catalog = catalog();
        let temp = TempDir::new().unwrap();
        let mut manifest = started("missing");

        let err = LogAnalyzer::new(&catalog)
            .analyze_file(
                &temp.path().join("round1-build.log"),
                &mut manifest,
                BuildSystemId::Make,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::TranscriptMissing { .. })
        ));
    }

    #[tokio::test]
    async fn analyzes_transcript_file() {
        let catalog = catalog();
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("round1-build.log");
        tokio::fs::write(&log, "make: xsltproc: command not found\n")
            .await
            .unwrap();
        let mut manifest = started("file");

        let report = LogAnalyzer::new(&catalog)
            .analyze_file(&log, &mut manifest, BuildSystemId::Make, Some(2))
            .await
            .unwrap();
        assert_eq!(report.lines, 1);
        assert!(manifest.build_requires.contains(&Dependency::bare("libxslt")));
    }

    #[test]
    fn root_log_lists_uninstallable_dependencies() {
        let misses = root_log_misses(["No matching package to install: 'pkgconfig(nope)'"]);
        assert_eq!(misses, vec!["pkgconfig(nope)".to_string()]);
    }

    #[test]
    fn simple_rule_line_still_counts_as_progress() {
        let catalog = catalog();
        let mut manifest = started("gtkdoc");

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["./autogen.sh: line 3: gtkdocize: command not found"],
                &mut manifest,
                BuildSystemId::Autogen,
                Some(127),
            )
            .unwrap();

        let gtk_doc = Dependency::bare("gtk-doc");
        assert!(manifest.build_requires.contains(&gtk_doc));
        assert_eq!(
            report.fixes,
            vec![FixAction::AddBuildRequire {
                dependency: gtk_doc.clone()
            }]
        );
        assert_eq!(manifest.must_restart, 1);
        assert!(!manifest.is_fixed_point());
        assert!(manifest.requires[&PackageKey::Main].contains(&gtk_doc));
    }

    #[test]
    fn simple_rule_alone_is_not_progress() {
        let catalog = catalog();
        let mut manifest = started("autoconf-archive");

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["configure: Please install the GNU autoconf-archive package"],
                &mut manifest,
                BuildSystemId::Make,
                Some(1),
            )
            .unwrap();

        let archive = Dependency::bare("autoconf-archive");
        assert!(manifest.build_requires.contains(&archive));
        assert!(manifest.requires[&PackageKey::Main].contains(&archive));
        assert_eq!(report.applied(), 0);
        assert!(manifest.is_fixed_point());
    }

    #[test]
    fn catalog_ban_holds_on_unseeded_manifest() {
        let catalog = catalog();
        let mut manifest = started("scratch");
        assert!(manifest.banned.is_empty());

        let report = LogAnalyzer::new(&catalog)
            .analyze(
                ["No package 'hal' found"],
                &mut manifest,
                BuildSystemId::Configure,
                Some(1),
            )
            .unwrap();

        assert_eq!(report.applied(), 0);
        assert!(!manifest
            .build_requires
            .contains(&Dependency::pkgconfig("hal")));
        assert_eq!(manifest.must_restart, 0);
    }

    #[test]
    fn cmake_region_ends_at_blank_line() {
        let catalog = catalog();
        let mut manifest = started("cmake-blank");

        LogAnalyzer::new(&catalog)
            .analyze(
                [
                    "CMake Error at CMakeLists.txt:20 (find_package):",
                    "  By not providing \"FindZLIB.cmake\" in",
                    "",
                    "  CMAKE_MODULE_PATH this project has asked CMake to find a package",
                ],
                &mut manifest,
                BuildSystemId::CMake,
                Some(1),
            )
            .unwrap();
        assert!(manifest.build_requires.is_empty());
    }

    #[test]
    fn cmake_region_is_bounded() {
        let catalog = catalog();
        let mut manifest = started("cmake-long");

        let mut lines = vec!["CMake Error at CMakeLists.txt:20 (find_package):".to_string()];
        lines.extend((0..MAX_CMAKE_REGION_LINES).map(|n| format!("  note {n}")));
        lines.push("  By not providing \"FindZLIB.cmake\" in".to_string());
        lines.push("  CMAKE_MODULE_PATH this project has asked CMake to find a package".to_string());

        LogAnalyzer::new(&catalog)
            .analyze(
                lines.iter().map(String::as_str),
                &mut manifest,
                BuildSystemId::CMake,
                Some(1),
            )
            .unwrap();
        assert!(manifest.build_requires.is_empty());
    }

    const TRANSCRIPT_LINES: &[&str] = &[
        "checking for OpenSSL... no",
        "No package 'libxml-2.0' found",
        "./autogen.sh: line 3: gtkdocize: command not found",
        "xsltproc: command not found",
        "fatal error: zlib.h: No such file or directory",
        "No package 'hal' found",
        "checking for frobnicator... no",
        "configure: Please install the GNU autoconf-archive package",
    ];

    proptest! {
        #[test]
        fn reapplying_a_transcript_changes_nothing(
            lines in prop::sample::subsequence(TRANSCRIPT_LINES.to_vec(), 0..=TRANSCRIPT_LINES.len())
        ) {
            let catalog = catalog();
            let analyzer = LogAnalyzer::new(&catalog);
            let mut manifest = started("idempotent");

            analyzer
                .analyze(lines.iter().copied(), &mut manifest, BuildSystemId::Autogen, Some(1))
                .unwrap();
            let build_requires = manifest.build_requires.clone();
            let requires = manifest.requires.clone();

            manifest.begin_round();
            let second = analyzer
                .analyze(lines.iter().copied(), &mut manifest, BuildSystemId::Autogen, Some(1))
                .unwrap();

            prop_assert_eq!(second.applied(), 0);
            prop_assert!(manifest.is_fixed_point());
            prop_assert_eq!(&manifest.build_requires, &build_requires);
            prop_assert_eq!(&manifest.requires, &requires);
        }
    }
}
