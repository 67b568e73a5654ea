//! Integration tests for classifier crate

#[cfg(test)]
mod tests {
    use pkgmend_classifier::{
        ClassificationRule, ClassificationRules, FileClassifier, PathPattern, Placement,
    };
    use pkgmend_config::Config;
    use pkgmend_manifest::{FileEntry, Manifest};
    use pkgmend_types::{FileAttr, FixAction, PackageKey};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::new("foo", "1.0");
        manifest.begin_round();
        manifest
    }

    #[test]
    fn header_goes_to_dev() {
        let rules = ClassificationRules::new(vec![ClassificationRule::new(
            PathPattern::prefix("^/usr/include/").unwrap(),
            "dev",
        )]);
        let classifier = FileClassifier::new(rules);
        let mut manifest = manifest();

        let fixes = classifier.classify(["/usr/include/foo.h"], &mut manifest);

        assert_eq!(
            fixes,
            vec![FixAction::AssignFile {
                path: "/usr/include/foo.h".to_string(),
                package: PackageKey::sub("dev"),
            }]
        );
        assert_eq!(
            manifest.file_owner("/usr/include/foo.h"),
            Some(&PackageKey::sub("dev"))
        );
        assert_eq!(manifest.file_restart, 1);
        assert_eq!(manifest.must_restart, 0);
    }

    #[test]
    fn second_pass_is_a_fixed_point() {
        let classifier = FileClassifier::builtin().unwrap();
        let mut manifest = manifest();
        let paths = ["/usr/bin/foo", "/usr/lib64/libfoo.so.1", "/usr/share/man/man1/foo.1"];

        assert_eq!(classifier.classify(paths, &mut manifest).len(), 3);
        manifest.begin_round();
        assert!(classifier.classify(paths, &mut manifest).is_empty());
        assert!(manifest.is_fixed_point());
    }

    #[test]
    fn specific_rule_shadows_generic_one() {
        let classifier = FileClassifier::builtin().unwrap();
        let mut manifest = manifest();

        classifier.classify(
            [
                "/usr/lib64/glibc-hwcaps/x86-64-v3/libfoo.so.1",
                "/usr/lib64/glibc-hwcaps/x86-64-v3/libfoo.so.1.2",
                "/usr/lib64/libfoo.so",
                "/usr/lib64/libfoo.so.1",
            ],
            &mut manifest,
        );

        assert_eq!(
            manifest.file_owner("/usr/lib64/glibc-hwcaps/x86-64-v3/lib*.so.*"),
            Some(&PackageKey::sub("lib"))
        );
        assert_eq!(
            manifest.file_owner("/usr/lib64/glibc-hwcaps/x86-64-v3/libfoo.so.1"),
            None
        );
        assert_eq!(
            manifest.file_owner("/usr/lib64/libfoo.so"),
            Some(&PackageKey::sub("dev"))
        );
        assert_eq!(
            manifest.file_owner("/usr/lib64/libfoo.so.1"),
            Some(&PackageKey::sub("lib"))
        );
        assert_eq!(manifest.file_entries().count(), 3);
    }

    #[test]
    fn locale_setuid_and_autostart() {
        let classifier = FileClassifier::builtin()
            .unwrap()
            .with_setuid(["/usr/bin/foo-helper"]);
        let mut manifest = manifest();
        let unit = "/usr/lib/systemd/system/multi-user.target.wants/foo.service";

        let fixes = classifier.classify(
            [
                "/usr/share/locale/de/LC_MESSAGES/foo.mo",
                "/usr/share/locale/fr/LC_MESSAGES/foo.mo",
                "/usr/bin/foo-helper",
                unit,
            ],
            &mut manifest,
        );

        assert!(manifest.locales.contains("foo"));
        assert_eq!(manifest.locales.len(), 1);
        assert!(manifest.file_entries().any(|(key, entry)| key.is_main()
            && *entry == FileEntry::with_attr("/usr/bin/foo-helper", FileAttr::setuid_root())));
        assert_eq!(
            manifest.file_owner(unit),
            Some(&PackageKey::sub("autostart"))
        );
        assert!(manifest.excludes.contains(unit));
        // one locale domain, one setuid entry, autostart assignment and exclusion
        assert_eq!(fixes.len(), 4);
        assert_eq!(manifest.file_restart, 4);
    }

    #[test]
    fn configured_excludes_are_not_packaged() {
        let classifier = FileClassifier::builtin()
            .unwrap()
            .with_excludes(["/usr/share/foo/sample.conf"]);
        let mut manifest = manifest();

        let fixes = classifier.classify(["/usr/share/foo/sample.conf"], &mut manifest);

        assert_eq!(
            fixes,
            vec![FixAction::ExcludeFile {
                path: "/usr/share/foo/sample.conf".to_string()
            }]
        );
        assert_eq!(manifest.file_owner("/usr/share/foo/sample.conf"), None);
    }

    #[test]
    fn missing_file_is_blacklisted() {
        let classifier = FileClassifier::builtin().unwrap();
        let mut manifest = manifest();
        classifier.classify(["/usr/bin/foo"], &mut manifest);
        manifest.begin_round();

        let fixes = classifier.remove_missing(["/usr/bin/foo"], &mut manifest);

        assert_eq!(
            fixes,
            vec![FixAction::RemoveFile {
                path: "/usr/bin/foo".to_string()
            }]
        );
        assert_eq!(manifest.file_owner("/usr/bin/foo"), None);
        assert!(manifest.is_file_blacklisted("/usr/bin/foo"));
        assert_eq!(manifest.file_restart, 1);

        // never re-added
        manifest.begin_round();
        assert!(classifier.classify(["/usr/bin/foo"], &mut manifest).is_empty());
        assert!(classifier
            .remove_missing(["/usr/bin/foo"], &mut manifest)
            .is_empty());
        assert!(manifest.is_fixed_point());
    }

    #[tokio::test]
    async fn directory_entry_is_pruned() {
        let build_root = TempDir::new().unwrap();
        std::fs::create_dir_all(build_root.path().join("usr/share/foo/themes")).unwrap();
        std::fs::create_dir_all(build_root.path().join("usr/bin")).unwrap();
        std::fs::write(build_root.path().join("usr/bin/foo"), b"#!/bin/sh\n").unwrap();

        let classifier = FileClassifier::builtin().unwrap();
        let mut manifest = manifest();
        classifier.classify(
            ["/usr/share/foo/themes", "/usr/bin/foo", "/usr/bin/gone"],
            &mut manifest,
        );
        manifest.begin_round();

        let fixes = classifier
            .prune_directories(build_root.path(), &mut manifest)
            .await
            .unwrap();

        assert_eq!(
            fixes,
            vec![FixAction::PruneDirectory {
                path: "/usr/share/foo/themes".to_string()
            }]
        );
        assert_eq!(manifest.file_owner("/usr/share/foo/themes"), None);
        assert!(manifest.is_file_blacklisted("/usr/share/foo/themes"));
        assert_eq!(manifest.file_restart, 1);
        assert_eq!(
            manifest.file_owner("/usr/bin/foo"),
            Some(&PackageKey::sub("bin"))
        );
        assert_eq!(
            manifest.file_owner("/usr/bin/gone"),
            Some(&PackageKey::sub("bin"))
        );
    }

    #[tokio::test]
    async fn rule_file_from_config_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        let rule_file = dir.path().join("classify.toml");
        std::fs::write(
            &rule_file,
            r#"
[[rule]]
glob = "/usr/share/foo/*.xml"
package = "schemas"
"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.classify.rule_file = Some(rule_file);
        config.classify.setuid = vec!["/usr/bin/foo".to_string()];
        let classifier = FileClassifier::from_config(&config).await.unwrap();

        assert_eq!(classifier.rules().len(), 1);
        assert_eq!(
            classifier.classify_path("/usr/share/foo/a.xml"),
            Placement::Package {
                package: PackageKey::sub("schemas"),
                path: "/usr/share/foo/a.xml".to_string(),
            }
        );
        assert_eq!(
            classifier.classify_path("/usr/include/foo.h"),
            Placement::Package {
                package: PackageKey::Main,
                path: "/usr/include/foo.h".to_string(),
            }
        );
        assert_eq!(classifier.classify_path("/usr/bin/foo"), Placement::Setuid);
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        let dirs = prop::sample::select(vec![
            "/usr/include",
            "/usr/lib64",
            "/usr/bin",
            "/usr/share/man/man1",
            "/usr/share/foo",
            "/opt/foo",
        ]);
        let names = prop::sample::select(vec![
            "libfoo.so", "libfoo.so.1", "foo.h", "foo.1", "foo", "libbar.a", "data.xml",
        ]);
        (dirs, names).prop_map(|(dir, name)| format!("{dir}/{name}"))
    }

    proptest! {
        #[test]
        fn owner_does_not_depend_on_report_order(
            paths in prop::collection::btree_set(path_strategy(), 1..12)
        ) {
            let classifier = FileClassifier::builtin().unwrap();
            let forward: Vec<&str> = paths.iter().map(String::as_str).collect();
            let mut backward = forward.clone();
            backward.reverse();

            let mut first = manifest();
            classifier.classify(forward.iter().copied(), &mut first);
            let mut second = manifest();
            classifier.classify(backward.iter().copied(), &mut second);

            for path in &forward {
                prop_assert_eq!(first.file_owner(path), second.file_owner(path));
                match classifier.classify_path(path) {
                    Placement::Package { package, .. } => {
                        prop_assert_eq!(first.file_owner(path), Some(&package));
                    }
                    other => prop_assert!(false, "unexpected placement {:?}", other),
                }
            }
        }
    }
}
