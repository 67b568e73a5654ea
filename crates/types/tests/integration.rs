//! Integration tests for types crate

#[cfg(test)]
mod tests {
    use pkgmend_types::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_package_key_serialization() {
        let mut files: BTreeMap<PackageKey, Vec<String>> = BTreeMap::new();
        files.insert(PackageKey::Main, vec!["/usr/bin/foo".into()]);
        files.insert(PackageKey::sub("dev"), vec!["/usr/include/foo.h".into()]);

        let text = toml::to_string(&files).unwrap();
        assert!(text.contains("\"@main\""));

        let back: BTreeMap<PackageKey, Vec<String>> = toml::from_str(&text).unwrap();
        assert_eq!(back, files);
    }

    #[test]
    fn test_package_key_main_aliases() {
        assert_eq!(PackageKey::sub(""), PackageKey::Main);
        assert_eq!(PackageKey::from(None), PackageKey::Main);
        assert_eq!(PackageKey::from(Some("doc")), PackageKey::Sub("doc".into()));
    }

    #[test]
    fn test_flag_value_untagged() {
        let value: FlagValue = serde_json::from_str("false").unwrap();
        assert_eq!(value, FlagValue::Bool(false));
        let value: FlagValue = serde_json::from_str(r#"["-j4"]"#).unwrap();
        assert_eq!(value, FlagValue::List(vec!["-j4".into()]));
    }

    #[test]
    fn test_build_system_serde() {
        let id: BuildSystemId = serde_json::from_str("\"java_pom\"").unwrap();
        assert_eq!(id, BuildSystemId::Maven);
        assert_eq!(serde_json::to_string(&BuildSystemId::CMake).unwrap(), "\"cmake\"");
        assert_eq!(
            serde_json::to_string(&BuildSystemId::ConfigureAc).unwrap(),
            "\"configure_ac\""
        );
    }

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::ALL.first(), Some(&Phase::Prep));
        assert_eq!(Phase::Install.to_string(), "install");
    }

    #[test]
    fn test_setuid_attr_display() {
        assert_eq!(FileAttr::setuid_root().to_string(), "%attr(4755,root,root)");
    }
}
