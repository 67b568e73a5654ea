//! Integration tests for manifest crate

#[cfg(test)]
mod tests {
    use pkgmend_manifest::*;
    use pkgmend_types::{BuildSystemId, Dependency, FileAttr, FlagValue, PackageKey, Phase};
    use tempfile::tempdir;

    fn populated() -> Manifest {
        let mut manifest = ManifestBuilder::new("libfoo", "2.5.0")
            .build_system(BuildSystemId::CMake)
            .banned([Dependency::bare("llvm-devel")])
            .build_requires([Dependency::bare("cmake"), Dependency::pkgconfig("zlib")])
            .patches(["backport-CVE-1.patch"])
            .phase(Phase::Build, "%cmake_build")
            .build()
            .unwrap();
        manifest.add_requires(Dependency::pypi("six"), PackageKey::sub("python3"));
        manifest.set_flag(BuildSystemId::CMake, "WITH_DOCS", FlagValue::Bool(false));
        manifest.assign_file(FileEntry::new("/usr/lib64/libfoo.so.2"), PackageKey::sub("lib"));
        manifest.assign_file(
            FileEntry::with_attr("/usr/bin/foo-helper", FileAttr::setuid_root()),
            PackageKey::sub("setuid"),
        );
        manifest.assign_file(FileEntry::new("/usr/bin/foo"), PackageKey::Main);
        manifest.remove_java_plugin("maven-javadoc-plugin");
        manifest
    }

    #[tokio::test]
    async fn test_manifest_file_operations() {
        let temp = tempdir().unwrap();
        let manifest_path = temp.path().join("manifest.toml");

        let manifest = populated();
        manifest.write_to_file(&manifest_path).await.unwrap();
        let loaded = Manifest::from_file(&manifest_path).await.unwrap();

        assert_eq!(loaded, manifest);
        assert_eq!(loaded.build_system, Some(BuildSystemId::CMake));
        assert_eq!(
            loaded.file_owner("/usr/bin/foo-helper"),
            Some(&PackageKey::sub("setuid"))
        );
    }

    #[tokio::test]
    async fn test_toml_store_roundtrip() {
        let temp = tempdir().unwrap();
        let store = TomlManifestStore::new(temp.path().join("state").join("manifest.toml"));
        assert!(store.load().await.unwrap().is_none());

        let mut manifest = populated();
        manifest.begin_round();
        store.save(&manifest).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.round, 1);
        assert!(store.location().is_some());
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryManifestStore::new();
        store.save(&populated()).await.unwrap();
        store.save(&populated()).await.unwrap();
        assert_eq!(store.save_count().await, 2);
        assert_eq!(store.load().await.unwrap().unwrap().name, "libfoo");
    }

    #[test]
    fn test_builder_rejects_empty_name() {
        assert!(ManifestBuilder::new("  ", "1.0").build().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Manifest::from_toml("name = [").is_err());
    }
}
