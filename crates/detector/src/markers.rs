//! Marker files that identify a build system

use pkgmend_types::BuildSystemId;

/// How a marker is recognised from a file name
#[derive(Debug, Clone, Copy)]
pub(crate) enum MarkerName {
    Exact(&'static str),
    Suffix(&'static str),
}

/// One marker file and the weight it carries
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    pub name: MarkerName,
    pub build_system: BuildSystemId,
    /// Higher values outrank generic markers at the same depth
    pub specificity: i32,
    /// Only a script with an execute bit carries the full specificity
    pub executable: bool,
}

/// Specificity of an executable marker that has no execute bit
pub(crate) const NON_EXECUTABLE_SPECIFICITY: i32 = 1;

const fn exact(name: &'static str, build_system: BuildSystemId, specificity: i32) -> Marker {
    Marker {
        name: MarkerName::Exact(name),
        build_system,
        specificity,
        executable: false,
    }
}

const fn script(name: &'static str, build_system: BuildSystemId, specificity: i32) -> Marker {
    Marker {
        name: MarkerName::Exact(name),
        build_system,
        specificity,
        executable: true,
    }
}

const fn suffix(name: &'static str, build_system: BuildSystemId, specificity: i32) -> Marker {
    Marker {
        name: MarkerName::Suffix(name),
        build_system,
        specificity,
        executable: false,
    }
}

pub(crate) const MARKERS: &[Marker] = &[
    script("configure", BuildSystemId::Configure, 3),
    exact("CMakeLists.txt", BuildSystemId::CMake, 3),
    exact("meson.build", BuildSystemId::Meson, 3),
    exact("Cargo.toml", BuildSystemId::Cargo, 3),
    exact("go.mod", BuildSystemId::Go, 3),
    exact("pom.xml", BuildSystemId::Maven, 3),
    exact("pyproject.toml", BuildSystemId::Pyproject, 3),
    exact("autogen.sh", BuildSystemId::Autogen, 2),
    exact("SConstruct", BuildSystemId::Scons, 2),
    exact("Makefile.PL", BuildSystemId::Cpan, 2),
    exact("setup.py", BuildSystemId::Distutils3, 2),
    suffix(".pro", BuildSystemId::Qmake, 2),
    suffix(".gemspec", BuildSystemId::Ruby, 2),
    exact("configure.ac", BuildSystemId::ConfigureAc, 1),
    exact("configure.in", BuildSystemId::ConfigureAc, 1),
    exact("Makefile", BuildSystemId::Make, 1),
    exact("makefile", BuildSystemId::Make, 1),
    exact("GNUmakefile", BuildSystemId::Make, 1),
    exact("package.json", BuildSystemId::Javascript, 1),
];

/// Scripts that drive a build when no descriptor exists
pub(crate) const SCRIPT_MARKERS: &[&str] = &["build.sh", "compile.sh"];

/// Directory names never descended into
pub(crate) const SKIPPED_DIRS: &[&str] = &[".git", ".svn", ".hg", "node_modules", "vendor"];

/// Path components under which python descriptors belong to samples, not the
/// project itself
pub(crate) const PYTHON_NOISE_DIRS: &[&str] = &["demo", "doc", "docs", "example", "examples", "test", "tests", "plugin", "plugins"];

pub(crate) fn lookup(file_name: &str) -> Option<&'static Marker> {
    MARKERS.iter().find(|marker| match marker.name {
        MarkerName::Exact(name) => name == file_name,
        MarkerName::Suffix(ext) => file_name.len() > ext.len() && file_name.ends_with(ext),
    })
}

pub(crate) fn is_python(build_system: BuildSystemId) -> bool {
    matches!(
        build_system,
        BuildSystemId::Pyproject | BuildSystemId::Distutils3
    )
}
