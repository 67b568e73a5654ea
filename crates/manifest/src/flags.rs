//! Tool-specific rendering of build flags

use pkgmend_types::{BuildSystemId, FlagValue};

/// Render one flag as the argument(s) the given tool understands.
///
/// Booleans become the tool's enable/disable syntax. Lists become a single
/// `NAME=a b` assignment for make-style tools and are passed through verbatim
/// everywhere else.
#[must_use]
pub fn render_flag(tool: BuildSystemId, name: &str, value: &FlagValue) -> Vec<String> {
    match value {
        FlagValue::List(items) if takes_assignments(tool) => {
            vec![format!("{name}={}", items.join(" "))]
        }
        FlagValue::List(items) => items.clone(),
        FlagValue::Bool(enabled) => vec![render_bool(tool, name, *enabled)],
    }
}

fn takes_assignments(tool: BuildSystemId) -> bool {
    tool.is_autotools()
        || matches!(
            tool,
            BuildSystemId::Make | BuildSystemId::Qmake | BuildSystemId::Scons
        )
}

fn render_bool(tool: BuildSystemId, name: &str, enabled: bool) -> String {
    match tool {
        BuildSystemId::CMake => {
            let state = if enabled { "ON" } else { "OFF" };
            format!("-D{name}={state}")
        }
        BuildSystemId::Meson => format!("-D{name}={enabled}"),
        id if id.is_autotools() => {
            let verb = if enabled { "enable" } else { "disable" };
            format!("--{verb}-{}", name.trim_start_matches('-'))
        }
        BuildSystemId::Qmake => format!("CONFIG{}={name}", if enabled { "+" } else { "-" }),
        _ => format!("{name}={}", u8::from(enabled)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_per_tool() {
        assert_eq!(
            render_flag(BuildSystemId::Configure, "docs", &FlagValue::Bool(false)),
            vec!["--disable-docs"]
        );
        assert_eq!(
            render_flag(BuildSystemId::Meson, "tests", &FlagValue::Bool(true)),
            vec!["-Dtests=true"]
        );
        assert_eq!(
            render_flag(BuildSystemId::Make, "V", &FlagValue::Bool(true)),
            vec!["V=1"]
        );
        assert_eq!(
            render_flag(
                BuildSystemId::Make,
                "CFLAGS",
                &FlagValue::List(vec!["-O2".into(), "-fcommon".into()])
            ),
            vec!["CFLAGS=-O2 -fcommon"]
        );
        assert_eq!(
            render_flag(
                BuildSystemId::Cargo,
                "features",
                &FlagValue::List(vec!["--no-default-features".into()])
            ),
            vec!["--no-default-features"]
        );
    }
}
