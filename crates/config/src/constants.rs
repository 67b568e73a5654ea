//! Fixed names shared with external tooling
//!
//! These are persisted-state contracts: the round-log naming in particular is
//! read by tools that replay failed repair sessions, so it is not configurable.

pub const CONFIG_DIR_NAME: &str = "pkgmend";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/pkgmend/output";
pub const BUILD_ROOT_DIR: &str = "buildroot";

/// Directory under the output directory holding the build driver's logs
pub const RESULTS_DIR: &str = "results";

pub const BUILD_LOG_KIND: &str = "build";
pub const ROOT_LOG_KIND: &str = "root";

/// Persisted manifest written before every round
pub const MANIFEST_FILE: &str = "manifest.toml";

pub const CONFIGURE_MISSES_FILE: &str = "configure_misses";
pub const WHATREQUIRES_FILE: &str = "whatrequires";

pub const DEFAULT_ROUND_CAP: u32 = 20;
pub const DEFAULT_SUCCESS_BANNER: &str = "Compress success";
pub const DEFAULT_CLEAN_MARKER: &str = "Executing(%clean";

/// Live name of a transcript, e.g. `build.log`
#[must_use]
pub fn log_file_name(kind: &str) -> String {
    format!("{kind}.log")
}

/// Archived name of a transcript, e.g. `round3-build.log`
#[must_use]
pub fn round_log_name(round: u32, kind: &str) -> String {
    format!("round{round}-{kind}.log")
}
