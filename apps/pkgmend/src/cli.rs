//! Command line interface definition

use clap::{Parser, Subcommand};
use pkgmend_types::{BuildSystemId, ColorChoice};
use std::path::PathBuf;

/// pkgmend - unattended build repair for native packages
#[derive(Parser)]
#[command(name = "pkgmend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unattended build repair for native packages")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to <output>/logs/
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output directory for manifests, transcripts and reports
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build a source tree repeatedly, fixing the manifest until it builds
    Repair {
        /// Unpacked upstream source tree
        source: PathBuf,

        /// Package name (defaults to the source directory name)
        #[arg(long)]
        name: Option<String>,

        /// Package version
        #[arg(long = "pkg-version", default_value = "0")]
        pkg_version: String,

        /// Backport patch applied in prep; repeat for several
        #[arg(long = "patch", value_name = "NAME")]
        patches: Vec<String>,

        /// Maximum number of build rounds
        #[arg(long)]
        round_cap: Option<u32>,

        /// Build root the driver installs into
        #[arg(long, value_name = "DIR")]
        build_root: Option<PathBuf>,

        /// Build driver program and arguments
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Rank the build systems found in a source tree
    Detect {
        /// Unpacked upstream source tree
        source: PathBuf,

        /// Deepest directory level to scan
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Run one build transcript through the analyzer
    Analyze {
        /// Build transcript
        log: PathBuf,

        /// Build system the transcript came from
        #[arg(long, short)]
        tool: BuildSystemId,

        /// Exit status of the build
        #[arg(long)]
        exit_code: Option<i32>,

        /// Existing manifest to apply the fixes to; it is rewritten in place
        #[arg(long, value_name = "PATH")]
        manifest: Option<PathBuf>,
    },

    /// Place a list of installed files into subpackages
    Classify {
        /// File with one installed path per line
        list: PathBuf,

        /// Existing manifest to apply the placements to; it is rewritten in place
        #[arg(long, value_name = "PATH")]
        manifest: Option<PathBuf>,
    },
}
