//! pkgmend - unattended build repair for native packages
//!
//! The CLI wires configuration, the rule catalog and the build driver into a
//! repair session, and exposes the detector, analyzer and classifier as
//! standalone commands for inspecting one step at a time.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{CommandOutput, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use pkgmend_analyzer::{FileOwnerIndex, LogAnalyzer, NoResolver, PackageResolver};
use pkgmend_builder::{
    CommandBuilder, CommandReverseDependencies, RepairOrchestrator, RepairRequest,
    RepairSettings, RepairState,
};
use pkgmend_catalog::RuleCatalog;
use pkgmend_classifier::FileClassifier;
use pkgmend_config::{constants, Config};
use pkgmend_detector::BuildSystemDetector;
use pkgmend_events::{EventReceiver, EventSender};
use pkgmend_manifest::{Manifest, TomlManifestStore};
use pkgmend_types::{BuildSystemId, ColorChoice};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    // Logs go next to the session output; the config is not loaded yet
    let log_dir = cli
        .global
        .output_dir
        .clone()
        .or_else(|| std::env::var_os("PKGMEND_OUTPUT_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_DIR))
        .join("logs");
    logging::init_tracing(json_mode, cli.global.debug, &log_dir);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting pkgmend v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    let (event_sender, event_receiver) = pkgmend_events::channel();

    let color = cli.global.color.unwrap_or(config.general.color);
    let renderer = OutputRenderer::new(cli.global.json, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug);

    let result = execute_command_with_events(
        cli.command,
        config,
        event_sender,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    if let CommandOutput::Repair(report) = &result {
        if report.state == RepairState::Aborted {
            let reason = report
                .failure
                .as_ref()
                .map_or_else(|| "unknown".to_string(), |f| f.message.clone());
            return Err(CliError::Aborted(reason));
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    config: Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandOutput, CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: Config,
    event_sender: EventSender,
) -> Result<CommandOutput, CliError> {
    match command {
        Commands::Repair {
            source,
            name,
            pkg_version,
            patches,
            ..
        } => {
            let name = match name {
                Some(name) => name,
                None => package_name_from(&source)?,
            };
            let orchestrator = build_orchestrator(&config, event_sender).await?;
            let request = RepairRequest::new(name, pkg_version, source).with_patches(patches);
            let report = orchestrator.repair(&request).await;
            Ok(CommandOutput::Repair(Box::new(report)))
        }

        Commands::Detect { source, max_depth } => {
            let mut detector = BuildSystemDetector::new();
            if let Some(depth) = max_depth {
                detector = detector.with_max_depth(depth);
            }
            let detection = detector.detect(&source)?;
            Ok(CommandOutput::Detect(detection))
        }

        Commands::Analyze {
            log,
            tool,
            exit_code,
            manifest,
        } => analyze(&config, &log, tool, exit_code, manifest).await,

        Commands::Classify { list, manifest } => classify(&config, &list, manifest).await,
    }
}

async fn build_orchestrator(
    config: &Config,
    event_sender: EventSender,
) -> Result<RepairOrchestrator, CliError> {
    let catalog = RuleCatalog::load(&config.catalog.rule_files).await?;
    let classifier = FileClassifier::from_config(config).await?;
    let builder = CommandBuilder::new(&config.builder.command)?;
    let store = TomlManifestStore::new(config.output_dir().join(constants::MANIFEST_FILE));

    let mut orchestrator = RepairOrchestrator::new(
        Arc::new(catalog),
        Arc::new(classifier),
        Arc::new(builder),
        Arc::new(store),
        RepairSettings::from_config(config),
    )
    .with_resolver(load_resolver(config).await?)
    .with_event_sender(event_sender);
    if let Some(query) = CommandReverseDependencies::new(&config.builder.whatrequires) {
        orchestrator = orchestrator.with_reverse_dependencies(Arc::new(query));
    }

    Ok(orchestrator)
}

async fn load_resolver(config: &Config) -> Result<Arc<dyn PackageResolver>, CliError> {
    match &config.catalog.file_owners {
        Some(path) => {
            let index = FileOwnerIndex::load(path).await?;
            info!(entries = index.len(), "loaded file owner index");
            Ok(Arc::new(index))
        }
        None => Ok(Arc::new(NoResolver)),
    }
}

async fn analyze(
    config: &Config,
    log: &Path,
    tool: BuildSystemId,
    exit_code: Option<i32>,
    manifest_path: Option<PathBuf>,
) -> Result<CommandOutput, CliError> {
    let catalog = RuleCatalog::load(&config.catalog.rule_files).await?;
    let resolver = load_resolver(config).await?;
    let mut manifest = load_manifest(manifest_path.as_deref()).await?;

    let analyzer = LogAnalyzer::new(&catalog)
        .with_resolver(resolver.as_ref())
        .with_options(pkgmend_analyzer::AnalyzerOptions::from_config(config));
    let report = analyzer
        .analyze_file(log, &mut manifest, tool, exit_code)
        .await?;

    if let Some(path) = &manifest_path {
        manifest.write_to_file(path).await?;
    }

    Ok(CommandOutput::Analyze {
        build_system: tool,
        report,
        manifest: manifest_path,
    })
}

async fn classify(
    config: &Config,
    list: &Path,
    manifest_path: Option<PathBuf>,
) -> Result<CommandOutput, CliError> {
    let content = tokio::fs::read_to_string(list).await?;
    let paths: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let classifier = FileClassifier::from_config(config).await?;
    let mut manifest = load_manifest(manifest_path.as_deref()).await?;
    let fixes = classifier.classify(paths, &mut manifest);

    if let Some(path) = &manifest_path {
        manifest.write_to_file(path).await?;
    }

    Ok(CommandOutput::Classify {
        fixes,
        manifest: manifest_path,
    })
}

async fn load_manifest(path: Option<&Path>) -> Result<Manifest, CliError> {
    match path {
        Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
            Ok(Manifest::from_file(path).await?)
        }
        Some(path) => {
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("scratch");
            Ok(Manifest::new(name, "0"))
        }
        None => Ok(Manifest::new("scratch", "0")),
    }
}

fn package_name_from(path: &Path) -> Result<String, CliError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::InvalidArguments(format!(
                "cannot derive a package name from {}; pass --name",
                path.display()
            ))
        })
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if let Some(dir) = &global.output_dir {
        config.paths.output_dir = Some(dir.clone());
    }

    if let Commands::Repair {
        round_cap,
        build_root,
        command: build_command,
        ..
    } = command
    {
        if let Some(cap) = round_cap {
            config.repair.round_cap = *cap;
        }
        if let Some(root) = build_root {
            config.paths.build_root = Some(root.clone());
        }
        if !build_command.is_empty() {
            config.builder.command.clone_from(build_command);
        }
    }
}
