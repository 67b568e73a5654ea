//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use pkgmend_analyzer::AnalysisReport;
use pkgmend_builder::{RepairReport, RepairState};
use pkgmend_detector::Detection;
use pkgmend_types::{BuildSystemId, ColorChoice, FixAction};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Result of one CLI command
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandOutput {
    Repair(Box<RepairReport>),
    Detect(Detection),
    Analyze {
        build_system: BuildSystemId,
        report: AnalysisReport,
        /// Manifest that was rewritten, if one was given
        manifest: Option<PathBuf>,
    },
    Classify {
        fixes: Vec<FixAction>,
        manifest: Option<PathBuf>,
    },
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    json_output: bool,
    color_choice: ColorChoice,
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render a command result
    pub fn render_result(&self, result: &CommandOutput) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            CommandOutput::Repair(report) => self.render_repair_report(report),
            CommandOutput::Detect(detection) => self.render_detection(detection),
            CommandOutput::Analyze {
                build_system,
                report,
                manifest,
            } => self.render_analysis(*build_system, report, manifest.as_ref()),
            CommandOutput::Classify { fixes, manifest } => {
                self.render_classification(fixes, manifest.as_ref())
            }
        }
    }

    fn render_repair_report(&self, report: &RepairReport) -> io::Result<()> {
        let state = match report.state {
            RepairState::Converged => self.style("Converged", &Style::new().green().bold()),
            RepairState::Aborted => self.style("Aborted", &Style::new().red().bold()),
            other => format!("{other:?}"),
        };
        println!("{} {state}", self.style(&report.manifest.name, &Style::new().bold()));
        println!();
        println!("Session:      {}", report.session_id);
        println!(
            "Build system: {}",
            report
                .build_system
                .map_or_else(|| "-".to_string(), |bs| bs.to_string())
        );
        println!("Rounds:       {}", report.rounds);
        let elapsed = report.finished_at - report.started_at;
        println!("Duration:     {}s", elapsed.num_seconds());

        if let Some(failure) = &report.failure {
            println!();
            println!("Reason: {}", failure.message);
            if let Some(code) = &failure.code {
                println!("  Code: {code}");
            }
            if let Some(hint) = &failure.hint {
                println!("  Hint: {hint}");
            }
        }

        if !report.history.is_empty() {
            println!();
            let mut table = new_table(&["Round", "Kind", "Fix"]);
            for applied in &report.history {
                let kind = if applied.action.is_file_action() {
                    Cell::new("file").fg(Color::Blue)
                } else {
                    Cell::new("requirement").fg(Color::Magenta)
                };
                table.add_row(vec![
                    Cell::new(applied.round),
                    kind,
                    Cell::new(applied.action.to_string()),
                ]);
            }
            println!("{table}");
        }

        if !report.collateral.is_empty() {
            println!();
            for path in &report.collateral {
                println!("Report written: {}", path.display());
            }
        }
        Ok(())
    }

    fn render_detection(&self, detection: &Detection) -> io::Result<()> {
        println!(
            "Detected {} in {}",
            self.style(detection.best().build_system.as_str(), &Style::new().bold()),
            detection.root.display()
        );
        println!();

        let mut table = new_table(&["Build system", "Score", "Depth", "Marker"]);
        for (index, candidate) in detection.candidates().iter().enumerate() {
            let name = if index == 0 {
                Cell::new(candidate.build_system).fg(Color::Green)
            } else {
                Cell::new(candidate.build_system)
            };
            table.add_row(vec![
                name,
                Cell::new(candidate.score),
                Cell::new(candidate.depth),
                Cell::new(candidate.marker.display()),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    fn render_analysis(
        &self,
        build_system: BuildSystemId,
        report: &AnalysisReport,
        manifest: Option<&PathBuf>,
    ) -> io::Result<()> {
        let verdict = if report.success {
            self.style("build succeeded", &Style::new().green())
        } else {
            self.style("build failed", &Style::new().red())
        };
        println!(
            "{build_system} transcript: {verdict}, {} lines read",
            report.lines
        );

        if !report.fixes.is_empty() {
            println!();
            let mut table = new_table(&["Fix"]);
            for fix in &report.fixes {
                table.add_row(vec![Cell::new(fix.to_string())]);
            }
            println!("{table}");
        }

        print_list("Unresolved", &report.unresolved);
        print_list("Unpackaged files", &report.unpackaged);
        print_list("Missing files", &report.missing_files);

        if let Some(path) = manifest {
            println!();
            println!("Manifest updated: {}", path.display());
        }
        Ok(())
    }

    fn render_classification(
        &self,
        fixes: &[FixAction],
        manifest: Option<&PathBuf>,
    ) -> io::Result<()> {
        if fixes.is_empty() {
            println!("Nothing to place.");
            return Ok(());
        }

        let mut table = new_table(&["Path", "Placement"]);
        for fix in fixes {
            let (path, placement) = match fix {
                FixAction::AssignFile { path, package } => (path.as_str(), package.to_string()),
                FixAction::ExcludeFile { path } => (path.as_str(), "excluded".to_string()),
                FixAction::AddLocale { domain } => (domain.as_str(), "locale".to_string()),
                FixAction::RemoveFile { path } => (path.as_str(), "blacklisted".to_string()),
                FixAction::PruneDirectory { path } => (path.as_str(), "pruned".to_string()),
                other => ("-", other.to_string()),
            };
            table.add_row(vec![Cell::new(path), Cell::new(placement)]);
        }
        println!("{table}");

        if let Some(path) = manifest {
            println!();
            println!("Manifest updated: {}", path.display());
        }
        Ok(())
    }

    fn style(&self, text: &str, style: &Style) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{title}:");
    for item in items {
        println!("  {item}");
    }
}
