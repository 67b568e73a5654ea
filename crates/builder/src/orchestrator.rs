//! The detect, build, analyze, retry loop

use crate::archive::RoundLogArchive;
use crate::collateral::{write_configure_misses, write_whatrequires, Collateral, ReverseDependencyQuery};
use crate::driver::{BuildOutcome, BuildRequest, Builder};
use chrono::{DateTime, Utc};
use pkgmend_analyzer::{root_log_misses, AnalyzerOptions, LogAnalyzer, NoResolver, PackageResolver};
use pkgmend_catalog::RuleCatalog;
use pkgmend_classifier::FileClassifier;
use pkgmend_config::constants::{
    BUILD_LOG_KIND, CONFIGURE_MISSES_FILE, ROOT_LOG_KIND, WHATREQUIRES_FILE,
};
use pkgmend_config::Config;
use pkgmend_detector::{seed_requirements, BuildSystemDetector};
use pkgmend_errors::{BuildError, Error, RepairError};
use pkgmend_events::{EventEmitter, EventSender, FailureContext, RepairEvent};
use pkgmend_manifest::{Manifest, ManifestBuilder, ManifestStore};
use pkgmend_types::{AppliedFix, BuildSystemId, FixAction};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairState {
    Detecting,
    Building,
    Analyzing,
    Retrying,
    Converged,
    Aborted,
}

impl RepairState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Aborted)
    }
}

/// Session-wide knobs
#[derive(Debug, Clone)]
pub struct RepairSettings {
    pub round_cap: u32,
    pub output_dir: PathBuf,
    pub build_root: PathBuf,
    pub results_dir: PathBuf,
    pub analyzer: AnalyzerOptions,
}

impl RepairSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            round_cap: config.repair.round_cap,
            output_dir: config.output_dir(),
            build_root: config.build_root(),
            results_dir: config.results_dir(),
            analyzer: AnalyzerOptions::from_config(config),
        }
    }
}

/// The package to repair
#[derive(Debug, Clone)]
pub struct RepairRequest {
    pub name: String,
    pub version: String,
    pub source_dir: PathBuf,
    /// Backport patches applied in prep, in order
    pub patches: Vec<String>,
}

impl RepairRequest {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source_dir: source_dir.into(),
            patches: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_patches<I, S>(mut self, patches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patches.extend(patches.into_iter().map(Into::into));
        self
    }
}

/// Terminal summary of a session, available whatever the outcome
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub session_id: Uuid,
    pub state: RepairState,
    pub build_system: Option<BuildSystemId>,
    pub rounds: u32,
    pub history: Vec<AppliedFix>,
    /// Archived transcripts, oldest first
    pub transcripts: Vec<PathBuf>,
    /// Post-success reports written to the output directory
    pub collateral: Vec<PathBuf>,
    pub failure: Option<FailureContext>,
    #[serde(skip)]
    pub error: Option<Error>,
    pub manifest: Manifest,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RepairReport {
    #[must_use]
    pub fn converged(&self) -> bool {
        self.state == RepairState::Converged
    }

    /// The repair-level reason for an abort, if it was one
    #[must_use]
    pub fn repair_error(&self) -> Option<&RepairError> {
        match &self.error {
            Some(Error::Repair(err)) => Some(err),
            _ => None,
        }
    }
}

struct Session {
    id: Uuid,
    state: RepairState,
    manifest: Manifest,
    build_system: Option<BuildSystemId>,
    history: Vec<AppliedFix>,
    transcripts: Vec<PathBuf>,
    collateral: Vec<PathBuf>,
    last_transcript: Option<PathBuf>,
    started_at: DateTime<Utc>,
}

/// What one analyzed round amounted to
struct RoundResult {
    converged: bool,
    unresolved: Vec<String>,
}

/// Drives one package from source tree to a converged (or abandoned) manifest.
///
/// The manifest is owned by the session; catalog, classifier and collaborators
/// are shared read-only and may serve several orchestrators at once.
pub struct RepairOrchestrator {
    catalog: Arc<RuleCatalog>,
    classifier: Arc<FileClassifier>,
    builder: Arc<dyn Builder>,
    store: Arc<dyn ManifestStore>,
    resolver: Arc<dyn PackageResolver>,
    reverse_deps: Option<Arc<dyn ReverseDependencyQuery>>,
    detector: BuildSystemDetector,
    settings: RepairSettings,
    event_sender: Option<EventSender>,
}

impl EventEmitter for RepairOrchestrator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl RepairOrchestrator {
    pub fn new(
        catalog: Arc<RuleCatalog>,
        classifier: Arc<FileClassifier>,
        builder: Arc<dyn Builder>,
        store: Arc<dyn ManifestStore>,
        settings: RepairSettings,
    ) -> Self {
        Self {
            catalog,
            classifier,
            builder,
            store,
            resolver: Arc::new(NoResolver),
            reverse_deps: None,
            detector: BuildSystemDetector::new(),
            settings,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn PackageResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_reverse_dependencies(mut self, query: Arc<dyn ReverseDependencyQuery>) -> Self {
        self.reverse_deps = Some(query);
        self
    }

    #[must_use]
    pub fn with_detector(mut self, detector: BuildSystemDetector) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &RepairSettings {
        &self.settings
    }

    /// Repair one package. Failures end up in the report, never as `Err`.
    pub async fn repair(&self, request: &RepairRequest) -> RepairReport {
        let mut session = Session {
            id: Uuid::new_v4(),
            state: RepairState::Detecting,
            manifest: Manifest::new(&request.name, &request.version),
            build_system: None,
            history: Vec::new(),
            transcripts: Vec::new(),
            collateral: Vec::new(),
            last_transcript: None,
            started_at: Utc::now(),
        };
        info!(session = %session.id, package = %request.name, "repair session started");
        self.emit_repair(RepairEvent::SessionStarted {
            session_id: session.id,
            package: request.name.clone(),
            source_dir: request.source_dir.clone(),
            round_cap: self.settings.round_cap,
        });

        let result = self.run(request, &mut session).await;
        self.finish(session, result).await
    }

    async fn run(&self, request: &RepairRequest, session: &mut Session) -> Result<(), Error> {
        let build_system = self.select_build_system(request, session.id).await?;
        session.build_system = Some(build_system);
        session.manifest = self.seed_manifest(request, build_system).await?;

        let archive = RoundLogArchive::new(&self.settings.results_dir);
        loop {
            session.state = RepairState::Building;
            let round = session.manifest.begin_round();
            info!(round, "round started");
            self.emit_repair(RepairEvent::RoundStarted {
                session_id: session.id,
                round,
            });

            self.store.save(&session.manifest).await?;
            let outcome = self.build(request, build_system, session, &archive).await?;

            session.state = RepairState::Analyzing;
            let result = self.analyze(build_system, &outcome, session).await?;
            let manifest = &session.manifest;
            self.emit_repair(RepairEvent::RoundCompleted {
                session_id: session.id,
                round,
                must_restart: manifest.must_restart,
                file_restart: manifest.file_restart,
            });

            if result.converged {
                session.state = RepairState::Converged;
                return Ok(());
            }
            if manifest.is_fixed_point() {
                let err = if result.unresolved.is_empty() {
                    RepairError::NoProgress { round }
                } else {
                    RepairError::UnresolvedSignature {
                        signatures: result.unresolved,
                    }
                };
                return Err(err.into());
            }
            if round >= self.settings.round_cap {
                return Err(RepairError::RoundCapExceeded { rounds: round }.into());
            }
            debug!(
                round,
                must_restart = manifest.must_restart,
                file_restart = manifest.file_restart,
                "retrying"
            );
            session.state = RepairState::Retrying;
        }
    }

    /// First detected candidate whose probe succeeds
    async fn select_build_system(
        &self,
        request: &RepairRequest,
        session_id: Uuid,
    ) -> Result<BuildSystemId, Error> {
        let detection = self.detector.detect(&request.source_dir)?;
        for candidate in detection.candidates() {
            if !self
                .builder
                .probe(candidate.build_system, &request.source_dir)
                .await?
            {
                debug!(build_system = %candidate.build_system, "probe rejected candidate");
                continue;
            }
            info!(
                build_system = %candidate.build_system,
                score = candidate.score,
                "build system selected"
            );
            self.emit_repair(RepairEvent::BuildSystemDetected {
                session_id,
                build_system: candidate.build_system,
                score: candidate.score,
                candidates: detection.build_systems().collect(),
            });
            return Ok(candidate.build_system);
        }
        Err(BuildError::ProbeFailed {
            build_system: detection
                .build_systems()
                .map(BuildSystemId::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
        .into())
    }

    async fn seed_manifest(
        &self,
        request: &RepairRequest,
        build_system: BuildSystemId,
    ) -> Result<Manifest, Error> {
        let seeded = seed_requirements(&request.source_dir, build_system, &self.catalog).await?;

        let mut builder = ManifestBuilder::new(&request.name, &request.version)
            .build_system(build_system)
            .banned(self.catalog.banned().iter().cloned())
            .patches(request.patches.iter().cloned());
        if let Some(defaults) = self.catalog.defaults_for(build_system) {
            builder = builder.build_requires(defaults.build_requires.iter().cloned());
            for (phase, script) in &defaults.phases {
                builder = builder.phase(*phase, script.clone());
            }
        }
        builder.build_requires(seeded).build()
    }

    async fn build(
        &self,
        request: &RepairRequest,
        build_system: BuildSystemId,
        session: &mut Session,
        archive: &RoundLogArchive,
    ) -> Result<BuildOutcome, Error> {
        let round = session.manifest.round;
        let build_request = BuildRequest {
            manifest: &session.manifest,
            manifest_path: self.store.location(),
            build_system,
            round,
            source_dir: &request.source_dir,
            build_root: &self.settings.build_root,
            results_dir: &self.settings.results_dir,
        };
        let outcome = self
            .builder
            .run(&build_request)
            .await
            .map_err(environment_failure)?;

        let archived = archive
            .archive(round, BUILD_LOG_KIND, &outcome.transcript)
            .await?;
        if let Some(root) = &outcome.root_transcript {
            if let Some(path) = archive.archive(round, ROOT_LOG_KIND, root).await? {
                session.transcripts.push(path);
            }
        }
        self.emit_repair(RepairEvent::BuildFinished {
            session_id: session.id,
            round,
            exit_code: outcome.exit_code,
            transcript: archived.clone().unwrap_or_else(|| outcome.transcript.clone()),
        });
        session.transcripts.extend(archived);
        session.last_transcript = Some(outcome.transcript.clone());
        Ok(outcome)
    }

    async fn analyze(
        &self,
        build_system: BuildSystemId,
        outcome: &BuildOutcome,
        session: &mut Session,
    ) -> Result<RoundResult, Error> {
        let round = session.manifest.round;
        let analyzer = LogAnalyzer::new(&self.catalog)
            .with_resolver(self.resolver.as_ref())
            .with_options(self.settings.analyzer.clone());
        let report = analyzer
            .analyze_file(
                &outcome.transcript,
                &mut session.manifest,
                build_system,
                outcome.exit_code,
            )
            .await?;
        self.record(session, round, &report.fixes);

        if report.success && outcome.succeeded() {
            info!(round, "build succeeded");
            return Ok(RoundResult {
                converged: true,
                unresolved: Vec::new(),
            });
        }

        let mut file_fixes = self.classifier.classify(
            report.unpackaged.iter().map(String::as_str),
            &mut session.manifest,
        );
        file_fixes.extend(self.classifier.remove_missing(
            report.missing_files.iter().map(String::as_str),
            &mut session.manifest,
        ));
        file_fixes.extend(
            self.classifier
                .prune_directories(&self.settings.build_root, &mut session.manifest)
                .await?,
        );
        self.record(session, round, &file_fixes);

        let mut unresolved = report.unresolved;
        if let Some(root) = &outcome.root_transcript {
            let bytes = tokio::fs::read(root)
                .await
                .map_err(|e| Error::io_with_path(&e, root))?;
            for miss in root_log_misses(String::from_utf8_lossy(&bytes).lines()) {
                if !unresolved.contains(&miss) {
                    unresolved.push(miss);
                }
            }
        }
        for signature in &unresolved {
            self.emit_repair(RepairEvent::SignatureUnresolved {
                session_id: session.id,
                round,
                signature: signature.clone(),
            });
        }

        Ok(RoundResult {
            converged: false,
            unresolved,
        })
    }

    fn record(&self, session: &mut Session, round: u32, fixes: &[FixAction]) {
        for fix in fixes {
            self.emit_repair(RepairEvent::FixApplied {
                session_id: session.id,
                round,
                fix: fix.clone(),
            });
            session.history.push(AppliedFix {
                round,
                action: fix.clone(),
            });
        }
    }

    async fn finish(&self, mut session: Session, result: Result<(), Error>) -> RepairReport {
        let rounds = session.manifest.round;
        let (failure, error) = match result {
            Ok(()) => {
                self.write_collateral(&mut session).await;
                info!(rounds, fixes = session.history.len(), "repair converged");
                self.emit_repair(RepairEvent::Converged {
                    session_id: session.id,
                    rounds,
                    fixes: session.history.len(),
                });
                (None, None)
            }
            Err(err) => {
                session.state = RepairState::Aborted;
                error!(rounds, error = %err, "repair aborted");
                let failure = FailureContext::from_error(&err);
                self.emit_repair(RepairEvent::Aborted {
                    session_id: session.id,
                    rounds,
                    failure: failure.clone(),
                });
                (Some(failure), Some(err))
            }
        };

        if let Err(err) = self.store.save(&session.manifest).await {
            self.emit_step_failed("save manifest", err.to_string());
        }

        RepairReport {
            session_id: session.id,
            state: session.state,
            build_system: session.build_system,
            rounds,
            history: session.history,
            transcripts: session.transcripts,
            collateral: session.collateral,
            failure,
            error,
            manifest: session.manifest,
            started_at: session.started_at,
            finished_at: Utc::now(),
        }
    }

    async fn write_collateral(&self, session: &mut Session) {
        if let Err(err) = tokio::fs::create_dir_all(&self.settings.output_dir).await {
            self.emit_step_failed("collateral", err.to_string());
            return;
        }

        if let Some(transcript) = session.last_transcript.clone() {
            let target = self.settings.output_dir.join(CONFIGURE_MISSES_FILE);
            match write_configure_misses(&transcript, &self.catalog, &target).await {
                Ok(Some(collateral)) => self.collateral_written(session, collateral),
                Ok(None) => {}
                Err(err) => self.emit_step_failed(CONFIGURE_MISSES_FILE, err.to_string()),
            }
        }

        if let Some(query) = &self.reverse_deps {
            let target = self.settings.output_dir.join(WHATREQUIRES_FILE);
            match write_whatrequires(query.as_ref(), &session.manifest.name, &target).await {
                Ok(collateral) => self.collateral_written(session, collateral),
                Err(err) => self.emit_step_failed(WHATREQUIRES_FILE, err.to_string()),
            }
        }
    }

    fn collateral_written(&self, session: &mut Session, collateral: Collateral) {
        for target in &collateral.flagged {
            self.emit_warning_with_context(
                "configure probe for blacklisted target answered no",
                target,
            );
        }
        self.emit_repair(RepairEvent::CollateralWritten {
            session_id: session.id,
            path: collateral.path.clone(),
            entries: collateral.entries,
        });
        session.collateral.push(collateral.path);
    }
}

/// A driver error that is not already a repair verdict means no transcript
fn environment_failure(err: Error) -> Error {
    if matches!(err, Error::Repair(_)) {
        return err;
    }
    RepairError::EnvironmentFailure {
        message: err.to_string(),
    }
    .into()
}
