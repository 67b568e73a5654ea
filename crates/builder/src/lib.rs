#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build driving and the repair loop for pkgmend
//!
//! The actual build is someone else's job: a [`Builder`] runs one attempt of
//! the current manifest and hands back its transcripts. [`RepairOrchestrator`]
//! owns the manifest for a session and moves it through
//! `Detecting -> Building -> Analyzing -> (Converged | Retrying | Aborted)`.
//!
//! A session ends on the first of:
//! - the success banner in a transcript of a zero-exit build,
//! - a fatal verdict (`BlacklistedMiss`, `EnvironmentFailure`, a missing
//!   transcript),
//! - a round in which nothing changed the manifest,
//! - the round cap.

mod archive;
mod collateral;
mod driver;
mod orchestrator;

pub use archive::RoundLogArchive;
pub use collateral::{Collateral, CommandReverseDependencies, ReverseDependencyQuery};
pub use driver::{BuildOutcome, BuildRequest, Builder, CommandBuilder};
pub use orchestrator::{
    RepairOrchestrator, RepairReport, RepairRequest, RepairSettings, RepairState,
};
