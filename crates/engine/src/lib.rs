//! Submit/poll/merge lifecycle for spreadsheet autofill batches.
//!
//! [`JobOrchestrator`] owns at most one live [`smartsheet_core::Batch`]
//! and drives it through `Idle -> Submitting -> Polling -> Complete`
//! (or `Error`). Polling runs on a cancellable [`PollHandle`]; progress
//! is broadcast as [`OrchestratorEvent`]s. [`Session`] pairs one grid
//! with one orchestrator.

pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod poller;
pub mod session;

pub use config::EngineConfig;
pub use error::EngineError;
pub use events::OrchestratorEvent;
pub use orchestrator::{JobOrchestrator, RunState, SharedGrid, TickOutcome};
pub use poller::PollHandle;
pub use session::Session;
