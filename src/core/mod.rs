//! Session lifecycle: the per-session cycle loop and the restart loop around it.

pub mod orchestrator;
pub mod supervisor;

pub use orchestrator::{CycleReport, SessionFailure, SessionOrchestrator, SessionState, SessionSummary};
pub use supervisor::{AttemptOutcome, Supervisor, SupervisorReport};
