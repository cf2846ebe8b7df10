//! Application layer of the FGI simulator.
//!
//! Coordinates the domain model in `fgi-core` with the generation
//! backend in `fgi-interaction`: prompt composition, turn orchestration,
//! the session use case that fronts every operator command, and
//! transcript/report export.

pub mod export;
pub mod orchestrator;
pub mod prompt;
pub mod session_usecase;

#[cfg(test)]
pub(crate) mod testing;

pub use export::{Export, report_markdown, transcript_csv};
pub use orchestrator::{
    BatchReport, CycleOutcome, CycleReport, DEFAULT_BATCH_CYCLES, ParticipantOutcome,
    TurnOrchestrator, TurnOutcome,
};
pub use session_usecase::SessionUseCase;
