//! Turn orchestration.
//!
//! Sequences single-cycle and batched interview advancement. Within one
//! cycle the moderator always speaks first, then every persona in registry
//! order; each speaker's context window is rebuilt from the transcript as
//! it exists after the previous append, so participant N sees participant
//! N-1's fresh text and never a future participant's.

use crate::prompt;
use fgi_core::error::{FgiError, Result};
use fgi_core::session::{Phase, Session};
use fgi_core::transcript::{HISTORY_WINDOW, Speaker, SpeechContent, SpeechRecord};
use fgi_interaction::GenerationBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Cycles run by `advance_batch` when the operator asks to "advance 15
/// minutes" (3 cycles x 5 simulated minutes).
pub const DEFAULT_BATCH_CYCLES: usize = 3;

/// Pause between batched cycles, a cooperative yield that respects the
/// backend's rate limits. Nothing else runs concurrently.
const DEFAULT_PACING: Duration = Duration::from_secs(2);

/// Outcome of one participant's slot within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The participant's generated contribution was appended.
    Spoke(String),
    /// Generation failed; the slot was skipped and no record appended.
    Skipped(String),
}

/// Per-participant result of one cycle, in speaking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantOutcome {
    pub name: String,
    pub outcome: TurnOutcome,
}

/// Result of one completed moderator+participants cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// The moderator's generated contribution.
    pub moderator: String,
    pub participants: Vec<ParticipantOutcome>,
}

impl CycleReport {
    /// Names of participants whose slot was skipped.
    pub fn skipped(&self) -> Vec<&str> {
        self.participants
            .iter()
            .filter(|p| matches!(p.outcome, TurnOutcome::Skipped(_)))
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// One slot of a batch: either a completed cycle or a cycle whose
/// moderator step failed (skipped atomically, batch continues).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Skipped { reason: String },
}

/// Result of a batched advancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub cycles: Vec<CycleOutcome>,
}

impl BatchReport {
    /// Number of cycles that completed (and advanced the turn counter).
    pub fn completed(&self) -> usize {
        self.cycles
            .iter()
            .filter(|c| matches!(c, CycleOutcome::Completed(_)))
            .count()
    }
}

/// Drives interview advancement against the generation backend.
///
/// Calls are strictly sequential and blocking by design; the orchestrator
/// owns the session state exclusively for the duration of a command.
pub struct TurnOrchestrator {
    backend: Arc<dyn GenerationBackend>,
    pacing: Duration,
}

impl TurnOrchestrator {
    /// Creates an orchestrator with the default inter-cycle pacing.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            pacing: DEFAULT_PACING,
        }
    }

    /// Overrides the pause inserted between batched cycles.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    fn ensure_interview(session: &Session) -> Result<()> {
        if session.phase != Phase::Interview {
            return Err(FgiError::precondition(format!(
                "interview commands are only valid in the interview phase (current: {})",
                session.phase.label()
            )));
        }
        Ok(())
    }

    /// Advances the interview by one cycle: one moderator turn followed by
    /// every persona in registry order.
    ///
    /// The cycle is atomic around the moderator: if the moderator
    /// generation fails, nothing is appended and the turn counter does not
    /// move. A participant failure only skips that participant; the cycle
    /// still completes and counts.
    ///
    /// # Errors
    ///
    /// `Precondition` outside the interview phase; `Generation` when the
    /// moderator step fails.
    pub async fn advance_cycle(&self, session: &mut Session) -> Result<CycleReport> {
        Self::ensure_interview(session)?;

        let request = prompt::compose_moderator_turn(
            &session.config,
            session.strategy_log.full(),
            session.progress(),
            session.personas.list(),
            session.interview_log.recent(HISTORY_WINDOW),
        );

        let moderator_text = self.backend.generate(request).await.map_err(|err| {
            tracing::warn!(target: "fgi::orchestrator", error = %err, "moderator turn failed, cycle aborted");
            FgiError::generation("Moderator", err.to_string())
        })?;

        session.interview_log.append(SpeechRecord::new(
            Speaker::Moderator,
            SpeechContent::Remark(moderator_text.clone()),
        ));

        let personas = session.personas.list().to_vec();
        let mut participants = Vec::with_capacity(personas.len());

        for persona in &personas {
            let request = prompt::compose_participant_turn(
                persona,
                &session.config.topic,
                session.interview_log.recent(HISTORY_WINDOW),
            );

            match self.backend.generate(request).await {
                Ok(text) => {
                    session.interview_log.append(SpeechRecord::new(
                        Speaker::Participant(persona.name.clone()),
                        SpeechContent::Remark(text.clone()),
                    ));
                    participants.push(ParticipantOutcome {
                        name: persona.name.clone(),
                        outcome: TurnOutcome::Spoke(text),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        target: "fgi::orchestrator",
                        participant = %persona.name,
                        error = %err,
                        "participant turn failed, slot skipped"
                    );
                    participants.push(ParticipantOutcome {
                        name: persona.name.clone(),
                        outcome: TurnOutcome::Skipped(err.to_string()),
                    });
                }
            }
        }

        session.record_cycle();
        tracing::debug!(
            target: "fgi::orchestrator",
            turn_count = session.turn_count,
            participants = participants.len(),
            "cycle completed"
        );

        Ok(CycleReport {
            moderator: moderator_text,
            participants,
        })
    }

    /// Runs `cycles` sequential cycles with a pacing pause between them.
    ///
    /// A cycle whose moderator step fails is recorded as skipped and the
    /// batch continues, so a batch is observationally equivalent to the
    /// same number of single-cycle commands.
    ///
    /// # Errors
    ///
    /// `Precondition` outside the interview phase.
    pub async fn advance_batch(&self, session: &mut Session, cycles: usize) -> Result<BatchReport> {
        Self::ensure_interview(session)?;

        let mut outcomes = Vec::with_capacity(cycles);
        for i in 0..cycles {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            match self.advance_cycle(session).await {
                Ok(report) => outcomes.push(CycleOutcome::Completed(report)),
                Err(FgiError::Generation { message, .. }) => {
                    outcomes.push(CycleOutcome::Skipped { reason: message });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(BatchReport { cycles: outcomes })
    }

    /// Presents stimulus material: a single moderator step, no participant
    /// fan-out. Aborts wholly on failure; no partial record is appended.
    ///
    /// # Errors
    ///
    /// `Precondition` outside the interview phase; `Validation` on empty
    /// stimulus content (checked before any generation); `Generation` when
    /// the call fails.
    pub async fn present_stimulus(
        &self,
        session: &mut Session,
        stimulus_type: &str,
        stimulus_content: &str,
    ) -> Result<SpeechRecord> {
        Self::ensure_interview(session)?;

        let request = prompt::compose_stimulus_turn(
            &session.config,
            stimulus_type,
            stimulus_content,
            session.personas.list(),
        )?;

        let framing = self.backend.generate(request).await.map_err(|err| {
            tracing::warn!(target: "fgi::orchestrator", error = %err, "stimulus presentation failed");
            FgiError::generation("Moderator", err.to_string())
        })?;

        let record = SpeechRecord::new(
            Speaker::Moderator,
            SpeechContent::Stimulus {
                stimulus_type: stimulus_type.trim().to_string(),
                framing,
            },
        );
        session.interview_log.append(record.clone());
        session.record_stimulus();

        Ok(record)
    }
}
