//! Session domain model.
//!
//! A session owns all mutable state of one simulated focus group interview:
//! configuration, phase, turn counter, persona registry and both transcript
//! logs. It is an explicit struct passed into every command handler; there
//! are no ambient globals.

use crate::error::{FgiError, Result};
use crate::persona::PersonaRegistry;
use crate::progress::Progress;
use crate::transcript::{StrategyLog, Transcript};
use serde::{Deserialize, Serialize};

/// Top-level session phase. Strictly linear: strategy, then interview, then
/// report. The only way back is a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Pre-session planning dialogue between operator and moderator.
    Strategy,
    /// The simulated interview is running.
    Interview,
    /// The interview is over; the insight report is available.
    Report,
}

impl Phase {
    /// Human-readable phase name.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Strategy => "strategy",
            Phase::Interview => "interview",
            Phase::Report => "report",
        }
    }
}

/// How much the turn counter advances per completed operation.
///
/// Whether a stimulus presentation consumes as much simulated time as a
/// full cycle is a pacing policy, so the mapping is configuration rather
/// than code. Both default to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnIncrements {
    /// Increment per completed moderator+participants cycle.
    pub cycle: u32,
    /// Increment per completed stimulus presentation.
    pub stimulus: u32,
}

impl Default for TurnIncrements {
    fn default() -> Self {
        Self {
            cycle: 1,
            stimulus: 1,
        }
    }
}

/// Moderator and pacing configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interview topic, e.g. "acceptance of a new coffee brand concept".
    pub topic: String,
    /// Advisory target duration in minutes. Pacing only, never a hard gate.
    pub target_duration_minutes: u32,
    /// Moderator probing intensity, 1 (rapport-driven) to 5 (adversarial).
    pub style_level: u8,
    #[serde(default)]
    pub turn_increments: TurnIncrements,
}

impl SessionConfig {
    /// Creates a config, clamping `style_level` into `1..=5`.
    pub fn new(topic: impl Into<String>, target_duration_minutes: u32, style_level: u8) -> Self {
        Self {
            topic: topic.into(),
            target_duration_minutes,
            style_level: style_level.clamp(1, 5),
            turn_increments: TurnIncrements::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("New product concept acceptance", 60, 2)
    }
}

/// All mutable state of one simulated interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
    pub config: SessionConfig,
    pub phase: Phase,
    /// Completed cycles and stimulus presentations, weighted by
    /// `config.turn_increments`.
    pub turn_count: u32,
    pub personas: PersonaRegistry,
    pub strategy_log: StrategyLog,
    pub interview_log: Transcript,
    /// Cached insight analysis. Empty until the report is synthesized;
    /// computed at most once per session absent a reset.
    pub analysis: Option<String>,
}

impl Session {
    /// Creates a fresh session in the strategy phase.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            config,
            phase: Phase::Strategy,
            turn_count: 0,
            personas: PersonaRegistry::new(),
            strategy_log: StrategyLog::new(),
            interview_log: Transcript::new(),
            analysis: None,
        }
    }

    /// Returns the derived pacing state (never stored).
    pub fn progress(&self) -> Progress {
        Progress::at(self.turn_count, self.config.target_duration_minutes)
    }

    /// Advances to the next phase.
    ///
    /// Strategy to interview is guarded: it fails if no personas are
    /// registered, and the phase is left unchanged on failure. Interview to
    /// report is unconditional; the target duration is advisory pacing, not
    /// a gate.
    ///
    /// # Errors
    ///
    /// Returns `FgiError::Precondition` if the guard fails or the session
    /// is already in the report phase.
    pub fn advance_phase(&mut self) -> Result<Phase> {
        let next = match self.phase {
            Phase::Strategy => {
                if self.personas.is_empty() {
                    return Err(FgiError::precondition(
                        "cannot start the interview with an empty persona registry",
                    ));
                }
                Phase::Interview
            }
            Phase::Interview => Phase::Report,
            Phase::Report => {
                return Err(FgiError::precondition(
                    "the report phase is final; reset the session to start over",
                ));
            }
        };

        self.phase = next;
        Ok(next)
    }

    /// Records one completed moderator+participants cycle.
    pub fn record_cycle(&mut self) {
        self.turn_count += self.config.turn_increments.cycle;
    }

    /// Records one completed stimulus presentation.
    pub fn record_stimulus(&mut self) {
        self.turn_count += self.config.turn_increments.stimulus;
    }

    /// Resets the session back to the strategy phase.
    ///
    /// Both logs are cleared wholesale, the turn counter is zeroed and the
    /// cached analysis is dropped. Personas survive iff `preserve_personas`
    /// is set; re-running a session with the same panel is common enough
    /// that the choice belongs to the caller.
    pub fn reset(&mut self, preserve_personas: bool) {
        self.phase = Phase::Strategy;
        self.turn_count = 0;
        self.strategy_log.clear();
        self.interview_log.clear();
        self.analysis = None;
        if !preserve_personas {
            self.personas.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_personas() -> Session {
        let mut session = Session::new(SessionConfig::default());
        session.personas.add("Tanaka", "40, career woman").unwrap();
        session
    }

    #[test]
    fn test_new_session_starts_in_strategy() {
        let session = Session::new(SessionConfig::default());
        assert_eq!(session.phase, Phase::Strategy);
        assert_eq!(session.turn_count, 0);
        assert!(session.analysis.is_none());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_advance_phase_guard_on_empty_registry() {
        let mut session = Session::new(SessionConfig::default());
        let err = session.advance_phase().unwrap_err();

        assert!(err.is_precondition());
        // Phase must not change on a failed transition
        assert_eq!(session.phase, Phase::Strategy);
    }

    #[test]
    fn test_advance_phase_linear_progression() {
        let mut session = session_with_personas();

        assert_eq!(session.advance_phase().unwrap(), Phase::Interview);
        assert_eq!(session.advance_phase().unwrap(), Phase::Report);
        assert!(session.advance_phase().unwrap_err().is_precondition());
        assert_eq!(session.phase, Phase::Report);
    }

    #[test]
    fn test_style_level_is_clamped() {
        assert_eq!(SessionConfig::new("t", 60, 0).style_level, 1);
        assert_eq!(SessionConfig::new("t", 60, 9).style_level, 5);
        assert_eq!(SessionConfig::new("t", 60, 3).style_level, 3);
    }

    #[test]
    fn test_turn_increments_are_configurable() {
        let mut session = session_with_personas();
        session.config.turn_increments = TurnIncrements {
            cycle: 1,
            stimulus: 2,
        };

        session.record_cycle();
        session.record_stimulus();
        assert_eq!(session.turn_count, 3);
    }

    #[test]
    fn test_reset_preserving_personas() {
        let mut session = session_with_personas();
        session.advance_phase().unwrap();
        session.record_cycle();
        session.analysis = Some("insights".to_string());

        session.reset(true);

        assert_eq!(session.phase, Phase::Strategy);
        assert_eq!(session.turn_count, 0);
        assert!(session.analysis.is_none());
        assert_eq!(session.personas.len(), 1);
    }

    #[test]
    fn test_reset_clearing_personas() {
        let mut session = session_with_personas();
        session.reset(false);
        assert!(session.personas.is_empty());
    }
}
