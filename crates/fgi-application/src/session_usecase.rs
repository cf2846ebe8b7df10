//! Session use case.
//!
//! The top-level command surface of the simulator: one `SessionUseCase`
//! owns one `Session` and validates every operator command against the
//! current phase before delegating to the orchestrator or the composer.
//! Exactly one command is in flight at a time; the use case owns all
//! mutable state exclusively between commands.

use crate::orchestrator::{BatchReport, CycleReport, DEFAULT_BATCH_CYCLES, TurnOrchestrator};
use crate::prompt;
use fgi_core::error::{FgiError, Result};
use fgi_core::persona::{self, Persona};
use fgi_core::session::{Phase, Session, SessionConfig};
use fgi_core::transcript::{SpeechRecord, StrategyExchange, StrategyRole};
use fgi_interaction::GenerationBackend;
use std::sync::Arc;
use std::time::Duration;

/// Phase controller and operator command surface for one session.
pub struct SessionUseCase {
    session: Session,
    backend: Arc<dyn GenerationBackend>,
    orchestrator: TurnOrchestrator,
}

impl SessionUseCase {
    /// Creates a use case around a fresh session with the default
    /// configuration.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self::with_config(SessionConfig::default(), backend)
    }

    /// Creates a use case around a fresh session with the given
    /// configuration.
    pub fn with_config(config: SessionConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            session: Session::new(config),
            backend: backend.clone(),
            orchestrator: TurnOrchestrator::new(backend),
        }
    }

    /// Overrides the pacing pause between batched cycles.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.orchestrator = TurnOrchestrator::new(self.backend.clone()).with_pacing(pacing);
        self
    }

    /// Read access for rendering and export.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reconfigures topic, target duration and style level.
    ///
    /// # Errors
    ///
    /// `Precondition` outside the strategy phase: once the interview has
    /// started the moderator setup is fixed until a reset.
    pub fn configure(
        &mut self,
        topic: impl Into<String>,
        target_duration_minutes: u32,
        style_level: u8,
    ) -> Result<()> {
        if self.session.phase != Phase::Strategy {
            return Err(FgiError::precondition(
                "configuration can only change during the strategy phase",
            ));
        }

        let increments = self.session.config.turn_increments;
        self.session.config = SessionConfig::new(topic, target_duration_minutes, style_level);
        self.session.config.turn_increments = increments;
        Ok(())
    }

    /// Adds (or overwrites) a participant persona.
    pub fn add_persona(&mut self, name: &str, profile: &str) -> Result<()> {
        self.session.personas.add(name, profile)
    }

    /// Removes a persona; no-op when absent.
    pub fn remove_persona(&mut self, name: &str) {
        self.session.personas.remove(name);
    }

    /// Removes all personas.
    pub fn clear_personas(&mut self) {
        self.session.personas.clear();
    }

    /// Bulk-loads a `Name: profile` roster, one persona per line.
    ///
    /// # Errors
    ///
    /// `Validation` on a malformed line; no personas are added in that
    /// case.
    pub fn load_roster(&mut self, text: &str) -> Result<usize> {
        let personas = persona::parse_roster(text)?;
        let count = personas.len();
        for Persona { name, profile } in personas {
            self.session.personas.add(name, profile)?;
        }
        Ok(count)
    }

    /// Submits an operator strategy instruction and returns the
    /// moderator's generated acknowledgement.
    ///
    /// The operator line and the acknowledgement are appended together
    /// only when generation succeeds, so a failed submission leaves the
    /// strategy log untouched and can simply be retried.
    ///
    /// # Errors
    ///
    /// `Validation` on empty text, `Precondition` outside the strategy
    /// phase, `Generation` when the acknowledgement call fails.
    pub async fn submit_strategy(&mut self, instruction: &str) -> Result<String> {
        if self.session.phase != Phase::Strategy {
            return Err(FgiError::precondition(
                "strategy instructions are only accepted during the strategy phase",
            ));
        }
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(FgiError::validation("strategy instruction must not be empty"));
        }

        let request = prompt::compose_strategy_reply(
            &self.session.config,
            self.session.strategy_log.full(),
            instruction,
        );

        let ack = self
            .backend
            .generate(request)
            .await
            .map_err(|err| FgiError::generation("Moderator", err.to_string()))?;

        self.session
            .strategy_log
            .append(StrategyExchange::new(StrategyRole::Operator, instruction));
        self.session
            .strategy_log
            .append(StrategyExchange::new(StrategyRole::Moderator, ack.clone()));

        tracing::debug!(
            target: "fgi::session",
            exchanges = self.session.strategy_log.len(),
            "strategy instruction recorded"
        );

        Ok(ack)
    }

    /// Advances the session phase (strategy to interview is guarded by a
    /// non-empty registry; interview to report is unconditional).
    pub fn advance_phase(&mut self) -> Result<Phase> {
        let next = self.session.advance_phase()?;
        tracing::info!(target: "fgi::session", phase = next.label(), "phase advanced");
        Ok(next)
    }

    /// Advances the interview by one moderator+participants cycle.
    pub async fn advance_cycle(&mut self) -> Result<CycleReport> {
        self.orchestrator.advance_cycle(&mut self.session).await
    }

    /// Advances the interview by `cycles` sequential cycles
    /// (`DEFAULT_BATCH_CYCLES` when `None`).
    pub async fn advance_batch(&mut self, cycles: Option<usize>) -> Result<BatchReport> {
        self.orchestrator
            .advance_batch(&mut self.session, cycles.unwrap_or(DEFAULT_BATCH_CYCLES))
            .await
    }

    /// Presents stimulus material for reaction.
    pub async fn present_stimulus(
        &mut self,
        stimulus_type: &str,
        stimulus_content: &str,
    ) -> Result<SpeechRecord> {
        self.orchestrator
            .present_stimulus(&mut self.session, stimulus_type, stimulus_content)
            .await
    }

    /// Returns the insight report, synthesizing it on first call.
    ///
    /// The analysis runs at most once per session: re-entering the report
    /// view returns the cached text. A failed synthesis leaves the cache
    /// empty, so the operator can retry the command.
    ///
    /// # Errors
    ///
    /// `Precondition` outside the report phase, `Generation` when the
    /// synthesis call fails.
    pub async fn report(&mut self) -> Result<String> {
        if self.session.phase != Phase::Report {
            return Err(FgiError::precondition(
                "the insight report is only available in the report phase",
            ));
        }

        if let Some(analysis) = &self.session.analysis {
            return Ok(analysis.clone());
        }

        let request = prompt::compose_analysis(
            &self.session.config,
            self.session.personas.list(),
            self.session.interview_log.full(),
            self.session.strategy_log.full(),
        );

        let analysis = self
            .backend
            .generate(request)
            .await
            .map_err(|err| FgiError::generation("Analyst", err.to_string()))?;

        tracing::info!(target: "fgi::session", chars = analysis.len(), "insight report synthesized");
        self.session.analysis = Some(analysis.clone());
        Ok(analysis)
    }

    /// Resets the session back to the strategy phase, optionally keeping
    /// the persona registry.
    pub fn reset(&mut self, preserve_personas: bool) {
        self.session.reset(preserve_personas);
        tracing::info!(target: "fgi::session", preserve_personas, "session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;

    fn usecase(backend: Arc<ScriptedBackend>) -> SessionUseCase {
        SessionUseCase::with_config(SessionConfig::new("coffee concept", 60, 2), backend)
            .with_pacing(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_configure_only_in_strategy_phase() {
        let backend = Arc::new(ScriptedBackend::ok(&[]));
        let mut usecase = usecase(backend);

        usecase.configure("tea concept", 90, 4).unwrap();
        assert_eq!(usecase.session().config.topic, "tea concept");
        assert_eq!(usecase.session().config.style_level, 4);

        usecase.add_persona("A", "a").unwrap();
        usecase.advance_phase().unwrap();

        let err = usecase.configure("again", 30, 1).unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(usecase.session().config.topic, "tea concept");
    }

    #[tokio::test]
    async fn test_submit_strategy_appends_pair_on_success() {
        let backend = Arc::new(ScriptedBackend::ok(&["Understood, I will probe pricing."]));
        let mut usecase = usecase(backend.clone());

        let ack = usecase.submit_strategy("Probe price sensitivity.").await.unwrap();
        assert_eq!(ack, "Understood, I will probe pricing.");

        let log = usecase.session().strategy_log.full();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, StrategyRole::Operator);
        assert_eq!(log[0].content, "Probe price sensitivity.");
        assert_eq!(log[1].role, StrategyRole::Moderator);

        // The composed request saw the (then-empty) prior briefing
        assert!(backend.calls()[0].instruction.contains("coffee concept"));
    }

    #[tokio::test]
    async fn test_submit_strategy_atomic_on_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err("down".into())]));
        let mut usecase = usecase(backend);

        let err = usecase.submit_strategy("Probe pricing.").await.unwrap_err();
        assert!(err.is_generation());
        assert!(usecase.session().strategy_log.is_empty());
    }

    #[tokio::test]
    async fn test_submit_strategy_validation_and_gating() {
        let backend = Arc::new(ScriptedBackend::ok(&[]));
        let mut usecase = usecase(backend.clone());

        assert!(usecase.submit_strategy("  ").await.unwrap_err().is_validation());

        usecase.add_persona("A", "a").unwrap();
        usecase.advance_phase().unwrap();
        assert!(
            usecase
                .submit_strategy("late")
                .await
                .unwrap_err()
                .is_precondition()
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_phase_guard_requires_personas() {
        let backend = Arc::new(ScriptedBackend::ok(&[]));
        let mut usecase = usecase(backend);

        assert!(usecase.advance_phase().unwrap_err().is_precondition());
        assert_eq!(usecase.session().phase, Phase::Strategy);

        usecase.load_roster("Tanaka: 40, career woman\nSato: 28, single").unwrap();
        assert_eq!(usecase.advance_phase().unwrap(), Phase::Interview);
    }

    #[tokio::test]
    async fn test_report_is_synthesized_at_most_once() {
        let backend = Arc::new(ScriptedBackend::ok(&["mod", "a1", "the insights"]));
        let mut usecase = usecase(backend.clone());

        usecase.add_persona("A", "a").unwrap();
        usecase.advance_phase().unwrap();
        usecase.advance_cycle().await.unwrap();
        usecase.advance_phase().unwrap();

        let first = usecase.report().await.unwrap();
        let second = usecase.report().await.unwrap();
        assert_eq!(first, "the insights");
        assert_eq!(first, second);

        // 2 cycle calls + exactly 1 analysis call despite the re-entry
        assert_eq!(backend.calls().len(), 3);
        let analysis_request = &backend.calls()[2];
        assert!(analysis_request.instruction.contains("Moderator: mod"));
        assert!(analysis_request.instruction.contains("A: a1"));
    }

    #[tokio::test]
    async fn test_report_failure_leaves_cache_empty_for_retry() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok("mod".into()),
            Ok("a1".into()),
            Err("overloaded".into()),
            Ok("insights on retry".into()),
        ]));
        let mut usecase = usecase(backend);

        usecase.add_persona("A", "a").unwrap();
        usecase.advance_phase().unwrap();
        usecase.advance_cycle().await.unwrap();
        usecase.advance_phase().unwrap();

        assert!(usecase.report().await.unwrap_err().is_generation());
        assert!(usecase.session().analysis.is_none());

        assert_eq!(usecase.report().await.unwrap(), "insights on retry");
    }

    #[tokio::test]
    async fn test_report_gated_by_phase() {
        let backend = Arc::new(ScriptedBackend::ok(&[]));
        let mut usecase = usecase(backend);
        assert!(usecase.report().await.unwrap_err().is_precondition());
    }

    #[tokio::test]
    async fn test_reset_returns_to_strategy() {
        let backend = Arc::new(ScriptedBackend::ok(&["ack", "mod", "a1"]));
        let mut usecase = usecase(backend);

        usecase.add_persona("A", "a").unwrap();
        usecase.submit_strategy("be gentle").await.unwrap();
        usecase.advance_phase().unwrap();
        usecase.advance_cycle().await.unwrap();

        usecase.reset(true);

        let session = usecase.session();
        assert_eq!(session.phase, Phase::Strategy);
        assert_eq!(session.turn_count, 0);
        assert!(session.strategy_log.is_empty());
        assert!(session.interview_log.is_empty());
        assert_eq!(session.personas.len(), 1);

        usecase.reset(false);
        assert!(usecase.session().personas.is_empty());
    }
}
